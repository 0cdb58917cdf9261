use assert_cmd::Command;
use serde_json::Value;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;

fn bundle_js_cli() -> Command {
  assert_cmd::cargo::cargo_bin_cmd!("bundle-js-cli")
}

fn project(files: &[(&str, &str)]) -> TempDir {
  let dir = tempfile::tempdir().unwrap();
  for (name, text) in files {
    fs::write(dir.path().join(name), text).unwrap();
  }
  dir
}

fn a_and_b() -> TempDir {
  project(&[
    ("a.js", "export const x = 1;\n"),
    (
      "b.js",
      "import {x} from 'a';\nconst style = StyleSheet({color: 'red'});\nexport const y = [x + 1, style];\n",
    ),
  ])
}

fn stdout_json(output: &[u8]) -> Value {
  serde_json::from_str(&String::from_utf8_lossy(output)).expect("stdout to be valid JSON")
}

fn entry(dir: &Path, name: &str) -> String {
  dir.join(name).to_string_lossy().into_owned()
}

#[test]
fn writes_bundle_to_stdout() {
  let dir = a_and_b();
  let assert = bundle_js_cli()
    .timeout(Duration::from_secs(5))
    .arg(entry(dir.path(), "b.js"))
    .arg("-I")
    .arg(dir.path())
    .arg("--minify")
    .assert()
    .success()
    .code(0);

  let stdout = String::from_utf8_lossy(&assert.get_output().stdout);
  assert!(stdout.contains("\"use strict\""), "{stdout}");
  assert!(stdout.contains("\"dcs-"), "{stdout}");
  assert!(
    assert.get_output().stderr.is_empty(),
    "expected stderr to be empty, got: {}",
    String::from_utf8_lossy(&assert.get_output().stderr)
  );
}

#[test]
fn writes_bundle_stylesheet_and_map_to_files() {
  let dir = a_and_b();
  let out = dir.path().join("out.js");
  let css = dir.path().join("out.css");
  let map = dir.path().join("out.js.map");
  let assert = bundle_js_cli()
    .timeout(Duration::from_secs(5))
    .arg(entry(dir.path(), "b.js"))
    .arg("-I")
    .arg(dir.path())
    .arg("-o")
    .arg(&out)
    .arg("--css")
    .arg(&css)
    .arg("--source-map")
    .arg(&map)
    .assert()
    .success();
  assert!(assert.get_output().stdout.is_empty());

  assert!(fs::read_to_string(&out).unwrap().contains("function"));
  let css = fs::read_to_string(&css).unwrap();
  assert!(css.starts_with(".dcs-"));
  assert!(css.contains("color: red;"));
  let map: Value = serde_json::from_str(&fs::read_to_string(&map).unwrap()).unwrap();
  assert_eq!(map["version"], 3);
  assert_eq!(map["sources"].as_array().unwrap().len(), 2);
}

#[test]
fn json_report_names_the_entry_point() {
  let dir = a_and_b();
  let assert = bundle_js_cli()
    .timeout(Duration::from_secs(5))
    .arg(entry(dir.path(), "b.js"))
    .arg("-I")
    .arg(dir.path())
    .arg("--json")
    .assert()
    .success()
    .code(0);

  let value = stdout_json(&assert.get_output().stdout);
  assert_eq!(value["schema_version"], 1);
  assert_eq!(value["export"], "b.y");
  assert!(value["js"].as_str().unwrap().contains("\"use strict\""));
  assert!(value["css"].as_str().unwrap().contains("color: red;"));
  assert!(value["warnings"].as_array().unwrap().is_empty());
}

#[test]
fn graph_errors_go_to_stderr() {
  let dir = project(&[
    ("m.js", "include 'n.js';\nexport const m = 1;\n"),
    ("n.js", "include 'm.js';\nexport const n = 2;\n"),
  ]);
  let html = dir.path().join("error.html");
  let assert = bundle_js_cli()
    .timeout(Duration::from_secs(5))
    .arg(entry(dir.path(), "m.js"))
    .arg("--error-html")
    .arg(&html)
    .assert()
    .failure()
    .code(1);

  assert!(
    assert.get_output().stdout.is_empty(),
    "expected stdout to be empty, got: {}",
    String::from_utf8_lossy(&assert.get_output().stdout)
  );
  let stderr = String::from_utf8_lossy(&assert.get_output().stderr);
  assert!(stderr.contains("graph error: include cycle detected"), "{stderr}");
  let page = fs::read_to_string(&html).unwrap();
  assert!(page.starts_with("<!DOCTYPE html>"));
  assert!(page.contains("include cycle detected"));
}

#[test]
fn json_error_describes_the_position() {
  let dir = project(&[("bad.js", "export const a = 1;\nexport const b = ;\n")]);
  let assert = bundle_js_cli()
    .timeout(Duration::from_secs(5))
    .arg(entry(dir.path(), "bad.js"))
    .arg("--json")
    .assert()
    .failure()
    .code(1);

  assert!(
    assert.get_output().stderr.is_empty(),
    "expected stderr to be empty, got: {}",
    String::from_utf8_lossy(&assert.get_output().stderr)
  );
  let value = stdout_json(&assert.get_output().stdout);
  assert_eq!(value["error"]["kind"], "parse");
  assert_eq!(value["error"]["line"], 2);
  assert!(!value["error"]["context"].as_array().unwrap().is_empty());
}

#[test]
fn config_file_supplies_search_paths_and_static_data() {
  let dir = project(&[("conf.js", "export const label = \"v\" + version;\n")]);
  let config = dir.path().join("build.json");
  fs::write(
    &config,
    serde_json::json!({
      "search_paths": [dir.path()],
      "static_data": {"conf": {"version": "2.0"}},
    })
    .to_string(),
  )
  .unwrap();
  let assert = bundle_js_cli()
    .timeout(Duration::from_secs(5))
    .arg("conf")
    .arg("--config")
    .arg(&config)
    .arg("--minify")
    .assert()
    .success();
  let stdout = String::from_utf8_lossy(&assert.get_output().stdout);
  assert!(stdout.contains("\"2.0\""), "{stdout}");
  let stderr = String::from_utf8_lossy(&assert.get_output().stderr);
  assert!(stderr.contains("warning[BD0001]"), "{stderr}");
}

#[test]
fn failed_writes_leave_no_outputs_behind() {
  let dir = a_and_b();
  let out = dir.path().join("out.js");
  let css = dir.path().join("missing").join("out.css");
  let assert = bundle_js_cli()
    .timeout(Duration::from_secs(5))
    .arg(entry(dir.path(), "b.js"))
    .arg("-I")
    .arg(dir.path())
    .arg("-o")
    .arg(&out)
    .arg("--css")
    .arg(&css)
    .assert()
    .failure()
    .code(1);

  let stderr = String::from_utf8_lossy(&assert.get_output().stderr);
  assert!(stderr.contains("io error: failed to write"), "{stderr}");
  assert!(!out.exists());
  let leftovers: Vec<_> = fs::read_dir(dir.path())
    .unwrap()
    .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
    .filter(|name| !name.ends_with(".js"))
    .collect();
  assert!(leftovers.is_empty(), "{leftovers:?}");
}

#[test]
fn writes_the_page_from_the_template() {
  let dir = a_and_b();
  fs::write(
    dir.path().join("index.html"),
    "<html><head><!--TITLE--><!--STYLE--></head><body><div id=\"root\"></div><!--SOURCE--><!--RENDER--></body></html>\n",
  )
  .unwrap();
  let html = dir.path().join("page.html");
  bundle_js_cli()
    .timeout(Duration::from_secs(5))
    .arg(entry(dir.path(), "b.js"))
    .arg("-I")
    .arg(dir.path())
    .arg("-o")
    .arg(dir.path().join("out.js"))
    .arg("--html")
    .arg(&html)
    .assert()
    .success();

  let page = fs::read_to_string(&html).unwrap();
  assert!(page.contains("<style type=\"text/css\">\n.dcs-"), "{page}");
  assert!(page.contains("\"use strict\""), "{page}");
  assert!(page.contains("const document_node = new b.y();"), "{page}");
}

#[test]
fn page_without_template_is_an_error() {
  let dir = a_and_b();
  let html = dir.path().join("page.html");
  bundle_js_cli()
    .timeout(Duration::from_secs(5))
    .arg(entry(dir.path(), "b.js"))
    .arg("-I")
    .arg(dir.path())
    .arg("--html")
    .arg(&html)
    .assert()
    .failure()
    .code(1);
  assert!(!html.exists());
}
