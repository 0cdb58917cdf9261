use bundle_js::BuildErrorKind;
use bundle_js::BuildOptions;
use bundle_js::Builder;
use render_js::render;
use render_js::sourcemap::SourceMap;
use render_js::RenderOptions;
use serde_json::json;
use std::fs::File;
use std::time::Duration;
use std::time::SystemTime;
use syntax_js::parse;
use util::assert_text_eq;
use util::evaluate;
use util::Project;

mod util;

fn a_and_b() -> Project {
  Project::new(&[
    ("a.js", "export const x = 1;\n"),
    ("b.js", "import {x} from 'a';\nexport const y = x + 1;\n"),
  ])
}

fn assembled(builder: &Builder, entry: &str, standalone: bool) -> String {
  let tree = builder.assemble(entry, standalone).unwrap();
  render(&tree, &RenderOptions::minified())
}

#[test]
fn dependent_modules_are_wrapped_in_order() {
  let project = a_and_b();
  let builder = Builder::new(project.config());
  let entry = project.entry("b.js");

  let names = builder.discover(&entry).unwrap();
  assert_eq!(names, vec![entry.clone(), "a".to_string()]);

  assert_text_eq(
    concat!(
      "a=function(){\"use strict\";const x=1;return{x};}();",
      "b=function(a){\"use strict\";const x=a.x;const y=x+1;return{y};}(a);"
    ),
    &assembled(&builder, &entry, false),
  );

  let (css, js, export) = builder.build(&entry, false).unwrap();
  assert!(css.is_empty());
  assert_eq!(export, "b.y");
  assert!(parse(&js).is_ok());
  if let Some(y) = evaluate(&js, &export) {
    assert_eq!(y, "2");
  }

  let (_, js, export) = builder.build(&entry, true).unwrap();
  if let Some(y) = evaluate(&js, &export) {
    assert_eq!(y, "2");
  }
}

#[test]
fn file_named_modules_are_found_in_the_search_paths() {
  let project = Project::new(&[
    ("src/main.js", "import {h} from 'vendor/dom.js';\nexport const out = h(2);\n"),
    ("vendor/dom.js", "export const h = (v) => v * 3;\n"),
  ]);
  let builder = Builder::new(project.config());
  let entry = project.entry("src/main.js");
  assert_eq!(
    builder.discover(&entry).unwrap(),
    vec![entry.clone(), "vendor/dom.js".to_string()]
  );

  let bundle = assembled(&builder, &entry, false);
  assert!(bundle.starts_with("dom=function(){\"use strict\";"), "{bundle}");
  assert!(bundle.ends_with("}(dom);"), "{bundle}");

  let (_, js, export) = builder.build(&entry, false).unwrap();
  assert_eq!(export, "main.out");
  if let Some(out) = evaluate(&js, &export) {
    assert_eq!(out, "6");
  }
}

#[test]
fn star_exports_forward_every_name() {
  let project = Project::new(&[
    ("lib/lib.js", "export const one = 1;\nexport const two = 2;\n"),
    ("api/api.js", "export * from 'lib';\nexport const three = 3;\n"),
    ("main.js", "import * from 'api';\nexport const total = one + two + three;\n"),
  ]);
  let builder = Builder::new(project.config());
  let entry = project.entry("main.js");
  assert_text_eq(
    concat!(
      "lib=function(){\"use strict\";const one=1;const two=2;return{one,two};}();",
      "api=function(lib){\"use strict\";const one=lib.one;const two=lib.two;const three=3;return{one,three,two};}(lib);",
      "main=function(api){\"use strict\";const one=api.one;const three=api.three;const two=api.two;const total=one+two+three;return{total};}(api);"
    ),
    &assembled(&builder, &entry, false),
  );

  for minify in [false, true] {
    let (_, js, export) = builder.build(&entry, minify).unwrap();
    if let Some(total) = evaluate(&js, &export) {
      assert_eq!(total, "6");
    }
  }
}

#[test]
fn pages_use_the_platform_template() {
  let project = Project::new(&[
    ("app.js", "export class App {}\n"),
    ("index.html", "<title>default</title><!--SOURCE-->"),
    ("index.android.html", "<!--TITLE--><!--SOURCE--><!--RENDER-->"),
  ]);
  let mut config = project.config();
  config.html.title = "Demo".into();
  let output = Builder::new(config.clone())
    .build_with_options(&project.entry("app.js"), &BuildOptions::default())
    .unwrap();
  let page = output.html.unwrap();
  assert!(page.starts_with("<title>default</title><script"), "{page}");

  config.platform = Some("android".into());
  let output = Builder::new(config)
    .build_with_options(&project.entry("app.js"), &BuildOptions::default())
    .unwrap();
  let page = output.html.unwrap();
  assert!(page.starts_with("<title>Demo</title><script"), "{page}");
  assert!(page.contains("new app.App();"), "{page}");

  let bare = Project::new(&[("app.js", "export class App {}\n")]);
  let output = Builder::new(bare.config())
    .build_with_options(&bare.entry("app.js"), &BuildOptions::default())
    .unwrap();
  assert_eq!(output.html, None);
}

#[test]
fn standalone_emits_only_the_entry_module() {
  let project = a_and_b();
  let builder = Builder::new(project.config());
  let entry = project.entry("b.js");
  assert_eq!(
    assembled(&builder, &entry, true),
    "b=function(a){\"use strict\";const x=a.x;const y=x+1;return{y};}(a);"
  );

  let output = builder
    .build_with_options(
      &entry,
      &BuildOptions {
        minify: true,
        standalone: true,
      },
    )
    .unwrap();
  // Dependency paths must survive minification.
  assert!(output.js.starts_with("b=function("));
  assert!(output.js.ends_with("}(a);"));
  assert_eq!(output.export, "b.y");
}

#[test]
fn single_file_round_trips() {
  let project = Project::new(&[(
    "calc.js",
    "export function area(w, h) { return w * h; }\nconst unit = `${1}px`;\nlet n = [1, 2].map((v) => v * 2);\n",
  )]);
  let builder = Builder::new(project.config());
  let tree = builder.assemble(&project.entry("calc.js"), false).unwrap();
  for minify in [false, true] {
    let text = render(&tree, &RenderOptions { minify });
    let reparsed = parse(&text).unwrap();
    assert!(reparsed.structurally_eq(&tree), "{text}");
  }
}

#[test]
fn builds_are_deterministic() {
  let project = Project::new(&[
    ("app/app.js", "import {show} from 'app.ui';\nimport {clamp} from 'lib';\nexport function run(v) { return show(clamp(v)); }\n"),
    ("app/ui/ui.js", "include 'widgets.js';\nexport const show = (v) => widget(v);\n"),
    ("app/ui/widgets.js", "export function widget(value) { const box = {value}; return box; }\n"),
    ("lib.js", "export const clamp = (v) => Math.min(Math.max(v, 0), 1);\n"),
  ]);
  let first = Builder::new(project.config()).build("app", true).unwrap();
  let second = Builder::new(project.config()).build("app", true).unwrap();
  assert_text_eq(&first.1, &second.1);
  assert_eq!(first.2, second.2);
}

#[test]
fn namespaced_modules_merge_into_their_parent() {
  let project = Project::new(&[
    ("app/app.js", "import {show} from 'app.ui';\nexport const run = () => show();\n"),
    ("app/ui/ui.js", "export const show = () => 1;\n"),
  ]);
  let builder = Builder::new(project.config());
  assert_text_eq(
    concat!(
      "app={ui:{}};",
      "app.ui=function(){\"use strict\";const show=()=>1;return{show};}();",
      "Object.assign(app,function(ui){\"use strict\";const show=ui.show;const run=()=>show();return{run};}(app.ui));"
    ),
    &assembled(&builder, "app", false),
  );

  let output = builder
    .build_with_options("app", &BuildOptions::default())
    .unwrap();
  assert!(output.warnings.is_empty(), "{:?}", output.warnings);
  assert_eq!(output.export, "app.run");

  let (_, js, export) = builder.build("app", true).unwrap();
  assert_eq!(export, "a.run");
  assert!(js.starts_with("a={ui:{}};"));
}

#[test]
fn include_cycles_are_graph_errors() {
  let project = Project::new(&[
    ("m.js", "include 'n.js';\nexport const m = 1;\n"),
    ("n.js", "include 'm.js';\nexport const n = 2;\n"),
  ]);
  let err = Builder::new(project.config())
    .build(&project.entry("m.js"), false)
    .unwrap_err();
  assert_eq!(err.kind, BuildErrorKind::Graph);
  assert_eq!(err.path, project.path("m.js"));
  assert!(err.message.contains("m.js -> "), "{err}");
}

#[test]
fn import_cycles_name_both_modules() {
  let project = Project::new(&[
    ("p.js", "import {q} from 'q';\nexport const p = () => q;\n"),
    ("q.js", "import {p} from 'p';\nexport const q = () => p;\n"),
  ]);
  let err = Builder::new(project.config()).build("p", false).unwrap_err();
  assert_eq!(err.kind, BuildErrorKind::Graph);
  assert_eq!(err.message, "import cycle detected: p -> q -> p");
  assert_eq!(err.path, project.path("p.js"));
}

#[test]
fn modules_without_exports_are_rejected() {
  let project = Project::new(&[
    ("main.js", "import module quiet;\nexport const a = 1;\n"),
    ("quiet.js", "console.log('side effect');\n"),
  ]);
  let err = Builder::new(project.config())
    .build(&project.entry("main.js"), false)
    .unwrap_err();
  assert_eq!(err.kind, BuildErrorKind::Graph);
  assert_eq!(err.message, "module `quiet` has no exports");
  assert_eq!(err.path, project.path("quiet.js"));
}

#[test]
fn missing_modules_are_reported_against_the_importer() {
  let project = Project::new(&[("main.js", "import {a} from 'nowhere';\nexport const b = a;\n")]);
  let err = Builder::new(project.config())
    .build(&project.entry("main.js"), false)
    .unwrap_err();
  assert_eq!(err.kind, BuildErrorKind::Graph);
  assert!(err.message.contains("`nowhere`"));
  assert_eq!(err.path, project.path("main.js"));
}

#[test]
fn parse_errors_carry_context() {
  let project = Project::new(&[("bad.js", "export const a = 1;\nexport const b = ;\nlet c;\n")]);
  let err = Builder::new(project.config())
    .build(&project.entry("bad.js"), false)
    .unwrap_err();
  assert_eq!(err.kind, BuildErrorKind::Parse);
  assert_eq!(err.line, Some(2));
  assert!(err.render().contains('^'));
  assert!(err.context.iter().any(|l| l.contains("export const b = ;")));
}

#[test]
fn resolve_errors_point_into_the_source_file() {
  let project = Project::new(&[("main.js", "export const a = 1;\nfunction f() {\n  a = 2;\n}\n")]);
  let err = Builder::new(project.config())
    .build(&project.entry("main.js"), false)
    .unwrap_err();
  assert_eq!(err.kind, BuildErrorKind::Resolve);
  assert_eq!(err.path, project.path("main.js"));
  assert_eq!(err.line, Some(3));
}

#[test]
fn static_data_is_exported() {
  let project = Project::new(&[("conf.js", "export const label = \"v\" + version;\n")]);
  let mut config = project.config();
  config.static_data.insert(
    "conf".into(),
    json!({"version": "1.2"}).as_object().unwrap().clone(),
  );
  let builder = Builder::new(config);
  assert_eq!(
    assembled(&builder, "conf", false),
    "conf=function(){\"use strict\";const version=\"1.2\";const label=\"v\"+version;return{label,version};}();"
  );
  let output = builder
    .build_with_options("conf", &BuildOptions::default())
    .unwrap();
  assert_eq!(output.export, "conf.label");
  assert_eq!(output.warnings.len(), 1);
  assert_eq!(output.warnings[0].code, "BD0001");
}

#[test]
fn platform_variants_replace_the_default_source() {
  let project = Project::new(&[
    ("io.js", "export const target = \"web\";\n"),
    ("io.android.js", "export const target = \"android\";\n"),
  ]);
  let mut config = project.config();
  let default = assembled(&Builder::new(config.clone()), "io", false);
  assert!(default.contains("\"web\""));

  config.platform = Some("android".into());
  let android = assembled(&Builder::new(config), "io", false);
  assert!(android.contains("\"android\""));
  assert!(!android.contains("\"web\""));
}

#[test]
fn style_sheets_become_css() {
  let project = Project::new(&[(
    "button.js",
    "export const style = {\n  root: StyleSheet({color: 'red'}),\n  wide: StyleSheet({width: width()}),\n};\n",
  )]);
  let output = Builder::new(project.config())
    .build_with_options(&project.entry("button.js"), &BuildOptions::default())
    .unwrap();
  assert!(output.css.starts_with(".dcs-"));
  assert!(output.css.ends_with(" {\n  color: red;\n}"));
  assert!(output.js.contains("\"dcs-"));
  assert!(output.js.contains("StyleSheet("));
  let unconverted: Vec<_> = output
    .warnings
    .iter()
    .filter(|w| w.code == "BD0002")
    .collect();
  assert_eq!(unconverted.len(), 1);
  assert_eq!(unconverted[0].line, Some(3));
  assert_eq!(unconverted[0].path, project.path("button.js"));
}

#[test]
fn source_maps_point_at_the_original_files() {
  let project = a_and_b();
  let mut config = project.config();
  config.source_map = true;
  let output = Builder::new(config.clone())
    .build_with_options(&project.entry("b.js"), &BuildOptions::default())
    .unwrap();
  let map = output.source_map.unwrap();
  assert_eq!(map.version, 3);
  assert_eq!(
    map.sources,
    vec![
      project.entry("b.js"),
      project.path("a.js").to_string_lossy().into_owned(),
    ]
  );
  assert!(!map.segments().unwrap().concat().is_empty());
  assert_eq!(SourceMap::from_json(&map.to_json()).unwrap(), map);

  config.inline_source_map = true;
  let output = Builder::new(config)
    .build_with_options(&project.entry("b.js"), &BuildOptions::default())
    .unwrap();
  let last = output.js.lines().last().unwrap();
  assert!(last.starts_with("//# sourceMappingURL=data:application/json;"));
}

#[test]
fn modified_files_are_reloaded() {
  let project = a_and_b();
  let builder = Builder::new(project.config());
  let entry = project.entry("b.js");
  let before = assembled(&builder, &entry, false);
  assert!(before.contains("const x=1;"));

  project.write("a.js", "export const x = 41;\n");
  File::options()
    .write(true)
    .open(project.path("a.js"))
    .unwrap()
    .set_modified(SystemTime::now() + Duration::from_secs(30))
    .unwrap();
  let after = assembled(&builder, &entry, false);
  assert!(after.contains("const x=41;"));

  // Same timestamp, so only an explicit invalidation picks this up.
  let mtime = std::fs::metadata(project.path("a.js")).unwrap().modified().unwrap();
  project.write("a.js", "export const x = 42;\n");
  File::options()
    .write(true)
    .open(project.path("a.js"))
    .unwrap()
    .set_modified(mtime)
    .unwrap();
  assert!(assembled(&builder, &entry, false).contains("const x=41;"));
  assert!(builder.invalidate(&project.path("a.js")));
  assert!(assembled(&builder, &entry, false).contains("const x=42;"));
}
