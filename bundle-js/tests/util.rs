use assert_cmd::Command;
use bundle_js::BuildConfig;
use similar::ChangeTag;
use similar::TextDiff;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;

/// A project laid out in a temporary directory, which is also its only search path.
pub struct Project {
  pub dir: TempDir,
}

impl Project {
  pub fn new(files: &[(&str, &str)]) -> Project {
    let project = Project {
      dir: tempfile::tempdir().unwrap(),
    };
    for (name, text) in files {
      project.write(name, text);
    }
    project
  }

  pub fn path(&self, name: &str) -> PathBuf {
    self.dir.path().join(name)
  }

  /// Entry argument naming a file of the project.
  pub fn entry(&self, name: &str) -> String {
    self.path(name).to_string_lossy().into_owned()
  }

  pub fn write(&self, name: &str, text: &str) {
    let path = self.path(name);
    if let Some(parent) = path.parent() {
      fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, text).unwrap();
  }

  pub fn config(&self) -> BuildConfig {
    BuildConfig {
      search_paths: vec![self.dir.path().to_path_buf()],
      ..Default::default()
    }
  }
}

/// Panics with a line diff when `actual` differs from `expected`.
pub fn assert_text_eq(expected: &str, actual: &str) {
  if expected == actual {
    return;
  }
  let mut report = String::new();
  for change in TextDiff::from_lines(expected, actual).iter_all_changes() {
    let sign = match change.tag() {
      ChangeTag::Delete => "-",
      ChangeTag::Insert => "+",
      ChangeTag::Equal => " ",
    };
    report.push_str(&format!("{sign}{change}"));
    if change.missing_newline() {
      report.push('\n');
    }
  }
  panic!("bundles differ:\n{report}");
}

/// Runs `js` with node and returns `expr` as JSON, or `None` when node is not installed.
pub fn evaluate(js: &str, expr: &str) -> Option<String> {
  if std::process::Command::new("node")
    .arg("--version")
    .output()
    .is_err()
  {
    eprintln!("node is not installed, skipping evaluation");
    return None;
  }
  let dir = tempfile::tempdir().unwrap();
  let script = dir.path().join("bundle.cjs");
  fs::write(
    &script,
    format!("{js}\nconsole.log(JSON.stringify({expr}));\n"),
  )
  .unwrap();
  let output = Command::new("node")
    .arg(&script)
    .timeout(Duration::from_secs(10))
    .output()
    .unwrap();
  assert!(
    output.status.success(),
    "bundle failed to run:\n{js}\n{}",
    String::from_utf8_lossy(&output.stderr)
  );
  Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
}
