//! Locating included files and named modules on disk.

use crate::error::BuildError;
use std::io;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;
use std::time::SystemTime;

/// File system access used while discovering a project.
pub trait SourceFs {
  fn is_file(&self, path: &Path) -> bool;
  fn read_to_string(&self, path: &Path) -> io::Result<String>;
  fn modified(&self, path: &Path) -> io::Result<SystemTime>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct RealFs;

impl SourceFs for RealFs {
  fn is_file(&self, path: &Path) -> bool {
    std::fs::metadata(path)
      .map(|m| m.is_file())
      .unwrap_or(false)
  }

  fn read_to_string(&self, path: &Path) -> io::Result<String> {
    std::fs::read_to_string(path)
  }

  fn modified(&self, path: &Path) -> io::Result<SystemTime> {
    std::fs::metadata(path)?.modified()
  }
}

/// Removes `.` segments and resolves `..` against the preceding segment without touching the
/// file system.
pub fn normalize_path(path: &Path) -> PathBuf {
  let mut normalized = PathBuf::new();
  for component in path.components() {
    match component {
      Component::CurDir => {}
      Component::ParentDir => {
        if !normalized.pop() {
          normalized.push("..");
        }
      }
      other => normalized.push(other.as_os_str()),
    }
  }
  normalized
}

/// Absolute, normalized form of a path given on the command line or in configuration.
pub fn absolute_path(path: &Path) -> Result<PathBuf, BuildError> {
  if path.is_absolute() {
    return Ok(normalize_path(path));
  }
  let cwd = std::env::current_dir().map_err(|err| BuildError::io(path, &err))?;
  Ok(normalize_path(&cwd.join(path)))
}

/// Target of an `include` written in `from`, relative to the including file's directory.
pub fn include_path(from: &Path, target: &str) -> PathBuf {
  let dir = from.parent().unwrap_or_else(|| Path::new(""));
  normalize_path(&dir.join(target))
}

/// Global name a module is published under: the dotted name itself, or the file stem for a
/// module named by file.
pub fn module_global_name(name: &str) -> String {
  match name.strip_suffix(".js") {
    Some(file) => Path::new(file)
      .file_name()
      .map(|n| n.to_string_lossy().into_owned())
      .unwrap_or_else(|| file.to_string()),
    None => name.to_string(),
  }
}

/// Candidate file names of a module, most specific first.
pub fn module_candidates(name: &str) -> Vec<String> {
  if name.ends_with(".js") {
    return vec![name.to_string()];
  }
  let dir = name.replace('.', "/");
  let last = name.rsplit('.').next().unwrap_or(name);
  vec![
    format!("{dir}/{last}.js"),
    format!("{dir}/index.js"),
    format!("{dir}.js"),
  ]
}

pub struct Lookup<'a, F: SourceFs> {
  pub fs: &'a F,
  pub roots: Vec<&'a Path>,
  pub platform: Option<&'a str>,
}

impl<'a, F: SourceFs> Lookup<'a, F> {
  /// First root containing `name`.
  pub fn find_file(&self, name: &str) -> Option<PathBuf> {
    self
      .roots
      .iter()
      .map(|root| normalize_path(&root.join(name)))
      .find(|candidate| self.fs.is_file(candidate))
  }

  /// Each candidate name is tried in every root before moving on to the next candidate.
  pub fn find_module(&self, name: &str, importer: &Path) -> Result<PathBuf, BuildError> {
    for candidate in module_candidates(name) {
      if let Some(path) = self.find_file(&candidate) {
        return Ok(path);
      }
    }
    let searched: Vec<String> = self
      .roots
      .iter()
      .map(|r| r.display().to_string())
      .collect();
    Err(BuildError::graph(
      importer,
      format!(
        "module `{name}` not found in search paths [{}]",
        searched.join(", ")
      ),
    ))
  }

  /// `x.<platform>.js` next to `x.js` when a platform is configured and the variant exists.
  pub fn source_path(&self, path: &Path) -> PathBuf {
    let Some(platform) = self.platform else {
      return path.to_path_buf();
    };
    let Some(stem) = path.file_stem() else {
      return path.to_path_buf();
    };
    let variant = path.with_file_name(format!("{}.{platform}.js", stem.to_string_lossy()));
    if self.fs.is_file(&variant) {
      variant
    } else {
      path.to_path_buf()
    }
  }
}

#[cfg(test)]
mod tests {
  use super::include_path;
  use super::module_candidates;
  use super::module_global_name;
  use super::normalize_path;
  use super::Lookup;
  use super::SourceFs;
  use std::collections::BTreeSet;
  use std::io;
  use std::path::Path;
  use std::path::PathBuf;
  use std::time::SystemTime;

  struct FakeFs(BTreeSet<PathBuf>);

  impl SourceFs for FakeFs {
    fn is_file(&self, path: &Path) -> bool {
      self.0.contains(path)
    }

    fn read_to_string(&self, _path: &Path) -> io::Result<String> {
      Ok(String::new())
    }

    fn modified(&self, _path: &Path) -> io::Result<SystemTime> {
      Ok(SystemTime::UNIX_EPOCH)
    }
  }

  fn fake(paths: &[&str]) -> FakeFs {
    FakeFs(paths.iter().map(PathBuf::from).collect())
  }

  #[test]
  fn normalizes_lexically() {
    assert_eq!(normalize_path(Path::new("/a/./b/../c")), PathBuf::from("/a/c"));
    assert_eq!(normalize_path(Path::new("../x")), PathBuf::from("../x"));
    assert_eq!(
      include_path(Path::new("/src/app/main.js"), "../lib/util.js"),
      PathBuf::from("/src/lib/util.js")
    );
  }

  #[test]
  fn candidate_order() {
    assert_eq!(
      module_candidates("a.b.c"),
      vec!["a/b/c/c.js", "a/b/c/index.js", "a/b/c.js"]
    );
    assert_eq!(module_candidates("lib/x.js"), vec!["lib/x.js"]);
    assert_eq!(module_global_name("app.api"), "app.api");
    assert_eq!(module_global_name("lib/x.js"), "x");
  }

  #[test]
  fn search_paths_then_resources() {
    let fs = fake(&["/res/ui/index.js", "/src/ui.js", "/src/app/app.js"]);
    let lookup = Lookup {
      fs: &fs,
      roots: vec![Path::new("/src"), Path::new("/res")],
      platform: None,
    };
    let importer = Path::new("/src/main.js");
    assert_eq!(
      lookup.find_module("ui", importer).unwrap(),
      PathBuf::from("/res/ui/index.js")
    );
    assert_eq!(
      lookup.find_module("app", importer).unwrap(),
      PathBuf::from("/src/app/app.js")
    );
    let err = lookup.find_module("missing.mod", importer).unwrap_err();
    assert!(err.message.contains("`missing.mod`"));
  }

  #[test]
  fn platform_variant_is_preferred() {
    let fs = fake(&["/src/io.js", "/src/io.android.js"]);
    let lookup = Lookup {
      fs: &fs,
      roots: vec![Path::new("/src")],
      platform: Some("android"),
    };
    assert_eq!(
      lookup.source_path(Path::new("/src/io.js")),
      PathBuf::from("/src/io.android.js")
    );
    assert_eq!(
      lookup.source_path(Path::new("/src/other.js")),
      PathBuf::from("/src/other.js")
    );
  }
}
