use crate::error::BuildError;
use crate::error::BuildErrorKind;
use crate::html::HtmlConfig;
use scope_js::NameStyle;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;

/// Settings shared by every build of one [`crate::Builder`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
  /// Roots searched, in order, for named modules.
  pub search_paths: Vec<PathBuf>,
  /// Searched after `search_paths`.
  pub resource_dir: Option<PathBuf>,
  /// Prefer `name.<platform>.js` over `name.js` when it exists.
  pub platform: Option<String>,
  /// Module name to constants injected into that module and exported from it.
  pub static_data: BTreeMap<String, Map<String, Value>>,
  /// Naming scheme of unminified output.
  pub naming: NameStyle,
  pub source_map: bool,
  /// Append the source map to the bundle as a data URL comment.
  pub inline_source_map: bool,
  /// Page generated when the roots contain an `index.html` template.
  pub html: HtmlConfig,
}

impl BuildConfig {
  pub fn from_json(text: &str) -> serde_json::Result<BuildConfig> {
    serde_json::from_str(text)
  }

  pub fn load(path: &Path) -> Result<BuildConfig, BuildError> {
    let text = std::fs::read_to_string(path).map_err(|err| BuildError::io(path, &err))?;
    Self::from_json(&text).map_err(|err| {
      BuildError::new(
        BuildErrorKind::Io,
        path,
        format!("invalid build configuration: {err}"),
      )
    })
  }

  /// Search roots in lookup order: the search paths, then the resource directory.
  pub fn roots(&self) -> Vec<&Path> {
    self
      .search_paths
      .iter()
      .map(|p| p.as_path())
      .chain(self.resource_dir.as_deref())
      .collect()
  }
}

#[cfg(test)]
mod tests {
  use super::BuildConfig;
  use scope_js::NameStyle;
  use std::path::Path;

  #[test]
  fn missing_fields_use_defaults() {
    let config = BuildConfig::from_json(r#"{"platform": "android"}"#).unwrap();
    assert_eq!(config.platform.as_deref(), Some("android"));
    assert!(config.search_paths.is_empty());
    assert_eq!(config.naming, NameStyle::Short);
    assert!(!config.source_map);
    assert_eq!(config.html.path_prefix, "/");
    assert!(config.html.inline);
  }

  #[test]
  fn parses_static_data_and_roots() {
    let config = BuildConfig::from_json(
      r#"{
        "search_paths": ["src", "lib"],
        "resource_dir": "res",
        "naming": "long",
        "html": {"title": "App", "inline": false},
        "static_data": {"app": {"version": "1.0", "flags": [1, true, null]}}
      }"#,
    )
    .unwrap();
    assert_eq!(config.naming, NameStyle::Long);
    assert_eq!(config.html.title, "App");
    assert!(!config.html.inline);
    assert_eq!(config.html.render_function, "daedalus.render");
    assert_eq!(config.static_data["app"]["version"], "1.0");
    assert_eq!(
      config.roots(),
      vec![Path::new("src"), Path::new("lib"), Path::new("res")]
    );
  }
}
