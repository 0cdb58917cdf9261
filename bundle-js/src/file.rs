use crate::error::BuildError;
use crate::lookup::SourceFs;
use crate::style::extract_styles;
use crate::BuildWarning;
use std::path::Path;
use std::path::PathBuf;
use std::time::Instant;
use std::time::SystemTime;
use syntax_js::ast::Node;
use syntax_js::loc::Loc;
use syntax_js::loc::SourceId;
use syntax_js::parse_source;
use syntax_js::surface::extract_surface;
use syntax_js::surface::Surface;
use tracing::debug;

pub const UNCONVERTED_STYLE: &str = "BD0002";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FileState {
  Unloaded,
  /// Parsed successfully from the source as of `mtime`.
  Loaded { mtime: SystemTime },
  /// Loaded once, but must be reparsed before next use.
  Stale,
  /// The last load failed.
  Error,
}

/// Everything derived from one parse of a file. Replaced wholesale on reload.
#[derive(Clone, Debug)]
pub struct Parsed {
  pub text: String,
  /// Module body with the surface declarations removed and style sheets extracted.
  pub tree: Node,
  pub surface: Surface,
  pub styles: Vec<String>,
  pub warnings: Vec<BuildWarning>,
}

#[derive(Debug)]
pub struct JsFile {
  pub path: PathBuf,
  /// `path`, or its platform variant.
  pub source_path: PathBuf,
  /// Dotted name, used in diagnostics.
  pub name: String,
  pub source_id: SourceId,
  parsed: Option<Parsed>,
  /// Last text read, kept even when it failed to parse so errors can show context.
  text: Option<String>,
  state: FileState,
}

impl JsFile {
  pub fn new(path: PathBuf, source_path: PathBuf, name: String, source_id: SourceId) -> JsFile {
    JsFile {
      path,
      source_path,
      name,
      source_id,
      parsed: None,
      text: None,
      state: FileState::Unloaded,
    }
  }

  pub fn state(&self) -> &FileState {
    &self.state
  }

  pub fn parsed(&self) -> Option<&Parsed> {
    self.parsed.as_ref()
  }

  pub fn text(&self) -> Option<&str> {
    self.text.as_deref()
  }

  /// Included file paths as written.
  pub fn includes(&self) -> &[String] {
    self
      .parsed
      .as_ref()
      .map(|p| p.surface.includes.as_slice())
      .unwrap_or(&[])
  }

  pub fn invalidate(&mut self) {
    if matches!(self.state, FileState::Loaded { .. }) {
      self.state = FileState::Stale;
    }
  }

  /// Brings the file up to date with the disk. Returns whether it was (re)parsed.
  pub fn reload<F: SourceFs>(&mut self, fs: &F) -> Result<bool, BuildError> {
    if let FileState::Loaded { mtime } = self.state {
      let current = fs
        .modified(&self.source_path)
        .map_err(|err| BuildError::io(&self.source_path, &err))?;
      if current <= mtime {
        return Ok(false);
      }
    }
    match self.load(fs) {
      Ok(()) => Ok(true),
      Err(err) => {
        self.state = FileState::Error;
        self.parsed = None;
        Err(err)
      }
    }
  }

  fn load<F: SourceFs>(&mut self, fs: &F) -> Result<(), BuildError> {
    let started = Instant::now();
    let mtime = fs
      .modified(&self.source_path)
      .map_err(|err| BuildError::io(&self.source_path, &err))?;
    let text = fs
      .read_to_string(&self.source_path)
      .map_err(|err| BuildError::io(&self.source_path, &err))?;
    self.text = Some(text.clone());
    let parsed = parse_file(&self.source_path, text, self.source_id)?;
    debug!(
      path = %self.source_path.display(),
      bytes = parsed.text.len(),
      elapsed_ms = started.elapsed().as_secs_f64() * 1000.0,
      "loaded file"
    );
    self.parsed = Some(parsed);
    self.state = FileState::Loaded { mtime };
    Ok(())
  }
}

fn style_warning(path: &Path, text: &str, loc: Loc) -> BuildWarning {
  BuildWarning {
    code: UNCONVERTED_STYLE,
    path: path.to_path_buf(),
    line: Some(loc.line + 1),
    column: Some(loc.column + 1),
    message: format!(
      "StyleSheet call could not be converted at compile time: {}",
      text.lines().nth(loc.line as usize).unwrap_or("").trim()
    ),
  }
}

/// Parses one source text and strips its module surface.
pub fn parse_file(path: &Path, text: String, source_id: SourceId) -> Result<Parsed, BuildError> {
  let mut tree =
    parse_source(&text, source_id).map_err(|err| BuildError::from_syntax(path, &text, &err))?;
  let surface =
    extract_surface(&mut tree).map_err(|err| BuildError::from_syntax(path, &text, &err))?;
  let styles = extract_styles(&mut tree, path);
  let warnings = styles
    .unconverted
    .iter()
    .map(|loc| style_warning(path, &text, *loc))
    .collect();
  Ok(Parsed {
    text,
    tree,
    surface,
    styles: styles.rules,
    warnings,
  })
}
