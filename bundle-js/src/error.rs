use scope_js::ResolveError;
use serde::Serialize;
use std::fmt;
use std::fmt::Display;
use std::fmt::Formatter;
use std::io;
use std::path::Path;
use std::path::PathBuf;
use syntax_js::error::SyntaxError;
use syntax_js::loc::Loc;
use thiserror::Error;

/// Lines of source shown on each side of the error position.
const CONTEXT_LINES: usize = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildErrorKind {
  Parse,
  Resolve,
  Graph,
  Io,
}

impl BuildErrorKind {
  pub fn as_str(self) -> &'static str {
    match self {
      BuildErrorKind::Parse => "parse",
      BuildErrorKind::Resolve => "resolve",
      BuildErrorKind::Graph => "graph",
      BuildErrorKind::Io => "io",
    }
  }
}

impl Display for BuildErrorKind {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

fn headline(
  kind: &BuildErrorKind,
  path: &Path,
  line: &Option<u32>,
  column: &Option<u32>,
  message: &str,
) -> String {
  let mut out = path.display().to_string();
  if let Some(line) = line {
    out.push_str(&format!(":{line}"));
    if let Some(column) = column {
      out.push_str(&format!(":{column}"));
    }
  }
  if !out.is_empty() {
    out.push_str(": ");
  }
  out.push_str(&format!("{kind} error: {message}"));
  out
}

/// The single error type of a build. No output is produced when one is returned.
#[derive(Clone, Debug, Error, PartialEq, Eq, Serialize)]
#[error("{}", headline(.kind, .path, .line, .column, .message))]
pub struct BuildError {
  pub kind: BuildErrorKind,
  pub path: PathBuf,
  /// 1-based.
  pub line: Option<u32>,
  /// 1-based.
  pub column: Option<u32>,
  pub message: String,
  /// Numbered source lines around the position with a caret line under the error column.
  pub context: Vec<String>,
}

impl BuildError {
  pub fn new(kind: BuildErrorKind, path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
    BuildError {
      kind,
      path: path.into(),
      line: None,
      column: None,
      message: message.into(),
      context: Vec::new(),
    }
  }

  pub fn graph(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
    Self::new(BuildErrorKind::Graph, path, message)
  }

  pub fn io(path: impl Into<PathBuf>, err: &io::Error) -> Self {
    let path = path.into();
    let message = format!("cannot read {}: {err}", path.display());
    Self::new(BuildErrorKind::Io, path, message)
  }

  pub fn from_syntax(path: impl Into<PathBuf>, text: &str, err: &SyntaxError) -> Self {
    Self::new(BuildErrorKind::Parse, path, err.to_string()).at(err.loc, Some(text))
  }

  pub fn from_resolve(path: impl Into<PathBuf>, text: Option<&str>, err: &ResolveError) -> Self {
    Self::new(BuildErrorKind::Resolve, path, err.to_string()).at(err.loc(), text)
  }

  /// Attaches a position, and the surrounding lines when `text` is available.
  pub fn at(mut self, loc: Loc, text: Option<&str>) -> Self {
    if loc.is_synthetic() {
      return self;
    }
    self.line = Some(loc.line + 1);
    self.column = Some(loc.column + 1);
    if let Some(text) = text {
      self.context = context_lines(text, loc.line as usize, loc.column as usize);
    }
    self
  }

  /// Console report: the headline followed by the source context.
  pub fn render(&self) -> String {
    let mut out = self.to_string();
    for line in self.context.iter() {
      out.push('\n');
      out.push_str(line);
    }
    out
  }

  /// Self-contained HTML page describing the error, served in place of a bundle.
  pub fn render_html(&self) -> String {
    let mut context = String::new();
    for line in self.context.iter() {
      context.push_str(&escape_html(line));
      context.push('\n');
    }
    format!(
      concat!(
        "<!DOCTYPE html>\n",
        "<html>\n<head>\n<meta charset=\"utf-8\">\n<title>Build error</title>\n",
        "<style>body{{font-family:sans-serif;margin:2em}}",
        "pre{{background:#f6f6f6;padding:1em;overflow:auto}}",
        "h1{{color:#b00020}}</style>\n",
        "</head>\n<body>\n<h1>{} error</h1>\n<p><code>{}</code></p>\n",
        "<p>{}</p>\n<pre>{}</pre>\n</body>\n</html>\n"
      ),
      self.kind,
      escape_html(&location(self)),
      escape_html(&self.message),
      context,
    )
  }
}

fn location(err: &BuildError) -> String {
  match (err.line, err.column) {
    (Some(line), Some(column)) => format!("{}:{line}:{column}", err.path.display()),
    (Some(line), None) => format!("{}:{line}", err.path.display()),
    _ => err.path.display().to_string(),
  }
}

pub(crate) fn escape_html(raw: &str) -> String {
  let mut out = String::with_capacity(raw.len());
  for c in raw.chars() {
    match c {
      '<' => out.push_str("&lt;"),
      '>' => out.push_str("&gt;"),
      '&' => out.push_str("&amp;"),
      '"' => out.push_str("&quot;"),
      '\'' => out.push_str("&#39;"),
      c => out.push(c),
    }
  }
  out
}

/// `line` and `column` are 0-based. Lines are numbered from 1 in a four wide field.
pub fn context_lines(text: &str, line: usize, column: usize) -> Vec<String> {
  let lines: Vec<&str> = text.split('\n').collect();
  if line >= lines.len() {
    return Vec::new();
  }
  let first = line.saturating_sub(CONTEXT_LINES);
  let last = (line + CONTEXT_LINES).min(lines.len() - 1);
  let mut out = Vec::with_capacity(last - first + 2);
  for (i, text) in lines.iter().enumerate().take(line + 1).skip(first) {
    out.push(format!("{:4}: {}", i + 1, text.trim_end_matches('\r')));
  }
  out.push(format!("      {}^", " ".repeat(column)));
  for (i, text) in lines.iter().enumerate().take(last + 1).skip(line + 1) {
    out.push(format!("{:4}: {}", i + 1, text.trim_end_matches('\r')));
  }
  out
}
