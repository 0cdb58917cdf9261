//! Dependency graph discovery and scope-isolated bundle assembly.
//!
//! A project is a graph of logical modules. Each module is an index file plus the files it
//! textually includes, and imports named values from other modules. [`Builder`] discovers the
//! graph from an entry point, orders it, wraps every file and module in an isolating function,
//! resolves scopes over the result and renders a single program:
//!
//! ```no_run
//! use bundle_js::BuildConfig;
//! use bundle_js::Builder;
//!
//! let builder = Builder::new(BuildConfig {
//!   search_paths: vec!["src".into()],
//!   ..Default::default()
//! });
//! let (css, js, export) = builder.build("src/app/app.js", true).unwrap();
//! ```

use serde::Serialize;
use std::fmt;
use std::fmt::Display;
use std::fmt::Formatter;
use std::path::PathBuf;

pub mod assemble;
pub mod builder;
pub mod config;
pub mod error;
pub mod file;
pub mod html;
pub mod lookup;
pub mod module;
pub mod order;
pub mod style;

pub use builder::BuildOptions;
pub use builder::BuildOutput;
pub use builder::Builder;
pub use config::BuildConfig;
pub use error::BuildError;
pub use error::BuildErrorKind;
pub use html::HtmlConfig;
pub use lookup::RealFs;
pub use lookup::SourceFs;
pub use scope_js::NameStyle;

/// A non-fatal finding of a build.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BuildWarning {
  pub code: &'static str,
  pub path: PathBuf,
  /// 1-based.
  pub line: Option<u32>,
  /// 1-based.
  pub column: Option<u32>,
  pub message: String,
}

impl Display for BuildWarning {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.path.display())?;
    if let Some(line) = self.line {
      write!(f, ":{line}")?;
      if let Some(column) = self.column {
        write!(f, ":{column}")?;
      }
    }
    write!(f, ": warning[{}]: {}", self.code, self.message)
  }
}
