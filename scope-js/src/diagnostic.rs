use std::fmt::Display;
use std::fmt::Formatter;
use syntax_js::loc::Loc;
use thiserror::Error;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Severity {
  Error,
  Warning,
}

impl Severity {
  pub const fn as_str(&self) -> &'static str {
    match self {
      Severity::Error => "error",
      Severity::Warning => "warning",
    }
  }
}

impl Display for Severity {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

/// A non-fatal finding of the resolver.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
  pub code: &'static str,
  pub severity: Severity,
  pub message: String,
  pub loc: Loc,
}

impl Diagnostic {
  pub fn warning(code: &'static str, message: impl Into<String>, loc: Loc) -> Self {
    Self {
      code,
      severity: Severity::Warning,
      message: message.into(),
      loc,
    }
  }
}

impl Display for Diagnostic {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}[{}]: {}", self.severity, self.code, self.message)?;
    if !self.loc.is_synthetic() {
      write!(f, " at {}:{}", self.loc.line + 1, self.loc.column + 1)?;
    }
    Ok(())
  }
}

pub const UNRESOLVED_GLOBAL: &str = "SC0001";
pub const IMPLICIT_GLOBAL: &str = "SC0002";

/// Fatal resolution errors.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
  #[error("identifier `{name}` has already been declared")]
  Redeclaration { name: String, loc: Loc },
  #[error("assignment to constant variable `{name}`")]
  AssignToConst { name: String, loc: Loc },
  #[error("assignment to undeclared variable `{name}` in strict mode")]
  UndeclaredAssignment { name: String, loc: Loc },
}

impl ResolveError {
  pub fn loc(&self) -> Loc {
    match self {
      ResolveError::Redeclaration { loc, .. }
      | ResolveError::AssignToConst { loc, .. }
      | ResolveError::UndeclaredAssignment { loc, .. } => *loc,
    }
  }
}
