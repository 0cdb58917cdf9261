use crate::loc::Loc;
use crate::token::TT;
use core::fmt;
use core::fmt::Debug;
use core::fmt::Formatter;
use std::error::Error;
use std::fmt::Display;

/// A stable classification of syntax errors produced by the parser.
///
/// Diagnostic codes (prefix `SX`) are assigned per variant and are stable:
/// - `SX0001`: [`SyntaxErrorType::ExpectedNotFound`]
/// - `SX0002`: [`SyntaxErrorType::ExpectedSyntax`]
/// - `SX0003`: [`SyntaxErrorType::InvalidAssigmentTarget`]
/// - `SX0004`: [`SyntaxErrorType::MalformedLiteral`]
/// - `SX0005`: [`SyntaxErrorType::RequiredTokenNotFound`]
/// - `SX0006`: [`SyntaxErrorType::TryStatementHasNoCatchOrFinally`]
/// - `SX0007`: [`SyntaxErrorType::UnexpectedEnd`]
/// - `SX0008`: [`SyntaxErrorType::AnonymousExport`]
/// - `SX0009`: [`SyntaxErrorType::ModuleDeclarationNotAtTopLevel`]
/// - `SX0010`: [`SyntaxErrorType::LineTerminatorAfterThrow`]
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum SyntaxErrorType {
  ExpectedNotFound,
  ExpectedSyntax(&'static str),
  InvalidAssigmentTarget,
  MalformedLiteral,
  RequiredTokenNotFound(TT),
  TryStatementHasNoCatchOrFinally,
  UnexpectedEnd,
  AnonymousExport,
  ModuleDeclarationNotAtTopLevel,
  LineTerminatorAfterThrow,
}

#[derive(Clone)]
pub struct SyntaxError {
  pub typ: SyntaxErrorType,
  pub loc: Loc,
  pub actual_token: Option<TT>,
}

impl SyntaxError {
  pub fn new(typ: SyntaxErrorType, loc: Loc, actual_token: Option<TT>) -> SyntaxError {
    SyntaxError {
      typ,
      loc,
      actual_token,
    }
  }

  pub fn message(&self) -> String {
    self.typ.message(self.actual_token)
  }
}

impl Debug for SyntaxError {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    write!(f, "{} around {}:{}", self, self.loc.line + 1, self.loc.column + 1)
  }
}

impl Display for SyntaxError {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    write!(f, "{} [{}]", self.message(), self.typ.code())
  }
}

impl Error for SyntaxError {}

impl PartialEq for SyntaxError {
  fn eq(&self, other: &Self) -> bool {
    self.typ == other.typ
  }
}

impl Eq for SyntaxError {}

pub type SyntaxResult<T> = Result<T, SyntaxError>;

impl SyntaxErrorType {
  /// Stable diagnostic code for this syntax error variant.
  pub fn code(&self) -> &'static str {
    match self {
      SyntaxErrorType::ExpectedNotFound => "SX0001",
      SyntaxErrorType::ExpectedSyntax(_) => "SX0002",
      SyntaxErrorType::InvalidAssigmentTarget => "SX0003",
      SyntaxErrorType::MalformedLiteral => "SX0004",
      SyntaxErrorType::RequiredTokenNotFound(_) => "SX0005",
      SyntaxErrorType::TryStatementHasNoCatchOrFinally => "SX0006",
      SyntaxErrorType::UnexpectedEnd => "SX0007",
      SyntaxErrorType::AnonymousExport => "SX0008",
      SyntaxErrorType::ModuleDeclarationNotAtTopLevel => "SX0009",
      SyntaxErrorType::LineTerminatorAfterThrow => "SX0010",
    }
  }

  /// Human-readable message describing this syntax error.
  pub fn message(&self, actual_token: Option<TT>) -> String {
    let base = match self {
      SyntaxErrorType::ExpectedNotFound => "expected token not found".to_string(),
      SyntaxErrorType::ExpectedSyntax(expected) => format!("expected {}", expected),
      SyntaxErrorType::InvalidAssigmentTarget => "invalid assignment target".to_string(),
      SyntaxErrorType::MalformedLiteral => "malformed or unterminated literal".to_string(),
      SyntaxErrorType::RequiredTokenNotFound(tt) => format!("expected {:?}", tt),
      SyntaxErrorType::TryStatementHasNoCatchOrFinally => {
        "try statement has no catch or finally".to_string()
      }
      SyntaxErrorType::UnexpectedEnd => "unexpected end of input".to_string(),
      SyntaxErrorType::AnonymousExport => "unable to export anonymous entity".to_string(),
      SyntaxErrorType::ModuleDeclarationNotAtTopLevel => {
        "include, import and export are only allowed at the top level".to_string()
      }
      SyntaxErrorType::LineTerminatorAfterThrow => {
        "line terminator not allowed after `throw`".to_string()
      }
    };
    match actual_token {
      Some(TT::EOF) | None => base,
      Some(tt) => format!("{} (found {:?})", base, tt),
    }
  }
}
