//! Boundary-aware text writer used by the renderer.
//!
//! When callers emit token-like fragments (keywords, identifiers, numbers,
//! punctuation), the [`Emitter`] inserts the minimal whitespace required to
//! prevent the concatenation from being lexed as a different token (e.g.
//! `returnx`, `a++b`, `a--b`, `a//b`). It also tracks the output line and
//! column so that source positions can be attached to the next token.

use syntax_js::loc::Loc;

/// Controls how the renderer lays out code.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EmitMode {
  /// Only whitespace required at token boundaries.
  Minified,
  /// One statement per line with two-space indentation.
  Pretty,
}

/// A source position attached to a generated position.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mark {
  pub generated_line: u32,
  pub generated_column: u32,
  pub loc: Loc,
  pub name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Emitter {
  out: String,
  mode: EmitMode,
  trailing: Boundary,
  line: u32,
  column: u32,
  pending: Option<(Loc, Option<String>)>,
  marks: Vec<Mark>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Boundary {
  None,
  Word,
  Number,
  Plus,
  PlusPlus,
  Minus,
  MinusMinus,
  Slash,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Leading {
  None,
  Word,
  Number,
  Plus,
  Minus,
  Slash,
  Star,
  Dot,
  Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenKind {
  Word,
  Number,
  Other,
}

impl Emitter {
  pub fn new(mode: EmitMode) -> Self {
    Emitter {
      out: String::new(),
      mode,
      trailing: Boundary::None,
      line: 0,
      column: 0,
      pending: None,
      marks: Vec::new(),
    }
  }

  pub fn mode(&self) -> EmitMode {
    self.mode
  }

  pub fn is_pretty(&self) -> bool {
    self.mode == EmitMode::Pretty
  }

  pub fn as_str(&self) -> &str {
    &self.out
  }

  pub fn into_parts(self) -> (String, Vec<Mark>) {
    (self.out, self.marks)
  }

  /// Attaches `loc` (and an optional name) to the next token written. Synthetic positions are
  /// ignored.
  pub fn mark(&mut self, loc: Loc, name: Option<&str>) {
    if !loc.is_synthetic() {
      self.pending = Some((loc, name.map(str::to_string)));
    }
  }

  pub fn write_keyword(&mut self, keyword: &str) {
    self.write_with_kind(keyword, TokenKind::Word);
  }

  pub fn write_identifier(&mut self, identifier: &str) {
    self.write_with_kind(identifier, TokenKind::Word);
  }

  pub fn write_number(&mut self, number: &str) {
    self.write_with_kind(number, TokenKind::Number);
  }

  /// Punctuation and operators.
  pub fn write_punct(&mut self, punct: &str) {
    self.write_with_kind(punct, TokenKind::Other);
  }

  /// A single literal token whose boundaries are derived from its first and last chars
  /// (strings, regexes, template pieces).
  pub fn write_literal(&mut self, text: &str) {
    self.write_with_kind(text, TokenKind::Other);
  }

  /// A space in pretty mode; nothing when minifying.
  pub fn write_soft_space(&mut self) {
    if self.is_pretty() {
      self.push_whitespace(" ");
    }
  }

  pub fn write_space(&mut self) {
    self.push_whitespace(" ");
  }

  /// A newline followed by `indent` levels of indentation in pretty mode; nothing when
  /// minifying.
  pub fn write_soft_newline(&mut self, indent: usize) {
    if self.is_pretty() {
      self.push_whitespace("\n");
      for _ in 0..indent {
        self.push_whitespace("  ");
      }
    }
  }

  pub fn write_newline(&mut self) {
    self.push_whitespace("\n");
  }

  fn write_with_kind(&mut self, text: &str, kind: TokenKind) {
    let Some(first) = text.chars().next() else {
      return;
    };
    let leading = match kind {
      TokenKind::Word => Leading::Word,
      TokenKind::Number => Leading::Number,
      TokenKind::Other => classify_leading_char(first),
    };
    if needs_space(self.trailing, leading) {
      self.push_whitespace(" ");
    }
    if let Some((loc, name)) = self.pending.take() {
      self.marks.push(Mark {
        generated_line: self.line,
        generated_column: self.column,
        loc,
        name,
      });
    }
    self.push(text);
    self.trailing = match kind {
      TokenKind::Word => Boundary::Word,
      TokenKind::Number if text.ends_with('.') => Boundary::None,
      TokenKind::Number => Boundary::Number,
      TokenKind::Other => classify_trailing(text),
    };
  }

  fn push_whitespace(&mut self, text: &str) {
    self.push(text);
    self.trailing = Boundary::None;
  }

  fn push(&mut self, text: &str) {
    for c in text.chars() {
      if c == '\n' {
        self.line += 1;
        self.column = 0;
      } else {
        self.column += 1;
      }
    }
    self.out.push_str(text);
  }
}

fn needs_space(prev: Boundary, next: Leading) -> bool {
  match (prev, next) {
    (Boundary::Word, Leading::Word)
    | (Boundary::Word, Leading::Number)
    | (Boundary::Number, Leading::Word)
    | (Boundary::Number, Leading::Number)
    | (Boundary::Number, Leading::Dot) => true,
    (Boundary::Plus, Leading::Plus)
    | (Boundary::PlusPlus, Leading::Plus)
    | (Boundary::Minus, Leading::Minus)
    | (Boundary::MinusMinus, Leading::Minus)
    | (Boundary::Slash, Leading::Slash)
    | (Boundary::Slash, Leading::Star) => true,
    _ => false,
  }
}

fn is_word_char(c: char) -> bool {
  c == '_' || c == '$' || c.is_alphanumeric() || c == '\\'
}

fn classify_leading_char(ch: char) -> Leading {
  match ch {
    '0'..='9' => Leading::Number,
    '+' => Leading::Plus,
    '-' => Leading::Minus,
    '/' => Leading::Slash,
    '*' => Leading::Star,
    '.' => Leading::Dot,
    c if is_word_char(c) => Leading::Word,
    _ => Leading::Other,
  }
}

fn classify_trailing(text: &str) -> Boundary {
  let mut rev = text.chars().rev();
  match rev.next() {
    Some('0'..='9') => Boundary::Number,
    Some('+') if rev.next() == Some('+') => Boundary::PlusPlus,
    Some('+') => Boundary::Plus,
    Some('-') if rev.next() == Some('-') => Boundary::MinusMinus,
    Some('-') => Boundary::Minus,
    Some('/') => Boundary::Slash,
    Some(c) if is_word_char(c) => Boundary::Word,
    _ => Boundary::None,
  }
}

#[cfg(test)]
mod tests {
  use super::EmitMode;
  use super::Emitter;
  use syntax_js::loc::Loc;
  use syntax_js::loc::SourceId;

  #[test]
  fn separates_keyword_and_identifier() {
    let mut emitter = Emitter::new(EmitMode::Minified);
    emitter.write_keyword("return");
    emitter.write_identifier("value");
    assert_eq!(emitter.as_str(), "return value");
  }

  #[test]
  fn disambiguates_adjacent_operators() {
    let mut emitter = Emitter::new(EmitMode::Minified);
    emitter.write_identifier("a");
    emitter.write_punct("+");
    emitter.write_punct("++");
    emitter.write_identifier("b");
    emitter.write_punct("-");
    emitter.write_punct("-");
    emitter.write_identifier("c");
    emitter.write_punct("/");
    emitter.write_literal("/re/g");
    assert_eq!(emitter.as_str(), "a+ ++b- -c/ /re/g");
  }

  #[test]
  fn number_member_access() {
    let mut emitter = Emitter::new(EmitMode::Minified);
    emitter.write_number("1");
    emitter.write_punct(".");
    emitter.write_identifier("x");
    assert_eq!(emitter.as_str(), "1 .x");
  }

  #[test]
  fn marks_point_after_inserted_space() {
    let mut emitter = Emitter::new(EmitMode::Pretty);
    emitter.write_keyword("let");
    emitter.write_soft_newline(1);
    emitter.write_keyword("var");
    emitter.mark(Loc::new(SourceId(0), 3, 4), Some("x"));
    emitter.write_identifier("x");
    let (out, marks) = emitter.into_parts();
    assert_eq!(out, "let\n  var x");
    assert_eq!(marks.len(), 1);
    assert_eq!(marks[0].generated_line, 1);
    assert_eq!(marks[0].generated_column, 6);
    assert_eq!(marks[0].name.as_deref(), Some("x"));
  }
}
