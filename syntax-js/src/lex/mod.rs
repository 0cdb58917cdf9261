use crate::loc::Span;
use crate::token::Token;
use crate::token::TT;
use ahash::HashMap;
use ahash::HashMapExt;
use aho_corasick::AhoCorasick;
use aho_corasick::AhoCorasickBuilder;
use aho_corasick::AhoCorasickKind;
use aho_corasick::Anchored;
use aho_corasick::Input;
use aho_corasick::MatchKind;
use aho_corasick::StartKind;
use core::ops::Index;
use memchr::memchr;
use memchr::memchr3;
use memchr::memmem;
use once_cell::sync::Lazy;

#[cfg(test)]
mod tests;

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum LexMode {
  SlashIsRegex,
  Standard,
  TemplateStrContinue,
}

#[derive(Copy, Clone)]
pub struct LexerCheckpoint {
  next: usize,
}

// Contains the match length.
#[derive(Copy, Clone)]
struct Match(usize);

impl Match {
  pub fn len(&self) -> usize {
    self.0
  }

  pub fn prefix(&self, n: usize) -> Match {
    debug_assert!(n <= self.len());
    Match(n)
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

struct PatternMatcher {
  patterns: Vec<TT>,
  matcher: AhoCorasick,
}

impl PatternMatcher {
  pub fn new<D: AsRef<str>>(patterns: Vec<(TT, D)>) -> Self {
    let (tts, syns): (Vec<_>, Vec<_>) = patterns.into_iter().unzip();
    let byte_syns: Vec<Vec<u8>> = syns
      .iter()
      .map(|s| s.as_ref().as_bytes().to_vec())
      .collect();
    let matcher = AhoCorasickBuilder::new()
      .start_kind(StartKind::Anchored)
      .kind(Some(AhoCorasickKind::DFA))
      .match_kind(MatchKind::LeftmostLongest)
      .build(byte_syns)
      .unwrap();
    PatternMatcher {
      patterns: tts,
      matcher,
    }
  }

  pub fn find(&self, lexer: &Lexer) -> LexResult<(TT, Match)> {
    self
      .matcher
      .find(Input::new(&lexer.source[lexer.next..]).anchored(Anchored::Yes))
      .map(|m| (self.patterns[m.pattern().as_usize()], Match(m.end())))
      .ok_or(LexNotFound)
  }
}

#[derive(Debug)]
struct LexNotFound;

type LexResult<T> = Result<T, LexNotFound>;

pub struct Lexer<'a> {
  source: &'a str,
  next: usize,
}

impl<'a> Lexer<'a> {
  pub fn new(code: &'a str) -> Lexer<'a> {
    Lexer {
      source: code,
      next: 0,
    }
  }

  pub fn source(&self) -> &'a str {
    self.source
  }

  pub fn next(&self) -> usize {
    self.next
  }

  fn end(&self) -> usize {
    self.source.len()
  }

  fn remaining(&self) -> usize {
    self.end() - self.next
  }

  fn eof_range(&self) -> Span {
    Span(self.end(), self.end())
  }

  fn at_end(&self) -> bool {
    self.next >= self.end()
  }

  fn peek(&self, n: usize) -> LexResult<char> {
    self.peek_or_eof(n).ok_or(LexNotFound)
  }

  fn peek_or_eof(&self, n: usize) -> Option<char> {
    self.source[self.next..].chars().nth(n)
  }

  pub fn checkpoint(&self) -> LexerCheckpoint {
    LexerCheckpoint { next: self.next }
  }

  pub fn since_checkpoint(&self, checkpoint: LexerCheckpoint) -> Span {
    Span(checkpoint.next, self.next)
  }

  pub fn apply_checkpoint(&mut self, checkpoint: LexerCheckpoint) {
    self.next = checkpoint.next;
  }

  /// Moves past a token previously returned while peeking.
  pub fn advance_to(&mut self, next: usize) {
    debug_assert!(next >= self.next && next <= self.end());
    self.next = next;
  }

  fn if_char(&self, c: char) -> Match {
    match self.peek_or_eof(0) {
      Some(first) if first == c => Match(c.len_utf8()),
      _ => Match(0),
    }
  }

  fn while_not_3_chars(&self, a: char, b: char, c: char) -> Match {
    debug_assert!(a.is_ascii() && b.is_ascii() && c.is_ascii());
    Match(
      memchr3(a as u8, b as u8, c as u8, self.source[self.next..].as_bytes())
        .unwrap_or(self.remaining()),
    )
  }

  fn while_chars(&self, pred: impl Fn(char) -> bool) -> Match {
    let mut len = 0;
    for ch in self.source[self.next..].chars() {
      if !pred(ch) {
        break;
      }
      len += ch.len_utf8();
    }
    Match(len)
  }

  fn consume(&mut self, m: Match) -> Match {
    self.next += m.len();
    m
  }

  fn consume_next(&mut self) -> LexResult<char> {
    let c = self.peek(0)?;
    self.next += c.len_utf8();
    Ok(c)
  }

  fn skip_expect(&mut self, n: usize) {
    debug_assert!(self.next + n <= self.end());
    self.next += n;
  }

  fn drive_fallible(
    &mut self,
    preceded_by_line_terminator: bool,
    f: impl FnOnce(&mut Self) -> LexResult<TT>,
  ) -> Token {
    let cp = self.checkpoint();
    let typ = f(self).unwrap_or(TT::Invalid);
    Token {
      span: self.since_checkpoint(cp),
      typ,
      preceded_by_line_terminator,
    }
  }
}

impl<'a> Index<Span> for Lexer<'a> {
  type Output = str;

  fn index(&self, index: Span) -> &Self::Output {
    &self.source[index.0..index.1]
  }
}

pub fn is_id_start(c: char) -> bool {
  c == '$' || c == '_' || c.is_ascii_alphabetic() || (!c.is_ascii() && c.is_alphabetic())
}

pub fn is_id_continue(c: char) -> bool {
  c == '$'
    || c == '_'
    || c.is_ascii_alphanumeric()
    || (!c.is_ascii() && (c.is_alphanumeric() || c == '\u{200C}' || c == '\u{200D}'))
}

/// Whether `name` can be written verbatim as an identifier (not validated against keywords).
pub fn is_valid_identifier(name: &str) -> bool {
  let mut chars = name.chars();
  match chars.next() {
    Some(c) if is_id_start(c) => chars.all(is_id_continue),
    _ => false,
  }
}

fn is_line_terminator(c: char) -> bool {
  matches!(c, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

#[rustfmt::skip]
pub static OPERATORS_MAPPING: Lazy<HashMap<TT, &'static str>> = Lazy::new(|| {
  let mut map = HashMap::<TT, &'static str>::new();
  map.insert(TT::Ampersand, "&");
  map.insert(TT::AmpersandAmpersand, "&&");
  map.insert(TT::AmpersandAmpersandEquals, "&&=");
  map.insert(TT::AmpersandEquals, "&=");
  map.insert(TT::Asterisk, "*");
  map.insert(TT::AsteriskAsterisk, "**");
  map.insert(TT::AsteriskAsteriskEquals, "**=");
  map.insert(TT::AsteriskEquals, "*=");
  map.insert(TT::Bar, "|");
  map.insert(TT::BarBar, "||");
  map.insert(TT::BarBarEquals, "||=");
  map.insert(TT::BarEquals, "|=");
  map.insert(TT::BraceClose, "}");
  map.insert(TT::BraceOpen, "{");
  map.insert(TT::BracketClose, "]");
  map.insert(TT::BracketOpen, "[");
  map.insert(TT::Caret, "^");
  map.insert(TT::CaretEquals, "^=");
  map.insert(TT::ChevronLeft, "<");
  map.insert(TT::ChevronLeftChevronLeft, "<<");
  map.insert(TT::ChevronLeftChevronLeftEquals, "<<=");
  map.insert(TT::ChevronLeftEquals, "<=");
  map.insert(TT::ChevronRight, ">");
  map.insert(TT::ChevronRightChevronRight, ">>");
  map.insert(TT::ChevronRightChevronRightChevronRight, ">>>");
  map.insert(TT::ChevronRightChevronRightChevronRightEquals, ">>>=");
  map.insert(TT::ChevronRightChevronRightEquals, ">>=");
  map.insert(TT::ChevronRightEquals, ">=");
  map.insert(TT::Colon, ":");
  map.insert(TT::Comma, ",");
  map.insert(TT::Dot, ".");
  map.insert(TT::DotDotDot, "...");
  map.insert(TT::Equals, "=");
  map.insert(TT::EqualsChevronRight, "=>");
  map.insert(TT::EqualsEquals, "==");
  map.insert(TT::EqualsEqualsEquals, "===");
  map.insert(TT::Exclamation, "!");
  map.insert(TT::ExclamationEquals, "!=");
  map.insert(TT::ExclamationEqualsEquals, "!==");
  map.insert(TT::Hyphen, "-");
  map.insert(TT::HyphenEquals, "-=");
  map.insert(TT::HyphenHyphen, "--");
  map.insert(TT::ParenthesisClose, ")");
  map.insert(TT::ParenthesisOpen, "(");
  map.insert(TT::Percent, "%");
  map.insert(TT::PercentEquals, "%=");
  map.insert(TT::Plus, "+");
  map.insert(TT::PlusEquals, "+=");
  map.insert(TT::PlusPlus, "++");
  map.insert(TT::Question, "?");
  map.insert(TT::QuestionDot, "?.");
  map.insert(TT::QuestionQuestion, "??");
  map.insert(TT::QuestionQuestionEquals, "??=");
  map.insert(TT::Semicolon, ";");
  map.insert(TT::Slash, "/");
  map.insert(TT::SlashEquals, "/=");
  map.insert(TT::Tilde, "~");
  map
});

pub static KEYWORDS_MAPPING: Lazy<HashMap<TT, &'static str>> = Lazy::new(|| {
  let mut map = HashMap::<TT, &'static str>::new();
  map.insert(TT::KeywordBreak, "break");
  map.insert(TT::KeywordCase, "case");
  map.insert(TT::KeywordCatch, "catch");
  map.insert(TT::KeywordClass, "class");
  map.insert(TT::KeywordConst, "const");
  map.insert(TT::KeywordContinue, "continue");
  map.insert(TT::KeywordDebugger, "debugger");
  map.insert(TT::KeywordDefault, "default");
  map.insert(TT::KeywordDelete, "delete");
  map.insert(TT::KeywordDo, "do");
  map.insert(TT::KeywordElse, "else");
  map.insert(TT::KeywordExport, "export");
  map.insert(TT::KeywordExtends, "extends");
  map.insert(TT::KeywordFinally, "finally");
  map.insert(TT::KeywordFor, "for");
  map.insert(TT::KeywordFunction, "function");
  map.insert(TT::KeywordIf, "if");
  map.insert(TT::KeywordImport, "import");
  map.insert(TT::KeywordIn, "in");
  map.insert(TT::KeywordInstanceof, "instanceof");
  map.insert(TT::KeywordNew, "new");
  map.insert(TT::KeywordReturn, "return");
  map.insert(TT::KeywordSuper, "super");
  map.insert(TT::KeywordSwitch, "switch");
  map.insert(TT::KeywordThis, "this");
  map.insert(TT::KeywordThrow, "throw");
  map.insert(TT::KeywordTry, "try");
  map.insert(TT::KeywordTypeof, "typeof");
  map.insert(TT::KeywordVar, "var");
  map.insert(TT::KeywordVoid, "void");
  map.insert(TT::KeywordWhile, "while");
  map.insert(TT::KeywordWith, "with");
  map.insert(TT::LiteralFalse, "false");
  map.insert(TT::LiteralNull, "null");
  map.insert(TT::LiteralTrue, "true");
  map
});

pub static KEYWORD_STRS: Lazy<HashMap<&'static str, TT>> = Lazy::new(|| {
  HashMap::<&'static str, TT>::from_iter(KEYWORDS_MAPPING.iter().map(|(tt, s)| (*s, *tt)))
});

static SIG: Lazy<PatternMatcher> = Lazy::new(|| {
  let mut patterns: Vec<(TT, String)> = Vec::new();
  for (&k, &v) in OPERATORS_MAPPING.iter() {
    patterns.push((k, v.into()));
  }
  for digit in '0'..='9' {
    patterns.push((TT::LiteralNumber, digit.to_string()));
    // Prevent `.` immediately followed by a digit from being recognised as the `.` operator.
    patterns.push((TT::LiteralNumber, format!(".{}", digit)));
    // Prevent `?` immediately followed by a decimal number from being recognised as the `?.` operator.
    patterns.push((TT::Question, format!("?.{}", digit)));
  }
  patterns.push((TT::LiteralString, "\"".into()));
  patterns.push((TT::LiteralString, "'".into()));
  patterns.push((TT::LiteralTemplatePartString, "`".into()));
  patterns.push((TT::PrivateMember, "#".into()));
  PatternMatcher::new(patterns)
});

/// Skips whitespace and comments. Returns whether a line terminator was skipped.
fn skip_insignificant(lexer: &mut Lexer<'_>) -> bool {
  let mut preceded_by_line_terminator = false;
  while let Some(c) = lexer.peek_or_eof(0) {
    if is_line_terminator(c) {
      preceded_by_line_terminator = true;
      lexer.skip_expect(c.len_utf8());
    } else if c == '/' && lexer.peek_or_eof(1) == Some('/') {
      let rest = &lexer.source[lexer.next..];
      let len = memchr(b'\n', rest.as_bytes()).unwrap_or(rest.len());
      lexer.skip_expect(len);
    } else if c == '/' && lexer.peek_or_eof(1) == Some('*') {
      let rest = &lexer.source[lexer.next + 2..];
      // We can't reject with an error here, so an unterminated comment swallows the rest of the source.
      let len = memmem::find(rest.as_bytes(), b"*/")
        .map(|i| i + 2)
        .unwrap_or(rest.len());
      if rest[..len].chars().any(is_line_terminator) {
        preceded_by_line_terminator = true;
      }
      lexer.skip_expect(2 + len);
    } else if c.is_whitespace() || c == '\u{FEFF}' {
      lexer.skip_expect(c.len_utf8());
    } else {
      break;
    }
  }
  preceded_by_line_terminator
}

fn lex_unicode_escape(lexer: &mut Lexer<'_>) -> LexResult<()> {
  // Consume `\u`.
  lexer.skip_expect(1);
  if lexer.consume_next()? != 'u' {
    return Err(LexNotFound);
  }
  if lexer.peek(0)? == '{' {
    lexer.skip_expect(1);
    let digits = lexer.consume(lexer.while_chars(|c| c.is_ascii_hexdigit()));
    if digits.is_empty() || lexer.consume_next()? != '}' {
      return Err(LexNotFound);
    }
  } else {
    for _ in 0..4 {
      if !lexer.consume_next()?.is_ascii_hexdigit() {
        return Err(LexNotFound);
      }
    }
  }
  Ok(())
}

fn lex_identifier(lexer: &mut Lexer<'_>) -> LexResult<TT> {
  let start = lexer.next;
  if lexer.peek(0)? == '\\' {
    lex_unicode_escape(lexer)?;
  }
  loop {
    lexer.consume(lexer.while_chars(is_id_continue));
    if lexer.peek_or_eof(0) == Some('\\') {
      lex_unicode_escape(lexer)?;
    } else {
      break;
    }
  }
  let word = &lexer.source[start..lexer.next];
  Ok(KEYWORD_STRS.get(word).copied().unwrap_or(TT::Identifier))
}

fn lex_number(lexer: &mut Lexer<'_>) -> LexResult<TT> {
  if lexer.peek(0)? == '0'
    && matches!(
      lexer.peek_or_eof(1),
      Some('x' | 'X' | 'o' | 'O' | 'b' | 'B')
    )
  {
    lexer.skip_expect(2);
    let digits = lexer.consume(lexer.while_chars(|c| c.is_ascii_hexdigit() || c == '_'));
    if digits.is_empty() {
      return Ok(TT::Invalid);
    }
    lexer.consume(lexer.if_char('n'));
    return Ok(TT::LiteralNumber);
  }
  lexer.consume(lexer.while_chars(|c| c.is_ascii_digit() || c == '_'));
  if !lexer.consume(lexer.if_char('n')).is_empty() {
    return Ok(TT::LiteralNumber);
  }
  if !lexer.consume(lexer.if_char('.')).is_empty() {
    lexer.consume(lexer.while_chars(|c| c.is_ascii_digit() || c == '_'));
  }
  if matches!(lexer.peek_or_eof(0), Some('e' | 'E')) {
    lexer.skip_expect(1);
    if matches!(lexer.peek_or_eof(0), Some('+' | '-')) {
      lexer.skip_expect(1);
    }
    let exponent = lexer.consume(lexer.while_chars(|c| c.is_ascii_digit()));
    if exponent.is_empty() {
      return Ok(TT::Invalid);
    }
  }
  if lexer.peek_or_eof(0).is_some_and(is_id_start) {
    return Ok(TT::Invalid);
  }
  Ok(TT::LiteralNumber)
}

fn lex_string(lexer: &mut Lexer<'_>) -> LexResult<TT> {
  let quote = lexer.consume_next()?;
  loop {
    lexer.consume(lexer.while_not_3_chars('\\', '\n', quote));
    match lexer.consume_next()? {
      '\\' => {
        // Escapes (including line continuations) swallow the next char whatever it is.
        let escaped = lexer.consume_next()?;
        if escaped == '\r' {
          lexer.consume(lexer.if_char('\n'));
        }
      }
      c if c == quote => break,
      _ => return Ok(TT::Invalid),
    };
  }
  Ok(TT::LiteralString)
}

/// Ends with `${` or backtick.
fn lex_template_string_continue(lexer: &mut Lexer<'_>) -> LexResult<TT> {
  loop {
    lexer.consume(lexer.while_not_3_chars('\\', '`', '$'));
    match lexer.consume_next()? {
      '\\' => {
        lexer.consume_next()?;
      }
      '`' => return Ok(TT::LiteralTemplatePartStringEnd),
      _ => {
        if !lexer.consume(lexer.if_char('{')).is_empty() {
          return Ok(TT::LiteralTemplatePartString);
        }
      }
    };
  }
}

// TODO Validate regex flags and body.
fn lex_regex(lexer: &mut Lexer<'_>) -> LexResult<TT> {
  // Consume slash.
  lexer.skip_expect(1);
  let mut in_charset = false;
  loop {
    match lexer.consume_next()? {
      '\\' => {
        let escaped = lexer.consume_next()?;
        if is_line_terminator(escaped) {
          return Ok(TT::Invalid);
        }
      }
      '/' if !in_charset => break,
      '[' => in_charset = true,
      ']' if in_charset => in_charset = false,
      c if is_line_terminator(c) => return Ok(TT::Invalid),
      _ => {}
    };
  }
  lexer.consume(lexer.while_chars(is_id_continue));
  Ok(TT::LiteralRegex)
}

fn lex_private_member(lexer: &mut Lexer<'_>) -> LexResult<TT> {
  // Include the `#` in the token.
  lexer.skip_expect(1);
  if !lexer.peek(0).is_ok_and(is_id_start) {
    return Ok(TT::Invalid);
  }
  lexer.consume(lexer.while_chars(is_id_continue));
  Ok(TT::PrivateMember)
}

pub fn lex_next(lexer: &mut Lexer<'_>, mode: LexMode) -> Token {
  if mode == LexMode::TemplateStrContinue {
    return lexer.drive_fallible(false, lex_template_string_continue);
  };

  let preceded_by_line_terminator = skip_insignificant(lexer);

  // EOF is different from Invalid, so we should emit this specifically instead of letting drive_fallible return an Invalid.
  if lexer.at_end() {
    return Token {
      span: lexer.eof_range(),
      typ: TT::EOF,
      preceded_by_line_terminator,
    };
  };

  lexer.drive_fallible(preceded_by_line_terminator, |lexer| {
    let c = lexer.peek(0)?;
    if is_id_start(c) || c == '\\' {
      return lex_identifier(lexer);
    }
    let (tt, mat) = SIG.find(lexer)?;
    match tt {
      TT::LiteralNumber => lex_number(lexer),
      TT::LiteralString => lex_string(lexer),
      TT::LiteralTemplatePartString => {
        // Consume backtick.
        lexer.skip_expect(1);
        lex_template_string_continue(lexer)
      }
      TT::PrivateMember => lex_private_member(lexer),
      TT::Slash | TT::SlashEquals if mode == LexMode::SlashIsRegex => lex_regex(lexer),
      TT::Question if mat.len() != 1 => {
        // We've matched `?.[0-9]`.
        lexer.consume(mat.prefix(1));
        Ok(TT::Question)
      }
      typ => {
        lexer.consume(mat);
        Ok(typ)
      }
    }
  })
}
