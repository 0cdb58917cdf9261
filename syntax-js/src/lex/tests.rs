use super::lex_next;
use super::LexMode;
use super::Lexer;
use crate::token::TT;

fn lex_all(src: &str, mode: LexMode) -> Vec<(TT, String)> {
  let mut lexer = Lexer::new(src);
  let mut out = Vec::new();
  loop {
    let t = lex_next(&mut lexer, mode);
    if t.typ == TT::EOF {
      break;
    }
    out.push((t.typ, lexer[t.span].to_string()));
  }
  out
}

#[test]
fn lexes_keywords_and_identifiers() {
  let tokens = lex_all("const include = fromage", LexMode::Standard);
  assert_eq!(tokens, vec![
    (TT::KeywordConst, "const".to_string()),
    (TT::Identifier, "include".to_string()),
    (TT::Equals, "=".to_string()),
    (TT::Identifier, "fromage".to_string()),
  ]);
}

#[test]
fn lexes_longest_operator() {
  let tokens = lex_all("a>>>=b?.c??d", LexMode::Standard);
  let types: Vec<TT> = tokens.iter().map(|t| t.0).collect();
  assert_eq!(types, vec![
    TT::Identifier,
    TT::ChevronRightChevronRightChevronRightEquals,
    TT::Identifier,
    TT::QuestionDot,
    TT::Identifier,
    TT::QuestionQuestion,
    TT::Identifier,
  ]);
}

#[test]
fn question_before_decimal_is_not_optional_chaining() {
  let tokens = lex_all("a?.5:1", LexMode::Standard);
  assert_eq!(tokens[1], (TT::Question, "?".to_string()));
  assert_eq!(tokens[2], (TT::LiteralNumber, ".5".to_string()));
}

#[test]
fn slash_mode_controls_regex() {
  assert_eq!(lex_all("/a[/]b/g", LexMode::SlashIsRegex), vec![(
    TT::LiteralRegex,
    "/a[/]b/g".to_string()
  )]);
  assert_eq!(lex_all("/a", LexMode::Standard)[0].0, TT::Slash);
}

#[test]
fn strings_and_templates() {
  let tokens = lex_all(r#"'it\'s' "a\"b" `x${"#, LexMode::Standard);
  assert_eq!(tokens[0], (TT::LiteralString, r"'it\'s'".to_string()));
  assert_eq!(tokens[1], (TT::LiteralString, r#""a\"b""#.to_string()));
  assert_eq!(tokens[2], (TT::LiteralTemplatePartString, "`x${".to_string()));
  assert_eq!(lex_all("'abc", LexMode::Standard)[0].0, TT::Invalid);
}

#[test]
fn tracks_line_terminators_through_comments() {
  let mut lexer = Lexer::new("a /* x\n */ b // c\n c");
  let a = lex_next(&mut lexer, LexMode::Standard);
  let b = lex_next(&mut lexer, LexMode::Standard);
  let c = lex_next(&mut lexer, LexMode::Standard);
  assert!(!a.preceded_by_line_terminator);
  assert!(b.preceded_by_line_terminator);
  assert!(c.preceded_by_line_terminator);
}

#[test]
fn numbers() {
  for src in ["0", "1.5", ".5", "1e10", "0xff", "1_000", "10n", "1.e3"] {
    assert_eq!(lex_all(src, LexMode::Standard), vec![(TT::LiteralNumber, src.to_string())], "{src}");
  }
  assert_eq!(lex_all("3in", LexMode::Standard)[0].0, TT::Invalid);
}
