use crate::ast::Kind;
use crate::ast::Node;
use crate::error::SyntaxError;
use crate::error::SyntaxErrorType;
use crate::error::SyntaxResult;
use crate::lex::lex_next;
use crate::lex::LexMode;
use crate::lex::Lexer;
use crate::lex::LexerCheckpoint;
use crate::loc::LineIndex;
use crate::loc::Loc;
use crate::loc::SourceId;
use crate::loc::Span;
use crate::token::Token;
use crate::token::TT;

pub mod expr;
pub mod operator;
pub mod pattern;
pub mod stmt;

#[derive(Copy, Clone)]
pub struct ParserCheckpoint {
  lexer: LexerCheckpoint,
  ctx: ParseCtx,
}

/// Context flags that change how certain tokens are interpreted.
#[derive(Copy, Clone, Default)]
pub struct ParseCtx {
  pub in_async: bool,
  pub in_generator: bool,
  /// Set while parsing the head of a `for` statement, where `in` is not a binary operator.
  pub no_in: bool,
}

pub struct Parser<'a> {
  lexer: Lexer<'a>,
  lines: LineIndex,
  source_id: SourceId,
  ctx: ParseCtx,
  // Last peeked token, keyed by the position and mode it was lexed with.
  peeked: Option<(usize, LexMode, Token)>,
}

impl<'a> Parser<'a> {
  pub fn new(lexer: Lexer<'a>, source_id: SourceId) -> Parser<'a> {
    let lines = LineIndex::new(lexer.source());
    Parser {
      lexer,
      lines,
      source_id,
      ctx: ParseCtx::default(),
      peeked: None,
    }
  }

  pub fn source_range(&self) -> Span {
    Span(0, self.lexer.source().len())
  }

  pub fn checkpoint(&self) -> ParserCheckpoint {
    ParserCheckpoint {
      lexer: self.lexer.checkpoint(),
      ctx: self.ctx,
    }
  }

  pub fn restore_checkpoint(&mut self, checkpoint: ParserCheckpoint) {
    self.lexer.apply_checkpoint(checkpoint.lexer);
    self.ctx = checkpoint.ctx;
  }

  pub fn str(&self, span: Span) -> &'a str {
    &self.lexer.source()[span.0..span.1]
  }

  pub fn string(&self, span: Span) -> String {
    self.str(span).to_string()
  }

  pub fn loc(&self, span: Span) -> Loc {
    self
      .lines
      .loc(self.lexer.source(), self.source_id, span.0)
  }

  pub fn error(&self, token: Token, typ: SyntaxErrorType) -> SyntaxError {
    let typ = match token.typ {
      TT::EOF => SyntaxErrorType::UnexpectedEnd,
      TT::Invalid => SyntaxErrorType::MalformedLiteral,
      _ => typ,
    };
    SyntaxError::new(typ, self.loc(token.span), Some(token.typ))
  }

  pub fn peek_with_mode(&mut self, mode: LexMode) -> Token {
    let pos = self.lexer.next();
    if let Some((p, m, t)) = self.peeked {
      if p == pos && m == mode {
        return t;
      }
    }
    let cp = self.lexer.checkpoint();
    let t = lex_next(&mut self.lexer, mode);
    self.lexer.apply_checkpoint(cp);
    self.peeked = Some((pos, mode, t));
    t
  }

  pub fn peek(&mut self) -> Token {
    self.peek_with_mode(LexMode::Standard)
  }

  /// Peeks the token after the next one.
  pub fn peek_second(&mut self) -> Token {
    let cp = self.lexer.checkpoint();
    self.consume();
    let t = self.peek();
    self.lexer.apply_checkpoint(cp);
    t
  }

  pub fn consume_with_mode(&mut self, mode: LexMode) -> Token {
    let t = self.peek_with_mode(mode);
    self.lexer.advance_to(t.span.1);
    t
  }

  pub fn consume(&mut self) -> Token {
    self.consume_with_mode(LexMode::Standard)
  }

  pub fn consume_if(&mut self, typ: TT) -> Option<Token> {
    let t = self.peek();
    if t.typ == typ {
      self.consume();
      Some(t)
    } else {
      None
    }
  }

  /// Consumes the next token if it is the identifier `word` (contextual keywords like `of` or `from`).
  pub fn consume_if_word(&mut self, word: &str) -> Option<Token> {
    let t = self.peek();
    if t.typ == TT::Identifier && self.str(t.span) == word {
      self.consume();
      Some(t)
    } else {
      None
    }
  }

  pub fn is_word(&self, t: Token, word: &str) -> bool {
    t.typ == TT::Identifier && self.str(t.span) == word
  }

  pub fn require_with_mode(&mut self, typ: TT, mode: LexMode) -> SyntaxResult<Token> {
    let t = self.consume_with_mode(mode);
    if t.typ != typ {
      Err(self.error(t, SyntaxErrorType::RequiredTokenNotFound(typ)))
    } else {
      Ok(t)
    }
  }

  pub fn require(&mut self, typ: TT) -> SyntaxResult<Token> {
    self.require_with_mode(typ, LexMode::Standard)
  }

  pub fn require_word(&mut self, word: &'static str) -> SyntaxResult<Token> {
    let t = self.consume();
    if self.is_word(t, word) {
      Ok(t)
    } else {
      Err(self.error(t, SyntaxErrorType::ExpectedSyntax(word)))
    }
  }

  /// Identifier names include reserved words (valid as property names).
  pub fn require_identifier_name(&mut self) -> SyntaxResult<Token> {
    let t = self.consume();
    if t.typ.is_identifier_name() {
      Ok(t)
    } else {
      Err(self.error(t, SyntaxErrorType::ExpectedSyntax("identifier name")))
    }
  }

  pub fn require_identifier(&mut self) -> SyntaxResult<Token> {
    let t = self.consume();
    if t.typ == TT::Identifier {
      Ok(t)
    } else {
      Err(self.error(t, SyntaxErrorType::ExpectedSyntax("identifier")))
    }
  }

  /// Automatic semicolon insertion: a semicolon is optional before `}`, at the end, or after a line break.
  pub fn require_semicolon(&mut self) -> SyntaxResult<()> {
    let t = self.peek();
    match t.typ {
      TT::Semicolon => {
        self.consume();
        Ok(())
      }
      TT::BraceClose | TT::EOF => Ok(()),
      _ if t.preceded_by_line_terminator => Ok(()),
      _ => Err(self.error(t, SyntaxErrorType::ExpectedSyntax("semicolon"))),
    }
  }

  pub fn with_ctx<T>(
    &mut self,
    ctx: ParseCtx,
    f: impl FnOnce(&mut Self) -> SyntaxResult<T>,
  ) -> SyntaxResult<T> {
    let saved = self.ctx;
    self.ctx = ctx;
    let res = f(self);
    self.ctx = saved;
    res
  }

  /// Runs `f` with `in` re-enabled as an operator (inside brackets, parentheses and bodies).
  pub fn with_in_allowed<T>(
    &mut self,
    f: impl FnOnce(&mut Self) -> SyntaxResult<T>,
  ) -> SyntaxResult<T> {
    let ctx = ParseCtx {
      no_in: false,
      ..self.ctx
    };
    self.with_ctx(ctx, f)
  }

  pub fn ctx(&self) -> ParseCtx {
    self.ctx
  }

  pub fn node_text(&self, kind: Kind, t: Token) -> Node {
    Node::with_text(kind, self.loc(t.span), self.str(t.span))
  }
}
