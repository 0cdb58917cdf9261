use super::pattern::to_assign_target;
use super::ParseCtx;
use super::Parser;
use crate::ast::Kind;
use crate::ast::Node;
use crate::error::SyntaxErrorType;
use crate::error::SyntaxResult;
use crate::lex::LexMode;
use crate::literal::string_value;
use crate::loc::Loc;
use crate::token::Token;
use crate::token::TT;

/// Whether the source of a bare `import '...'` names a file (textual include) rather than a module.
pub fn is_file_specifier(source: &str) -> bool {
  source.ends_with(".js") || source.starts_with('.')
}

impl<'a> Parser<'a> {
  pub fn parse_top_level(&mut self) -> SyntaxResult<Node> {
    let mut body = Vec::new();
    while self.peek_with_mode(LexMode::SlashIsRegex).typ != TT::EOF {
      body.push(self.parse_stmt(true)?);
    }
    let loc = Loc::new(self.source_id, 0, 0);
    Ok(Node::with_children(Kind::Module, loc, body))
  }

  pub fn parse_stmt(&mut self, top_level: bool) -> SyntaxResult<Node> {
    let t = self.peek_with_mode(LexMode::SlashIsRegex);
    let loc = self.loc(t.span);
    match t.typ {
      TT::BraceOpen => self.parse_block(),
      TT::Semicolon => {
        self.consume();
        Ok(Node::new(Kind::Empty, loc))
      }
      TT::KeywordVar | TT::KeywordConst => {
        let decl = self.parse_var_decl()?;
        self.require_semicolon()?;
        Ok(decl)
      }
      TT::Identifier if self.is_let_declaration(t) => {
        let decl = self.parse_var_decl()?;
        self.require_semicolon()?;
        Ok(decl)
      }
      TT::KeywordFunction => self.parse_function(Kind::FuncDecl, false, false),
      TT::Identifier if self.is_async_function(t) => {
        self.consume();
        self.parse_function(Kind::FuncDecl, true, false)
      }
      TT::KeywordClass => self.parse_class(Kind::ClassDecl, false),
      TT::KeywordIf => self.parse_if(),
      TT::KeywordFor => self.parse_for(),
      TT::KeywordWhile => {
        self.consume();
        let test = self.parse_paren_expr()?;
        let body = self.parse_stmt(false)?;
        Ok(Node::with_children(Kind::While, loc, vec![test, body]))
      }
      TT::KeywordDo => {
        self.consume();
        let body = self.parse_stmt(false)?;
        self.require(TT::KeywordWhile)?;
        let test = self.parse_paren_expr()?;
        self.consume_if(TT::Semicolon);
        Ok(Node::with_children(Kind::DoWhile, loc, vec![body, test]))
      }
      TT::KeywordReturn => {
        self.consume();
        let next = self.peek_with_mode(LexMode::SlashIsRegex);
        let value = if next.preceded_by_line_terminator
          || matches!(next.typ, TT::Semicolon | TT::BraceClose | TT::EOF)
        {
          Node::absent(loc)
        } else {
          self.parse_expr()?
        };
        self.require_semicolon()?;
        Ok(Node::with_children(Kind::Return, loc, vec![value]))
      }
      TT::KeywordBreak | TT::KeywordContinue => {
        self.consume();
        let kind = if t.typ == TT::KeywordBreak {
          Kind::Break
        } else {
          Kind::Continue
        };
        let mut node = Node::new(kind, loc);
        let next = self.peek();
        if next.typ == TT::Identifier && !next.preceded_by_line_terminator {
          self.consume();
          node.text = self.string(next.span);
        }
        self.require_semicolon()?;
        Ok(node)
      }
      TT::KeywordThrow => {
        self.consume();
        let next = self.peek_with_mode(LexMode::SlashIsRegex);
        if next.preceded_by_line_terminator {
          return Err(self.error(next, SyntaxErrorType::LineTerminatorAfterThrow));
        }
        let value = self.parse_expr()?;
        self.require_semicolon()?;
        Ok(Node::with_children(Kind::Throw, loc, vec![value]))
      }
      TT::KeywordTry => self.parse_try(),
      TT::KeywordSwitch => self.parse_switch(),
      TT::KeywordDebugger => {
        self.consume();
        self.require_semicolon()?;
        Ok(Node::new(Kind::Debugger, loc))
      }
      TT::KeywordImport | TT::KeywordExport => {
        if !top_level {
          return Err(self.error(t, SyntaxErrorType::ModuleDeclarationNotAtTopLevel));
        }
        if t.typ == TT::KeywordImport {
          self.parse_import()
        } else {
          self.parse_export()
        }
      }
      TT::Identifier if self.is_surface_word(t) => {
        if !top_level {
          return Err(self.error(t, SyntaxErrorType::ModuleDeclarationNotAtTopLevel));
        }
        if self.is_word(t, "include") {
          self.parse_include()
        } else {
          self.parse_from_import()
        }
      }
      TT::Identifier if self.peek_second().typ == TT::Colon => {
        self.consume();
        self.require(TT::Colon)?;
        let body = self.parse_stmt(false)?;
        let mut node = Node::with_children(Kind::Labeled, loc, vec![body]);
        node.text = self.string(t.span);
        Ok(node)
      }
      _ => {
        let expr = self.parse_expr()?;
        self.require_semicolon()?;
        Ok(Node::with_children(Kind::ExprStmt, loc, vec![expr]))
      }
    }
  }

  fn is_let_declaration(&mut self, t: Token) -> bool {
    self.is_word(t, "let")
      && matches!(
        self.peek_second().typ,
        TT::Identifier | TT::BracketOpen | TT::BraceOpen
      )
  }

  fn is_async_function(&mut self, t: Token) -> bool {
    if !self.is_word(t, "async") {
      return false;
    }
    let next = self.peek_second();
    next.typ == TT::KeywordFunction && !next.preceded_by_line_terminator
  }

  /// `include '...'` and `from pkg.mod import {...}` at the start of a statement.
  fn is_surface_word(&mut self, t: Token) -> bool {
    let is_include = self.is_word(t, "include");
    if !is_include && !self.is_word(t, "from") {
      return false;
    }
    let next = self.peek_second();
    if next.preceded_by_line_terminator {
      return false;
    }
    if is_include {
      next.typ == TT::LiteralString
    } else {
      next.typ == TT::Identifier
    }
  }

  pub fn parse_block(&mut self) -> SyntaxResult<Node> {
    let start = self.require(TT::BraceOpen)?;
    let mut body = Vec::new();
    while self.peek_with_mode(LexMode::SlashIsRegex).typ != TT::BraceClose {
      body.push(self.parse_stmt(false)?);
    }
    self.require(TT::BraceClose)?;
    Ok(Node::with_children(Kind::Block, self.loc(start.span), body))
  }

  fn parse_paren_expr(&mut self) -> SyntaxResult<Node> {
    self.require(TT::ParenthesisOpen)?;
    let expr = self.with_in_allowed(|p| p.parse_expr())?;
    self.require(TT::ParenthesisClose)?;
    Ok(expr)
  }

  /// `var`, `let` or `const` followed by declarators. Does not consume the terminating semicolon.
  pub fn parse_var_decl(&mut self) -> SyntaxResult<Node> {
    let t = self.consume();
    let mut decl = Node::new(Kind::VarDecl, self.loc(t.span));
    decl.text = self.string(t.span);
    loop {
      let target = self.parse_binding_target()?;
      let loc = target.loc;
      let init = if self.consume_if(TT::Equals).is_some() {
        self.parse_assign()?
      } else {
        Node::absent(loc)
      };
      decl
        .children
        .push(Node::with_children(Kind::Declarator, loc, vec![target, init]));
      if self.consume_if(TT::Comma).is_none() {
        break;
      }
    }
    Ok(decl)
  }

  fn parse_if(&mut self) -> SyntaxResult<Node> {
    let start = self.require(TT::KeywordIf)?;
    let loc = self.loc(start.span);
    let test = self.parse_paren_expr()?;
    let consequent = self.parse_stmt(false)?;
    let alternate = if self.consume_if(TT::KeywordElse).is_some() {
      self.parse_stmt(false)?
    } else {
      Node::absent(loc)
    };
    Ok(Node::with_children(Kind::If, loc, vec![
      test, consequent, alternate,
    ]))
  }

  fn parse_for(&mut self) -> SyntaxResult<Node> {
    let start = self.require(TT::KeywordFor)?;
    let loc = self.loc(start.span);
    self.require(TT::ParenthesisOpen)?;
    let head_ctx = ParseCtx {
      no_in: true,
      ..self.ctx()
    };
    let t = self.peek_with_mode(LexMode::SlashIsRegex);
    let init = match t.typ {
      TT::Semicolon => Node::absent(loc),
      TT::KeywordVar | TT::KeywordConst => self.with_ctx(head_ctx, |p| p.parse_var_decl())?,
      TT::Identifier if self.is_let_declaration(t) => {
        self.with_ctx(head_ctx, |p| p.parse_var_decl())?
      }
      _ => self.with_ctx(head_ctx, |p| p.parse_expr())?,
    };

    let next = self.peek();
    let iteration = if next.typ == TT::KeywordIn {
      Some("in")
    } else if self.is_word(next, "of") {
      Some("of")
    } else {
      None
    };
    if let Some(iteration) = iteration {
      let target = match init.kind {
        Kind::VarDecl => {
          if init.children.len() != 1 || !init.child(0).child(1).is_absent() {
            return Err(self.error(next, SyntaxErrorType::ExpectedSyntax("single declarator")));
          }
          init
        }
        _ => to_assign_target(init)?,
      };
      self.consume();
      let iterable = if iteration == "of" {
        self.with_in_allowed(|p| p.parse_assign())?
      } else {
        self.with_in_allowed(|p| p.parse_expr())?
      };
      self.require(TT::ParenthesisClose)?;
      let body = self.parse_stmt(false)?;
      let mut node = Node::with_children(Kind::ForIn, loc, vec![target, iterable, body]);
      node.text = iteration.to_string();
      return Ok(node);
    }

    self.require(TT::Semicolon)?;
    let test = if self.peek().typ == TT::Semicolon {
      Node::absent(loc)
    } else {
      self.with_in_allowed(|p| p.parse_expr())?
    };
    self.require(TT::Semicolon)?;
    let update = if self.peek().typ == TT::ParenthesisClose {
      Node::absent(loc)
    } else {
      self.with_in_allowed(|p| p.parse_expr())?
    };
    self.require(TT::ParenthesisClose)?;
    let body = self.parse_stmt(false)?;
    Ok(Node::with_children(Kind::For, loc, vec![
      init, test, update, body,
    ]))
  }

  fn parse_try(&mut self) -> SyntaxResult<Node> {
    let start = self.require(TT::KeywordTry)?;
    let loc = self.loc(start.span);
    let block = self.parse_block()?;
    let handler = if let Some(c) = self.consume_if(TT::KeywordCatch) {
      let catch_loc = self.loc(c.span);
      let param = if self.consume_if(TT::ParenthesisOpen).is_some() {
        let param = self.parse_binding_target()?;
        self.require(TT::ParenthesisClose)?;
        param
      } else {
        Node::absent(catch_loc)
      };
      let body = self.parse_block()?;
      Node::with_children(Kind::Catch, catch_loc, vec![param, body])
    } else {
      Node::absent(loc)
    };
    let finalizer = if self.consume_if(TT::KeywordFinally).is_some() {
      self.parse_block()?
    } else {
      Node::absent(loc)
    };
    if handler.is_absent() && finalizer.is_absent() {
      return Err(self.error(start, SyntaxErrorType::TryStatementHasNoCatchOrFinally));
    }
    Ok(Node::with_children(Kind::Try, loc, vec![
      block, handler, finalizer,
    ]))
  }

  fn parse_switch(&mut self) -> SyntaxResult<Node> {
    let start = self.require(TT::KeywordSwitch)?;
    let loc = self.loc(start.span);
    let discriminant = self.parse_paren_expr()?;
    self.require(TT::BraceOpen)?;
    let mut children = vec![discriminant];
    loop {
      let t = self.consume();
      let case_loc = self.loc(t.span);
      let mut case = match t.typ {
        TT::BraceClose => break,
        TT::KeywordCase => {
          let test = self.with_in_allowed(|p| p.parse_expr())?;
          Node::with_children(Kind::Case, case_loc, vec![test])
        }
        TT::KeywordDefault => Node::with_children(Kind::Case, case_loc, vec![Node::absent(case_loc)]),
        _ => return Err(self.error(t, SyntaxErrorType::ExpectedSyntax("case"))),
      };
      case.text = self.string(t.span);
      self.require(TT::Colon)?;
      while !matches!(
        self.peek_with_mode(LexMode::SlashIsRegex).typ,
        TT::KeywordCase | TT::KeywordDefault | TT::BraceClose
      ) {
        case.children.push(self.parse_stmt(false)?);
      }
      children.push(case);
    }
    Ok(Node::with_children(Kind::Switch, loc, children))
  }

  fn require_string(&mut self) -> SyntaxResult<(Token, String)> {
    let t = self.require(TT::LiteralString)?;
    let value = string_value(self.str(t.span))
      .ok_or_else(|| self.error(t, SyntaxErrorType::MalformedLiteral))?;
    Ok((t, value))
  }

  /// Dotted module name such as `app.widgets.button`.
  fn parse_dotted_name(&mut self) -> SyntaxResult<String> {
    let first = self.require_identifier_name()?;
    let mut name = self.string(first.span);
    while self.consume_if(TT::Dot).is_some() {
      let segment = self.require_identifier_name()?;
      name.push('.');
      name.push_str(self.str(segment.span));
    }
    Ok(name)
  }

  /// `{a, b as c}`.
  fn parse_import_specifiers(&mut self) -> SyntaxResult<Vec<Node>> {
    self.require(TT::BraceOpen)?;
    let mut specifiers = Vec::new();
    while self.peek().typ != TT::BraceClose {
      let imported = self.require_identifier_name()?;
      let local = if self.consume_if_word("as").is_some() {
        self.require_identifier()?
      } else if imported.typ == TT::Identifier {
        imported
      } else {
        return Err(self.error(imported, SyntaxErrorType::ExpectedSyntax("identifier")));
      };
      let mut specifier = Node::with_children(Kind::ImportSpecifier, self.loc(imported.span), vec![
        self.node_text(Kind::BindingIdent, local),
      ]);
      specifier.text = self.string(imported.span);
      specifiers.push(specifier);
      if self.consume_if(TT::Comma).is_none() {
        break;
      }
    }
    self.require(TT::BraceClose)?;
    Ok(specifiers)
  }

  /// `*` in `import * from 'x'` and `from x import *`: every export of the module.
  fn star_specifier(&self, t: Token) -> Node {
    let loc = self.loc(t.span);
    let mut specifier = Node::with_children(Kind::ImportSpecifier, loc, vec![Node::with_text(
      Kind::BindingIdent,
      loc,
      "*",
    )]);
    specifier.text = "*".to_string();
    specifier
  }

  fn include_node(&self, t: Token, path: String) -> Node {
    Node::with_text(Kind::Include, self.loc(t.span), path)
  }

  fn import_node(&self, t: Token, module: String, specifiers: Vec<Node>) -> Node {
    let mut node = Node::with_children(Kind::Import, self.loc(t.span), specifiers);
    node.text = module;
    node
  }

  fn parse_include(&mut self) -> SyntaxResult<Node> {
    let start = self.require_word("include")?;
    let (_, path) = self.require_string()?;
    self.require_semicolon()?;
    Ok(self.include_node(start, path))
  }

  /// `from [module] pkg.mod import {a, b as c}`.
  fn parse_from_import(&mut self) -> SyntaxResult<Node> {
    let start = self.require_word("from")?;
    let t = self.peek();
    if self.is_word(t, "module") && self.peek_second().typ == TT::Identifier {
      self.consume();
    }
    let module = self.parse_dotted_name()?;
    self.require(TT::KeywordImport)?;
    let specifiers = match self.consume_if(TT::Asterisk) {
      Some(star) => vec![self.star_specifier(star)],
      None => self.parse_import_specifiers()?,
    };
    self.require_semicolon()?;
    Ok(self.import_node(start, module, specifiers))
  }

  fn parse_import(&mut self) -> SyntaxResult<Node> {
    let start = self.require(TT::KeywordImport)?;
    let t = self.peek();
    let node = match t.typ {
      TT::LiteralString => {
        let (_, source) = self.require_string()?;
        if is_file_specifier(&source) {
          self.include_node(start, source)
        } else {
          self.import_node(start, source, Vec::new())
        }
      }
      TT::BraceOpen => {
        let specifiers = self.parse_import_specifiers()?;
        self.require_word("from")?;
        let (_, source) = self.require_string()?;
        self.import_node(start, source, specifiers)
      }
      TT::Asterisk => {
        let star = self.consume();
        self.require_word("from")?;
        let (_, source) = self.require_string()?;
        self.import_node(start, source, vec![self.star_specifier(star)])
      }
      _ if t.typ.is_identifier_name() => {
        if self.is_word(t, "module") && self.peek_second().typ == TT::Identifier {
          self.consume();
        }
        let module = self.parse_dotted_name()?;
        let specifiers = if self.consume_if(TT::KeywordWith).is_some() {
          self.parse_import_specifiers()?
        } else {
          Vec::new()
        };
        self.import_node(start, module, specifiers)
      }
      _ => return Err(self.error(t, SyntaxErrorType::ExpectedSyntax("import source"))),
    };
    self.require_semicolon()?;
    Ok(node)
  }

  fn parse_export(&mut self) -> SyntaxResult<Node> {
    let start = self.require(TT::KeywordExport)?;
    let loc = self.loc(start.span);
    let t = self.peek();
    let (text, decl) = match t.typ {
      TT::KeywordVar | TT::KeywordConst => {
        let decl = self.parse_var_decl()?;
        self.require_semicolon()?;
        ("", decl)
      }
      TT::Identifier if self.is_let_declaration(t) => {
        let decl = self.parse_var_decl()?;
        self.require_semicolon()?;
        ("", decl)
      }
      TT::KeywordFunction => ("", self.parse_function(Kind::FuncDecl, false, false)?),
      TT::Identifier if self.is_async_function(t) => {
        self.consume();
        ("", self.parse_function(Kind::FuncDecl, true, false)?)
      }
      TT::KeywordClass => ("", self.parse_class(Kind::ClassDecl, false)?),
      TT::Asterisk => {
        self.consume();
        self.require_word("from")?;
        let (_, source) = self.require_string()?;
        self.require_semicolon()?;
        return Ok(Node::with_text(Kind::ExportStar, loc, source));
      }
      TT::KeywordDefault => {
        self.consume();
        let next = self.peek();
        let decl = match next.typ {
          TT::KeywordFunction => self.parse_function(Kind::FuncDecl, false, true)?,
          TT::Identifier if self.is_async_function(next) => {
            self.consume();
            self.parse_function(Kind::FuncDecl, true, true)?
          }
          TT::KeywordClass => self.parse_class(Kind::ClassDecl, true)?,
          _ => return Err(self.error(next, SyntaxErrorType::AnonymousExport)),
        };
        if decl.child(0).is_absent() {
          return Err(self.error(next, SyntaxErrorType::AnonymousExport));
        }
        ("default", decl)
      }
      TT::BraceOpen | TT::Identifier => {
        let braced = self.consume_if(TT::BraceOpen).is_some();
        let mut names = Vec::new();
        loop {
          if braced && self.peek().typ == TT::BraceClose {
            break;
          }
          let name = self.require_identifier()?;
          names.push(self.node_text(Kind::ExportSpecifier, name));
          if self.consume_if(TT::Comma).is_none() {
            break;
          }
        }
        if braced {
          self.require(TT::BraceClose)?;
        }
        self.require_semicolon()?;
        return Ok(Node::with_children(Kind::ExportNames, loc, names));
      }
      _ => return Err(self.error(t, SyntaxErrorType::AnonymousExport)),
    };
    let mut node = Node::with_children(Kind::Export, loc, vec![decl]);
    node.text = text.to_string();
    Ok(node)
  }
}
