use super::operator::ASSIGNMENT_OPERATOR_MAPPING;
use super::operator::BINARY_OPERATOR_MAPPING;
use super::operator::UNARY_OPERATOR_MAPPING;
use super::pattern::is_simple_target;
use super::pattern::to_assign_target;
use super::ParseCtx;
use super::Parser;
use crate::ast::Kind;
use crate::ast::Node;
use crate::error::SyntaxErrorType;
use crate::error::SyntaxResult;
use crate::lex::LexMode;
use crate::loc::Loc;
use crate::operator::Associativity;
use crate::token::Token;
use crate::token::TT;

impl<'a> Parser<'a> {
  /// Parses a full expression including the comma operator.
  pub fn parse_expr(&mut self) -> SyntaxResult<Node> {
    let first = self.parse_assign()?;
    if self.peek().typ != TT::Comma {
      return Ok(first);
    }
    let loc = first.loc;
    let mut items = vec![first];
    while self.consume_if(TT::Comma).is_some() {
      items.push(self.parse_assign()?);
    }
    Ok(Node::with_children(Kind::Sequence, loc, items))
  }

  pub fn parse_assign(&mut self) -> SyntaxResult<Node> {
    let t = self.peek_with_mode(LexMode::SlashIsRegex);
    if self.ctx().in_generator && self.is_word(t, "yield") {
      return self.parse_yield();
    }
    if matches!(t.typ, TT::Identifier | TT::ParenthesisOpen) {
      if let Some(arrow) = self.try_parse_arrow()? {
        return Ok(arrow);
      }
    }

    let lhs = self.parse_conditional()?;
    let t = self.peek();
    let Some(&op) = ASSIGNMENT_OPERATOR_MAPPING.get(&t.typ) else {
      return Ok(lhs);
    };
    let target = if op == "=" {
      to_assign_target(lhs)?
    } else if is_simple_target(&lhs) {
      lhs
    } else {
      return Err(self.error(t, SyntaxErrorType::InvalidAssigmentTarget));
    };
    self.consume();
    let value = self.parse_assign()?;
    let loc = target.loc;
    let mut node = Node::with_children(Kind::Assign, loc, vec![target, value]);
    node.text = op.to_string();
    Ok(node)
  }

  fn parse_yield(&mut self) -> SyntaxResult<Node> {
    let start = self.consume();
    let loc = self.loc(start.span);
    let delegate = self.consume_if(TT::Asterisk).is_some();
    let next = self.peek_with_mode(LexMode::SlashIsRegex);
    let has_argument = delegate
      || (!next.preceded_by_line_terminator
        && !matches!(
          next.typ,
          TT::ParenthesisClose
            | TT::BracketClose
            | TT::BraceClose
            | TT::Comma
            | TT::Semicolon
            | TT::Colon
            | TT::EOF
        ));
    let argument = if has_argument {
      self.parse_assign()?
    } else {
      Node::absent(loc)
    };
    let mut node = Node::with_children(Kind::Yield, loc, vec![argument]);
    node.text = if delegate { "yield*" } else { "yield" }.to_string();
    Ok(node)
  }

  /// Tries `x => ...`, `(a, b) => ...` and their `async` forms, rewinding if the input turns out
  /// not to be an arrow function.
  fn try_parse_arrow(&mut self) -> SyntaxResult<Option<Node>> {
    let cp = self.checkpoint();
    let start = self.peek();
    let loc = self.loc(start.span);
    let mut is_async = false;
    if self.is_word(start, "async") {
      let second = self.peek_second();
      if !second.preceded_by_line_terminator
        && matches!(second.typ, TT::Identifier | TT::ParenthesisOpen)
      {
        self.consume();
        is_async = true;
      }
    }
    let t = self.peek();
    let params = match t.typ {
      TT::Identifier => {
        if self.peek_second().typ != TT::EqualsChevronRight {
          self.restore_checkpoint(cp);
          return Ok(None);
        };
        self.consume();
        let param = self.node_text(Kind::BindingIdent, t);
        Node::with_children(Kind::Params, param.loc, vec![param])
      }
      TT::ParenthesisOpen => {
        let ctx = ParseCtx {
          in_async: is_async,
          in_generator: false,
          no_in: false,
        };
        match self.with_ctx(ctx, |p| p.parse_params()) {
          Ok(params) => params,
          Err(_) => {
            self.restore_checkpoint(cp);
            return Ok(None);
          }
        }
      }
      _ => {
        self.restore_checkpoint(cp);
        return Ok(None);
      }
    };
    let arrow = self.peek();
    if arrow.typ != TT::EqualsChevronRight || arrow.preceded_by_line_terminator {
      self.restore_checkpoint(cp);
      return Ok(None);
    }
    self.consume();
    let ctx = ParseCtx {
      in_async: is_async,
      in_generator: false,
      no_in: self.ctx().no_in,
    };
    let body = if self.peek().typ == TT::BraceOpen {
      self.with_ctx(
        ParseCtx {
          no_in: false,
          ..ctx
        },
        |p| p.parse_function_body(),
      )?
    } else {
      self.with_ctx(ctx, |p| p.parse_assign())?
    };
    let mut node = Node::with_children(Kind::Arrow, loc, vec![params, body]);
    if is_async {
      node.text = "async".to_string();
    }
    Ok(Some(node))
  }

  fn parse_conditional(&mut self) -> SyntaxResult<Node> {
    let test = self.parse_binary(0)?;
    if self.consume_if(TT::Question).is_none() {
      return Ok(test);
    }
    let consequent = self.with_in_allowed(|p| p.parse_assign())?;
    self.require(TT::Colon)?;
    let alternate = self.parse_assign()?;
    let loc = test.loc;
    Ok(Node::with_children(Kind::Cond, loc, vec![
      test, consequent, alternate,
    ]))
  }

  /// Precedence climbing over binary operators binding at least as tightly as `min_precedence`.
  fn parse_binary(&mut self, min_precedence: u8) -> SyntaxResult<Node> {
    let mut left = self.parse_unary()?;
    loop {
      let t = self.peek();
      let Some(&op) = BINARY_OPERATOR_MAPPING.get(&t.typ) else {
        break;
      };
      if op.precedence < min_precedence || (t.typ == TT::KeywordIn && self.ctx().no_in) {
        break;
      }
      self.consume();
      let next_min = match op.associativity {
        Associativity::Left => op.precedence + 1,
        Associativity::Right => op.precedence,
      };
      let right = self.parse_binary(next_min)?;
      let loc = left.loc;
      let mut node = Node::with_children(Kind::Binary, loc, vec![left, right]);
      node.text = op.text.to_string();
      left = node;
    }
    Ok(left)
  }

  fn parse_unary(&mut self) -> SyntaxResult<Node> {
    let t = self.peek_with_mode(LexMode::SlashIsRegex);
    let op = if self.ctx().in_async && self.is_word(t, "await") {
      "await"
    } else if let Some(&op) = UNARY_OPERATOR_MAPPING.get(&t.typ) {
      op
    } else {
      return self.parse_postfix();
    };
    self.consume_with_mode(LexMode::SlashIsRegex);
    let argument = self.parse_unary()?;
    if matches!(op, "++" | "--") && !is_simple_target(&argument) {
      return Err(self.error(t, SyntaxErrorType::InvalidAssigmentTarget));
    }
    let mut node = Node::with_children(Kind::Unary, self.loc(t.span), vec![argument]);
    node.text = op.to_string();
    Ok(node)
  }

  fn parse_postfix(&mut self) -> SyntaxResult<Node> {
    let operand = self.parse_lhs()?;
    let t = self.peek();
    if !matches!(t.typ, TT::PlusPlus | TT::HyphenHyphen) || t.preceded_by_line_terminator {
      return Ok(operand);
    }
    if !is_simple_target(&operand) {
      return Err(self.error(t, SyntaxErrorType::InvalidAssigmentTarget));
    }
    self.consume();
    let loc = operand.loc;
    let mut node = Node::with_children(Kind::Postfix, loc, vec![operand]);
    node.text = self.string(t.span);
    Ok(node)
  }

  /// Member accesses, calls, `new` and tagged templates.
  pub fn parse_lhs(&mut self) -> SyntaxResult<Node> {
    let base = if self.peek_with_mode(LexMode::SlashIsRegex).typ == TT::KeywordNew {
      self.parse_new()?
    } else {
      self.parse_primary()?
    };
    self.parse_chain(base, true)
  }

  fn parse_new(&mut self) -> SyntaxResult<Node> {
    let start = self.require(TT::KeywordNew)?;
    let loc = self.loc(start.span);
    if self.consume_if(TT::Dot).is_some() {
      let target = self.require_word("target")?;
      let meta = Node::with_text(Kind::Keyword, loc, "new");
      let prop = self.node_text(Kind::PropKey, target);
      return Ok(chain_node(Kind::Member, ".", vec![meta, prop], loc));
    }
    let callee = if self.peek_with_mode(LexMode::SlashIsRegex).typ == TT::KeywordNew {
      self.parse_new()?
    } else {
      self.parse_primary()?
    };
    let callee = self.parse_chain(callee, false)?;
    let args = if self.peek().typ == TT::ParenthesisOpen {
      self.parse_args()?
    } else {
      Node::absent(loc)
    };
    Ok(Node::with_children(Kind::New, loc, vec![callee, args]))
  }

  fn parse_chain(&mut self, mut expr: Node, allow_call: bool) -> SyntaxResult<Node> {
    loop {
      let t = self.peek();
      let loc = expr.loc;
      expr = match t.typ {
        TT::Dot => {
          self.consume();
          let prop = self.parse_member_name()?;
          chain_node(Kind::Member, ".", vec![expr, prop], loc)
        }
        TT::QuestionDot => {
          self.consume();
          match self.peek().typ {
            TT::ParenthesisOpen => {
              let args = self.parse_args()?;
              chain_node(Kind::Call, "?.", vec![expr, args], loc)
            }
            TT::BracketOpen => {
              self.consume();
              let index = self.with_in_allowed(|p| p.parse_expr())?;
              self.require(TT::BracketClose)?;
              chain_node(Kind::Index, "?.", vec![expr, index], loc)
            }
            _ => {
              let prop = self.parse_member_name()?;
              chain_node(Kind::Member, "?.", vec![expr, prop], loc)
            }
          }
        }
        TT::BracketOpen => {
          self.consume();
          let index = self.with_in_allowed(|p| p.parse_expr())?;
          self.require(TT::BracketClose)?;
          chain_node(Kind::Index, "", vec![expr, index], loc)
        }
        TT::ParenthesisOpen if allow_call => {
          let args = self.parse_args()?;
          chain_node(Kind::Call, "", vec![expr, args], loc)
        }
        TT::LiteralTemplatePartString | TT::LiteralTemplatePartStringEnd => {
          let template = self.parse_template()?;
          Node::with_children(Kind::TaggedTemplate, loc, vec![expr, template])
        }
        _ => break,
      };
    }
    Ok(expr)
  }

  fn parse_member_name(&mut self) -> SyntaxResult<Node> {
    let t = self.consume();
    if t.typ.is_identifier_name() || t.typ == TT::PrivateMember {
      Ok(self.node_text(Kind::PropKey, t))
    } else {
      Err(self.error(t, SyntaxErrorType::ExpectedSyntax("property name")))
    }
  }

  pub fn parse_args(&mut self) -> SyntaxResult<Node> {
    let start = self.require(TT::ParenthesisOpen)?;
    let args = self.with_in_allowed(|p| {
      let mut args = Vec::new();
      while p.peek().typ != TT::ParenthesisClose {
        if let Some(spread) = p.consume_if(TT::DotDotDot) {
          let arg = p.parse_assign()?;
          args.push(Node::with_children(Kind::Spread, p.loc(spread.span), vec![arg]));
        } else {
          args.push(p.parse_assign()?);
        }
        if p.consume_if(TT::Comma).is_none() {
          break;
        }
      }
      Ok(args)
    })?;
    self.require(TT::ParenthesisClose)?;
    Ok(Node::with_children(Kind::Args, self.loc(start.span), args))
  }

  fn parse_primary(&mut self) -> SyntaxResult<Node> {
    let t = self.peek_with_mode(LexMode::SlashIsRegex);
    let node = match t.typ {
      TT::Identifier => {
        if self.is_word(t, "async") {
          let second = self.peek_second();
          if second.typ == TT::KeywordFunction && !second.preceded_by_line_terminator {
            self.consume();
            return self.parse_function(Kind::FuncExpr, true, false);
          }
        }
        self.consume();
        self.node_text(Kind::Ident, t)
      }
      TT::KeywordThis | TT::KeywordSuper | TT::LiteralTrue | TT::LiteralFalse | TT::LiteralNull => {
        self.consume();
        self.node_text(Kind::Keyword, t)
      }
      TT::LiteralNumber => {
        self.consume();
        self.node_text(Kind::Number, t)
      }
      TT::LiteralString => {
        self.consume();
        self.node_text(Kind::String, t)
      }
      TT::LiteralRegex => {
        self.consume_with_mode(LexMode::SlashIsRegex);
        self.node_text(Kind::Regex, t)
      }
      TT::LiteralTemplatePartString | TT::LiteralTemplatePartStringEnd => self.parse_template()?,
      TT::ParenthesisOpen => {
        self.consume();
        let expr = self.with_in_allowed(|p| p.parse_expr())?;
        self.require(TT::ParenthesisClose)?;
        expr
      }
      TT::BracketOpen => self.parse_array_literal()?,
      TT::BraceOpen => self.parse_object_literal()?,
      TT::KeywordFunction => self.parse_function(Kind::FuncExpr, false, false)?,
      TT::KeywordClass => self.parse_class(Kind::ClassExpr, false)?,
      _ => return Err(self.error(t, SyntaxErrorType::ExpectedSyntax("expression"))),
    };
    Ok(node)
  }

  /// Template literal starting at the current token. Chunk text excludes the delimiters.
  fn parse_template(&mut self) -> SyntaxResult<Node> {
    let first = self.consume_with_mode(LexMode::SlashIsRegex);
    let loc = self.loc(first.span);
    let mut children = Vec::new();
    let mut tok: Token = first;
    // The opening backtick belongs to the first chunk's token only.
    let mut raw = &self.str(first.span)[1..];
    loop {
      let (chunk, done) = match tok.typ {
        TT::LiteralTemplatePartStringEnd => (&raw[..raw.len() - 1], true),
        TT::LiteralTemplatePartString => (&raw[..raw.len() - 2], false),
        _ => return Err(self.error(tok, SyntaxErrorType::MalformedLiteral)),
      };
      children.push(Node::with_text(
        Kind::TemplateChunk,
        self.loc(tok.span),
        chunk,
      ));
      if done {
        break;
      }
      children.push(self.with_in_allowed(|p| p.parse_expr())?);
      self.require(TT::BraceClose)?;
      tok = self.consume_with_mode(LexMode::TemplateStrContinue);
      raw = self.str(tok.span);
    }
    Ok(Node::with_children(Kind::Template, loc, children))
  }

  fn parse_array_literal(&mut self) -> SyntaxResult<Node> {
    let start = self.require(TT::BracketOpen)?;
    let elements = self.with_in_allowed(|p| {
      let mut elements = Vec::new();
      loop {
        let t = p.peek_with_mode(LexMode::SlashIsRegex);
        match t.typ {
          TT::BracketClose => break,
          TT::Comma => {
            p.consume();
            elements.push(Node::absent(p.loc(t.span)));
            continue;
          }
          TT::DotDotDot => {
            p.consume();
            let arg = p.parse_assign()?;
            elements.push(Node::with_children(Kind::Spread, p.loc(t.span), vec![arg]));
          }
          _ => elements.push(p.parse_assign()?),
        };
        if p.consume_if(TT::Comma).is_none() {
          break;
        }
      }
      Ok(elements)
    })?;
    self.require(TT::BracketClose)?;
    Ok(Node::with_children(
      Kind::Array,
      self.loc(start.span),
      elements,
    ))
  }

  /// Property key in an object literal, object pattern or class body.
  pub fn parse_property_key(&mut self) -> SyntaxResult<Node> {
    let t = self.consume();
    match t.typ {
      TT::LiteralString | TT::LiteralNumber | TT::PrivateMember => {
        Ok(self.node_text(Kind::PropKey, t))
      }
      TT::BracketOpen => {
        let expr = self.with_in_allowed(|p| p.parse_assign())?;
        self.require(TT::BracketClose)?;
        Ok(Node::with_children(Kind::Computed, self.loc(t.span), vec![
          expr,
        ]))
      }
      typ if typ.is_identifier_name() => Ok(self.node_text(Kind::PropKey, t)),
      _ => Err(self.error(t, SyntaxErrorType::ExpectedSyntax("property key"))),
    }
  }

  /// Whether the token after a `get`/`set`/`async`/`static` word makes that word a modifier
  /// rather than the key itself.
  pub fn is_modifier_followed_by_key(&mut self) -> bool {
    let next = self.peek_second();
    !matches!(
      next.typ,
      TT::ParenthesisOpen
        | TT::Colon
        | TT::Comma
        | TT::BraceClose
        | TT::Equals
        | TT::Semicolon
        | TT::EOF
    )
  }

  /// Collects method modifiers (`get`, `set`, `async`, `*`) in front of a key.
  pub fn parse_method_modifiers(&mut self, modifiers: &mut Vec<&'static str>) {
    loop {
      let t = self.peek();
      if self.is_word(t, "async") && self.is_modifier_followed_by_key() {
        let next = self.peek_second();
        if next.preceded_by_line_terminator {
          break;
        }
        self.consume();
        modifiers.push("async");
      } else if (self.is_word(t, "get") || self.is_word(t, "set"))
        && self.is_modifier_followed_by_key()
      {
        self.consume();
        modifiers.push(if self.is_word(t, "get") { "get" } else { "set" });
      } else if t.typ == TT::Asterisk {
        self.consume();
        modifiers.push("*");
      } else {
        break;
      }
    }
  }

  fn parse_object_literal(&mut self) -> SyntaxResult<Node> {
    let start = self.require(TT::BraceOpen)?;
    let members = self.with_in_allowed(|p| {
      let mut members = Vec::new();
      while p.peek().typ != TT::BraceClose {
        members.push(p.parse_object_member()?);
        if p.consume_if(TT::Comma).is_none() {
          break;
        }
      }
      Ok(members)
    })?;
    self.require(TT::BraceClose)?;
    Ok(Node::with_children(
      Kind::Object,
      self.loc(start.span),
      members,
    ))
  }

  fn parse_object_member(&mut self) -> SyntaxResult<Node> {
    if let Some(spread) = self.consume_if(TT::DotDotDot) {
      let arg = self.parse_assign()?;
      return Ok(Node::with_children(
        Kind::Spread,
        self.loc(spread.span),
        vec![arg],
      ));
    }
    let mut modifiers = Vec::new();
    self.parse_method_modifiers(&mut modifiers);
    let key_token = self.peek();
    let key = self.parse_property_key()?;
    let loc = key.loc;
    if !modifiers.is_empty() || self.peek().typ == TT::ParenthesisOpen {
      return self.parse_method(modifiers.join(" "), key);
    }
    if self.consume_if(TT::Colon).is_some() {
      let value = self.parse_assign()?;
      return Ok(Node::with_children(Kind::Property, loc, vec![key, value]));
    }
    if key_token.typ != TT::Identifier {
      let t = self.peek();
      return Err(self.error(t, SyntaxErrorType::RequiredTokenNotFound(TT::Colon)));
    }
    let reference = Node::with_text(Kind::Ident, loc, key.text.clone());
    let value = if let Some(eq) = self.consume_if(TT::Equals) {
      // Only meaningful once the literal is reinterpreted as a destructuring pattern.
      let default = self.parse_assign()?;
      let mut assign = Node::with_children(Kind::Assign, self.loc(eq.span), vec![
        reference, default,
      ]);
      assign.text = "=".to_string();
      assign
    } else {
      reference
    };
    Ok(Node::with_children(Kind::Property, loc, vec![key, value]))
  }

  /// Method with the key already parsed; used by object literals and class bodies.
  pub fn parse_method(&mut self, modifiers: String, key: Node) -> SyntaxResult<Node> {
    let loc = key.loc;
    let ctx = ParseCtx {
      in_async: modifiers.split(' ').any(|m| m == "async"),
      in_generator: modifiers.split(' ').any(|m| m == "*"),
      no_in: false,
    };
    let (params, body) = self.with_ctx(ctx, |p| {
      let params = p.parse_params()?;
      let body = p.parse_function_body()?;
      Ok((params, body))
    })?;
    let mut node = Node::with_children(Kind::Method, loc, vec![key, params, body]);
    node.text = modifiers;
    Ok(node)
  }

  pub fn parse_params(&mut self) -> SyntaxResult<Node> {
    let start = self.require(TT::ParenthesisOpen)?;
    let mut params = Vec::new();
    loop {
      let t = self.peek();
      match t.typ {
        TT::ParenthesisClose => break,
        TT::DotDotDot => {
          self.consume();
          let target = self.parse_binding_target()?;
          params.push(Node::with_children(Kind::Rest, self.loc(t.span), vec![
            target,
          ]));
          break;
        }
        _ => params.push(self.parse_binding_element()?),
      };
      if self.consume_if(TT::Comma).is_none() {
        break;
      }
    }
    self.require(TT::ParenthesisClose)?;
    Ok(Node::with_children(
      Kind::Params,
      self.loc(start.span),
      params,
    ))
  }

  /// `function` keyword onwards. `kind` is `FuncDecl` or `FuncExpr`; declarations require a
  /// name unless `anonymous_ok`.
  pub fn parse_function(
    &mut self,
    kind: Kind,
    is_async: bool,
    anonymous_ok: bool,
  ) -> SyntaxResult<Node> {
    let start = self.require(TT::KeywordFunction)?;
    let loc = self.loc(start.span);
    let is_generator = self.consume_if(TT::Asterisk).is_some();
    let name = match self.peek().typ {
      TT::Identifier => {
        let t = self.consume();
        self.node_text(Kind::BindingIdent, t)
      }
      _ if kind == Kind::FuncExpr || anonymous_ok => Node::absent(loc),
      _ => {
        let t = self.peek();
        return Err(self.error(t, SyntaxErrorType::ExpectedSyntax("function name")));
      }
    };
    let ctx = ParseCtx {
      in_async: is_async,
      in_generator: is_generator,
      no_in: false,
    };
    let (params, body) = self.with_ctx(ctx, |p| {
      let params = p.parse_params()?;
      let body = p.parse_function_body()?;
      Ok((params, body))
    })?;
    let mut node = Node::with_children(kind, loc, vec![name, params, body]);
    let mut modifiers = Vec::new();
    if is_async {
      modifiers.push("async");
    }
    if is_generator {
      modifiers.push("*");
    }
    node.text = modifiers.join(" ");
    Ok(node)
  }

  pub fn parse_function_body(&mut self) -> SyntaxResult<Node> {
    let start = self.require(TT::BraceOpen)?;
    let mut body = Vec::new();
    while self.peek_with_mode(LexMode::SlashIsRegex).typ != TT::BraceClose {
      body.push(self.parse_stmt(false)?);
    }
    self.require(TT::BraceClose)?;
    Ok(Node::with_children(Kind::Block, self.loc(start.span), body))
  }

  /// `class` keyword onwards.
  pub fn parse_class(&mut self, kind: Kind, anonymous_ok: bool) -> SyntaxResult<Node> {
    let start = self.require(TT::KeywordClass)?;
    let loc = self.loc(start.span);
    let name = match self.peek().typ {
      TT::Identifier => {
        let t = self.consume();
        self.node_text(Kind::BindingIdent, t)
      }
      _ if kind == Kind::ClassExpr || anonymous_ok => Node::absent(loc),
      _ => {
        let t = self.peek();
        return Err(self.error(t, SyntaxErrorType::ExpectedSyntax("class name")));
      }
    };
    let heritage = if self.consume_if(TT::KeywordExtends).is_some() {
      self.parse_lhs()?
    } else {
      Node::absent(loc)
    };
    let body_start = self.require(TT::BraceOpen)?;
    let mut members = Vec::new();
    loop {
      let t = self.peek();
      match t.typ {
        TT::BraceClose => break,
        TT::Semicolon => {
          self.consume();
          continue;
        }
        _ => {}
      };
      members.push(self.parse_class_member()?);
    }
    self.require(TT::BraceClose)?;
    let body = Node::with_children(Kind::ClassBody, self.loc(body_start.span), members);
    Ok(Node::with_children(kind, loc, vec![name, heritage, body]))
  }

  fn parse_class_member(&mut self) -> SyntaxResult<Node> {
    let mut modifiers = Vec::new();
    let t = self.peek();
    if self.is_word(t, "static") && self.is_modifier_followed_by_key() {
      self.consume();
      modifiers.push("static");
    }
    let before = modifiers.len();
    self.parse_method_modifiers(&mut modifiers);
    let key = self.parse_property_key()?;
    if modifiers.len() > before || self.peek().typ == TT::ParenthesisOpen {
      return self.parse_method(modifiers.join(" "), key);
    }
    let loc = key.loc;
    let value = if self.consume_if(TT::Equals).is_some() {
      self.with_in_allowed(|p| p.parse_assign())?
    } else {
      Node::absent(loc)
    };
    self.require_semicolon()?;
    let mut node = Node::with_children(Kind::Field, loc, vec![key, value]);
    node.text = modifiers.join(" ");
    Ok(node)
  }
}

fn chain_node(kind: Kind, text: &str, children: Vec<Node>, loc: Loc) -> Node {
  let mut node = Node::with_children(kind, loc, children);
  node.text = text.to_string();
  node
}
