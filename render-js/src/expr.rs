use crate::precedence::callee_contains_call;
use crate::precedence::child_min_prec_for_binary;
use crate::precedence::expr_leading;
use crate::precedence::expr_prec;
use crate::precedence::mixes_nullish;
use crate::precedence::Leading;
use crate::precedence::Prec;
use crate::precedence::Side;
use crate::Renderer;
use syntax_js::ast::Kind;
use syntax_js::ast::Node;
use syntax_js::operator::is_word_operator;

fn needs_parens(node: &Node, min: Prec, no_in: bool) -> bool {
  expr_prec(node) < min || (no_in && node.is(Kind::Binary) && node.text == "in")
}

impl Renderer {
  /// Renders `node`, parenthesised when it binds looser than `min`.
  pub(crate) fn expr(&mut self, node: &Node, min: Prec) {
    if needs_parens(node, min, self.no_in) {
      self.parenthesised(node);
    } else {
      self.expr_inner(node);
    }
  }

  fn parenthesised(&mut self, node: &Node) {
    let no_in = std::mem::replace(&mut self.no_in, false);
    self.out.write_punct("(");
    self.expr_inner(node);
    self.out.write_punct(")");
    self.no_in = no_in;
  }

  fn list(&mut self, items: &[Node]) {
    for (i, item) in items.iter().enumerate() {
      if i > 0 {
        self.comma();
      }
      self.expr(item, Prec::ASSIGNMENT);
    }
  }

  fn expr_inner(&mut self, node: &Node) {
    match node.kind {
      Kind::Ident => {
        self.out.mark(node.loc, Some(&node.text));
        self.out.write_identifier(&node.text);
      }
      Kind::Number => self.out.write_number(&node.text),
      Kind::String | Kind::Regex | Kind::TemplateChunk => self.out.write_literal(&node.text),
      Kind::Keyword => self.out.write_keyword(&node.text),
      Kind::Template => {
        self.out.write_literal(&format!("`{}", node.child(0).text));
        for pair in node.children[1..].chunks(2) {
          self.out.write_literal("${");
          let no_in = std::mem::replace(&mut self.no_in, false);
          self.expr(&pair[0], Prec::LOWEST);
          self.no_in = no_in;
          let chunk = pair.get(1).map(|c| c.text.as_str()).unwrap_or("");
          self.out.write_literal(&format!("}}{}", chunk));
        }
        self.out.write_literal("`");
      }
      Kind::TaggedTemplate => {
        self.expr(node.child(0), Prec::CALL);
        self.expr_inner(node.child(1));
      }
      Kind::Array => {
        self.out.write_punct("[");
        self.with_in_allowed(|r| r.list(&node.children));
        if node.children.last().is_some_and(Node::is_absent) {
          self.out.write_punct(",");
        }
        self.out.write_punct("]");
      }
      Kind::Object => {
        self.out.write_punct("{");
        self.with_in_allowed(|r| r.list(&node.children));
        self.out.write_punct("}");
      }
      Kind::Property => {
        let (key, value) = (node.child(0), node.child(1));
        if key.is(Kind::PropKey) && value.is(Kind::Ident) && value.text == key.text {
          self.expr_inner(value);
        } else {
          self.property_key(key);
          self.out.write_punct(":");
          self.out.write_soft_space();
          self.expr(value, Prec::ASSIGNMENT);
        }
      }
      Kind::PropKey | Kind::Computed => self.property_key(node),
      Kind::Member => {
        self.expr(node.child(0), Prec::CALL);
        self.out.write_punct(&node.text);
        self.property_key(node.child(1));
      }
      Kind::Index => {
        self.expr(node.child(0), Prec::CALL);
        if !node.text.is_empty() {
          self.out.write_punct(&node.text);
        }
        self.bracketed(node.child(1));
      }
      Kind::Call => {
        self.expr(node.child(0), Prec::CALL);
        if !node.text.is_empty() {
          self.out.write_punct(&node.text);
        }
        self.expr_inner(node.child(1));
      }
      Kind::Args => {
        let no_in = std::mem::replace(&mut self.no_in, false);
        self.out.write_punct("(");
        self.list(&node.children);
        self.out.write_punct(")");
        self.no_in = no_in;
      }
      Kind::New => {
        self.out.write_keyword("new");
        let callee = node.child(0);
        if callee_contains_call(callee) || callee.is(Kind::New) || expr_prec(callee) < Prec::CALL
        {
          self.parenthesised(callee);
        } else {
          self.expr_inner(callee);
        }
        if !node.child(1).is_absent() {
          self.expr_inner(node.child(1));
        }
      }
      Kind::Unary => {
        if is_word_operator(&node.text) {
          self.out.write_keyword(&node.text);
        } else {
          self.out.write_punct(&node.text);
        }
        self.expr(node.child(0), Prec::UNARY);
      }
      Kind::Postfix => {
        self.expr(node.child(0), Prec::POSTFIX);
        self.out.write_punct(&node.text);
      }
      Kind::Binary => {
        let op = node.text.as_str();
        let (left, right) = (node.child(0), node.child(1));
        let left_min = child_min_prec_for_binary(op, Side::Left);
        if mixes_nullish(op, left) || (op == "**" && left.is(Kind::Unary)) {
          self.parenthesised(left);
        } else {
          self.expr(left, left_min);
        }
        self.infix(op);
        let right_min = child_min_prec_for_binary(op, Side::Right);
        if mixes_nullish(op, right) {
          self.parenthesised(right);
        } else {
          self.expr(right, right_min);
        }
      }
      Kind::Assign => {
        self.target(node.child(0));
        self.infix(&node.text);
        self.expr(node.child(1), Prec::ASSIGNMENT);
      }
      Kind::Cond => {
        self.expr(node.child(0), Prec::CONDITIONAL.tighter());
        self.infix("?");
        self.with_in_allowed(|r| r.expr(node.child(1), Prec::ASSIGNMENT));
        self.infix(":");
        self.expr(node.child(2), Prec::ASSIGNMENT);
      }
      Kind::Sequence => self.list(&node.children),
      Kind::Spread => {
        self.out.write_punct("...");
        self.expr(node.child(0), Prec::ASSIGNMENT);
      }
      Kind::Yield => {
        self.out.write_keyword("yield");
        if node.text == "yield*" {
          self.out.write_punct("*");
        }
        if !node.child(0).is_absent() {
          self.out.write_soft_space();
          self.expr(node.child(0), Prec::ASSIGNMENT);
        }
      }
      Kind::Arrow => {
        if node.is_async() {
          self.out.write_keyword("async");
          self.out.write_soft_space();
        }
        self.pattern(node.child(0));
        self.infix("=>");
        let body = node.child(1);
        if body.is(Kind::Block) {
          self.stmt(body);
        } else if expr_leading(body) == Leading::BraceOpen {
          self.parenthesised(body);
        } else {
          self.expr(body, Prec::ASSIGNMENT);
        }
      }
      Kind::FuncExpr => self.function(node),
      Kind::ClassExpr => self.class(node),
      Kind::Method => self.method(node),
      Kind::Module
      | Kind::Block
      | Kind::Empty
      | Kind::Absent
      | Kind::ExprStmt
      | Kind::VarDecl
      | Kind::Declarator
      | Kind::FuncDecl
      | Kind::ClassDecl
      | Kind::ClassBody
      | Kind::Field
      | Kind::Return
      | Kind::If
      | Kind::For
      | Kind::ForIn
      | Kind::While
      | Kind::DoWhile
      | Kind::Break
      | Kind::Continue
      | Kind::Throw
      | Kind::Try
      | Kind::Catch
      | Kind::Switch
      | Kind::Case
      | Kind::Labeled
      | Kind::Debugger
      | Kind::Include
      | Kind::Import
      | Kind::ImportSpecifier
      | Kind::Export
      | Kind::ExportNames
      | Kind::ExportStar
      | Kind::ExportSpecifier => self.stmt(node),
      Kind::BindingIdent
      | Kind::Params
      | Kind::AssignPattern
      | Kind::Rest
      | Kind::ArrayPattern
      | Kind::ObjectPattern
      | Kind::PatternProp => self.pattern(node),
    }
  }

  fn with_in_allowed(&mut self, f: impl FnOnce(&mut Renderer)) {
    let no_in = std::mem::replace(&mut self.no_in, false);
    f(self);
    self.no_in = no_in;
  }

  fn bracketed(&mut self, expr: &Node) {
    self.out.write_punct("[");
    self.with_in_allowed(|r| r.expr(expr, Prec::LOWEST));
    self.out.write_punct("]");
  }

  /// Object/class member key: identifier name, string, number, private name or `[computed]`.
  pub(crate) fn property_key(&mut self, key: &Node) {
    if key.is(Kind::Computed) {
      self.out.write_punct("[");
      self.with_in_allowed(|r| r.expr(key.child(0), Prec::ASSIGNMENT));
      self.out.write_punct("]");
      return;
    }
    match key.text.chars().next() {
      Some('"') | Some('\'') => self.out.write_literal(&key.text),
      Some(c) if c.is_ascii_digit() || c == '.' => self.out.write_number(&key.text),
      _ => self.out.write_identifier(&key.text),
    }
  }

  /// Assignment or `for-in` target: a pattern or a simple expression.
  pub(crate) fn target(&mut self, node: &Node) {
    match node.kind {
      Kind::ArrayPattern | Kind::ObjectPattern | Kind::BindingIdent => self.pattern(node),
      _ => self.expr(node, Prec::CALL),
    }
  }
}
