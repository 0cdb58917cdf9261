use crate::precedence::expr_stmt_needs_parens;
use crate::precedence::Prec;
use crate::Renderer;
use syntax_js::ast::Kind;
use syntax_js::ast::Node;
use syntax_js::literal::quote_string;

/// Whether `stmt` ends with an `if` that has no `else`, which would capture a following `else`.
fn ends_with_dangling_if(stmt: &Node) -> bool {
  match stmt.kind {
    Kind::If if stmt.child(2).is_absent() => true,
    Kind::If => ends_with_dangling_if(stmt.child(2)),
    Kind::For | Kind::ForIn | Kind::While | Kind::Labeled => {
      stmt.children.last().is_some_and(ends_with_dangling_if)
    }
    _ => false,
  }
}

impl Renderer {
  pub(crate) fn stmt(&mut self, node: &Node) {
    match node.kind {
      Kind::Module => {
        for (i, stmt) in node.children.iter().enumerate() {
          if i > 0 {
            self.out.write_soft_newline(self.indent);
          }
          self.stmt(stmt);
        }
        if self.out.is_pretty() && !node.children.is_empty() {
          self.out.write_newline();
        }
      }
      Kind::Block => {
        self.out.mark(node.loc, None);
        self.block(&node.children);
      }
      Kind::Empty => self.out.write_punct(";"),
      Kind::ExprStmt => {
        self.out.mark(node.loc, None);
        let expr = node.child(0);
        if expr_stmt_needs_parens(expr) {
          self.out.write_punct("(");
          self.expr(expr, Prec::LOWEST);
          self.out.write_punct(")");
        } else {
          self.expr(expr, Prec::LOWEST);
        }
        self.out.write_punct(";");
      }
      Kind::VarDecl => {
        self.out.mark(node.loc, None);
        self.var_decl(node);
        self.out.write_punct(";");
      }
      Kind::Declarator => {
        self.pattern(node.child(0));
        if !node.child(1).is_absent() {
          self.infix("=");
          self.expr(node.child(1), Prec::ASSIGNMENT);
        }
      }
      Kind::FuncDecl => {
        self.out.mark(node.loc, None);
        self.function(node);
      }
      Kind::ClassDecl => {
        self.out.mark(node.loc, None);
        self.class(node);
      }
      Kind::ClassBody => {
        self.block(&node.children);
      }
      Kind::Method => self.method(node),
      Kind::Field => {
        if node.has_modifier("static") {
          self.out.write_keyword("static");
        }
        self.property_key(node.child(0));
        if !node.child(1).is_absent() {
          self.infix("=");
          self.expr(node.child(1), Prec::ASSIGNMENT);
        }
        self.out.write_punct(";");
      }
      Kind::Return => {
        self.out.mark(node.loc, None);
        self.out.write_keyword("return");
        if !node.child(0).is_absent() {
          self.out.write_soft_space();
          self.expr(node.child(0), Prec::LOWEST);
        }
        self.out.write_punct(";");
      }
      Kind::If => {
        self.out.mark(node.loc, None);
        self.out.write_keyword("if");
        self.paren_expr(node.child(0));
        let alternate = node.child(2);
        if !alternate.is_absent() && ends_with_dangling_if(node.child(1)) {
          self.out.write_soft_space();
          self.block(std::slice::from_ref(node.child(1)));
        } else {
          self.body(node.child(1));
        }
        if !alternate.is_absent() {
          self.out.write_soft_space();
          self.out.write_keyword("else");
          self.out.write_soft_space();
          self.stmt(alternate);
        }
      }
      Kind::For => {
        self.out.mark(node.loc, None);
        self.out.write_keyword("for");
        self.out.write_soft_space();
        self.out.write_punct("(");
        let init = node.child(0);
        if !init.is_absent() {
          let no_in = std::mem::replace(&mut self.no_in, true);
          if init.is(Kind::VarDecl) {
            self.var_decl(init);
          } else {
            self.expr(init, Prec::LOWEST);
          }
          self.no_in = no_in;
        }
        for part in [node.child(1), node.child(2)] {
          self.out.write_punct(";");
          if !part.is_absent() {
            self.out.write_soft_space();
            self.expr(part, Prec::LOWEST);
          }
        }
        self.out.write_punct(")");
        self.body(node.child(3));
      }
      Kind::ForIn => {
        self.out.mark(node.loc, None);
        self.out.write_keyword("for");
        self.out.write_soft_space();
        self.out.write_punct("(");
        let left = node.child(0);
        if left.is(Kind::VarDecl) {
          self.var_decl(left);
        } else {
          self.target(left);
        }
        self.out.write_soft_space();
        self.out.write_keyword(&node.text);
        self.out.write_soft_space();
        let min = if node.text == "of" {
          Prec::ASSIGNMENT
        } else {
          Prec::LOWEST
        };
        self.expr(node.child(1), min);
        self.out.write_punct(")");
        self.body(node.child(2));
      }
      Kind::While => {
        self.out.mark(node.loc, None);
        self.out.write_keyword("while");
        self.paren_expr(node.child(0));
        self.body(node.child(1));
      }
      Kind::DoWhile => {
        self.out.mark(node.loc, None);
        self.out.write_keyword("do");
        self.body(node.child(0));
        self.out.write_soft_space();
        self.out.write_keyword("while");
        self.paren_expr(node.child(1));
        self.out.write_punct(";");
      }
      Kind::Break | Kind::Continue => {
        self.out.mark(node.loc, None);
        self.out.write_keyword(if node.is(Kind::Break) {
          "break"
        } else {
          "continue"
        });
        if !node.text.is_empty() {
          self.out.write_identifier(&node.text);
        }
        self.out.write_punct(";");
      }
      Kind::Throw => {
        self.out.mark(node.loc, None);
        self.out.write_keyword("throw");
        self.out.write_soft_space();
        self.expr(node.child(0), Prec::LOWEST);
        self.out.write_punct(";");
      }
      Kind::Try => {
        self.out.mark(node.loc, None);
        self.out.write_keyword("try");
        self.out.write_soft_space();
        self.stmt(node.child(0));
        if !node.child(1).is_absent() {
          self.out.write_soft_space();
          self.stmt(node.child(1));
        }
        if !node.child(2).is_absent() {
          self.out.write_soft_space();
          self.out.write_keyword("finally");
          self.out.write_soft_space();
          self.stmt(node.child(2));
        }
      }
      Kind::Catch => {
        self.out.write_keyword("catch");
        self.out.write_soft_space();
        if !node.child(0).is_absent() {
          self.out.write_punct("(");
          self.pattern(node.child(0));
          self.out.write_punct(")");
          self.out.write_soft_space();
        }
        self.stmt(node.child(1));
      }
      Kind::Switch => {
        self.out.mark(node.loc, None);
        self.out.write_keyword("switch");
        self.paren_expr(node.child(0));
        self.out.write_soft_space();
        self.block(&node.children[1..]);
      }
      Kind::Case => {
        if node.child(0).is_absent() {
          self.out.write_keyword("default");
        } else {
          self.out.write_keyword("case");
          self.out.write_soft_space();
          self.expr(node.child(0), Prec::LOWEST);
        }
        self.out.write_punct(":");
        self.indent += 1;
        for stmt in node.children[1..].iter() {
          self.out.write_soft_newline(self.indent);
          self.stmt(stmt);
        }
        self.indent -= 1;
      }
      Kind::Labeled => {
        self.out.mark(node.loc, None);
        self.out.write_identifier(&node.text);
        self.out.write_punct(":");
        self.out.write_soft_space();
        self.stmt(node.child(0));
      }
      Kind::Debugger => {
        self.out.mark(node.loc, None);
        self.out.write_keyword("debugger");
        self.out.write_punct(";");
      }
      Kind::Include => {
        self.out.write_keyword("include");
        self.out.write_soft_space();
        self.out.write_literal(&quote_string(&node.text));
        self.out.write_punct(";");
      }
      Kind::Import => {
        self.out.write_keyword("import");
        if node.children.is_empty() {
          self.out.write_keyword("module");
          self.out.write_identifier(&node.text);
        } else if node.children.len() == 1 && node.child(0).text == "*" {
          self.out.write_punct("*");
          self.out.write_keyword("from");
          self.out.write_soft_space();
          self.out.write_literal(&quote_string(&node.text));
        } else {
          self.out.write_soft_space();
          self.braced_list(&node.children);
          self.out.write_soft_space();
          self.out.write_keyword("from");
          self.out.write_soft_space();
          self.out.write_literal(&quote_string(&node.text));
        }
        self.out.write_punct(";");
      }
      Kind::ImportSpecifier => {
        let local = node.child(0);
        if local.text == node.text {
          self.pattern(local);
        } else {
          self.out.write_identifier(&node.text);
          self.out.write_keyword("as");
          self.pattern(local);
        }
      }
      Kind::Export => {
        self.out.write_keyword("export");
        if !node.text.is_empty() {
          self.out.write_keyword(&node.text);
        }
        self.out.write_soft_space();
        self.stmt(node.child(0));
      }
      Kind::ExportNames => {
        self.out.write_keyword("export");
        self.out.write_soft_space();
        self.braced_list(&node.children);
        self.out.write_punct(";");
      }
      Kind::ExportStar => {
        self.out.write_keyword("export");
        self.out.write_punct("*");
        self.out.write_keyword("from");
        self.out.write_soft_space();
        self.out.write_literal(&quote_string(&node.text));
        self.out.write_punct(";");
      }
      Kind::ExportSpecifier => self.out.write_identifier(&node.text),
      Kind::Absent => {}
      Kind::FuncExpr
      | Kind::Arrow
      | Kind::ClassExpr
      | Kind::Ident
      | Kind::Number
      | Kind::String
      | Kind::Template
      | Kind::TemplateChunk
      | Kind::TaggedTemplate
      | Kind::Regex
      | Kind::Keyword
      | Kind::Array
      | Kind::Object
      | Kind::Property
      | Kind::PropKey
      | Kind::Computed
      | Kind::Member
      | Kind::Index
      | Kind::Call
      | Kind::Args
      | Kind::New
      | Kind::Unary
      | Kind::Postfix
      | Kind::Binary
      | Kind::Assign
      | Kind::Cond
      | Kind::Sequence
      | Kind::Spread
      | Kind::Yield => self.expr(node, Prec::LOWEST),
      Kind::BindingIdent
      | Kind::Params
      | Kind::AssignPattern
      | Kind::Rest
      | Kind::ArrayPattern
      | Kind::ObjectPattern
      | Kind::PatternProp => self.pattern(node),
    }
  }

  /// `{` statements `}` with one statement per line in pretty mode.
  pub(crate) fn block(&mut self, stmts: &[Node]) {
    self.out.write_punct("{");
    self.indent += 1;
    for stmt in stmts {
      self.out.write_soft_newline(self.indent);
      self.stmt(stmt);
    }
    self.indent -= 1;
    if !stmts.is_empty() {
      self.out.write_soft_newline(self.indent);
    }
    self.out.write_punct("}");
  }

  /// Body of a compound statement: blocks stay on the same line.
  fn body(&mut self, stmt: &Node) {
    self.out.write_soft_space();
    self.stmt(stmt);
  }

  fn paren_expr(&mut self, expr: &Node) {
    self.out.write_soft_space();
    self.out.write_punct("(");
    self.expr(expr, Prec::LOWEST);
    self.out.write_punct(")");
  }

  /// Declaration list without the trailing semicolon.
  pub(crate) fn var_decl(&mut self, node: &Node) {
    self.out.write_keyword(&node.text);
    self.out.write_soft_space();
    for (i, declarator) in node.children.iter().enumerate() {
      if i > 0 {
        self.comma();
      }
      self.stmt(declarator);
    }
  }

  fn braced_list(&mut self, items: &[Node]) {
    self.out.write_punct("{");
    for (i, item) in items.iter().enumerate() {
      if i > 0 {
        self.comma();
      }
      self.stmt(item);
    }
    self.out.write_punct("}");
  }

  /// Function declaration or expression: modifiers, name, parameters and body.
  pub(crate) fn function(&mut self, node: &Node) {
    if node.is_async() {
      self.out.write_keyword("async");
    }
    self.out.write_keyword("function");
    if node.is_generator() {
      self.out.write_punct("*");
    }
    if !node.child(0).is_absent() {
      self.out.write_soft_space();
      self.pattern(node.child(0));
    }
    self.pattern(node.child(1));
    self.out.write_soft_space();
    self.stmt(node.child(2));
  }

  pub(crate) fn class(&mut self, node: &Node) {
    self.out.write_keyword("class");
    if !node.child(0).is_absent() {
      self.pattern(node.child(0));
    }
    if !node.child(1).is_absent() {
      self.out.write_keyword("extends");
      self.expr(node.child(1), Prec::CALL);
    }
    self.out.write_soft_space();
    self.stmt(node.child(2));
  }

  pub(crate) fn method(&mut self, node: &Node) {
    for modifier in node.text.split_whitespace() {
      if modifier == "*" {
        self.out.write_punct("*");
      } else {
        self.out.write_keyword(modifier);
      }
    }
    self.property_key(node.child(0));
    self.pattern(node.child(1));
    self.out.write_soft_space();
    self.stmt(node.child(2));
  }
}
