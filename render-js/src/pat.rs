use crate::precedence::Prec;
use crate::Renderer;
use syntax_js::ast::Kind;
use syntax_js::ast::Node;

/// `{x}` or `{x = 1}`: key and bound name agree.
fn is_shorthand(key: &Node, value: &Node) -> bool {
  let target = if value.is(Kind::AssignPattern) {
    value.child(0)
  } else {
    value
  };
  key.is(Kind::PropKey)
    && matches!(target.kind, Kind::BindingIdent | Kind::Ident)
    && target.text == key.text
}

impl Renderer {
  pub(crate) fn pattern(&mut self, node: &Node) {
    match node.kind {
      Kind::BindingIdent => {
        self.out.mark(node.loc, Some(&node.text));
        self.out.write_identifier(&node.text);
      }
      Kind::Params => {
        self.out.write_punct("(");
        self.pattern_list(&node.children);
        self.out.write_punct(")");
      }
      Kind::AssignPattern => {
        self.target(node.child(0));
        self.infix("=");
        self.expr(node.child(1), Prec::ASSIGNMENT);
      }
      Kind::Rest => {
        self.out.write_punct("...");
        self.target(node.child(0));
      }
      Kind::ArrayPattern => {
        self.out.write_punct("[");
        self.pattern_list(&node.children);
        if node.children.last().is_some_and(Node::is_absent) {
          self.out.write_punct(",");
        }
        self.out.write_punct("]");
      }
      Kind::ObjectPattern => {
        self.out.write_punct("{");
        self.pattern_list(&node.children);
        self.out.write_punct("}");
      }
      Kind::PatternProp => {
        let (key, value) = (node.child(0), node.child(1));
        if !is_shorthand(key, value) {
          self.property_key(key);
          self.out.write_punct(":");
          self.out.write_soft_space();
        }
        self.target(value);
      }
      Kind::Absent => {}
      _ => self.target(node),
    }
  }

  fn pattern_list(&mut self, items: &[Node]) {
    for (i, item) in items.iter().enumerate() {
      if i > 0 {
        self.comma();
      }
      self.pattern(item);
    }
  }
}
