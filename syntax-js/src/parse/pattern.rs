use super::Parser;
use crate::ast::Kind;
use crate::ast::Node;
use crate::error::SyntaxError;
use crate::error::SyntaxErrorType;
use crate::error::SyntaxResult;
use crate::loc::Loc;
use crate::token::TT;

impl<'a> Parser<'a> {
  /// Parses a declaration target: an identifier, or an array/object destructuring pattern.
  pub fn parse_binding_target(&mut self) -> SyntaxResult<Node> {
    let t = self.peek();
    match t.typ {
      TT::Identifier => {
        self.consume();
        Ok(self.node_text(Kind::BindingIdent, t))
      }
      TT::BracketOpen => self.parse_array_binding_pattern(),
      TT::BraceOpen => self.parse_object_binding_pattern(),
      _ => Err(self.error(t, SyntaxErrorType::ExpectedSyntax("binding pattern"))),
    }
  }

  /// A binding target optionally followed by `= default`.
  pub fn parse_binding_element(&mut self) -> SyntaxResult<Node> {
    let target = self.parse_binding_target()?;
    if self.consume_if(TT::Equals).is_some() {
      let default = self.with_in_allowed(|p| p.parse_assign())?;
      let loc = target.loc;
      return Ok(Node::with_children(Kind::AssignPattern, loc, vec![
        target, default,
      ]));
    }
    Ok(target)
  }

  fn parse_rest_binding(&mut self) -> SyntaxResult<Node> {
    let start = self.require(TT::DotDotDot)?;
    let target = self.parse_binding_target()?;
    Ok(Node::with_children(Kind::Rest, self.loc(start.span), vec![
      target,
    ]))
  }

  fn parse_array_binding_pattern(&mut self) -> SyntaxResult<Node> {
    let start = self.require(TT::BracketOpen)?;
    let mut elements = Vec::new();
    loop {
      let t = self.peek();
      match t.typ {
        TT::BracketClose => {
          self.consume();
          break;
        }
        TT::Comma => {
          self.consume();
          elements.push(Node::absent(self.loc(t.span)));
          continue;
        }
        TT::DotDotDot => {
          elements.push(self.parse_rest_binding()?);
          self.require(TT::BracketClose)?;
          break;
        }
        _ => elements.push(self.parse_binding_element()?),
      };
      if self.consume_if(TT::Comma).is_none() {
        self.require(TT::BracketClose)?;
        break;
      }
    }
    Ok(Node::with_children(
      Kind::ArrayPattern,
      self.loc(start.span),
      elements,
    ))
  }

  fn parse_object_binding_pattern(&mut self) -> SyntaxResult<Node> {
    let start = self.require(TT::BraceOpen)?;
    let mut props = Vec::new();
    loop {
      let t = self.peek();
      match t.typ {
        TT::BraceClose => {
          self.consume();
          break;
        }
        TT::DotDotDot => {
          props.push(self.parse_rest_binding()?);
          self.require(TT::BraceClose)?;
          break;
        }
        _ => {}
      };
      let key = self.parse_property_key()?;
      let loc = key.loc;
      let value = if self.consume_if(TT::Colon).is_some() {
        self.parse_binding_element()?
      } else if t.typ == TT::Identifier {
        // Shorthand: `{x}` or `{x = 1}`.
        let target = Node::with_text(Kind::BindingIdent, loc, key.text.clone());
        if self.consume_if(TT::Equals).is_some() {
          let default = self.with_in_allowed(|p| p.parse_assign())?;
          Node::with_children(Kind::AssignPattern, loc, vec![target, default])
        } else {
          target
        }
      } else {
        let t = self.peek();
        return Err(self.error(t, SyntaxErrorType::RequiredTokenNotFound(TT::Colon)));
      };
      props.push(Node::with_children(Kind::PatternProp, loc, vec![
        key, value,
      ]));
      if self.consume_if(TT::Comma).is_none() {
        self.require(TT::BraceClose)?;
        break;
      }
    }
    Ok(Node::with_children(
      Kind::ObjectPattern,
      self.loc(start.span),
      props,
    ))
  }
}

fn invalid_target(node: &Node) -> SyntaxError {
  invalid_target_at(node.loc)
}

/// Whether an expression can be the operand of `++`, `--` or a compound assignment.
pub fn is_simple_target(node: &Node) -> bool {
  matches!(node.kind, Kind::Ident | Kind::Member | Kind::Index)
}

/// Reinterprets an already parsed expression as the left side of `=` or of a `for-in/of` head.
/// Identifiers stay references; literals become the matching pattern kinds.
pub fn to_assign_target(node: Node) -> SyntaxResult<Node> {
  match node.kind {
    Kind::Ident | Kind::Member | Kind::Index => Ok(node),
    Kind::Array => {
      let Node {
        loc, children, ..
      } = node;
      let mut elements = Vec::with_capacity(children.len());
      let count = children.len();
      for (i, el) in children.into_iter().enumerate() {
        elements.push(match el.kind {
          Kind::Absent => el,
          Kind::Spread if i + 1 == count => to_rest(el)?,
          _ => to_assign_element(el)?,
        });
      }
      Ok(Node::with_children(Kind::ArrayPattern, loc, elements))
    }
    Kind::Object => {
      let Node {
        loc, children, ..
      } = node;
      let count = children.len();
      let mut props = Vec::with_capacity(count);
      for (i, prop) in children.into_iter().enumerate() {
        match prop.kind {
          Kind::Property => {
            let Node {
              loc, mut children, ..
            } = prop;
            let value = children.pop().ok_or_else(|| invalid_target_at(loc))?;
            let key = children.pop().ok_or_else(|| invalid_target_at(loc))?;
            props.push(Node::with_children(Kind::PatternProp, loc, vec![
              key,
              to_assign_element(value)?,
            ]));
          }
          Kind::Spread if i + 1 == count => props.push(to_rest(prop)?),
          _ => return Err(invalid_target(&prop)),
        };
      }
      Ok(Node::with_children(Kind::ObjectPattern, loc, props))
    }
    Kind::ArrayPattern | Kind::ObjectPattern => Ok(node),
    _ => Err(invalid_target(&node)),
  }
}

fn invalid_target_at(loc: Loc) -> SyntaxError {
  SyntaxError::new(SyntaxErrorType::InvalidAssigmentTarget, loc, None)
}

fn to_assign_element(node: Node) -> SyntaxResult<Node> {
  if node.kind == Kind::Assign && node.text == "=" {
    let Node {
      loc, mut children, ..
    } = node;
    let value = children.pop().ok_or_else(|| invalid_target_at(loc))?;
    let target = children.pop().ok_or_else(|| invalid_target_at(loc))?;
    // The target was already converted when the assignment was parsed.
    return Ok(Node::with_children(Kind::AssignPattern, loc, vec![
      target, value,
    ]));
  }
  to_assign_target(node)
}

fn to_rest(node: Node) -> SyntaxResult<Node> {
  let Node {
    loc, mut children, ..
  } = node;
  let target = children.pop().ok_or_else(|| invalid_target_at(loc))?;
  Ok(Node::with_children(Kind::Rest, loc, vec![to_assign_target(
    target,
  )?]))
}
