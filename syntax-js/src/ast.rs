use crate::loc::Loc;
use derive_visitor::Drive;
use derive_visitor::DriveMut;
use serde::Serialize;
use serde::Serializer;
use std::fmt;
use std::fmt::Debug;
use std::fmt::Formatter;

/// Index of a binding in the scope resolver's arena. Set on declaration and reference nodes
/// once resolution has run.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize)]
pub struct BindingId(pub u32);

impl BindingId {
  pub fn raw(self) -> u32 {
    self.0
  }
}

/// Closed set of node kinds. The layout of `children` for each kind is documented on the variant;
/// optional children are represented by an `Absent` node so positions stay fixed.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Serialize)]
pub enum Kind {
  /// Statements.
  Module,
  /// Statements.
  Block,
  Empty,
  /// Placeholder for an omitted optional child or an array hole.
  Absent,
  /// [expr]
  ExprStmt,
  /// text: `var`, `let` or `const`. [Declarator...]
  VarDecl,
  /// [target, init | Absent]
  Declarator,
  /// text: modifiers (`async`, `*`). [BindingIdent, Params, Block]
  FuncDecl,
  /// text: modifiers. [BindingIdent | Absent, Params, Block]
  FuncExpr,
  /// text: `` or `async`. [Params, Block | expr]
  Arrow,
  /// [BindingIdent, heritage | Absent, ClassBody]
  ClassDecl,
  /// [BindingIdent | Absent, heritage | Absent, ClassBody]
  ClassExpr,
  /// [Method | Field...]
  ClassBody,
  /// text: modifiers (`static`, `get`, `set`, `async`, `*`). [PropKey | Computed, Params, Block]
  Method,
  /// text: `` or `static`. [PropKey | Computed, value | Absent]
  Field,
  /// [expr | Absent]
  Return,
  /// [test, consequent, alternate | Absent]
  If,
  /// [init | Absent, test | Absent, update | Absent, body]
  For,
  /// text: `in` or `of`. [VarDecl | target, iterable, body]
  ForIn,
  /// [test, body]
  While,
  /// [body, test]
  DoWhile,
  /// text: label.
  Break,
  /// text: label.
  Continue,
  /// [expr]
  Throw,
  /// [Block, Catch | Absent, Block | Absent]
  Try,
  /// [param | Absent, Block]
  Catch,
  /// [discriminant, Case...]
  Switch,
  /// text: `case` or `default`. [test | Absent, statements...]
  Case,
  /// text: label. [statement]
  Labeled,
  Debugger,
  /// text: path of the included file.
  Include,
  /// text: dotted module name. [ImportSpecifier...]
  Import,
  /// text: imported name. [BindingIdent]
  ImportSpecifier,
  /// text: `` or `default`. [declaration]
  Export,
  /// [ExportSpecifier...]
  ExportNames,
  /// `export * from '...'`. text: module name.
  ExportStar,
  /// text: exported name.
  ExportSpecifier,
  /// A reference to a name. text: name.
  Ident,
  /// A declaration of a name. text: name.
  BindingIdent,
  /// text: raw literal.
  Number,
  /// text: raw literal including quotes.
  String,
  /// [TemplateChunk, (expr, TemplateChunk)...]
  Template,
  /// text: raw chunk between delimiters.
  TemplateChunk,
  /// [tag, Template]
  TaggedTemplate,
  /// text: raw literal.
  Regex,
  /// text: `this`, `super`, `true`, `false` or `null`.
  Keyword,
  /// [element | Spread | Absent...]
  Array,
  /// [Property | Method | Spread...]
  Object,
  /// [PropKey | Computed, value]
  Property,
  /// text: identifier name, raw string or raw number.
  PropKey,
  /// [expr]
  Computed,
  /// text: `.` or `?.`. [object, PropKey]
  Member,
  /// text: `` or `?.`. [object, expr]
  Index,
  /// text: `` or `?.`. [callee, Args]
  Call,
  /// [arg | Spread...]
  Args,
  /// [callee, Args | Absent]
  New,
  /// text: operator. [argument]
  Unary,
  /// text: operator. [argument]
  Postfix,
  /// text: operator. [left, right]
  Binary,
  /// text: operator. [target, value]
  Assign,
  /// [test, consequent, alternate]
  Cond,
  /// [expr...]
  Sequence,
  /// [expr]
  Spread,
  /// text: `yield` or `yield*`. [argument | Absent]
  Yield,
  /// [target | AssignPattern | Rest...]
  Params,
  /// [target, default]
  AssignPattern,
  /// [target]
  Rest,
  /// [target | AssignPattern | Rest | Absent...]
  ArrayPattern,
  /// [PatternProp | Rest...]
  ObjectPattern,
  /// [PropKey | Computed, target | AssignPattern]
  PatternProp,
}

impl Kind {
  pub fn is_function(self) -> bool {
    matches!(
      self,
      Kind::FuncDecl | Kind::FuncExpr | Kind::Arrow | Kind::Method
    )
  }
}

/// Small flag set attached to nodes by the surface extraction and the assembler.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Default, Serialize)]
pub struct NodeFlags(u8);

impl NodeFlags {
  /// Declaration whose name is part of the enclosing module's export surface.
  pub const EXPORTED: NodeFlags = NodeFlags(1 << 0);
  /// Reference to a global introduced by bundle assembly (module namespace paths).
  pub const SYNTHETIC_GLOBAL: NodeFlags = NodeFlags(1 << 1);

  pub fn contains(self, other: NodeFlags) -> bool {
    self.0 & other.0 == other.0
  }

  pub fn insert(&mut self, other: NodeFlags) {
    self.0 |= other.0;
  }

  pub fn remove(&mut self, other: NodeFlags) {
    self.0 &= !other.0;
  }
}

impl Debug for NodeFlags {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    let mut set = f.debug_set();
    if self.contains(NodeFlags::EXPORTED) {
      set.entry(&"EXPORTED");
    }
    if self.contains(NodeFlags::SYNTHETIC_GLOBAL) {
      set.entry(&"SYNTHETIC_GLOBAL");
    }
    set.finish()
  }
}

#[derive(Drive, DriveMut, Serialize)]
pub struct Node {
  #[drive(skip)]
  #[serde(rename = "$t")]
  pub kind: Kind,
  #[drive(skip)]
  #[serde(serialize_with = "serialize_loc")]
  pub loc: Loc,
  #[drive(skip)]
  #[serde(skip_serializing_if = "String::is_empty")]
  pub text: String,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub children: Vec<Node>,
  #[drive(skip)]
  #[serde(skip_serializing_if = "Option::is_none")]
  pub binding: Option<BindingId>,
  #[drive(skip)]
  #[serde(skip)]
  pub flags: NodeFlags,
}

fn serialize_loc<S: Serializer>(loc: &Loc, serializer: S) -> Result<S::Ok, S::Error> {
  if loc.is_synthetic() {
    serializer.serialize_none()
  } else {
    serializer.collect_seq([loc.line + 1, loc.column + 1])
  }
}

impl Node {
  pub fn new(kind: Kind, loc: Loc) -> Node {
    Node {
      kind,
      loc,
      text: String::new(),
      children: Vec::new(),
      binding: None,
      flags: NodeFlags::default(),
    }
  }

  pub fn with_text(kind: Kind, loc: Loc, text: impl Into<String>) -> Node {
    let mut node = Node::new(kind, loc);
    node.text = text.into();
    node
  }

  pub fn with_children(kind: Kind, loc: Loc, children: Vec<Node>) -> Node {
    let mut node = Node::new(kind, loc);
    node.children = children;
    node
  }

  pub fn absent(loc: Loc) -> Node {
    Node::new(Kind::Absent, loc)
  }

  pub fn is(&self, kind: Kind) -> bool {
    self.kind == kind
  }

  pub fn is_absent(&self) -> bool {
    self.kind == Kind::Absent
  }

  pub fn child(&self, i: usize) -> &Node {
    &self.children[i]
  }

  pub fn child_mut(&mut self, i: usize) -> &mut Node {
    &mut self.children[i]
  }

  pub fn flag(mut self, flag: NodeFlags) -> Node {
    self.flags.insert(flag);
    self
  }

  pub fn has_modifier(&self, word: &str) -> bool {
    self.text.split_whitespace().any(|w| w == word)
  }

  pub fn is_async(&self) -> bool {
    self.has_modifier("async")
  }

  pub fn is_generator(&self) -> bool {
    self.has_modifier("*")
  }

  /// Compares kind, text and children recursively; positions, bindings and flags are ignored.
  pub fn structurally_eq(&self, other: &Node) -> bool {
    self.kind == other.kind
      && self.text == other.text
      && self.children.len() == other.children.len()
      && self
        .children
        .iter()
        .zip(other.children.iter())
        .all(|(a, b)| a.structurally_eq(b))
  }
}

// Clones get a fresh identity: binding back-references belong to one resolution pass of one tree.
impl Clone for Node {
  fn clone(&self) -> Self {
    Node {
      kind: self.kind,
      loc: self.loc,
      text: self.text.clone(),
      children: self.children.clone(),
      binding: None,
      flags: self.flags,
    }
  }
}

impl Debug for Node {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    let mut tuple = f.debug_tuple(&format!("{:?}", self.kind));
    if !self.text.is_empty() {
      tuple.field(&self.text);
    }
    for c in self.children.iter() {
      tuple.field(c);
    }
    tuple.finish()
  }
}

#[cfg(test)]
mod tests {
  use super::BindingId;
  use super::Kind;
  use super::Node;
  use crate::loc::Loc;

  #[test]
  fn clone_drops_bindings() {
    let mut id = Node::with_text(Kind::Ident, Loc::synthetic(), "x");
    id.binding = Some(BindingId(3));
    let stmt = Node::with_children(Kind::ExprStmt, Loc::synthetic(), vec![id]);
    let copy = stmt.clone();
    assert_eq!(copy.child(0).binding, None);
    assert!(copy.structurally_eq(&stmt));
  }
}
