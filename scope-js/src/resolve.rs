//! Two-phase lexical scope resolution.
//!
//! Every scope first registers the names it declares (parameters, hoisted `var`s and function
//! declarations for function scopes, `let`/`const`/`class` for blocks), then its body is walked
//! and each identifier reference is bound to the nearest declaration. References that leave a
//! function scope on the way turn the binding into a cell of its owner and a free variable of
//! every function crossed.

use crate::builtins::is_builtin;
use crate::diagnostic::Diagnostic;
use crate::diagnostic::ResolveError;
use crate::diagnostic::IMPLICIT_GLOBAL;
use crate::diagnostic::UNRESOLVED_GLOBAL;
use crate::names::assign_long_names;
use crate::names::assign_short_names;
use crate::scope::DeclKind;
use crate::scope::Ownership;
use crate::scope::Reference;
use crate::scope::ScopeId;
use crate::scope::ScopeKind;
use crate::scope::ScopeTree;
use ahash::HashSet;
use ahash::HashSetExt;
use derive_visitor::Drive;
use derive_visitor::Visitor;
use std::collections::BTreeSet;
use syntax_js::ast::BindingId;
use syntax_js::ast::Kind;
use syntax_js::ast::Node;
use syntax_js::ast::NodeFlags;
use syntax_js::loc::Loc;
use syntax_js::surface::for_each_pattern_binding;

#[derive(Clone, Debug, Default)]
pub struct ResolveOptions {
  /// Path of the resolved program, used as the prefix of long names.
  pub path: String,
  /// Treat top-level code as strict.
  pub strict: bool,
}

#[derive(Clone, Debug)]
pub struct Resolution {
  pub scopes: ScopeTree,
  pub diagnostics: Vec<Diagnostic>,
}

type ResolveResult<T = ()> = Result<T, ResolveError>;

#[derive(Clone, Copy, PartialEq, Eq)]
enum PatternMode {
  Declare,
  Assign,
}

#[derive(Visitor)]
#[visitor(Node(enter))]
struct SyntheticNames {
  names: BTreeSet<String>,
}

impl SyntheticNames {
  fn enter_node(&mut self, node: &Node) {
    if node.is(Kind::Ident) && node.flags.contains(NodeFlags::SYNTHETIC_GLOBAL) {
      self.names.insert(node.text.clone());
    }
  }
}

/// Whether a function body starts with a `"use strict"` directive.
pub fn has_use_strict(body: &[Node]) -> bool {
  for stmt in body {
    if !stmt.is(Kind::ExprStmt) || !stmt.child(0).is(Kind::String) {
      return false;
    }
    let raw = stmt.child(0).text.as_str();
    if raw == "\"use strict\"" || raw == "'use strict'" {
      return true;
    }
  }
  false
}

fn pattern_names(target: &Node) -> Vec<(String, Loc, bool)> {
  let mut names = Vec::new();
  for_each_pattern_binding(target, &mut |b| {
    names.push((
      b.text.clone(),
      b.loc,
      b.flags.contains(NodeFlags::EXPORTED),
    ))
  });
  names
}

fn collect_var_names(stmt: &Node, out: &mut Vec<(String, Loc, bool)>) {
  match stmt.kind {
    Kind::VarDecl if stmt.text == "var" => {
      for declarator in stmt.children.iter() {
        out.extend(pattern_names(declarator.child(0)));
      }
    }
    Kind::Block => {
      for s in stmt.children.iter() {
        collect_var_names(s, out);
      }
    }
    Kind::If => {
      collect_var_names(stmt.child(1), out);
      collect_var_names(stmt.child(2), out);
    }
    Kind::For => {
      collect_var_names(stmt.child(0), out);
      collect_var_names(stmt.child(3), out);
    }
    Kind::ForIn => {
      collect_var_names(stmt.child(0), out);
      collect_var_names(stmt.child(2), out);
    }
    Kind::While | Kind::Catch => collect_var_names(stmt.child(1), out),
    Kind::DoWhile | Kind::Labeled => collect_var_names(stmt.child(0), out),
    Kind::Try => {
      for part in stmt.children.iter() {
        collect_var_names(part, out);
      }
    }
    Kind::Switch => {
      for case in stmt.children[1..].iter() {
        for s in case.children[1..].iter() {
          collect_var_names(s, out);
        }
      }
    }
    _ => {}
  }
}

/// Identifier-safe rendering of a path or label.
pub(crate) fn sanitize(raw: &str) -> String {
  let mut out: String = raw
    .chars()
    .map(|c| {
      if c.is_ascii_alphanumeric() || c == '_' || c == '$' {
        c
      } else {
        '_'
      }
    })
    .collect();
  if out.is_empty() || out.starts_with(|c: char| c.is_ascii_digit()) {
    out.insert(0, '_');
  }
  out
}

struct Resolver {
  tree: ScopeTree,
  scope: ScopeId,
  diagnostics: Vec<Diagnostic>,
  warned: HashSet<String>,
}

/// Resolves every identifier of `module` in place, setting `binding` on declaration and
/// reference nodes.
pub fn resolve(module: &mut Node, options: &ResolveOptions) -> ResolveResult<Resolution> {
  let strict = options.strict || has_use_strict(&module.children);
  let mut resolver = Resolver {
    tree: ScopeTree::new(strict),
    scope: ScopeId::ROOT,
    diagnostics: Vec::new(),
    warned: HashSet::new(),
  };
  resolver.declare_synthetic(module);
  resolver.declare_body(&module.children)?;
  resolver.stmts(&mut module.children)?;

  let mut tree = resolver.tree;
  assign_long_names(&mut tree, &sanitize(&options.path));
  assign_short_names(&mut tree);
  Ok(Resolution {
    scopes: tree,
    diagnostics: resolver.diagnostics,
  })
}

impl Resolver {
  fn strict(&self) -> bool {
    self.tree.scope(self.scope).strict
  }

  fn enter(&mut self, kind: ScopeKind, label: &str, strict: bool) -> ScopeId {
    let outer = self.scope;
    self.scope = self
      .tree
      .add_scope(kind, Some(outer), sanitize(label), strict);
    outer
  }

  fn declare_synthetic(&mut self, module: &Node) {
    let mut visitor = SyntheticNames {
      names: BTreeSet::new(),
    };
    module.drive(&mut visitor);
    for name in visitor.names {
      if self.tree.declared(ScopeId::ROOT, &name).is_none() {
        self
          .tree
          .add_binding(ScopeId::ROOT, &name, DeclKind::Synthetic, Loc::synthetic());
      }
    }
  }

  fn declare(
    &mut self,
    name: &str,
    kind: DeclKind,
    loc: Loc,
    exported: bool,
  ) -> ResolveResult<BindingId> {
    if let Some(existing) = self.tree.declared(self.scope, name) {
      let binding = self.tree.binding_mut(existing);
      if binding.kind == DeclKind::Synthetic {
        binding.pinned = true;
      } else if kind.is_lexical() || binding.kind.is_lexical() {
        return Err(ResolveError::Redeclaration {
          name: name.to_string(),
          loc,
        });
      }
      binding.exported |= exported;
      return Ok(existing);
    }
    let id = self.tree.add_binding(self.scope, name, kind, loc);
    self.tree.binding_mut(id).exported = exported;
    Ok(id)
  }

  fn declare_all(&mut self, names: Vec<(String, Loc, bool)>, kind: DeclKind) -> ResolveResult {
    for (name, loc, exported) in names {
      self.declare(&name, kind, loc, exported)?;
    }
    Ok(())
  }

  /// Hoisted and lexical declarations of a function (or program) body.
  fn declare_body(&mut self, stmts: &[Node]) -> ResolveResult {
    let mut vars = Vec::new();
    for stmt in stmts {
      collect_var_names(stmt, &mut vars);
    }
    self.declare_all(vars, DeclKind::Var)?;
    self.declare_lexical(stmts)
  }

  fn declare_lexical(&mut self, stmts: &[Node]) -> ResolveResult {
    for stmt in stmts {
      match stmt.kind {
        Kind::VarDecl if stmt.text != "var" => {
          let kind = if stmt.text == "const" {
            DeclKind::Const
          } else {
            DeclKind::Let
          };
          for declarator in stmt.children.iter() {
            self.declare_all(pattern_names(declarator.child(0)), kind)?;
          }
        }
        Kind::FuncDecl | Kind::ClassDecl => {
          let kind = if stmt.is(Kind::FuncDecl) {
            DeclKind::Function
          } else {
            DeclKind::Class
          };
          let name = stmt.child(0);
          self.declare(
            &name.text,
            kind,
            name.loc,
            name.flags.contains(NodeFlags::EXPORTED),
          )?;
        }
        _ => {}
      }
    }
    Ok(())
  }

  fn mark_dynamic(&mut self) {
    let chain: Vec<ScopeId> = self.tree.ancestors(self.scope).collect();
    for id in chain {
      self.tree.scope_mut(id).dynamic = true;
    }
  }

  fn capture(&mut self, binding: BindingId) {
    let owner = self.tree.binding(binding).scope;
    self.tree.binding_mut(binding).captured = true;
    self.tree.scope_mut(owner).cell_vars.insert(binding);
    let crossed: Vec<ScopeId> = self
      .tree
      .ancestors(self.scope)
      .take_while(|s| *s != owner)
      .filter(|s| self.tree.scope(*s).kind == ScopeKind::Function)
      .collect();
    for id in crossed {
      self.tree.scope_mut(id).free_vars.insert(binding);
    }
  }

  fn warn_once(&mut self, code: &'static str, name: &str, message: String, loc: Loc) {
    if self.warned.insert(format!("{code}:{name}")) {
      self.diagnostics.push(Diagnostic::warning(code, message, loc));
    }
  }

  fn reference(&mut self, node: &mut Node, assign: bool) -> ResolveResult {
    let synthetic = node.flags.contains(NodeFlags::SYNTHETIC_GLOBAL);
    let mut reference = Reference {
      name: node.text.clone(),
      scope: self.scope,
      binding: None,
      crosses_function: false,
      synthetic,
      loc: node.loc,
    };
    match self.tree.lookup(self.scope, &node.text) {
      Some((id, crosses_function)) => {
        let binding = self.tree.binding_mut(id);
        if binding.synthetic && !synthetic {
          binding.pinned = true;
        }
        if assign && binding.kind == DeclKind::Const {
          return Err(ResolveError::AssignToConst {
            name: node.text.clone(),
            loc: node.loc,
          });
        }
        binding.references += 1;
        if crosses_function && self.tree.ownership(id) != Ownership::Global {
          self.capture(id);
        }
        node.binding = Some(id);
        reference.binding = Some(id);
        reference.crosses_function = crosses_function;
      }
      None if assign => {
        if self.strict() {
          return Err(ResolveError::UndeclaredAssignment {
            name: node.text.clone(),
            loc: node.loc,
          });
        }
        let id = self
          .tree
          .add_binding(ScopeId::ROOT, &node.text, DeclKind::ImplicitGlobal, node.loc);
        self.tree.binding_mut(id).references += 1;
        self.warn_once(
          IMPLICIT_GLOBAL,
          &node.text,
          format!("assignment to undeclared `{}` creates a global", node.text),
          node.loc,
        );
        node.binding = Some(id);
        reference.binding = Some(id);
      }
      None => {
        self.tree.globals.insert(node.text.clone());
        if !is_builtin(&node.text) {
          self.warn_once(
            UNRESOLVED_GLOBAL,
            &node.text,
            format!("unresolved identifier `{}` treated as global", node.text),
            node.loc,
          );
        }
      }
    }
    self.tree.references.push(reference);
    Ok(())
  }

  fn bind_decl(&mut self, node: &mut Node) -> ResolveResult {
    let id = match self.tree.lookup(self.scope, &node.text) {
      Some((id, _)) => id,
      None => self.declare(
        &node.text,
        DeclKind::Var,
        node.loc,
        node.flags.contains(NodeFlags::EXPORTED),
      )?,
    };
    node.binding = Some(id);
    Ok(())
  }

  fn stmts(&mut self, stmts: &mut [Node]) -> ResolveResult {
    for stmt in stmts.iter_mut() {
      self.walk(stmt)?;
    }
    Ok(())
  }

  fn block(&mut self, stmts: &mut [Node]) -> ResolveResult {
    let outer = self.enter(ScopeKind::Block, "b", self.strict());
    self.declare_lexical(stmts)?;
    self.stmts(stmts)?;
    self.scope = outer;
    Ok(())
  }

  fn pattern(&mut self, node: &mut Node, mode: PatternMode) -> ResolveResult {
    match node.kind {
      Kind::BindingIdent => self.bind_decl(node),
      Kind::Ident => self.reference(node, mode == PatternMode::Assign),
      Kind::AssignPattern => {
        self.pattern(node.child_mut(0), mode)?;
        self.walk(node.child_mut(1))
      }
      Kind::Rest => self.pattern(node.child_mut(0), mode),
      Kind::ArrayPattern | Kind::ObjectPattern | Kind::Params => {
        for c in node.children.iter_mut() {
          self.pattern(c, mode)?;
        }
        Ok(())
      }
      Kind::PatternProp => {
        if node.child(0).is(Kind::Computed) {
          self.walk(node.child_mut(0))?;
        }
        self.pattern(node.child_mut(1), mode)
      }
      Kind::Absent => Ok(()),
      _ => self.walk(node),
    }
  }

  fn assign_target(&mut self, node: &mut Node) -> ResolveResult {
    match node.kind {
      Kind::Ident => self.reference(node, true),
      Kind::ArrayPattern | Kind::ObjectPattern => self.pattern(node, PatternMode::Assign),
      _ => self.walk(node),
    }
  }

  fn function(&mut self, node: &mut Node) -> ResolveResult {
    let (params, body) = if node.is(Kind::Arrow) { (0, 1) } else { (1, 2) };
    let label = match node.kind {
      Kind::FuncDecl | Kind::FuncExpr | Kind::Method if !node.child(0).is_absent() => {
        node.child(0).text.clone()
      }
      _ => "f".to_string(),
    };
    match node.kind {
      Kind::FuncDecl => self.bind_decl(node.child_mut(0))?,
      Kind::Method if node.child(0).is(Kind::Computed) => self.walk(node.child_mut(0))?,
      _ => {}
    }

    let body_stmts: &[Node] = if node.child(body).is(Kind::Block) {
      &node.child(body).children
    } else {
      &[]
    };
    let strict = self.strict() || has_use_strict(body_stmts);
    let outer = self.enter(ScopeKind::Function, &label, strict);
    let mut param_names = Vec::new();
    for param in node.child(params).children.iter() {
      param_names.extend(pattern_names(param));
    }
    self.declare_all(param_names, DeclKind::Param)?;
    let named_expr = node.is(Kind::FuncExpr) && !node.child(0).is_absent();
    if named_expr && self.tree.declared(self.scope, &node.child(0).text).is_none() {
      let name = node.child(0);
      self.declare(&name.text, DeclKind::FunctionName, name.loc, false)?;
    }
    self.declare_body(body_stmts)?;

    if named_expr {
      self.bind_decl(node.child_mut(0))?;
    }
    self.pattern(node.child_mut(params), PatternMode::Declare)?;
    let body = node.child_mut(body);
    if body.is(Kind::Block) {
      self.stmts(&mut body.children)?;
    } else {
      self.walk(body)?;
    }
    self.scope = outer;
    Ok(())
  }

  fn class(&mut self, node: &mut Node) -> ResolveResult {
    if node.is(Kind::ClassDecl) {
      self.bind_decl(node.child_mut(0))?;
    }
    self.walk(node.child_mut(1))?;
    let label = if node.child(0).is_absent() {
      "c".to_string()
    } else {
      node.child(0).text.clone()
    };
    let outer = self.enter(ScopeKind::Block, &label, true);
    if node.is(Kind::ClassExpr) && !node.child(0).is_absent() {
      let name = node.child(0);
      self.declare(&name.text, DeclKind::Class, name.loc, false)?;
      self.bind_decl(node.child_mut(0))?;
    }
    for member in node.child_mut(2).children.iter_mut() {
      match member.kind {
        Kind::Field => {
          if member.child(0).is(Kind::Computed) {
            self.walk(member.child_mut(0))?;
          }
          // Initializers run later with their own `this`, like a method body.
          let class_scope = self.enter(ScopeKind::Function, "field", true);
          self.walk(member.child_mut(1))?;
          self.scope = class_scope;
        }
        _ => self.walk(member)?,
      }
    }
    self.scope = outer;
    Ok(())
  }

  fn walk_children(&mut self, node: &mut Node) -> ResolveResult {
    for c in node.children.iter_mut() {
      self.walk(c)?;
    }
    Ok(())
  }

  fn walk(&mut self, node: &mut Node) -> ResolveResult {
    match node.kind {
      Kind::Module => self.stmts(&mut node.children),
      Kind::Block => self.block(&mut node.children),
      Kind::Declarator => {
        self.pattern(node.child_mut(0), PatternMode::Declare)?;
        self.walk(node.child_mut(1))
      }
      Kind::FuncDecl | Kind::FuncExpr | Kind::Arrow | Kind::Method => self.function(node),
      Kind::ClassDecl | Kind::ClassExpr => self.class(node),
      Kind::For | Kind::ForIn => {
        let outer = self.enter(ScopeKind::Block, "b", self.strict());
        let head = node.child(0);
        if head.is(Kind::VarDecl) && head.text != "var" {
          self.declare_lexical(std::slice::from_ref(head))?;
        }
        if node.is(Kind::ForIn) && !node.child(0).is(Kind::VarDecl) {
          self.assign_target(node.child_mut(0))?;
          for c in node.children[1..].iter_mut() {
            self.walk(c)?;
          }
        } else {
          self.walk_children(node)?;
        }
        self.scope = outer;
        Ok(())
      }
      Kind::Catch => {
        let outer = self.enter(ScopeKind::Block, "catch", self.strict());
        self.declare_all(pattern_names(node.child(0)), DeclKind::Catch)?;
        self.declare_lexical(&node.child(1).children)?;
        self.pattern(node.child_mut(0), PatternMode::Declare)?;
        self.stmts(&mut node.child_mut(1).children)?;
        self.scope = outer;
        Ok(())
      }
      Kind::Switch => {
        self.walk(node.child_mut(0))?;
        let outer = self.enter(ScopeKind::Block, "b", self.strict());
        for case in node.children[1..].iter() {
          self.declare_lexical(&case.children[1..])?;
        }
        for case in node.children[1..].iter_mut() {
          self.walk_children(case)?;
        }
        self.scope = outer;
        Ok(())
      }
      Kind::Ident => self.reference(node, false),
      Kind::BindingIdent => self.bind_decl(node),
      Kind::Unary if node.text == "++" || node.text == "--" => {
        self.assign_target(node.child_mut(0))
      }
      Kind::Postfix => self.assign_target(node.child_mut(0)),
      Kind::Assign => {
        self.assign_target(node.child_mut(0))?;
        self.walk(node.child_mut(1))
      }
      Kind::Call => {
        self.walk_children(node)?;
        let callee = node.child(0);
        if node.text.is_empty()
          && callee.is(Kind::Ident)
          && callee.text == "eval"
          && callee.binding.is_none()
        {
          self.mark_dynamic();
        }
        Ok(())
      }
      Kind::Params
      | Kind::AssignPattern
      | Kind::Rest
      | Kind::ArrayPattern
      | Kind::ObjectPattern
      | Kind::PatternProp => self.pattern(node, PatternMode::Declare),
      Kind::Empty
      | Kind::Absent
      | Kind::Break
      | Kind::Continue
      | Kind::Debugger
      | Kind::Include
      | Kind::Import
      | Kind::ImportSpecifier
      | Kind::ExportNames
      | Kind::ExportStar
      | Kind::ExportSpecifier
      | Kind::Number
      | Kind::String
      | Kind::TemplateChunk
      | Kind::Regex
      | Kind::Keyword
      | Kind::PropKey => Ok(()),
      Kind::ExprStmt
      | Kind::VarDecl
      | Kind::ClassBody
      | Kind::Field
      | Kind::Return
      | Kind::If
      | Kind::While
      | Kind::DoWhile
      | Kind::Throw
      | Kind::Try
      | Kind::Case
      | Kind::Labeled
      | Kind::Export
      | Kind::Template
      | Kind::TaggedTemplate
      | Kind::Array
      | Kind::Object
      | Kind::Property
      | Kind::Computed
      | Kind::Member
      | Kind::Index
      | Kind::Args
      | Kind::New
      | Kind::Unary
      | Kind::Binary
      | Kind::Cond
      | Kind::Sequence
      | Kind::Spread
      | Kind::Yield => self.walk_children(node),
    }
  }
}
