use ahash::HashMap;
use ahash::HashMapExt;
use std::collections::BTreeSet;
use syntax_js::ast::BindingId;
use syntax_js::loc::Loc;

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct ScopeId(pub u32);

impl ScopeId {
  pub const ROOT: ScopeId = ScopeId(0);

  pub fn raw(self) -> u32 {
    self.0
  }
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum ScopeKind {
  Global,
  Function,
  Block,
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum DeclKind {
  Var,
  Let,
  Const,
  Function,
  /// Name of a function expression, visible only inside it.
  FunctionName,
  Class,
  Param,
  Catch,
  /// Created by an assignment to an undeclared name in sloppy code.
  ImplicitGlobal,
  /// Root of a path introduced by bundle assembly.
  Synthetic,
}

impl DeclKind {
  pub fn is_lexical(self) -> bool {
    matches!(self, DeclKind::Let | DeclKind::Const | DeclKind::Class)
  }
}

/// Who owns the storage of a binding.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum Ownership {
  Global,
  Local,
  /// Local captured by a nested function.
  Cell,
}

/// Classification of one identifier reference.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum RefClass {
  Global,
  Local,
  /// Reference, from inside the owning function, to a local that some nested function captures.
  Cell,
  /// Reference to a binding owned by an enclosing function.
  Free,
}

#[derive(Clone, Debug)]
pub struct Binding {
  pub name: String,
  pub kind: DeclKind,
  pub scope: ScopeId,
  pub loc: Loc,
  pub captured: bool,
  pub exported: bool,
  pub synthetic: bool,
  /// Must keep its declared name.
  pub pinned: bool,
  pub references: u32,
  pub short_name: String,
  pub long_name: String,
}

impl Binding {
  /// Root-level, exported and synthetic bindings keep their declared name in both naming
  /// schemes.
  pub fn keeps_declared_name(&self) -> bool {
    self.scope == ScopeId::ROOT || self.exported || self.synthetic
  }
}

#[derive(Clone, Debug)]
pub struct Scope {
  pub kind: ScopeKind,
  pub parent: Option<ScopeId>,
  /// Used to build long names.
  pub label: String,
  pub names: HashMap<String, BindingId>,
  /// Declaration order.
  pub bindings: Vec<BindingId>,
  pub children: Vec<ScopeId>,
  pub cell_vars: BTreeSet<BindingId>,
  pub free_vars: BTreeSet<BindingId>,
  pub strict: bool,
  /// Contains a direct `eval`, or is an ancestor of one.
  pub dynamic: bool,
}

/// An identifier reference seen during resolution.
#[derive(Clone, Debug)]
pub struct Reference {
  pub name: String,
  pub scope: ScopeId,
  pub binding: Option<BindingId>,
  /// Resolution left at least one function scope.
  pub crosses_function: bool,
  pub synthetic: bool,
  pub loc: Loc,
}

/// Arena of scopes and bindings for one resolved tree.
#[derive(Clone, Debug)]
pub struct ScopeTree {
  pub scopes: Vec<Scope>,
  pub bindings: Vec<Binding>,
  pub references: Vec<Reference>,
  /// Names referenced without any binding.
  pub globals: BTreeSet<String>,
}

impl ScopeTree {
  pub(crate) fn new(strict: bool) -> ScopeTree {
    let mut tree = ScopeTree {
      scopes: Vec::new(),
      bindings: Vec::new(),
      references: Vec::new(),
      globals: BTreeSet::new(),
    };
    tree.add_scope(ScopeKind::Global, None, "g".to_string(), strict);
    tree
  }

  pub(crate) fn add_scope(
    &mut self,
    kind: ScopeKind,
    parent: Option<ScopeId>,
    label: String,
    strict: bool,
  ) -> ScopeId {
    let id = ScopeId(self.scopes.len() as u32);
    self.scopes.push(Scope {
      kind,
      parent,
      label,
      names: HashMap::new(),
      bindings: Vec::new(),
      children: Vec::new(),
      cell_vars: BTreeSet::new(),
      free_vars: BTreeSet::new(),
      strict,
      dynamic: false,
    });
    if let Some(parent) = parent {
      self.scopes[parent.0 as usize].children.push(id);
    }
    id
  }

  pub(crate) fn add_binding(
    &mut self,
    scope: ScopeId,
    name: &str,
    kind: DeclKind,
    loc: Loc,
  ) -> BindingId {
    let id = BindingId(self.bindings.len() as u32);
    self.bindings.push(Binding {
      name: name.to_string(),
      kind,
      scope,
      loc,
      captured: false,
      exported: false,
      synthetic: kind == DeclKind::Synthetic,
      pinned: false,
      references: 0,
      short_name: name.to_string(),
      long_name: name.to_string(),
    });
    let s = self.scope_mut(scope);
    s.names.insert(name.to_string(), id);
    s.bindings.push(id);
    id
  }

  pub fn scope(&self, id: ScopeId) -> &Scope {
    &self.scopes[id.0 as usize]
  }

  pub(crate) fn scope_mut(&mut self, id: ScopeId) -> &mut Scope {
    &mut self.scopes[id.0 as usize]
  }

  pub fn binding(&self, id: BindingId) -> &Binding {
    &self.bindings[id.0 as usize]
  }

  pub(crate) fn binding_mut(&mut self, id: BindingId) -> &mut Binding {
    &mut self.bindings[id.0 as usize]
  }

  pub fn root(&self) -> &Scope {
    self.scope(ScopeId::ROOT)
  }

  /// `id` followed by its ancestors up to the root.
  pub fn ancestors(&self, id: ScopeId) -> impl Iterator<Item = ScopeId> + '_ {
    std::iter::successors(Some(id), move |s| self.scope(*s).parent)
  }

  /// Scopes in pre-order, so parents come before their children.
  pub fn preorder(&self) -> Vec<ScopeId> {
    let mut out = Vec::with_capacity(self.scopes.len());
    let mut stack = vec![ScopeId::ROOT];
    while let Some(id) = stack.pop() {
      out.push(id);
      stack.extend(self.scope(id).children.iter().rev().copied());
    }
    out
  }

  /// Looks `name` up from `from`, returning the binding and whether a function scope was left on
  /// the way.
  pub fn lookup(&self, from: ScopeId, name: &str) -> Option<(BindingId, bool)> {
    let mut crosses_function = false;
    for id in self.ancestors(from) {
      let scope = self.scope(id);
      if let Some(binding) = scope.names.get(name) {
        return Some((*binding, crosses_function));
      }
      if scope.kind == ScopeKind::Function {
        crosses_function = true;
      }
    }
    None
  }

  pub fn ownership(&self, id: BindingId) -> Ownership {
    let binding = self.binding(id);
    if self.scope(binding.scope).kind == ScopeKind::Global {
      Ownership::Global
    } else if binding.captured {
      Ownership::Cell
    } else {
      Ownership::Local
    }
  }

  pub fn classify(&self, reference: &Reference) -> RefClass {
    let Some(binding) = reference.binding else {
      return RefClass::Global;
    };
    match self.ownership(binding) {
      Ownership::Global => RefClass::Global,
      _ if reference.crosses_function => RefClass::Free,
      Ownership::Cell => RefClass::Cell,
      Ownership::Local => RefClass::Local,
    }
  }

  /// Binding declared directly in `scope` under `name`.
  pub fn declared(&self, scope: ScopeId, name: &str) -> Option<BindingId> {
    self.scope(scope).names.get(name).copied()
  }

  /// Names of the free variables of `scope`, sorted.
  pub fn free_var_names(&self, scope: ScopeId) -> Vec<&str> {
    let mut names: Vec<&str> = self
      .scope(scope)
      .free_vars
      .iter()
      .map(|b| self.binding(*b).name.as_str())
      .collect();
    names.sort_unstable();
    names
  }

  pub fn cell_var_names(&self, scope: ScopeId) -> Vec<&str> {
    let mut names: Vec<&str> = self
      .scope(scope)
      .cell_vars
      .iter()
      .map(|b| self.binding(*b).name.as_str())
      .collect();
    names.sort_unstable();
    names
  }
}
