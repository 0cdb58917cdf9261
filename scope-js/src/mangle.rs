use crate::scope::DeclKind;
use crate::scope::ScopeId;
use crate::scope::ScopeTree;
use ahash::HashSet;
use ahash::HashSetExt;
use derive_visitor::DriveMut;
use derive_visitor::VisitorMut;
use once_cell::sync::Lazy;
use std::collections::BTreeMap;
use syntax_js::ast::Kind;
use syntax_js::ast::Node;
use syntax_js::lex::KEYWORDS_MAPPING;

/// Outcome of one mangling pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MangleResult {
  /// Synthetic globals that were renamed, old name to new name.
  pub renamed_globals: BTreeMap<String, String>,
  /// Number of bindings given a new name.
  pub renamed: usize,
}

static DEFAULT_RESERVED: Lazy<HashSet<String>> = Lazy::new(|| {
  let mut set = HashSet::new();
  for keyword in KEYWORDS_MAPPING.values() {
    set.insert((*keyword).to_string());
  }
  for word in ["arguments", "eval", "let", "static", "yield", "await", "async"] {
    set.insert(word.to_string());
  }
  set
});

/// Produces `a..z`, `A..Z`, then a letter followed by digits (`a0..Z9`, `a00..Z99`, ...).
#[derive(Default)]
pub struct NameGenerator {
  counter: usize,
}

impl NameGenerator {
  const LETTERS: &'static [u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

  pub fn next_name(&mut self, reserved: &HashSet<String>) -> String {
    loop {
      let name = Self::encode(self.counter);
      self.counter += 1;
      if !reserved.contains(&name) {
        return name;
      }
    }
  }

  pub fn encode(n: usize) -> String {
    let letters = Self::LETTERS.len();
    if n < letters {
      return (Self::LETTERS[n] as char).to_string();
    }
    let mut rest = n - letters;
    let mut width = 1u32;
    loop {
      let block = letters * 10usize.pow(width);
      if rest < block {
        let per_letter = 10usize.pow(width);
        let letter = Self::LETTERS[rest / per_letter] as char;
        let digits = rest % per_letter;
        return format!("{letter}{digits:0width$}", width = width as usize);
      }
      rest -= block;
      width += 1;
    }
  }
}

fn is_renameable(tree: &ScopeTree, id: syntax_js::ast::BindingId) -> bool {
  let binding = tree.binding(id);
  if binding.synthetic {
    return !binding.pinned;
  }
  binding.scope != ScopeId::ROOT
    && !binding.exported
    && !binding.pinned
    && binding.kind != DeclKind::ImplicitGlobal
    && !tree.scope(binding.scope).dynamic
}

#[derive(VisitorMut)]
#[visitor(Node(enter))]
struct RenameVisitor<'a> {
  names: &'a [Option<String>],
}

impl RenameVisitor<'_> {
  fn enter_node(&mut self, node: &mut Node) {
    if !matches!(node.kind, Kind::Ident | Kind::BindingIdent) {
      return;
    }
    if let Some(Some(name)) = node.binding.map(|b| &self.names[b.raw() as usize]) {
      node.text = name.clone();
    }
  }
}

/// Gives every renameable binding a short name and rewrites the tree accordingly. `tree` must be
/// the resolution of `module`.
pub fn mangle(module: &mut Node, tree: &ScopeTree) -> MangleResult {
  let scope_count = tree.scopes.len();
  let mut unknown: Vec<HashSet<String>> = vec![HashSet::new(); scope_count];
  for reference in tree.references.iter().filter(|r| r.binding.is_none()) {
    for id in tree.ancestors(reference.scope) {
      unknown[id.raw() as usize].insert(reference.name.clone());
    }
  }
  let mut pinned: Vec<HashSet<String>> = vec![HashSet::new(); scope_count];
  for (i, binding) in tree.bindings.iter().enumerate() {
    if is_renameable(tree, syntax_js::ast::BindingId(i as u32)) {
      continue;
    }
    for id in tree.ancestors(binding.scope) {
      pinned[id.raw() as usize].insert(binding.name.clone());
    }
  }

  let mut names: Vec<Option<String>> = vec![None; tree.bindings.len()];
  let mut enclosing: Vec<HashSet<String>> = vec![HashSet::new(); scope_count];
  for scope_id in tree.preorder() {
    let index = scope_id.raw() as usize;
    let scope = tree.scope(scope_id);
    let inherited = match scope.parent {
      Some(parent) => enclosing[parent.raw() as usize].clone(),
      None => HashSet::new(),
    };
    let mut reserved = DEFAULT_RESERVED.clone();
    reserved.extend(unknown[index].iter().cloned());
    reserved.extend(pinned[index].iter().cloned());
    reserved.extend(inherited.iter().cloned());

    let mut generator = NameGenerator::default();
    let mut visible = inherited;
    for id in scope.bindings.iter() {
      let final_name = if is_renameable(tree, *id) {
        let name = generator.next_name(&reserved);
        reserved.insert(name.clone());
        names[id.raw() as usize] = Some(name.clone());
        name
      } else {
        tree.binding(*id).name.clone()
      };
      visible.insert(final_name);
    }
    enclosing[index] = visible;
  }

  let mut result = MangleResult::default();
  for (binding, name) in tree.bindings.iter().zip(names.iter()) {
    if let Some(name) = name {
      result.renamed += 1;
      if binding.synthetic {
        result
          .renamed_globals
          .insert(binding.name.clone(), name.clone());
      }
    }
  }
  let mut visitor = RenameVisitor { names: &names };
  module.drive_mut(&mut visitor);
  result
}
