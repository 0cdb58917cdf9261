use crate::scope::ScopeTree;
use ahash::HashSet;
use ahash::HashSetExt;
use derive_visitor::DriveMut;
use derive_visitor::VisitorMut;
use serde::Deserialize;
use serde::Serialize;
use syntax_js::ast::Kind;
use syntax_js::ast::Node;

/// Which of the two naming schemes a render pass applies.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NameStyle {
  /// Declared names, suffixed with `$N` only where they would shadow.
  #[default]
  Short,
  /// Scope-qualified names unique across the whole program.
  Long,
}

pub(crate) fn assign_long_names(tree: &mut ScopeTree, prefix: &str) {
  let mut counter = 0u32;
  let mut paths: Vec<String> = vec![String::new(); tree.scopes.len()];
  for scope_id in tree.preorder() {
    let scope = tree.scope(scope_id);
    let path = match scope.parent {
      None => prefix.to_string(),
      Some(parent) => format!(
        "{}_{}{}",
        paths[parent.raw() as usize],
        scope.label,
        scope_id.raw()
      ),
    };
    if scope.parent.is_some() {
      for id in scope.bindings.clone() {
        let binding = tree.binding_mut(id);
        if binding.keeps_declared_name() {
          continue;
        }
        binding.long_name = format!("{}${}${}", path, binding.name, counter);
        counter += 1;
      }
    }
    paths[scope_id.raw() as usize] = path;
  }
}

pub(crate) fn assign_short_names(tree: &mut ScopeTree) {
  let mut visible: Vec<HashSet<String>> = vec![HashSet::new(); tree.scopes.len()];
  for scope_id in tree.preorder() {
    let mut taken = match tree.scope(scope_id).parent {
      Some(parent) => visible[parent.raw() as usize].clone(),
      None => tree.globals.iter().cloned().collect(),
    };
    let mut own = HashSet::new();
    for id in tree.scope(scope_id).bindings.clone() {
      let binding = tree.binding_mut(id);
      let mut name = binding.name.clone();
      if !binding.keeps_declared_name() {
        let mut n = 1;
        while taken.contains(&name) || own.contains(&name) {
          name = format!("{}${}", binding.name, n);
          n += 1;
        }
      }
      binding.short_name = name.clone();
      own.insert(name);
    }
    taken.extend(own);
    visible[scope_id.raw() as usize] = taken;
  }
}

#[derive(VisitorMut)]
#[visitor(Node(enter))]
struct Renamer<'a> {
  tree: &'a ScopeTree,
  style: NameStyle,
}

impl Renamer<'_> {
  fn enter_node(&mut self, node: &mut Node) {
    if !matches!(node.kind, Kind::Ident | Kind::BindingIdent) {
      return;
    }
    if let Some(id) = node.binding {
      let binding = self.tree.binding(id);
      node.text = match self.style {
        NameStyle::Short => binding.short_name.clone(),
        NameStyle::Long => binding.long_name.clone(),
      };
    }
  }
}

/// Rewrites every bound identifier to the name chosen by `style`.
pub fn apply_names(module: &mut Node, tree: &ScopeTree, style: NameStyle) {
  let mut renamer = Renamer { tree, style };
  module.drive_mut(&mut renamer);
}

