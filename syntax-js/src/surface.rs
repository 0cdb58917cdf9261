use crate::ast::Kind;
use crate::ast::Node;
use crate::ast::NodeFlags;
use crate::error::SyntaxError;
use crate::error::SyntaxErrorType;
use crate::error::SyntaxResult;
use std::collections::BTreeMap;
use std::collections::BTreeSet;

/// Include/import/export declarations of one file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Surface {
  /// Included file paths as written, in source order without duplicates.
  pub includes: Vec<String>,
  /// Module name to `{imported name: local name}`.
  pub imports: BTreeMap<String, BTreeMap<String, String>>,
  pub exports: BTreeSet<String>,
  /// Modules whose exports are all re-exported by `export * from`.
  pub star_exports: BTreeSet<String>,
}

/// Imported name standing for every export of a module.
pub const STAR: &str = "*";

/// Calls `f` on every `BindingIdent` of a declaration target, skipping default values and
/// computed keys.
pub fn for_each_pattern_binding<'n>(target: &'n Node, f: &mut impl FnMut(&'n Node)) {
  match target.kind {
    Kind::BindingIdent => f(target),
    Kind::AssignPattern | Kind::Rest => for_each_pattern_binding(target.child(0), f),
    Kind::PatternProp => for_each_pattern_binding(target.child(1), f),
    Kind::ArrayPattern | Kind::ObjectPattern => {
      for c in target.children.iter() {
        for_each_pattern_binding(c, f);
      }
    }
    _ => {}
  }
}

fn for_each_pattern_binding_mut(target: &mut Node, f: &mut impl FnMut(&mut Node)) {
  match target.kind {
    Kind::BindingIdent => f(target),
    Kind::AssignPattern | Kind::Rest => for_each_pattern_binding_mut(target.child_mut(0), f),
    Kind::PatternProp => for_each_pattern_binding_mut(target.child_mut(1), f),
    Kind::ArrayPattern | Kind::ObjectPattern => {
      for c in target.children.iter_mut() {
        for_each_pattern_binding_mut(c, f);
      }
    }
    _ => {}
  }
}

/// Names declared by a top-level declaration statement.
pub fn declared_names(decl: &Node) -> Vec<String> {
  let mut names = Vec::new();
  match decl.kind {
    Kind::VarDecl => {
      for d in decl.children.iter() {
        for_each_pattern_binding(d.child(0), &mut |b| names.push(b.text.clone()));
      }
    }
    Kind::FuncDecl | Kind::ClassDecl if !decl.child(0).is_absent() => {
      names.push(decl.child(0).text.clone());
    }
    _ => {}
  }
  names
}

fn flag_exported(decl: &mut Node, exports: &BTreeSet<String>) {
  let mut flag = |b: &mut Node| {
    if exports.contains(&b.text) {
      b.flags.insert(NodeFlags::EXPORTED);
    }
  };
  match decl.kind {
    Kind::VarDecl => {
      for d in decl.children.iter_mut() {
        for_each_pattern_binding_mut(d.child_mut(0), &mut flag);
      }
    }
    Kind::FuncDecl | Kind::ClassDecl => flag(decl.child_mut(0)),
    _ => {}
  }
}

/// Removes the module surface declarations from a parsed file and returns them. `export <decl>`
/// is replaced by the declaration, whose exported names get the `EXPORTED` flag.
pub fn extract_surface(module: &mut Node) -> SyntaxResult<Surface> {
  let mut surface = Surface::default();
  let body = std::mem::take(&mut module.children);
  let mut kept = Vec::with_capacity(body.len());
  for stmt in body {
    match stmt.kind {
      Kind::Include => {
        if !surface.includes.contains(&stmt.text) {
          surface.includes.push(stmt.text);
        }
      }
      Kind::Import => {
        let names = surface.imports.entry(stmt.text.clone()).or_default();
        for spec in stmt.children.iter() {
          names.insert(spec.text.clone(), spec.child(0).text.clone());
        }
      }
      Kind::ExportNames => {
        for spec in stmt.children.iter() {
          surface.exports.insert(spec.text.clone());
        }
      }
      Kind::ExportStar => {
        surface
          .imports
          .entry(stmt.text.clone())
          .or_default()
          .insert(STAR.to_string(), STAR.to_string());
        surface.star_exports.insert(stmt.text);
      }
      Kind::Export => {
        let Node {
          loc, mut children, ..
        } = stmt;
        let decl = children
          .pop()
          .ok_or_else(|| SyntaxError::new(SyntaxErrorType::AnonymousExport, loc, None))?;
        let names = declared_names(&decl);
        if names.is_empty() {
          return Err(SyntaxError::new(SyntaxErrorType::AnonymousExport, loc, None));
        }
        surface.exports.extend(names);
        kept.push(decl);
      }
      _ => kept.push(stmt),
    }
  }
  for stmt in kept.iter_mut() {
    flag_exported(stmt, &surface.exports);
  }
  module.children = kept;
  Ok(surface)
}

#[cfg(test)]
mod tests {
  use super::extract_surface;
  use super::STAR;
  use crate::ast::Kind;
  use crate::ast::NodeFlags;
  use crate::parse;

  #[test]
  fn extracts_all_forms() {
    let mut module = parse(
      "include 'util.js';
import './other.js';
import {a, b as c} from 'pkg.one';
import pkg.two with {d};
from pkg.three import {e};
import module pkg.four;
export const x = 1, {y} = o;
export function f() {}
export {g};
var g = 2;
",
    )
    .unwrap();
    let surface = extract_surface(&mut module).unwrap();
    assert_eq!(surface.includes, vec!["util.js", "./other.js"]);
    assert_eq!(surface.imports["pkg.one"]["b"], "c");
    assert_eq!(surface.imports["pkg.one"]["a"], "a");
    assert_eq!(surface.imports["pkg.two"]["d"], "d");
    assert_eq!(surface.imports["pkg.three"]["e"], "e");
    assert!(surface.imports["pkg.four"].is_empty());
    assert_eq!(
      surface.exports.iter().cloned().collect::<Vec<_>>(),
      vec!["f", "g", "x", "y"]
    );
    let kinds: Vec<Kind> = module.children.iter().map(|c| c.kind).collect();
    assert_eq!(kinds, vec![Kind::VarDecl, Kind::FuncDecl, Kind::VarDecl]);
    let g = module.children[2].child(0).child(0);
    assert!(g.flags.contains(NodeFlags::EXPORTED));
  }

  #[test]
  fn braced_file_imports_name_modules() {
    let mut module = parse("import {h} from 'vendor/dom.js';\nimport './local.js';\n").unwrap();
    let surface = extract_surface(&mut module).unwrap();
    assert_eq!(surface.includes, vec!["./local.js"]);
    assert_eq!(surface.imports["vendor/dom.js"]["h"], "h");
  }

  #[test]
  fn star_forms_import_every_export() {
    let mut module = parse(
      "import * from 'app.api';\nfrom app.util import *;\nexport * from 'app.widgets';\n",
    )
    .unwrap();
    let surface = extract_surface(&mut module).unwrap();
    assert!(module.children.is_empty());
    for name in ["app.api", "app.util", "app.widgets"] {
      assert_eq!(surface.imports[name][STAR], STAR);
    }
    assert_eq!(
      surface.star_exports.iter().cloned().collect::<Vec<_>>(),
      vec!["app.widgets"]
    );
    assert!(surface.exports.is_empty());
  }

  #[test]
  fn rejects_anonymous_default_export() {
    assert!(parse("export default function () {}").is_err());
    assert!(parse("export default 1 + 2;").is_err());
    assert!(parse("function f() { include 'x.js'; }").is_err());
  }
}
