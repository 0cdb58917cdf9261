//! Isolation wrappers built around file and module bodies.
//!
//! Every node created here has a synthetic position, so source maps only point at user code.
//! Roots of dotted module paths are flagged `SYNTHETIC_GLOBAL`, which lets the minifier rename
//! them consistently across the whole bundle.

use serde_json::Map;
use serde_json::Value;
use std::collections::BTreeMap;
use std::collections::BTreeSet;
use syntax_js::ast::Kind;
use syntax_js::ast::Node;
use syntax_js::ast::NodeFlags;
use syntax_js::loc::Loc;
use syntax_js::loc::SourceId;
use syntax_js::parse_source;

fn node(kind: Kind, children: Vec<Node>) -> Node {
  Node::with_children(kind, Loc::synthetic(), children)
}

fn text(kind: Kind, text: &str) -> Node {
  Node::with_text(kind, Loc::synthetic(), text)
}

fn ident(name: &str) -> Node {
  text(Kind::Ident, name)
}

fn binding(name: &str) -> Node {
  text(Kind::BindingIdent, name)
}

fn member(object: Node, property: &str) -> Node {
  let mut n = node(Kind::Member, vec![object, text(Kind::PropKey, property)]);
  n.text = ".".to_string();
  n
}

fn call(callee: Node, args: Vec<Node>) -> Node {
  node(Kind::Call, vec![callee, node(Kind::Args, args)])
}

fn const_decl(target: Node, init: Node) -> Node {
  let mut decl = node(Kind::VarDecl, vec![node(Kind::Declarator, vec![target, init])]);
  decl.text = "const".to_string();
  decl
}

fn function_expr(params: Vec<Node>, body: Vec<Node>) -> Node {
  node(
    Kind::FuncExpr,
    vec![
      Node::absent(Loc::synthetic()),
      node(Kind::Params, params),
      node(Kind::Block, body),
    ],
  )
}

fn stmt(expr: Node) -> Node {
  node(Kind::ExprStmt, vec![expr])
}

/// `{a, b}` using shorthand properties.
fn shorthand_object(names: &BTreeSet<String>) -> Node {
  node(
    Kind::Object,
    names
      .iter()
      .map(|n| node(Kind::Property, vec![text(Kind::PropKey, n), ident(n)]))
      .collect(),
  )
}

fn exported_binding(name: &str) -> Node {
  binding(name).flag(NodeFlags::EXPORTED)
}

/// `a.b.c` with the root flagged as a synthetic global.
pub fn path_expr(dotted: &str) -> Node {
  let mut parts = dotted.split('.');
  let root = parts.next().unwrap_or(dotted);
  let mut expr = ident(root).flag(NodeFlags::SYNTHETIC_GLOBAL);
  for part in parts {
    expr = member(expr, part);
  }
  expr
}

/// Wraps the statements of one non-index file of a module:
/// `const [e1, e2] = (function () { ...; return [e1, e2]; })();`, or a bare invoked function when
/// the file exports nothing.
pub fn file_wrapper(body: Vec<Node>, exports: &BTreeSet<String>) -> Node {
  if exports.is_empty() {
    return stmt(call(function_expr(Vec::new(), body), Vec::new()));
  }
  let mut body = body;
  let returned = node(Kind::Array, exports.iter().map(|e| ident(e)).collect());
  body.push(node(Kind::Return, vec![returned]));
  let target = node(
    Kind::ArrayPattern,
    exports.iter().map(|e| exported_binding(e)).collect(),
  );
  const_decl(target, call(function_expr(Vec::new(), body), Vec::new()))
}

/// Inputs of one module wrapper.
pub struct ModuleParts<'a> {
  /// Dotted global name the module is published under.
  pub name: &'a str,
  /// Static data, wrapped files and the index file's statements.
  pub body: Vec<Node>,
  /// Dotted global name of each import source to `{imported: local}`.
  pub imports: &'a BTreeMap<String, BTreeMap<String, String>>,
  pub exports: &'a BTreeSet<String>,
  /// Another module is named `<name>.<sub>`, so the namespace object already exists and the
  /// exports are merged into it.
  pub merge: bool,
}

/// Local parameter name each import source is bound to: its last dotted segment.
pub fn import_parameters(
  imports: &BTreeMap<String, BTreeMap<String, String>>,
) -> Result<Vec<(String, &str)>, String> {
  let mut seen: BTreeMap<&str, &str> = BTreeMap::new();
  let mut params = Vec::with_capacity(imports.len());
  for source in imports.keys() {
    let param = source.rsplit('.').next().unwrap_or(source);
    if let Some(other) = seen.insert(param, source) {
      return Err(format!(
        "imports `{other}` and `{source}` would both be bound to `{param}`"
      ));
    }
    params.push((source.clone(), param));
  }
  Ok(params)
}

/// `name = (function (p1, p2) { "use strict"; const x = p1.x; ...; return {exports}; })(deps)`.
pub fn module_wrapper(parts: ModuleParts<'_>) -> Result<Node, String> {
  let params = import_parameters(parts.imports)?;
  let mut body = Vec::with_capacity(parts.body.len() + 2);
  body.push(stmt(text(Kind::String, "\"use strict\"")));
  for (source, param) in params.iter() {
    for (imported, local) in parts.imports[source].iter() {
      body.push(const_decl(binding(local), member(ident(param), imported)));
    }
  }
  body.extend(parts.body);
  body.push(node(Kind::Return, vec![shorthand_object(parts.exports)]));

  let function = function_expr(params.iter().map(|(_, p)| binding(p)).collect(), body);
  let args = params.iter().map(|(source, _)| path_expr(source)).collect();
  let invoked = call(function, args);
  let expr = if parts.merge {
    call(
      member(ident("Object"), "assign"),
      vec![path_expr(parts.name), invoked],
    )
  } else {
    let mut assign = node(Kind::Assign, vec![path_expr(parts.name), invoked]);
    assign.text = "=".to_string();
    assign
  };
  Ok(stmt(expr))
}

#[derive(Default)]
struct Namespace(BTreeMap<String, Namespace>);

impl Namespace {
  fn object(&self) -> Node {
    node(
      Kind::Object,
      self
        .0
        .iter()
        .map(|(k, v)| node(Kind::Property, vec![text(Kind::PropKey, k), v.object()]))
        .collect(),
    )
  }
}

/// Module names that have dotted descendants among `names`.
pub fn namespace_owners(names: &[String]) -> BTreeSet<String> {
  let mut owners = BTreeSet::new();
  for name in names {
    let mut prefix = String::new();
    let parts: Vec<&str> = name.split('.').collect();
    for part in &parts[..parts.len() - 1] {
      if !prefix.is_empty() {
        prefix.push('.');
      }
      prefix.push_str(part);
      owners.insert(prefix.clone());
    }
  }
  owners
}

/// `top = {sub: {leaf: {}}}` for every top-level name with dotted descendants.
pub fn namespace_statements(names: &[String]) -> Vec<Node> {
  let mut roots: BTreeMap<String, Namespace> = BTreeMap::new();
  for name in names {
    let mut parts = name.split('.');
    let Some(root) = parts.next() else {
      continue;
    };
    let mut ns = roots.entry(root.to_string()).or_default();
    for part in parts {
      ns = ns.0.entry(part.to_string()).or_default();
    }
  }
  roots
    .iter()
    .filter(|(_, ns)| !ns.0.is_empty())
    .map(|(root, ns)| {
      let mut assign = node(Kind::Assign, vec![path_expr(root), ns.object()]);
      assign.text = "=".to_string();
      stmt(assign)
    })
    .collect()
}

fn is_identifier(name: &str) -> bool {
  let mut chars = name.chars();
  chars
    .next()
    .is_some_and(|c| c.is_alphabetic() || c == '_' || c == '$')
    && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

/// `const key = <json>;` for every entry, declared as exported.
pub fn static_data_statements(data: &Map<String, Value>) -> Result<Vec<Node>, String> {
  let mut out = Vec::with_capacity(data.len());
  for (key, value) in data.iter() {
    if !is_identifier(key) {
      return Err(format!("static data key `{key}` is not an identifier"));
    }
    let source = format!("({value});");
    let mut parsed = parse_source(&source, SourceId::SYNTHETIC)
      .map_err(|err| format!("static data `{key}` is not a literal: {err}"))?;
    let value = parsed
      .children
      .pop()
      .and_then(|mut statement| statement.children.pop())
      .ok_or_else(|| format!("static data `{key}` is empty"))?;
    out.push(const_decl(exported_binding(key), value));
  }
  Ok(out)
}

/// Expression naming the entry module's first export, with the module path's root renamed the way
/// the minifier renamed it.
pub fn export_expression(
  module: &str,
  export: &str,
  renamed_globals: &BTreeMap<String, String>,
) -> String {
  let (root, rest) = match module.split_once('.') {
    Some((root, rest)) => (root, Some(rest)),
    None => (module, None),
  };
  let root = renamed_globals.get(root).map_or(root, |r| r.as_str());
  match rest {
    Some(rest) => format!("{root}.{rest}.{export}"),
    None => format!("{root}.{export}"),
  }
}

#[cfg(test)]
mod tests {
  use super::export_expression;
  use super::file_wrapper;
  use super::import_parameters;
  use super::module_wrapper;
  use super::namespace_owners;
  use super::namespace_statements;
  use super::static_data_statements;
  use super::ModuleParts;
  use render_js::render;
  use render_js::RenderOptions;
  use std::collections::BTreeMap;
  use std::collections::BTreeSet;
  use syntax_js::ast::Kind;
  use syntax_js::ast::Node;
  use syntax_js::parse;

  fn minified(stmts: Vec<Node>) -> String {
    let module = Node::with_children(Kind::Module, syntax_js::loc::Loc::synthetic(), stmts);
    render(&module, &RenderOptions::minified())
  }

  fn set(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|n| n.to_string()).collect()
  }

  #[test]
  fn file_wrappers() {
    let body = parse("const b = 2, a = 1; function f() {}").unwrap().children;
    assert_eq!(
      minified(vec![file_wrapper(body.clone(), &set(&["b", "a"]))]),
      "const[a,b]=function(){const b=2,a=1;function f(){}return[a,b];}();"
    );
    assert_eq!(
      minified(vec![file_wrapper(body, &BTreeSet::new())]),
      "(function(){const b=2,a=1;function f(){}}());"
    );
  }

  #[test]
  fn module_wrapper_unpacks_imports() {
    let mut imports = BTreeMap::new();
    imports.insert(
      "lib.util".to_string(),
      BTreeMap::from([("max".to_string(), "largest".to_string())]),
    );
    imports.insert("dom".to_string(), BTreeMap::new());
    let body = parse("const y = largest(1, 2);").unwrap().children;
    let wrapper = module_wrapper(ModuleParts {
      name: "app.main",
      body,
      imports: &imports,
      exports: &set(&["y"]),
      merge: false,
    })
    .unwrap();
    assert_eq!(
      minified(vec![wrapper]),
      "app.main=function(dom,util){\"use strict\";const largest=util.max;const y=largest(1,2);return{y};}(dom,lib.util);"
    );
  }

  #[test]
  fn merged_module_uses_object_assign() {
    let wrapper = module_wrapper(ModuleParts {
      name: "app",
      body: Vec::new(),
      imports: &BTreeMap::new(),
      exports: &set(&["run"]),
      merge: true,
    })
    .unwrap();
    assert_eq!(
      minified(vec![wrapper]),
      "Object.assign(app,function(){\"use strict\";return{run};}());"
    );
  }

  #[test]
  fn conflicting_parameter_names() {
    let mut imports = BTreeMap::new();
    imports.insert("a.util".to_string(), BTreeMap::new());
    imports.insert("b.util".to_string(), BTreeMap::new());
    let err = import_parameters(&imports).unwrap_err();
    assert!(err.contains("`a.util`") && err.contains("`b.util`"));
  }

  #[test]
  fn namespaces() {
    let names: Vec<String> = ["app.api", "app", "app.ui.widgets", "lib"]
      .iter()
      .map(|n| n.to_string())
      .collect();
    assert_eq!(
      minified(namespace_statements(&names)),
      "app={api:{},ui:{widgets:{}}};"
    );
    assert_eq!(namespace_owners(&names), set(&["app", "app.ui"]));
  }

  #[test]
  fn static_data() {
    let data = serde_json::json!({"version": "1.2", "limits": {"max": 3, "flags": [true, null]}});
    let stmts = static_data_statements(data.as_object().unwrap()).unwrap();
    assert_eq!(
      minified(stmts),
      "const limits={\"flags\":[true,null],\"max\":3};const version=\"1.2\";"
    );
    let bad = serde_json::json!({"not-ident": 1});
    assert!(static_data_statements(bad.as_object().unwrap()).is_err());
  }

  #[test]
  fn export_expressions() {
    let renamed = BTreeMap::from([("app".to_string(), "a".to_string())]);
    assert_eq!(export_expression("app.main", "run", &renamed), "a.main.run");
    assert_eq!(export_expression("app", "run", &BTreeMap::new()), "app.run");
  }
}
