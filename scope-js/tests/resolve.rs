use render_js::render;
use render_js::RenderOptions;
use scope_js::apply_names;
use scope_js::resolve;
use scope_js::scope::RefClass;
use scope_js::scope::ScopeId;
use scope_js::NameStyle;
use scope_js::Resolution;
use scope_js::ResolveOptions;
use syntax_js::ast::Kind;
use syntax_js::ast::Node;
use syntax_js::parse;

fn resolved(source: &str, path: &str) -> (Node, Resolution) {
  let mut module = parse(source).unwrap();
  let options = ResolveOptions {
    path: path.to_string(),
    strict: false,
  };
  let resolution = resolve(&mut module, &options).unwrap();
  (module, resolution)
}

fn check_every_ident_resolved(node: &Node, res: &Resolution) {
  if node.is(Kind::Ident) {
    assert!(
      node.binding.is_some() || res.scopes.globals.contains(&node.text),
      "`{}` neither bound nor global",
      node.text
    );
  }
  if node.is(Kind::BindingIdent) {
    assert!(node.binding.is_some(), "declaration `{}` unbound", node.text);
  }
  for c in node.children.iter() {
    check_every_ident_resolved(c, res);
  }
}

#[test]
fn captured_variables_propagate_through_intermediate_functions() {
  let (_, res) = resolved(
    "function a() { var x = 1; function b() { function c() { return x; } } return x; }",
    "t.js",
  );
  let tree = &res.scopes;
  let (a, b, c) = (ScopeId(1), ScopeId(2), ScopeId(3));
  assert_eq!(tree.cell_var_names(a), vec!["x"]);
  assert!(tree.free_var_names(a).is_empty());
  // `b` never mentions `x` but must still carry it to `c`.
  assert_eq!(tree.free_var_names(b), vec!["x"]);
  assert_eq!(tree.free_var_names(c), vec!["x"]);
  assert!(tree.cell_var_names(c).is_empty());

  let classes: Vec<RefClass> = tree.references.iter().map(|r| tree.classify(r)).collect();
  assert_eq!(classes, vec![RefClass::Free, RefClass::Cell]);
}

#[test]
fn block_scoped_names_do_not_leak() {
  let (_, res) = resolved(
    "function f() { { let y = 1; } return y; }",
    "t.js",
  );
  let tree = &res.scopes;
  assert!(tree.globals.contains("y"));
  assert_eq!(tree.classify(&tree.references[0]), RefClass::Global);
}

#[test]
fn arrow_and_class_members_capture() {
  let (_, res) = resolved(
    "function f(n) { return () => class { m() { return n; } }; }",
    "t.js",
  );
  let tree = &res.scopes;
  assert_eq!(tree.cell_var_names(ScopeId(1)), vec!["n"]);
  let free: Vec<ScopeId> = (0..tree.scopes.len() as u32)
    .map(ScopeId)
    .filter(|s| !tree.free_var_names(*s).is_empty())
    .collect();
  // Arrow and method are function scopes; the class body is a block.
  assert_eq!(free.len(), 2);
}

#[test]
fn every_identifier_is_bound_or_global() {
  let source = "
var counter = 0;
function tick(step, ...rest) {
  let {a, b: [c = step]} = rest[0] || {};
  for (let i = 0; i < a; i++) counter += c;
  try { missing(); } catch (e) { counter = e ? counter : 0; }
  label: for (const k in window) { if (k) break label; }
  return function inner() { return inner.name + counter; };
}
class Widget extends Base { static make() { return new Widget(); } }
";
  let (module, res) = resolved(source, "widget.js");
  check_every_ident_resolved(&module, &res);
  assert!(res.scopes.globals.contains("missing"));
  assert!(res.scopes.globals.contains("Base"));
  assert!(!res.scopes.globals.contains("counter"));
}

#[test]
fn short_names_only_rename_shadowing_bindings() {
  let (mut module, res) = resolved(
    "var x; function f() { var x; var y; function g() { var x; return x + y; } }",
    "t.js",
  );
  let tree = &res.scopes;
  let short = |scope: u32, name: &str| {
    let id = tree.declared(ScopeId(scope), name).unwrap();
    tree.binding(id).short_name.clone()
  };
  assert_eq!(short(0, "x"), "x");
  assert_eq!(short(1, "x"), "x$1");
  assert_eq!(short(1, "y"), "y");
  assert_eq!(short(2, "x"), "x$2");

  apply_names(&mut module, tree, NameStyle::Short);
  let out = render(&module, &RenderOptions::minified());
  assert!(out.contains("var x$2;return x$2+y;"), "{out}");
}

#[test]
fn long_names_are_scope_qualified() {
  let (mut module, res) = resolved(
    "var top; function f(a) { var b; return function g() { return a + b; }; }",
    "app/main.js",
  );
  let tree = &res.scopes;
  let long = |scope: u32, name: &str| {
    let id = tree.declared(ScopeId(scope), name).unwrap();
    tree.binding(id).long_name.clone()
  };
  assert_eq!(long(0, "top"), "top");
  assert_eq!(long(0, "f"), "f");
  assert_eq!(long(1, "a"), "app_main_js_f1$a$0");
  assert_eq!(long(1, "b"), "app_main_js_f1$b$1");
  assert_eq!(long(2, "g"), "app_main_js_f1_g2$g$2");

  apply_names(&mut module, tree, NameStyle::Long);
  let out = render(&module, &RenderOptions::minified());
  assert!(
    out.contains("return app_main_js_f1$a$0+app_main_js_f1$b$1;"),
    "{out}"
  );
}
