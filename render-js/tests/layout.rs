use render_js::render;
use render_js::RenderOptions;
use syntax_js::parse;

mod util;

fn pretty(source: &str) -> String {
  render(&parse(source).unwrap(), &RenderOptions::default())
}

fn minified(source: &str) -> String {
  render(&parse(source).unwrap(), &RenderOptions::minified())
}

#[test]
fn pretty_layout() {
  util::assert_text_eq(
    "function f(a, b) {\n  if (a) {\n    return b;\n  } else return a + b;\n}\n",
    &pretty("function f(a, b) { if (a) { return b; } else return a + b; }"),
  );
  util::assert_text_eq(
    "x = {a: 1, b, [c]: d, ...e};\n",
    &pretty("x = {a: 1, b, [c]: d, ...e}"),
  );
  util::assert_text_eq("let x = /a/ / 1;\n", &pretty("let x = /a/ / 1"));
}

#[test]
fn minified_uses_only_required_whitespace() {
  assert_eq!(
    minified("function f(a, b) { if (a) { return b; } else return a + b; }"),
    "function f(a,b){if(a){return b;}else return a+b;}"
  );
  assert_eq!(minified("let x = /a/ / 1;"), "let x=/a/ /1;");
  assert_eq!(minified("a + +b; a - -b;"), "a+ +b;a- -b;");
  assert_eq!(minified("x = 1 .y;"), "x=1 .y;");
  assert_eq!(minified("tag`a${b}c${ {d} }`"), "tag`a${b}c${{d}}`;");
}

#[test]
fn precedence_parentheses() {
  assert_eq!(minified("(a + b) * c"), "(a+b)*c;");
  assert_eq!(minified("a + (b * c)"), "a+b*c;");
  assert_eq!(minified("(-a) ** b"), "(-a)**b;");
  assert_eq!(minified("(a ?? b) || c"), "(a??b)||c;");
  assert_eq!(minified("new (f())()"), "new(f())();");
}

#[test]
fn statement_start_hazards() {
  assert_eq!(minified("({}).x"), "({}.x);");
  assert_eq!(minified("(function () {})()"), "(function(){}());");
  assert_eq!(minified("(class {})"), "(class{});");
  assert_eq!(minified("x => ({a: 1})"), "(x)=>({a:1});");
}
