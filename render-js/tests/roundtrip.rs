use render_js::render;
use render_js::RenderOptions;
use syntax_js::parse;

mod util;

fn assert_roundtrip(source: &str) {
  let original = parse(source).expect("source should parse");
  for options in [RenderOptions::default(), RenderOptions::minified()] {
    let rendered = render(&original, &options);
    let reparsed = parse(&rendered)
      .unwrap_or_else(|err| panic!("rendered code should parse: {err}\n{rendered}"));
    assert!(
      original.structurally_eq(&reparsed),
      "tree changed after rendering {source:?} as {rendered:?}\nbefore: {original:?}\nafter: {reparsed:?}"
    );
    util::assert_text_eq(&rendered, &render(&reparsed, &options));
  }
}

#[test]
fn statements_roundtrip() {
  assert_roundtrip(
    r#"
var a = 1, [b, , c = 2, ...d] = e, {f, g: {h}, ...i} = j;
let k;
const l = function* named(m = 1, ...n) { yield; yield* m; };
async function o() { await p; for (const q of r) {} }
class S extends T.U { constructor() { super(); } static v = 1; get w() { return this.x; } x = 2; }
label: for (let y = 0; y < 10; y++) { if (y) continue label; else break; }
for (z in o) ;
for (const [k2, v2] of entries) { }
while (true) { do x(); while (false); }
try { throw new Error("e"); } catch ({message}) { } finally { debugger; }
switch (a) { case 1: case 2: b(); break; default: c(); }
"#,
  );
}

#[test]
fn expressions_roundtrip() {
  assert_roundtrip(
    r#"
x = a ? b : c ? d : e;
x = (a, b), c;
x = (a || b) && c;
x = (a ?? b) || c;
x = a ?? (b && c);
x = (-a) ** b;
x = a ** b ** c;
x = (a ** b) ** c;
x = a - (b - c);
x = typeof a === "string" && !(b instanceof C);
x = new (f())();
x = new (a.b().c)();
x = (new A).b;
x = new new A()();
x = a?.b?.[c]?.(d);
x = [, a, , ...b, ,];
x = {a, b: 1, [c]: 2, "d": 3, 4: 5, get e() { return 1; }, set e(v) {}, async *f() {}, ...g};
x = async (a) => { await a; };
x = (a, {b}) => ({b});
x = tag`a${b}c${{d}}`;
x = `plain`;
x = /re/g.test(a) / 2;
x = 1..toString() + 1 .y;
x = a++ + +b - -c - --d;
x = void 0, delete a[b];
({a} = b);
[a, b] = [b, a];
(function () {})();
(class {});
x = function () {} ? 1 : 2;
"#,
  );
}

#[test]
fn dangling_else_is_braced() {
  let module = parse("if (a) { if (b) c(); } else d();").unwrap();
  let rendered = render(&module, &RenderOptions::minified());
  assert_eq!(rendered, "if(a){if(b)c();}else d();");
}

#[test]
fn in_operator_inside_for_init_is_parenthesised() {
  let module = parse("for (var i = (\"x\" in o); ;) ;").unwrap();
  let rendered = render(&module, &RenderOptions::minified());
  assert_eq!(rendered, "for(var i=(\"x\"in o);;);");
  assert!(parse(&rendered).unwrap().structurally_eq(&module));
}
