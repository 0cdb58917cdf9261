use serde_json::json;
use serde_json::to_string_pretty;
use serde_json::Value;
use similar::ChangeTag;
use similar::TextDiff;
use syntax_js::parse;
use syntax_js::surface::extract_surface;

fn strip_locs(value: &mut Value) {
  match value {
    Value::Object(map) => {
      map.remove("loc");
      for v in map.values_mut() {
        strip_locs(v);
      }
    }
    Value::Array(items) => {
      for item in items {
        strip_locs(item);
      }
    }
    _ => {}
  }
}

fn assert_tree(source: &str, expected: Value) {
  let mut module = parse(source).unwrap();
  extract_surface(&mut module).unwrap();
  let mut actual = serde_json::to_value(&module).unwrap();
  strip_locs(&mut actual);
  if actual == expected {
    return;
  }
  let expected_fmt = to_string_pretty(&expected).unwrap();
  let actual_fmt = to_string_pretty(&actual).unwrap();
  let mut msg = format!("unexpected tree for {source:?}:\n");
  for change in TextDiff::from_lines(&expected_fmt, &actual_fmt).iter_all_changes() {
    let sign = match change.tag() {
      ChangeTag::Delete => "-",
      ChangeTag::Insert => "+",
      ChangeTag::Equal => " ",
    };
    msg.push_str(sign);
    msg.push_str(change.as_str().unwrap());
    if change.missing_newline() {
      msg.push('\n');
    }
  }
  panic!("{msg}");
}

#[test]
fn exported_declaration() {
  assert_tree(
    "include 'a.js';\nexport const x = f(1);\n",
    json!({
      "$t": "Module",
      "children": [{
        "$t": "VarDecl",
        "text": "const",
        "children": [{
          "$t": "Declarator",
          "children": [
            {"$t": "BindingIdent", "text": "x"},
            {
              "$t": "Call",
              "children": [
                {"$t": "Ident", "text": "f"},
                {"$t": "Args", "children": [{"$t": "Number", "text": "1"}]},
              ],
            },
          ],
        }],
      }],
    }),
  );
}

#[test]
fn member_assignment() {
  assert_tree(
    "a.b = [c];",
    json!({
      "$t": "Module",
      "children": [{
        "$t": "ExprStmt",
        "children": [{
          "$t": "Assign",
          "text": "=",
          "children": [
            {
              "$t": "Member",
              "text": ".",
              "children": [
                {"$t": "Ident", "text": "a"},
                {"$t": "PropKey", "text": "b"},
              ],
            },
            {"$t": "Array", "children": [{"$t": "Ident", "text": "c"}]},
          ],
        }],
      }],
    }),
  );
}

#[test]
fn positions_are_one_based_in_json() {
  let module = parse("\n  let a;").unwrap();
  let value = serde_json::to_value(&module.children[0]).unwrap();
  assert_eq!(value["loc"], json!([2, 3]));
}
