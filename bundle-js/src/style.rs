//! Compile-time extraction of `StyleSheet(...)` calls into CSS rules.

use sha2::Digest;
use sha2::Sha256;
use std::collections::BTreeMap;
use std::path::Path;
use syntax_js::ast::Kind;
use syntax_js::ast::Node;
use syntax_js::literal::quote_string;
use syntax_js::literal::string_value;
use syntax_js::loc::Loc;

const STYLE_CALLEE: &str = "StyleSheet";

/// First 8 hex digits of the SHA-256 of the file path.
pub fn style_uid(path: &Path) -> String {
  let digest = Sha256::digest(path.to_string_lossy().as_bytes());
  digest[..4].iter().map(|b| format!("{b:02x}")).collect()
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExtractedStyles {
  /// CSS rules in source order.
  pub rules: Vec<String>,
  /// Calls left in place because their arguments are not literal.
  pub unconverted: Vec<Loc>,
}

struct Extractor {
  uid: String,
  count: usize,
  /// `style.<name>` to generated class name.
  named: BTreeMap<String, String>,
  out: ExtractedStyles,
}

fn key_text(key: &Node) -> Option<String> {
  match key.kind {
    Kind::PropKey if key.text.starts_with(['"', '\'']) => string_value(&key.text),
    Kind::PropKey => Some(key.text.clone()),
    _ => None,
  }
}

/// Flattens nested objects into `outer-inner` keys, keeping first-seen order.
fn flatten(prefix: &str, object: &Node, out: &mut Vec<(String, String)>) -> Option<()> {
  for prop in object.children.iter() {
    if !prop.is(Kind::Property) {
      return None;
    }
    let key = format!("{prefix}{}", key_text(prop.child(0))?);
    let value = prop.child(1);
    let text = match value.kind {
      Kind::Object => {
        flatten(&format!("{key}-"), value, out)?;
        continue;
      }
      Kind::Ident | Kind::Number => value.text.clone(),
      Kind::String => string_value(&value.text)?,
      _ => return None,
    };
    match out.iter_mut().find(|(k, _)| *k == key) {
      Some(entry) => entry.1 = text,
      None => out.push((key, text)),
    }
  }
  Some(())
}

fn rule(selector: &str, object: &Node) -> Option<String> {
  let mut decls = Vec::new();
  flatten("", object, &mut decls)?;
  let body: Vec<String> = decls
    .iter()
    .map(|(k, v)| format!("  {k}: {v};"))
    .collect();
  Some(format!("{selector} {{\n{}\n}}", body.join("\n")))
}

impl Extractor {
  fn selector_text(&self, selector: &Node) -> Option<String> {
    match selector.kind {
      Kind::String => string_value(&selector.text),
      Kind::Template => {
        let mut text = String::new();
        for (i, part) in selector.children.iter().enumerate() {
          if i % 2 == 0 {
            text.push_str(&part.text);
            continue;
          }
          if !part.is(Kind::Member) || !part.child(0).is(Kind::Ident) {
            return None;
          }
          let name = format!("{}.{}", part.child(0).text, part.child(1).text);
          text.push_str(self.named.get(&name)?);
        }
        Some(text)
      }
      _ => None,
    }
  }

  /// Replacement string literal for a `StyleSheet` call, if it can be computed statically.
  fn convert(&mut self, call: &Node, style_name: Option<&str>) -> Option<String> {
    let args = &call.child(1).children;
    match args.as_slice() {
      [object] if object.is(Kind::Object) => {
        let class = format!("dcs-{}-{}", self.uid, self.count);
        let rule = rule(&format!(".{class}"), object)?;
        self.count += 1;
        self.out.rules.push(rule);
        if let Some(name) = style_name {
          self.named.insert(format!("style.{name}"), class.clone());
        }
        Some(class)
      }
      [selector, object] if object.is(Kind::Object) => {
        let selector = self.selector_text(selector)?;
        let rule = rule(&selector, object)?;
        self.count += 1;
        self.out.rules.push(rule);
        Some(selector)
      }
      _ => None,
    }
  }

  fn visit(&mut self, node: &mut Node, style_name: Option<&str>) {
    let is_style_call = node.is(Kind::Call)
      && node.text.is_empty()
      && node.child(0).is(Kind::Ident)
      && node.child(0).text == STYLE_CALLEE;
    if is_style_call {
      match self.convert(node, style_name) {
        Some(value) => {
          *node = Node::with_text(Kind::String, node.loc, quote_string(&value));
          return;
        }
        None => self.out.unconverted.push(node.loc),
      }
    }
    if node.is(Kind::Property) {
      let name = key_text(node.child(0));
      self.visit(node.child_mut(1), name.as_deref());
      return;
    }
    for c in node.children.iter_mut() {
      self.visit(c, None);
    }
  }
}

/// Replaces convertible `StyleSheet` calls in `module` by their class name or selector.
pub fn extract_styles(module: &mut Node, path: &Path) -> ExtractedStyles {
  let mut extractor = Extractor {
    uid: style_uid(path),
    count: 0,
    named: BTreeMap::new(),
    out: ExtractedStyles::default(),
  };
  extractor.visit(module, None);
  extractor.out
}

#[cfg(test)]
mod tests {
  use super::extract_styles;
  use super::style_uid;
  use render_js::render;
  use render_js::RenderOptions;
  use std::path::Path;
  use syntax_js::parse;

  #[test]
  fn uid_is_stable_hex() {
    let uid = style_uid(Path::new("/src/app.js"));
    assert_eq!(uid.len(), 8);
    assert!(uid.chars().all(|c| c.is_ascii_hexdigit()));
    assert_eq!(uid, style_uid(Path::new("/src/app.js")));
    assert_ne!(uid, style_uid(Path::new("/src/other.js")));
  }

  #[test]
  fn extracts_classes_and_selectors() {
    let path = Path::new("/src/app.js");
    let uid = style_uid(path);
    let mut module = parse(
      "const style = {
  button: StyleSheet({color: 'red', border: {width: 1, style: solid}}),
  hover: StyleSheet(`.${style.button}:hover`, {color: \"blue\"}),
};
",
    )
    .unwrap();
    let styles = extract_styles(&mut module, path);
    assert!(styles.unconverted.is_empty());
    assert_eq!(
      styles.rules,
      vec![
        format!(".dcs-{uid}-0 {{\n  color: red;\n  border-width: 1;\n  border-style: solid;\n}}"),
        format!(".dcs-{uid}-0:hover {{\n  color: blue;\n}}"),
      ]
    );
    let out = render(&module, &RenderOptions::minified());
    assert_eq!(
      out,
      format!("const style={{button:\"dcs-{uid}-0\",hover:\".dcs-{uid}-0:hover\"}};")
    );
  }

  #[test]
  fn dynamic_styles_are_left_alone() {
    let mut module = parse("const s = StyleSheet({color: pick()}); StyleSheet(1, 2, 3);").unwrap();
    let styles = extract_styles(&mut module, Path::new("a.js"));
    assert!(styles.rules.is_empty());
    assert_eq!(styles.unconverted.len(), 2);
  }
}
