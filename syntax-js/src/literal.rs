//! Conversions between literal source text and values.

/// Decodes a quoted string literal (`'...'` or `"..."`) to its value.
/// Returns `None` for malformed escapes.
pub fn string_value(raw: &str) -> Option<String> {
  let mut chars = raw.chars();
  let quote = chars.next()?;
  if !matches!(quote, '\'' | '"') || !raw.ends_with(quote) || raw.len() < 2 {
    return None;
  }
  let body = &raw[1..raw.len() - 1];
  let mut out = String::with_capacity(body.len());
  let mut it = body.chars().peekable();
  while let Some(c) = it.next() {
    if c != '\\' {
      out.push(c);
      continue;
    }
    let escaped = it.next()?;
    match escaped {
      'n' => out.push('\n'),
      'r' => out.push('\r'),
      't' => out.push('\t'),
      'b' => out.push('\u{8}'),
      'f' => out.push('\u{c}'),
      'v' => out.push('\u{b}'),
      '0' if !it.peek().is_some_and(|c| c.is_ascii_digit()) => out.push('\0'),
      'x' => {
        let hex: String = [it.next()?, it.next()?].iter().collect();
        out.push(char::from_u32(u32::from_str_radix(&hex, 16).ok()?)?);
      }
      'u' => {
        let code = if it.peek() == Some(&'{') {
          it.next();
          let mut hex = String::new();
          loop {
            match it.next()? {
              '}' => break,
              c => hex.push(c),
            }
          }
          u32::from_str_radix(&hex, 16).ok()?
        } else {
          let hex: String = [it.next()?, it.next()?, it.next()?, it.next()?]
            .iter()
            .collect();
          u32::from_str_radix(&hex, 16).ok()?
        };
        match char::from_u32(code) {
          Some(c) => out.push(c),
          // Lone surrogates cannot be represented in a Rust string.
          None => out.push('\u{FFFD}'),
        }
      }
      '\r' => {
        if it.peek() == Some(&'\n') {
          it.next();
        }
      }
      '\n' | '\u{2028}' | '\u{2029}' => {}
      other => out.push(other),
    }
  }
  Some(out)
}

/// Produces a double-quoted literal for `value`.
pub fn quote_string(value: &str) -> String {
  // JSON string syntax is a subset of JS string literal syntax.
  serde_json::Value::String(value.to_string()).to_string()
}

#[cfg(test)]
mod tests {
  use super::quote_string;
  use super::string_value;

  #[test]
  fn decodes_escapes() {
    assert_eq!(string_value(r"'a\'b'").as_deref(), Some("a'b"));
    assert_eq!(string_value(r#""\x41B\u{43}\n""#).as_deref(), Some("ABC\n"));
    assert_eq!(string_value("'a\\\nb'").as_deref(), Some("ab"));
    assert_eq!(string_value(r"'\q'").as_deref(), Some("q"));
    assert_eq!(string_value(r"'\x4'"), None);
    assert_eq!(string_value("abc"), None);
  }

  #[test]
  fn quotes_round_trip() {
    for value in ["", "plain", "it's \"quoted\"", "tab\tnewline\n", "\u{1F600}"] {
      assert_eq!(string_value(&quote_string(value)).as_deref(), Some(value));
    }
  }
}
