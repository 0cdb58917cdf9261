use similar::ChangeTag;
use similar::TextDiff;

/// Panics with a line diff when `actual` differs from `expected`.
pub fn assert_text_eq(expected: &str, actual: &str) {
  if expected == actual {
    return;
  }
  let mut report = String::new();
  for change in TextDiff::from_lines(expected, actual).iter_all_changes() {
    let sign = match change.tag() {
      ChangeTag::Delete => "-",
      ChangeTag::Insert => "+",
      ChangeTag::Equal => " ",
    };
    report.push_str(&format!("{sign}{change}"));
    if change.missing_newline() {
      report.push('\n');
    }
  }
  panic!("rendered text differs:\n{report}");
}
