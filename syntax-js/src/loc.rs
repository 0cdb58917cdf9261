use memchr::memchr_iter;
use serde::Serialize;
use std::cmp::max;
use std::cmp::min;

/// Identifies which loaded source a node came from.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize)]
pub struct SourceId(pub u32);

impl SourceId {
  /// Used by nodes created by the toolchain itself (wrappers, static data).
  pub const SYNTHETIC: SourceId = SourceId(u32::MAX);

  pub fn is_synthetic(self) -> bool {
    self == SourceId::SYNTHETIC
  }

  pub fn raw(self) -> u32 {
    self.0
  }
}

impl Default for SourceId {
  fn default() -> Self {
    SourceId(0)
  }
}

/// Position of a node. Both `line` and `column` are 0-based; `column` counts chars.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Serialize)]
pub struct Loc {
  pub source: SourceId,
  pub line: u32,
  pub column: u32,
}

impl Loc {
  pub fn new(source: SourceId, line: u32, column: u32) -> Loc {
    Loc {
      source,
      line,
      column,
    }
  }

  pub fn synthetic() -> Loc {
    Loc::new(SourceId::SYNTHETIC, 0, 0)
  }

  pub fn is_synthetic(&self) -> bool {
    self.source.is_synthetic()
  }
}

/// A half-open byte range into the text being lexed.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
pub struct Span(pub usize, pub usize);

impl Span {
  pub fn len(&self) -> usize {
    self.1 - self.0
  }

  pub fn is_empty(&self) -> bool {
    self.0 >= self.1
  }

  pub fn extend(self, other: Span) -> Span {
    Span(min(self.0, other.0), max(self.1, other.1))
  }
}

/// Maps byte offsets to line/column pairs.
pub struct LineIndex {
  line_starts: Vec<usize>,
}

impl LineIndex {
  pub fn new(source: &str) -> LineIndex {
    let mut line_starts = vec![0];
    line_starts.extend(memchr_iter(b'\n', source.as_bytes()).map(|i| i + 1));
    LineIndex { line_starts }
  }

  pub fn line_count(&self) -> usize {
    self.line_starts.len()
  }

  /// Returns the 0-based line and char column of `offset`.
  pub fn position(&self, source: &str, offset: usize) -> (u32, u32) {
    let offset = min(offset, source.len());
    let line = match self.line_starts.binary_search(&offset) {
      Ok(line) => line,
      Err(next) => next - 1,
    };
    let start = self.line_starts[line];
    let column = source
      .get(start..offset)
      .map(|prefix| prefix.chars().count())
      .unwrap_or(offset - start);
    (line as u32, column as u32)
  }

  pub fn loc(&self, source: &str, id: SourceId, offset: usize) -> Loc {
    let (line, column) = self.position(source, offset);
    Loc::new(id, line, column)
  }
}

#[cfg(test)]
mod tests {
  use super::LineIndex;

  #[test]
  fn positions_follow_newlines() {
    let src = "ab\ncd\n\nef";
    let index = LineIndex::new(src);
    assert_eq!(index.line_count(), 4);
    assert_eq!(index.position(src, 0), (0, 0));
    assert_eq!(index.position(src, 4), (1, 1));
    assert_eq!(index.position(src, 6), (2, 0));
    assert_eq!(index.position(src, 8), (3, 1));
  }

  #[test]
  fn columns_count_chars_not_bytes() {
    let src = "é = 1";
    let index = LineIndex::new(src);
    assert_eq!(index.position(src, "é ".len()), (0, 2));
  }
}
