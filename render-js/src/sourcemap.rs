//! Version 3 source maps with base64 VLQ mappings.

use crate::emitter::Mark;
use serde::Deserialize;
use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;

const BASE64_ALPHABET: &[u8; 64] =
  b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

const VLQ_SHIFT: u32 = 5;
const VLQ_CONTINUATION: u32 = 1 << VLQ_SHIFT;
const VLQ_MASK: u32 = VLQ_CONTINUATION - 1;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SourceMapError {
  #[error("invalid base64 digit {0:?} in mappings")]
  InvalidDigit(char),
  #[error("VLQ value ends in the middle of a quantum")]
  Truncated,
  #[error("VLQ value does not fit in 32 bits")]
  Overflow,
  #[error("segment has {0} fields, expected 1, 4 or 5")]
  SegmentArity(usize),
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SourceMap {
  pub version: u32,
  #[serde(default)]
  pub file: String,
  pub sources: Vec<String>,
  #[serde(default)]
  pub names: Vec<String>,
  pub mappings: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub sources_content: Option<Vec<String>>,
}

#[derive(Clone, Debug, Default)]
pub struct SourceMapOptions {
  pub file: String,
  /// Source paths, indexed by `SourceId`.
  pub sources: Vec<String>,
  pub sources_content: Option<Vec<String>>,
}

/// One decoded mapping segment with absolute values.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Segment {
  pub generated_column: u32,
  pub source: u32,
  pub line: u32,
  pub column: u32,
  pub name: Option<u32>,
}

/// Appends the VLQ encoding of `value` to `out`.
pub fn vlq_encode(value: i64, out: &mut String) {
  let mut rest = if value < 0 {
    ((-value) as u64) << 1 | 1
  } else {
    (value as u64) << 1
  };
  loop {
    let mut digit = (rest & VLQ_MASK as u64) as u32;
    rest >>= VLQ_SHIFT;
    if rest > 0 {
      digit |= VLQ_CONTINUATION;
    }
    out.push(BASE64_ALPHABET[digit as usize] as char);
    if rest == 0 {
      break;
    }
  }
}

fn base64_digit(c: char) -> Result<u32, SourceMapError> {
  Ok(match c {
    'A'..='Z' => c as u32 - 'A' as u32,
    'a'..='z' => c as u32 - 'a' as u32 + 26,
    '0'..='9' => c as u32 - '0' as u32 + 52,
    '+' => 62,
    '/' => 63,
    _ => return Err(SourceMapError::InvalidDigit(c)),
  })
}

/// Decodes every VLQ value in `text`.
pub fn vlq_decode(text: &str) -> Result<Vec<i64>, SourceMapError> {
  let mut values = Vec::new();
  let mut acc: u64 = 0;
  let mut shift = 0;
  let mut in_value = false;
  for c in text.chars() {
    let digit = base64_digit(c)?;
    if shift > 32 {
      return Err(SourceMapError::Overflow);
    }
    acc |= ((digit & VLQ_MASK) as u64) << shift;
    in_value = true;
    if digit & VLQ_CONTINUATION != 0 {
      shift += VLQ_SHIFT;
      continue;
    }
    let magnitude = (acc >> 1) as i64;
    values.push(if acc & 1 == 1 { -magnitude } else { magnitude });
    acc = 0;
    shift = 0;
    in_value = false;
  }
  if in_value {
    return Err(SourceMapError::Truncated);
  }
  Ok(values)
}

/// Decodes a `mappings` string into absolute segments per generated line.
pub fn decode_mappings(mappings: &str) -> Result<Vec<Vec<Segment>>, SourceMapError> {
  let mut lines = Vec::new();
  let (mut source, mut line, mut column, mut name) = (0i64, 0i64, 0i64, 0i64);
  for text in mappings.split(';') {
    let mut segments = Vec::new();
    let mut generated_column = 0i64;
    for raw in text.split(',').filter(|s| !s.is_empty()) {
      let fields = vlq_decode(raw)?;
      match fields.len() {
        1 => {
          generated_column += fields[0];
          continue;
        }
        4 | 5 => {}
        n => return Err(SourceMapError::SegmentArity(n)),
      };
      generated_column += fields[0];
      source += fields[1];
      line += fields[2];
      column += fields[3];
      let name_index = fields.get(4).map(|delta| {
        name += delta;
        name as u32
      });
      segments.push(Segment {
        generated_column: generated_column as u32,
        source: source as u32,
        line: line as u32,
        column: column as u32,
        name: name_index,
      });
    }
    lines.push(segments);
  }
  Ok(lines)
}

/// Accumulates marks in generated order and produces the delta-encoded `mappings` string.
#[derive(Default)]
pub struct SourceMapBuilder {
  mappings: String,
  names: Vec<String>,
  name_ids: HashMap<String, u32>,
  line: u32,
  prev_generated_column: i64,
  prev_source: i64,
  prev_line: i64,
  prev_column: i64,
  prev_name: i64,
  line_has_segment: bool,
}

impl SourceMapBuilder {
  pub fn new() -> Self {
    Self::default()
  }

  fn name_id(&mut self, name: &str) -> u32 {
    if let Some(id) = self.name_ids.get(name) {
      return *id;
    }
    let id = self.names.len() as u32;
    self.names.push(name.to_string());
    self.name_ids.insert(name.to_string(), id);
    id
  }

  /// Marks must be added in generated order.
  pub fn add(&mut self, mark: &Mark) {
    while self.line < mark.generated_line {
      self.mappings.push(';');
      self.line += 1;
      self.prev_generated_column = 0;
      self.line_has_segment = false;
    }
    if self.line_has_segment {
      self.mappings.push(',');
    }
    self.line_has_segment = true;

    let generated_column = mark.generated_column as i64;
    let source = mark.loc.source.raw() as i64;
    let line = mark.loc.line as i64;
    let column = mark.loc.column as i64;
    vlq_encode(generated_column - self.prev_generated_column, &mut self.mappings);
    vlq_encode(source - self.prev_source, &mut self.mappings);
    vlq_encode(line - self.prev_line, &mut self.mappings);
    vlq_encode(column - self.prev_column, &mut self.mappings);
    self.prev_generated_column = generated_column;
    self.prev_source = source;
    self.prev_line = line;
    self.prev_column = column;
    if let Some(name) = &mark.name {
      let id = self.name_id(name) as i64;
      vlq_encode(id - self.prev_name, &mut self.mappings);
      self.prev_name = id;
    }
  }

  pub fn finish(self, options: &SourceMapOptions) -> SourceMap {
    SourceMap {
      version: 3,
      file: options.file.clone(),
      sources: options.sources.clone(),
      names: self.names,
      mappings: self.mappings,
      sources_content: options.sources_content.clone(),
    }
  }
}

impl SourceMap {
  pub fn from_marks(marks: &[Mark], options: &SourceMapOptions) -> SourceMap {
    let mut builder = SourceMapBuilder::new();
    for mark in marks {
      builder.add(mark);
    }
    builder.finish(options)
  }

  pub fn to_json(&self) -> String {
    // Serializing plain strings and integers cannot fail.
    serde_json::to_string(self).unwrap_or_default()
  }

  pub fn from_json(text: &str) -> serde_json::Result<SourceMap> {
    serde_json::from_str(text)
  }

  pub fn segments(&self) -> Result<Vec<Vec<Segment>>, SourceMapError> {
    decode_mappings(&self.mappings)
  }

  /// `//# sourceMappingURL=` comment with the map embedded as a data URL.
  pub fn to_inline_comment(&self) -> String {
    format!(
      "//# sourceMappingURL=data:application/json;charset=utf-8;base64,{}",
      base64_encode(self.to_json().as_bytes())
    )
  }
}

fn base64_encode(bytes: &[u8]) -> String {
  let mut out = String::with_capacity(bytes.len().div_ceil(3) * 4);
  for chunk in bytes.chunks(3) {
    let b = [
      chunk[0],
      chunk.get(1).copied().unwrap_or(0),
      chunk.get(2).copied().unwrap_or(0),
    ];
    let n = (b[0] as u32) << 16 | (b[1] as u32) << 8 | b[2] as u32;
    for i in 0..4 {
      if i <= chunk.len() {
        out.push(BASE64_ALPHABET[(n >> (18 - 6 * i) & 63) as usize] as char);
      } else {
        out.push('=');
      }
    }
  }
  out
}
