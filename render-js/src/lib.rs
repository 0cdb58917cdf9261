//! Code generator for `syntax-js` trees.
//!
//! Parentheses are re-derived from operator precedence (the tree carries none), so rendering a
//! parsed tree and parsing the result yields a structurally equal tree.

use emitter::EmitMode;
use emitter::Emitter;
use sourcemap::SourceMap;
use sourcemap::SourceMapOptions;
use syntax_js::ast::Node;

pub mod emitter;
mod expr;
mod pat;
pub mod precedence;
pub mod sourcemap;
mod stmt;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderOptions {
  pub minify: bool,
}

impl RenderOptions {
  pub fn minified() -> Self {
    RenderOptions { minify: true }
  }

  fn mode(&self) -> EmitMode {
    if self.minify {
      EmitMode::Minified
    } else {
      EmitMode::Pretty
    }
  }
}

pub(crate) struct Renderer {
  pub(crate) out: Emitter,
  pub(crate) indent: usize,
  /// Set while rendering a `for` head, where a bare `in` would end the initializer.
  pub(crate) no_in: bool,
}

impl Renderer {
  fn new(options: &RenderOptions) -> Renderer {
    Renderer {
      out: Emitter::new(options.mode()),
      indent: 0,
      no_in: false,
    }
  }

  pub(crate) fn comma(&mut self) {
    self.out.write_punct(",");
    self.out.write_soft_space();
  }

  /// `a = b` with spaces around the operator in pretty mode.
  pub(crate) fn infix(&mut self, op: &str) {
    self.out.write_soft_space();
    if syntax_js::operator::is_word_operator(op) {
      self.out.write_keyword(op);
    } else {
      self.out.write_punct(op);
    }
    self.out.write_soft_space();
  }
}

/// Renders a tree (usually a `Module`) to source text.
pub fn render(node: &Node, options: &RenderOptions) -> String {
  let mut renderer = Renderer::new(options);
  renderer.stmt(node);
  renderer.out.into_parts().0
}

/// Renders a tree and records a source map segment for every statement and identifier with a
/// real position. `SourceId`s index into `map_options.sources`.
pub fn render_with_source_map(
  node: &Node,
  options: &RenderOptions,
  map_options: &SourceMapOptions,
) -> (String, SourceMap) {
  let mut renderer = Renderer::new(options);
  renderer.stmt(node);
  let (text, marks) = renderer.out.into_parts();
  let map = SourceMap::from_marks(&marks, map_options);
  (text, map)
}
