use ast::Node;
use error::SyntaxResult;
use lex::Lexer;
use loc::SourceId;
use parse::Parser;

pub mod ast;
pub mod error;
pub mod lex;
pub mod literal;
pub mod loc;
pub mod operator;
pub mod parse;
pub mod surface;
pub mod token;

/// Parses a whole file into a `Module` node. Positions refer to source 0.
pub fn parse(source: &str) -> SyntaxResult<Node> {
  parse_source(source, SourceId::default())
}

/// Parses a whole file, tagging every position with `source_id`.
pub fn parse_source(source: &str, source_id: SourceId) -> SyntaxResult<Node> {
  let lexer = Lexer::new(source);
  let mut parser = Parser::new(lexer, source_id);
  parser.parse_top_level()
}
