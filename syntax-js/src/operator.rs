use ahash::HashMap;
use ahash::HashMapExt;
use once_cell::sync::Lazy;

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Associativity {
  Left,
  Right,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Operator {
  pub text: &'static str,
  pub precedence: u8,
  pub associativity: Associativity,
}

// Higher binds tighter.
pub const PRECEDENCE_SEQUENCE: u8 = 1;
pub const PRECEDENCE_ASSIGNMENT: u8 = 2;
pub const PRECEDENCE_CONDITIONAL: u8 = 3;
pub const PRECEDENCE_LOGICAL_OR: u8 = 4;
pub const PRECEDENCE_LOGICAL_AND: u8 = 5;
pub const PRECEDENCE_BITWISE_OR: u8 = 6;
pub const PRECEDENCE_BITWISE_XOR: u8 = 7;
pub const PRECEDENCE_BITWISE_AND: u8 = 8;
pub const PRECEDENCE_EQUALITY: u8 = 9;
pub const PRECEDENCE_RELATIONAL: u8 = 10;
pub const PRECEDENCE_SHIFT: u8 = 11;
pub const PRECEDENCE_ADDITIVE: u8 = 12;
pub const PRECEDENCE_MULTIPLICATIVE: u8 = 13;
pub const PRECEDENCE_EXPONENTIATION: u8 = 14;
pub const PRECEDENCE_UNARY: u8 = 15;
pub const PRECEDENCE_POSTFIX: u8 = 16;
pub const PRECEDENCE_NEW: u8 = 17;
pub const PRECEDENCE_CALL: u8 = 18;
pub const PRECEDENCE_PRIMARY: u8 = 19;

fn op(text: &'static str, precedence: u8, associativity: Associativity) -> (&'static str, Operator) {
  (text, Operator {
    text,
    precedence,
    associativity,
  })
}

/// Binary operators keyed by their source text.
#[rustfmt::skip]
pub static BINARY_OPERATORS: Lazy<HashMap<&'static str, Operator>> = Lazy::new(|| {
  use Associativity::*;
  let mut map = HashMap::<&'static str, Operator>::new();
  for (text, operator) in [
    op("??", PRECEDENCE_LOGICAL_OR, Left),
    op("||", PRECEDENCE_LOGICAL_OR, Left),
    op("&&", PRECEDENCE_LOGICAL_AND, Left),
    op("|", PRECEDENCE_BITWISE_OR, Left),
    op("^", PRECEDENCE_BITWISE_XOR, Left),
    op("&", PRECEDENCE_BITWISE_AND, Left),
    op("==", PRECEDENCE_EQUALITY, Left),
    op("!=", PRECEDENCE_EQUALITY, Left),
    op("===", PRECEDENCE_EQUALITY, Left),
    op("!==", PRECEDENCE_EQUALITY, Left),
    op("<", PRECEDENCE_RELATIONAL, Left),
    op("<=", PRECEDENCE_RELATIONAL, Left),
    op(">", PRECEDENCE_RELATIONAL, Left),
    op(">=", PRECEDENCE_RELATIONAL, Left),
    op("in", PRECEDENCE_RELATIONAL, Left),
    op("instanceof", PRECEDENCE_RELATIONAL, Left),
    op("<<", PRECEDENCE_SHIFT, Left),
    op(">>", PRECEDENCE_SHIFT, Left),
    op(">>>", PRECEDENCE_SHIFT, Left),
    op("+", PRECEDENCE_ADDITIVE, Left),
    op("-", PRECEDENCE_ADDITIVE, Left),
    op("*", PRECEDENCE_MULTIPLICATIVE, Left),
    op("/", PRECEDENCE_MULTIPLICATIVE, Left),
    op("%", PRECEDENCE_MULTIPLICATIVE, Left),
    op("**", PRECEDENCE_EXPONENTIATION, Right),
  ] {
    map.insert(text, operator);
  }
  map
});

/// Whether the prefix operator is a word and needs separating from its operand.
pub fn is_word_operator(text: &str) -> bool {
  matches!(text, "typeof" | "void" | "delete" | "await" | "in" | "instanceof")
}
