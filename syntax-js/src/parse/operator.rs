use crate::operator::Operator;
use crate::operator::BINARY_OPERATORS;
use crate::token::TT;
use ahash::HashMap;
use ahash::HashMapExt;
use once_cell::sync::Lazy;

#[rustfmt::skip]
pub static BINARY_OPERATOR_MAPPING: Lazy<HashMap<TT, &'static Operator>> = Lazy::new(|| {
  let mut map = HashMap::<TT, &'static Operator>::new();
  map.insert(TT::QuestionQuestion, &BINARY_OPERATORS["??"]);
  map.insert(TT::BarBar, &BINARY_OPERATORS["||"]);
  map.insert(TT::AmpersandAmpersand, &BINARY_OPERATORS["&&"]);
  map.insert(TT::Bar, &BINARY_OPERATORS["|"]);
  map.insert(TT::Caret, &BINARY_OPERATORS["^"]);
  map.insert(TT::Ampersand, &BINARY_OPERATORS["&"]);
  map.insert(TT::EqualsEquals, &BINARY_OPERATORS["=="]);
  map.insert(TT::ExclamationEquals, &BINARY_OPERATORS["!="]);
  map.insert(TT::EqualsEqualsEquals, &BINARY_OPERATORS["==="]);
  map.insert(TT::ExclamationEqualsEquals, &BINARY_OPERATORS["!=="]);
  map.insert(TT::ChevronLeft, &BINARY_OPERATORS["<"]);
  map.insert(TT::ChevronLeftEquals, &BINARY_OPERATORS["<="]);
  map.insert(TT::ChevronRight, &BINARY_OPERATORS[">"]);
  map.insert(TT::ChevronRightEquals, &BINARY_OPERATORS[">="]);
  map.insert(TT::KeywordIn, &BINARY_OPERATORS["in"]);
  map.insert(TT::KeywordInstanceof, &BINARY_OPERATORS["instanceof"]);
  map.insert(TT::ChevronLeftChevronLeft, &BINARY_OPERATORS["<<"]);
  map.insert(TT::ChevronRightChevronRight, &BINARY_OPERATORS[">>"]);
  map.insert(TT::ChevronRightChevronRightChevronRight, &BINARY_OPERATORS[">>>"]);
  map.insert(TT::Plus, &BINARY_OPERATORS["+"]);
  map.insert(TT::Hyphen, &BINARY_OPERATORS["-"]);
  map.insert(TT::Asterisk, &BINARY_OPERATORS["*"]);
  map.insert(TT::Slash, &BINARY_OPERATORS["/"]);
  map.insert(TT::Percent, &BINARY_OPERATORS["%"]);
  map.insert(TT::AsteriskAsterisk, &BINARY_OPERATORS["**"]);
  map
});

#[rustfmt::skip]
pub static ASSIGNMENT_OPERATOR_MAPPING: Lazy<HashMap<TT, &'static str>> = Lazy::new(|| {
  let mut map = HashMap::<TT, &'static str>::new();
  map.insert(TT::Equals, "=");
  map.insert(TT::PlusEquals, "+=");
  map.insert(TT::HyphenEquals, "-=");
  map.insert(TT::AsteriskEquals, "*=");
  map.insert(TT::SlashEquals, "/=");
  map.insert(TT::PercentEquals, "%=");
  map.insert(TT::AsteriskAsteriskEquals, "**=");
  map.insert(TT::ChevronLeftChevronLeftEquals, "<<=");
  map.insert(TT::ChevronRightChevronRightEquals, ">>=");
  map.insert(TT::ChevronRightChevronRightChevronRightEquals, ">>>=");
  map.insert(TT::AmpersandEquals, "&=");
  map.insert(TT::BarEquals, "|=");
  map.insert(TT::CaretEquals, "^=");
  map.insert(TT::AmpersandAmpersandEquals, "&&=");
  map.insert(TT::BarBarEquals, "||=");
  map.insert(TT::QuestionQuestionEquals, "??=");
  map
});

#[rustfmt::skip]
pub static UNARY_OPERATOR_MAPPING: Lazy<HashMap<TT, &'static str>> = Lazy::new(|| {
  let mut map = HashMap::<TT, &'static str>::new();
  // `await` is contextual and handled manually.
  map.insert(TT::Exclamation, "!");
  map.insert(TT::Tilde, "~");
  map.insert(TT::Plus, "+");
  map.insert(TT::Hyphen, "-");
  map.insert(TT::PlusPlus, "++");
  map.insert(TT::HyphenHyphen, "--");
  map.insert(TT::KeywordTypeof, "typeof");
  map.insert(TT::KeywordVoid, "void");
  map.insert(TT::KeywordDelete, "delete");
  map
});
