use syntax_js::ast::Kind;
use syntax_js::ast::Node;
use syntax_js::operator::Associativity;
use syntax_js::operator::BINARY_OPERATORS;
use syntax_js::operator::PRECEDENCE_ASSIGNMENT;
use syntax_js::operator::PRECEDENCE_CALL;
use syntax_js::operator::PRECEDENCE_CONDITIONAL;
use syntax_js::operator::PRECEDENCE_NEW;
use syntax_js::operator::PRECEDENCE_POSTFIX;
use syntax_js::operator::PRECEDENCE_PRIMARY;
use syntax_js::operator::PRECEDENCE_SEQUENCE;
use syntax_js::operator::PRECEDENCE_UNARY;

/// Wrapper around a precedence value with total ordering.
#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub struct Prec(u8);

impl Prec {
  pub const LOWEST: Prec = Prec(0);
  pub const SEQUENCE: Prec = Prec(PRECEDENCE_SEQUENCE);
  pub const ASSIGNMENT: Prec = Prec(PRECEDENCE_ASSIGNMENT);
  pub const CONDITIONAL: Prec = Prec(PRECEDENCE_CONDITIONAL);
  pub const UNARY: Prec = Prec(PRECEDENCE_UNARY);
  pub const POSTFIX: Prec = Prec(PRECEDENCE_POSTFIX);
  pub const NEW: Prec = Prec(PRECEDENCE_NEW);
  pub const CALL: Prec = Prec(PRECEDENCE_CALL);
  pub const PRIMARY: Prec = Prec(PRECEDENCE_PRIMARY);

  pub const fn new(value: u8) -> Self {
    Prec(value)
  }

  pub const fn tighter(self) -> Self {
    Prec(self.0 + 1)
  }
}

#[derive(Clone, Copy, Debug)]
pub enum Side {
  Left,
  Right,
}

fn binary_prec(op: &str) -> Prec {
  BINARY_OPERATORS
    .get(op)
    .map(|o| Prec(o.precedence))
    .unwrap_or(Prec::PRIMARY)
}

/// Minimum precedence an operand of the binary operator `op` needs to avoid parentheses.
pub fn child_min_prec_for_binary(op: &str, side: Side) -> Prec {
  let Some(operator) = BINARY_OPERATORS.get(op) else {
    return Prec::PRIMARY;
  };
  let prec = Prec(operator.precedence);
  match (operator.associativity, side) {
    (Associativity::Left, Side::Left) | (Associativity::Right, Side::Right) => prec,
    (Associativity::Left, Side::Right) | (Associativity::Right, Side::Left) => prec.tighter(),
  }
}

/// Precedence of an expression node, derived from the parser's table so that emitting without
/// explicit parentheses re-parses to the same tree.
pub fn expr_prec(expr: &Node) -> Prec {
  match expr.kind {
    Kind::Sequence => Prec::SEQUENCE,
    Kind::Assign | Kind::Arrow | Kind::Yield | Kind::Spread => Prec::ASSIGNMENT,
    Kind::Cond => Prec::CONDITIONAL,
    Kind::Binary => binary_prec(&expr.text),
    Kind::Unary => Prec::UNARY,
    Kind::Postfix => Prec::POSTFIX,
    Kind::New if expr.child(1).is_absent() => Prec::NEW,
    Kind::New | Kind::Call | Kind::Member | Kind::Index | Kind::TaggedTemplate => Prec::CALL,
    Kind::Module
    | Kind::Block
    | Kind::Empty
    | Kind::Absent
    | Kind::ExprStmt
    | Kind::VarDecl
    | Kind::Declarator
    | Kind::FuncDecl
    | Kind::FuncExpr
    | Kind::ClassDecl
    | Kind::ClassExpr
    | Kind::ClassBody
    | Kind::Method
    | Kind::Field
    | Kind::Return
    | Kind::If
    | Kind::For
    | Kind::ForIn
    | Kind::While
    | Kind::DoWhile
    | Kind::Break
    | Kind::Continue
    | Kind::Throw
    | Kind::Try
    | Kind::Catch
    | Kind::Switch
    | Kind::Case
    | Kind::Labeled
    | Kind::Debugger
    | Kind::Include
    | Kind::Import
    | Kind::ImportSpecifier
    | Kind::Export
    | Kind::ExportNames
    | Kind::ExportStar
    | Kind::ExportSpecifier
    | Kind::Ident
    | Kind::BindingIdent
    | Kind::Number
    | Kind::String
    | Kind::Template
    | Kind::TemplateChunk
    | Kind::Regex
    | Kind::Keyword
    | Kind::Array
    | Kind::Object
    | Kind::Property
    | Kind::PropKey
    | Kind::Computed
    | Kind::Args
    | Kind::Params
    | Kind::AssignPattern
    | Kind::Rest
    | Kind::ArrayPattern
    | Kind::ObjectPattern
    | Kind::PatternProp => Prec::PRIMARY,
  }
}

/// `a ?? b || c` is a syntax error, so mixing `??` with `||`/`&&` always needs parentheses.
pub fn mixes_nullish(parent_op: &str, child: &Node) -> bool {
  if child.kind != Kind::Binary {
    return false;
  }
  let logical = |op: &str| matches!(op, "||" | "&&");
  (parent_op == "??" && logical(&child.text)) || (logical(parent_op) && child.text == "??")
}

/// Whether a `new` callee contains a call that would otherwise be taken as the constructor
/// arguments.
pub fn callee_contains_call(expr: &Node) -> bool {
  match expr.kind {
    Kind::Call => true,
    Kind::Member | Kind::Index | Kind::TaggedTemplate => callee_contains_call(expr.child(0)),
    _ => false,
  }
}

/// Leftmost token class of an expression, used to avoid ambiguous statement starts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Leading {
  BraceOpen,
  Function,
  Class,
  LetBracket,
  Other,
}

pub fn expr_leading(expr: &Node) -> Leading {
  match expr.kind {
    Kind::Object | Kind::ObjectPattern => Leading::BraceOpen,
    Kind::FuncExpr => Leading::Function,
    Kind::ClassExpr => Leading::Class,
    Kind::Index if expr.child(0).is(Kind::Ident) && expr.child(0).text == "let" => {
      Leading::LetBracket
    }
    Kind::Binary
    | Kind::Assign
    | Kind::Cond
    | Kind::Sequence
    | Kind::Call
    | Kind::Member
    | Kind::Index
    | Kind::Postfix
    | Kind::TaggedTemplate => expr_leading(expr.child(0)),
    _ => Leading::Other,
  }
}

pub fn expr_stmt_needs_parens(expr: &Node) -> bool {
  expr_leading(expr) != Leading::Other
}
