//! Operator combinator behaviour: associativity, single levels, expression
//! boundaries, prefix/postfix operators, and production-valued operators.
//!
//! The binary fold for `+` deliberately computes `lhs - rhs` so that the
//! fold order is observable.

use crate::lexeme::Pattern;
use crate::production::operators as op;
use crate::production::operators::OpExpr;
use crate::production::{RuleExpr, RuleProduction, OperatorProduction, TokenProduction};
use crate::{
    Arg, ErrorKind, ParseResult, Parser, TokenImpl, TokenSpec, Tokenizer, Unmatched, Visitor,
};
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
enum Token {
    Number,
    Plus,
    Star,
    Minus,
    Bang,
    Ws,
    Error,
    Eof,
}

impl TokenImpl for Token {
    fn eof() -> Self {
        Token::Eof
    }
    fn error() -> Self {
        Token::Error
    }
    fn name(&self) -> &'static str {
        match self {
            Token::Number => "<number>",
            Token::Plus => "+",
            Token::Star => "*",
            Token::Minus => "-",
            Token::Bang => "!",
            Token::Ws => "<whitespace>",
            Token::Error => "<error>",
            Token::Eof => "<eof>",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Value {
    Int(i64),
    Op,
}

struct Fold {
    errors: Vec<ErrorKind<Token>>,
}

impl Fold {
    fn new() -> Self {
        Self { errors: Vec::new() }
    }
}

impl Visitor<Token> for Fold {
    type Value = Value;

    fn production(
        &mut self,
        production: &'static str,
        args: Vec<Arg<Token, Value>>,
    ) -> ParseResult<Value> {
        match (production, args.as_slice()) {
            ("number", [Arg::Token(token)]) => {
                Ok(Value::Int(token.text().parse().map_err(|_| Unmatched)?))
            }
            ("plus_op", [Arg::Token(_)]) => Ok(Value::Op),
            ("main", [Arg::Value(value)]) | ("op_expr", [Arg::Value(value)]) => Ok(value.clone()),
            ("op_expr", [Arg::Token(op), Arg::Value(Value::Int(rhs))]) => match op.kind {
                Token::Minus => Ok(Value::Int(-rhs)),
                _ => Err(Unmatched),
            },
            ("op_expr", [Arg::Value(Value::Int(lhs)), Arg::Token(op)]) => match op.kind {
                Token::Bang => Ok(Value::Int(lhs + 1)),
                _ => Err(Unmatched),
            },
            (
                "op_expr",
                [Arg::Value(Value::Int(lhs)), Arg::Token(op), Arg::Value(Value::Int(rhs))],
            ) => match op.kind {
                Token::Plus => Ok(Value::Int(lhs - rhs)),
                Token::Star => Ok(Value::Int(lhs * rhs)),
                _ => Err(Unmatched),
            },
            ("op_expr", [Arg::Value(Value::Op), Arg::Value(Value::Int(rhs))]) => {
                Ok(Value::Int(100 + rhs))
            }
            (
                "op_expr",
                [Arg::Value(Value::Int(lhs)), Arg::Value(Value::Op), Arg::Value(Value::Int(rhs))],
            ) => Ok(Value::Int(lhs * rhs)),
            _ => Err(Unmatched),
        }
    }

    fn error(&mut self, error: ErrorKind<Token>, _tokenizer: &Tokenizer<Token>) {
        self.errors.push(error);
    }
}

fn parser(
    build: impl FnOnce(OpExpr<Token, Value>) -> OpExpr<Token, Value>,
) -> Parser<Token, Value> {
    let spec = Rc::new(
        TokenSpec::builder()
            .literal("+", Token::Plus)
            .literal("*", Token::Star)
            .literal("-", Token::Minus)
            .literal("!", Token::Bang)
            .rule(Rc::new(Pattern::new(Token::Number, r"^[0-9]+").unwrap()))
            .rule(Rc::new(Pattern::new(Token::Ws, r"^\s+").unwrap()))
            .whitespace(Token::Ws)
            .build()
            .unwrap(),
    );

    let number = Rc::new(TokenProduction::new("number", Token::Number));
    let op_expr = Rc::new(OperatorProduction::new(
        "op_expr",
        build(op::atom(&number)),
    ));
    let main = Rc::new(RuleProduction::new(
        "main",
        RuleExpr::prod(&op_expr).then(RuleExpr::eof()),
    ));

    Parser::new(spec, main).unwrap()
}

#[test]
fn left_associative_fold() {
    let parser = parser(|atom| op::bin_op_left(vec![Token::Plus], atom));
    let mut fold = Fold::new();
    // (1 - 2) - 3
    assert_eq!(
        parser.parse(b"1 + 2 + 3", &mut fold),
        Ok(Value::Int(-4))
    );
}

#[test]
fn right_associative_fold() {
    let parser = parser(|atom| op::bin_op_right(vec![Token::Plus], atom));
    let mut fold = Fold::new();
    // 1 - (2 - 3)
    assert_eq!(parser.parse(b"1 + 2 + 3", &mut fold), Ok(Value::Int(2)));
}

#[test]
fn chain_parses_like_a_left_fold() {
    let parser = parser(|atom| op::bin_op_chain(vec![Token::Plus], atom));
    let mut fold = Fold::new();
    assert_eq!(parser.parse(b"1 + 2 + 3", &mut fold), Ok(Value::Int(-4)));
}

#[test]
fn single_level_accepts_one_operator() {
    let parser = parser(|atom| op::bin_op_single(vec![Token::Plus], atom));
    let mut fold = Fold::new();
    assert_eq!(parser.parse(b"1 + 2", &mut fold), Ok(Value::Int(-1)));
}

#[test]
fn single_level_rejects_chaining() {
    let parser = parser(|atom| op::bin_op_single(vec![Token::Plus], atom));
    let mut fold = Fold::new();
    assert_eq!(parser.parse(b"1 + 2 + 3", &mut fold), Err(Unmatched));
    assert_eq!(
        fold.errors,
        vec![ErrorKind::UnexpectedToken {
            production: "main",
            expected: Token::Eof,
        }]
    );
}

#[test]
fn boundary_reports_an_illegal_chain_once() {
    let parser = parser(|atom| op::expr(op::bin_op_single(vec![Token::Plus], atom)));
    let mut fold = Fold::new();
    assert_eq!(parser.parse(b"1 + 2 + 3", &mut fold), Err(Unmatched));
    assert_eq!(
        fold.errors,
        vec![ErrorKind::IllegalOperatorChain {
            production: "op_expr",
            op: Token::Plus,
        }]
    );
}

#[test]
fn inner_levels_bind_tighter() {
    let parser = parser(|atom| {
        op::bin_op_left(
            vec![Token::Plus],
            op::bin_op_left(vec![Token::Star], atom),
        )
    });
    let mut fold = Fold::new();
    // 2 - (3 * 4)
    assert_eq!(parser.parse(b"2 + 3 * 4", &mut fold), Ok(Value::Int(-10)));
    // (2 * 3) - 4
    assert_eq!(parser.parse(b"2 * 3 + 4", &mut fold), Ok(Value::Int(2)));
}

#[test]
fn prefix_single_applies_at_most_once() {
    let parser = parser(|atom| op::pre_op_single(vec![Token::Minus], atom));
    let mut fold = Fold::new();
    assert_eq!(parser.parse(b"- 5", &mut fold), Ok(Value::Int(-5)));
    assert_eq!(parser.parse(b"- - 5", &mut fold), Err(Unmatched));
}

#[test]
fn prefix_chain_repeats() {
    let parser = parser(|atom| op::pre_op_chain(vec![Token::Minus], atom));
    let mut fold = Fold::new();
    assert_eq!(parser.parse(b"- - 5", &mut fold), Ok(Value::Int(5)));
}

#[test]
fn postfix_operators() {
    let chained = parser(|atom| op::post_op_chain(vec![Token::Bang], atom));
    let mut fold = Fold::new();
    assert_eq!(chained.parse(b"5 ! !", &mut fold), Ok(Value::Int(7)));

    let single = parser(|atom| op::post_op_single(vec![Token::Bang], atom));
    let mut fold = Fold::new();
    assert_eq!(single.parse(b"5 !", &mut fold), Ok(Value::Int(6)));
    assert_eq!(single.parse(b"5 ! !", &mut fold), Err(Unmatched));
}

#[test]
fn production_valued_binary_operator() {
    let plus_op = Rc::new(RuleProduction::new("plus_op", RuleExpr::token(Token::Plus)));
    let parser = parser(move |atom| op::bin_prod_left(&plus_op, atom));
    let mut fold = Fold::new();
    assert_eq!(parser.parse(b"2 + 3", &mut fold), Ok(Value::Int(6)));
    assert_eq!(parser.parse(b"2 + 3 + 4", &mut fold), Ok(Value::Int(24)));
}

#[test]
fn production_valued_prefix_operator() {
    let plus_op = Rc::new(RuleProduction::new("plus_op", RuleExpr::token(Token::Plus)));
    let parser = parser(move |atom| op::pre_prod_single(&plus_op, atom));
    let mut fold = Fold::new();
    assert_eq!(parser.parse(b"+ 5", &mut fold), Ok(Value::Int(105)));
}

#[test]
fn postfix_below_a_binary_level() {
    let parser = parser(|atom| {
        op::bin_op_left(
            vec![Token::Plus],
            op::post_op_chain(vec![Token::Bang], atom),
        )
    });
    let mut fold = Fold::new();
    // (2 + 1) - 3 with the bang bound to the left operand
    assert_eq!(parser.parse(b"2 ! + 3", &mut fold), Ok(Value::Int(0)));
}
