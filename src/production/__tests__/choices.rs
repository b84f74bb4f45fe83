//! Rule production behaviour: token choices, guarded alternatives, silent
//! tokens, optional rules, and the direct left recursion rewrite.
//!
//! The visitor renders every call as `production(arg arg ..)` so the call
//! shapes and fold order are directly observable.

use crate::lexeme::Pattern;
use crate::production::{RuleAlt, RuleExpr, RuleProduction};
use crate::{
    Arg, ErrorKind, IProduction, ParseResult, Parser, TokenImpl, TokenSpec, Tokenizer, Unmatched,
    Visitor,
};
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
enum Token {
    A,
    B,
    C,
    Comma,
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
            Token::A => "a",
            Token::B => "b",
            Token::C => "c",
            Token::Comma => ",",
            Token::Ws => "<whitespace>",
            Token::Error => "<error>",
            Token::Eof => "<eof>",
        }
    }
}

struct Transcript {
    errors: Vec<ErrorKind<Token>>,
}

impl Transcript {
    fn new() -> Self {
        Self { errors: Vec::new() }
    }
}

impl Visitor<Token> for Transcript {
    type Value = String;

    fn production(
        &mut self,
        production: &'static str,
        args: Vec<Arg<Token, String>>,
    ) -> ParseResult<String> {
        let mut parts = Vec::new();
        for arg in args {
            match arg {
                Arg::Token(token) => parts.push(token.text().to_string()),
                Arg::Value(value) => parts.push(value),
            }
        }
        Ok(format!("{}({})", production, parts.join(" ")))
    }

    fn error(&mut self, error: ErrorKind<Token>, _tokenizer: &Tokenizer<Token>) {
        self.errors.push(error);
    }
}

fn spec() -> Rc<TokenSpec<Token>> {
    Rc::new(
        TokenSpec::builder()
            .literal("a", Token::A)
            .literal("b", Token::B)
            .literal("c", Token::C)
            .literal(",", Token::Comma)
            .rule(Rc::new(Pattern::new(Token::Ws, r"^\s+").unwrap()))
            .whitespace(Token::Ws)
            .build()
            .unwrap(),
    )
}

fn parser(start: Rc<dyn IProduction<Token = Token, Value = String>>) -> Parser<Token, String> {
    Parser::new(spec(), start).unwrap()
}

fn main_over(rule: RuleExpr<Token, String>) -> Parser<Token, String> {
    parser(Rc::new(RuleProduction::new(
        "main",
        rule.then(RuleExpr::eof()),
    )))
}

#[test]
fn token_choice_selects_by_lookahead() {
    let parser = main_over(RuleExpr::token(Token::A).or(RuleExpr::token(Token::B)));
    let mut transcript = Transcript::new();
    assert_eq!(parser.parse(b"a", &mut transcript), Ok("main(a)".to_string()));
    assert_eq!(parser.parse(b"b", &mut transcript), Ok("main(b)".to_string()));
    assert!(transcript.errors.is_empty());
}

#[test]
fn exhausted_token_choice_reports_the_alternatives() {
    let parser = main_over(RuleExpr::token(Token::A).or(RuleExpr::token(Token::B)));
    let mut transcript = Transcript::new();
    assert_eq!(parser.parse(b"c", &mut transcript), Err(Unmatched));
    assert_eq!(
        transcript.errors,
        vec![ErrorKind::ExhaustedTokenChoice {
            production: "main",
            alternatives: vec![Token::A, Token::B],
        }]
    );
}

#[test]
fn any_token_is_a_catch_all_sink() {
    let parser = main_over(RuleExpr::token(Token::A).or(RuleExpr::any_token()));
    let mut transcript = Transcript::new();
    assert_eq!(parser.parse(b"c", &mut transcript), Ok("main(c)".to_string()));
}

#[test]
fn silent_tokens_are_not_forwarded() {
    let parser = main_over(
        RuleExpr::token(Token::A)
            .then(RuleExpr::silent(Token::Comma))
            .then(RuleExpr::token(Token::B)),
    );
    let mut transcript = Transcript::new();
    assert_eq!(
        parser.parse(b"a, b", &mut transcript),
        Ok("main(a b)".to_string())
    );
}

#[test]
fn optional_rules_match_or_vanish() {
    let parser = main_over(RuleExpr::token(Token::A).then(RuleExpr::token(Token::B).opt()));
    let mut transcript = Transcript::new();
    assert_eq!(parser.parse(b"a", &mut transcript), Ok("main(a)".to_string()));
    assert_eq!(
        parser.parse(b"a b", &mut transcript),
        Ok("main(a b)".to_string())
    );
}

#[test]
fn guards_commit_without_consuming() {
    let choice = Rc::new(RuleProduction::choice(
        "choice",
        vec![
            RuleAlt::when(
                vec![Token::A, Token::B],
                RuleExpr::token(Token::A).then(RuleExpr::token(Token::B)),
            ),
            RuleAlt::otherwise(RuleExpr::token(Token::A).then(RuleExpr::token(Token::C))),
        ],
    ));
    let parser = parser(Rc::new(RuleProduction::new(
        "main",
        RuleExpr::prod(&choice).then(RuleExpr::eof()),
    )));

    let mut transcript = Transcript::new();
    assert_eq!(
        parser.parse(b"a b", &mut transcript),
        Ok("main(choice(a b))".to_string())
    );
    assert_eq!(
        parser.parse(b"a c", &mut transcript),
        Ok("main(choice(a c))".to_string())
    );
}

#[test]
fn exhausted_guarded_choice_is_reported() {
    let choice = Rc::new(RuleProduction::choice(
        "choice",
        vec![
            RuleAlt::when(vec![Token::A], RuleExpr::token(Token::A)),
            RuleAlt::when(vec![Token::B], RuleExpr::token(Token::B)),
        ],
    ));
    let parser = parser(choice);
    let mut transcript = Transcript::new();
    assert_eq!(parser.parse(b"c", &mut transcript), Err(Unmatched));
    assert_eq!(
        transcript.errors,
        vec![ErrorKind::ExhaustedChoice {
            production: "choice"
        }]
    );
}

#[test]
fn left_recursion_folds_iteratively() {
    let item = Rc::new(RuleProduction::new("item", RuleExpr::token(Token::A)));
    let items = Rc::new(RuleProduction::init("items"));
    items
        .set_alternatives(vec![
            RuleAlt::otherwise(
                RuleExpr::prod(&items)
                    .then(RuleExpr::silent(Token::Comma))
                    .then(RuleExpr::prod(&item)),
            ),
            RuleAlt::otherwise(RuleExpr::prod(&item)),
        ])
        .unwrap();
    let parser = parser(Rc::new(RuleProduction::new(
        "main",
        RuleExpr::prod(&items).then(RuleExpr::eof()),
    )));

    let mut transcript = Transcript::new();
    assert_eq!(
        parser.parse(b"a, a, a", &mut transcript),
        Ok("main(items(items(items(item(a)) item(a)) item(a)))".to_string())
    );
}

#[test]
fn multiple_left_recursive_alternatives_are_rejected() {
    let items: Rc<RuleProduction<Token, String>> = Rc::new(RuleProduction::init("items"));
    items
        .set_alternatives(vec![
            RuleAlt::otherwise(
                RuleExpr::prod(&items)
                    .then(RuleExpr::silent(Token::Comma))
                    .then(RuleExpr::token(Token::A)),
            ),
            RuleAlt::otherwise(RuleExpr::prod(&items).then(RuleExpr::token(Token::B))),
            RuleAlt::otherwise(RuleExpr::token(Token::A)),
        ])
        .unwrap();
    assert!(Parser::new(spec(), items).is_err());
}

#[test]
fn indirect_left_recursion_is_rejected() {
    let p: Rc<RuleProduction<Token, String>> = Rc::new(RuleProduction::init("p"));
    let q = Rc::new(RuleProduction::new("q", RuleExpr::prod(&p)));
    p.set_rule(RuleExpr::prod(&q).then(RuleExpr::token(Token::A)))
        .unwrap();
    assert!(Parser::new(spec(), p).is_err());
}

#[test]
fn unset_productions_are_rejected() {
    let p: Rc<RuleProduction<Token, String>> = Rc::new(RuleProduction::init("p"));
    assert!(Parser::new(spec(), p).is_err());
}

#[test]
fn ambiguous_token_choices_are_rejected() {
    let parser = Parser::new(
        spec(),
        Rc::new(RuleProduction::new(
            "p",
            RuleExpr::token(Token::A).or(RuleExpr::token(Token::A)),
        )) as Rc<dyn IProduction<Token = Token, Value = String>>,
    );
    assert!(parser.is_err());
}

#[test]
fn visitor_abort_propagates_as_unmatched() {
    struct Abort;
    impl Visitor<Token> for Abort {
        type Value = String;
        fn production(
            &mut self,
            _: &'static str,
            _: Vec<Arg<Token, String>>,
        ) -> ParseResult<String> {
            Err(Unmatched)
        }
        fn error(&mut self, _: ErrorKind<Token>, _: &Tokenizer<Token>) {}
    }

    let parser = main_over(RuleExpr::token(Token::A));
    assert_eq!(parser.parse(b"a", &mut Abort), Err(Unmatched));
}
