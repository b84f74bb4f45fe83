//! List production laws: separator counting, empty and trailing flags, end
//! token lookahead, and the bracketed frame.

use crate::lexeme::Pattern;
use crate::production::{BracketedListProduction, ListElement, ListProduction, RuleExpr, RuleProduction};
use crate::{
    Arg, ErrorKind, IProduction, ParseResult, Parser, TokenImpl, TokenSpec, Tokenizer, Unmatched,
    Visitor,
};
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
enum Token {
    A,
    Comma,
    Open,
    Close,
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
            Token::Comma => ",",
            Token::Open => "[",
            Token::Close => "]",
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
            .literal(",", Token::Comma)
            .literal("[", Token::Open)
            .literal("]", Token::Close)
            .rule(Rc::new(Pattern::new(Token::Ws, r"^\s+").unwrap()))
            .whitespace(Token::Ws)
            .build()
            .unwrap(),
    )
}

fn parser(start: Rc<dyn IProduction<Token = Token, Value = String>>) -> Parser<Token, String> {
    Parser::new(spec(), start).unwrap()
}

#[test]
fn a_list_of_n_elements_consumes_n_minus_one_separators() {
    let list = Rc::new(
        ListProduction::new("list", ListElement::Token(Token::A))
            .separated_by(Token::Comma)
            .ends_with(Token::Eof),
    );
    let parser = parser(list);
    let mut transcript = Transcript::new();
    assert_eq!(
        parser.parse(b"a, a, a", &mut transcript),
        Ok("list(list(list(a) a) a)".to_string())
    );
    // A lone element gets only the initial call.
    assert_eq!(
        parser.parse(b"a", &mut transcript),
        Ok("list(a)".to_string())
    );
}

#[test]
fn an_empty_list_is_permitted_only_with_allow_empty() {
    let permissive = Rc::new(
        ListProduction::new("list", ListElement::Token(Token::A))
            .separated_by(Token::Comma)
            .ends_with(Token::Eof)
            .allow_empty(),
    );
    let parser = self::parser(permissive);
    let mut transcript = Transcript::new();
    assert_eq!(parser.parse(b"", &mut transcript), Ok("list()".to_string()));

    let strict = Rc::new(
        ListProduction::new("list", ListElement::Token(Token::A))
            .separated_by(Token::Comma)
            .ends_with(Token::Eof),
    );
    let parser = self::parser(strict);
    let mut transcript = Transcript::new();
    assert_eq!(parser.parse(b"", &mut transcript), Err(Unmatched));
    assert_eq!(
        transcript.errors,
        vec![ErrorKind::UnexpectedToken {
            production: "list",
            expected: Token::A,
        }]
    );
}

#[test]
fn a_trailing_separator_is_permitted_only_with_allow_trailing() {
    let permissive = Rc::new(
        ListProduction::new("list", ListElement::Token(Token::A))
            .separated_by(Token::Comma)
            .ends_with(Token::Eof)
            .allow_trailing(),
    );
    let parser = self::parser(permissive);
    let mut transcript = Transcript::new();
    assert_eq!(
        parser.parse(b"a, a,", &mut transcript),
        Ok("list(list(a) a)".to_string())
    );

    let strict = Rc::new(
        ListProduction::new("list", ListElement::Token(Token::A))
            .separated_by(Token::Comma)
            .ends_with(Token::Eof),
    );
    let parser = self::parser(strict);
    let mut transcript = Transcript::new();
    assert_eq!(parser.parse(b"a, a,", &mut transcript), Err(Unmatched));
}

#[test]
fn a_separator_less_list_runs_to_the_end_token() {
    let list = Rc::new(
        ListProduction::new("list", ListElement::Token(Token::A)).ends_with(Token::Eof),
    );
    let parser = parser(list);
    let mut transcript = Transcript::new();
    assert_eq!(
        parser.parse(b"a a a", &mut transcript),
        Ok("list(list(list(a) a) a)".to_string())
    );
}

#[test]
fn production_elements_nest() {
    let item = Rc::new(RuleProduction::new("item", RuleExpr::token(Token::A)));
    let list = Rc::new(
        ListProduction::new("list", ListElement::prod(&item))
            .separated_by(Token::Comma)
            .ends_with(Token::Eof),
    );
    let parser = parser(list);
    let mut transcript = Transcript::new();
    assert_eq!(
        parser.parse(b"a, a", &mut transcript),
        Ok("list(list(item(a)) item(a))".to_string())
    );
}

#[test]
fn bracketed_lists_frame_their_elements() {
    let list = Rc::new(
        BracketedListProduction::new(
            "list",
            Token::Open,
            Token::Close,
            ListElement::Token(Token::A),
        )
        .separated_by(Token::Comma)
        .allow_empty(),
    );
    let parser = parser(list);

    let mut transcript = Transcript::new();
    assert_eq!(
        parser.parse(b"[a, a]", &mut transcript),
        Ok("list(list(a) a)".to_string())
    );
    assert_eq!(parser.parse(b"[]", &mut transcript), Ok("list()".to_string()));
    assert!(transcript.errors.is_empty());
}

#[test]
fn a_missing_bracket_is_reported() {
    let list = Rc::new(
        BracketedListProduction::new(
            "list",
            Token::Open,
            Token::Close,
            ListElement::Token(Token::A),
        )
        .separated_by(Token::Comma),
    );
    let parser = parser(list);

    let mut transcript = Transcript::new();
    assert_eq!(parser.parse(b"[a", &mut transcript), Err(Unmatched));
    assert_eq!(
        transcript.errors,
        vec![ErrorKind::UnexpectedToken {
            production: "list",
            expected: Token::Close,
        }]
    );

    let mut transcript = Transcript::new();
    assert_eq!(parser.parse(b"a]", &mut transcript), Err(Unmatched));
    assert_eq!(
        transcript.errors,
        vec![ErrorKind::UnexpectedToken {
            production: "list",
            expected: Token::Open,
        }]
    );
}

#[test]
fn empty_and_trailing_flags_require_an_end_token() {
    let unbounded: Rc<ListProduction<Token, String>> = Rc::new(
        ListProduction::new("list", ListElement::Token(Token::A))
            .separated_by(Token::Comma)
            .allow_empty(),
    );
    assert!(Parser::new(spec(), unbounded).is_err());

    let separator_less: Rc<ListProduction<Token, String>> =
        Rc::new(ListProduction::new("list", ListElement::Token(Token::A)));
    assert!(Parser::new(spec(), separator_less).is_err());
}
