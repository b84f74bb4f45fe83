//! A JSON grammar built on the engine, checked against serde_json.
//!
//! The constant words `true`, `false`, and `null` go through the
//! keyword/identifier disambiguator, objects and arrays are bracketed lists,
//! and the value alternation is a guarded choice.

use crate::lexeme::Pattern;
use crate::production::{
    BracketedListProduction, ListElement, RuleAlt, RuleExpr, RuleProduction,
};
use crate::{
    Arg, ErrorKind, ParseResult, Parser, TokenImpl, TokenSpec, Tokenizer, Unmatched, Visitor,
};
use serde_json::json;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
enum Token {
    BraceOpen,
    BraceClose,
    BracketOpen,
    BracketClose,
    Comma,
    Colon,
    Str,
    Number,
    True,
    False,
    Null,
    Word,
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
            Token::BraceOpen => "{",
            Token::BraceClose => "}",
            Token::BracketOpen => "[",
            Token::BracketClose => "]",
            Token::Comma => ",",
            Token::Colon => ":",
            Token::Str => "<string>",
            Token::Number => "<number>",
            Token::True => "true",
            Token::False => "false",
            Token::Null => "null",
            Token::Word => "<word>",
            Token::Ws => "<whitespace>",
            Token::Error => "<error>",
            Token::Eof => "<eof>",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Value {
    Json(serde_json::Value),
    Member(String, serde_json::Value),
}

struct Builder {
    errors: Vec<ErrorKind<Token>>,
}

impl Builder {
    fn new() -> Self {
        Self { errors: Vec::new() }
    }
}

fn number_value(text: &str) -> ParseResult<serde_json::Value> {
    if text.contains(&['.', 'e', 'E'][..]) {
        let float: f64 = text.parse().map_err(|_| Unmatched)?;
        serde_json::Number::from_f64(float)
            .map(serde_json::Value::Number)
            .ok_or(Unmatched)
    } else {
        let int: i64 = text.parse().map_err(|_| Unmatched)?;
        Ok(json!(int))
    }
}

impl Visitor<Token> for Builder {
    type Value = Value;

    fn production(
        &mut self,
        production: &'static str,
        args: Vec<Arg<Token, Value>>,
    ) -> ParseResult<Value> {
        let mut args = args.into_iter();
        match production {
            "value" => match args.next() {
                Some(Arg::Token(token)) => match token.kind {
                    Token::Str => {
                        let text = token.text();
                        Ok(Value::Json(json!(text[1..text.len() - 1].to_string())))
                    }
                    Token::Number => Ok(Value::Json(number_value(token.text())?)),
                    Token::True => Ok(Value::Json(json!(true))),
                    Token::False => Ok(Value::Json(json!(false))),
                    Token::Null => Ok(Value::Json(serde_json::Value::Null)),
                    _ => Err(Unmatched),
                },
                Some(Arg::Value(value)) => Ok(value),
                None => Err(Unmatched),
            },
            "member" => match (args.next(), args.next()) {
                (Some(Arg::Token(key)), Some(Arg::Value(Value::Json(value)))) => {
                    let text = key.text();
                    Ok(Value::Member(text[1..text.len() - 1].to_string(), value))
                }
                _ => Err(Unmatched),
            },
            "object" => match (args.next(), args.next()) {
                (None, None) => Ok(Value::Json(json!({}))),
                (Some(Arg::Value(Value::Member(key, value))), None) => {
                    let mut map = serde_json::Map::new();
                    map.insert(key, value);
                    Ok(Value::Json(serde_json::Value::Object(map)))
                }
                (
                    Some(Arg::Value(Value::Json(serde_json::Value::Object(mut map)))),
                    Some(Arg::Value(Value::Member(key, value))),
                ) => {
                    map.insert(key, value);
                    Ok(Value::Json(serde_json::Value::Object(map)))
                }
                _ => Err(Unmatched),
            },
            "array" => match (args.next(), args.next()) {
                (None, None) => Ok(Value::Json(json!([]))),
                (Some(Arg::Value(Value::Json(value))), None) => Ok(Value::Json(json!([value]))),
                (
                    Some(Arg::Value(Value::Json(serde_json::Value::Array(mut items)))),
                    Some(Arg::Value(Value::Json(value))),
                ) => {
                    items.push(value);
                    Ok(Value::Json(serde_json::Value::Array(items)))
                }
                _ => Err(Unmatched),
            },
            "main" => match args.next() {
                Some(Arg::Value(value)) => Ok(value),
                _ => Err(Unmatched),
            },
            _ => Err(Unmatched),
        }
    }

    fn error(&mut self, error: ErrorKind<Token>, _tokenizer: &Tokenizer<Token>) {
        self.errors.push(error);
    }
}

fn json_parser() -> Parser<Token, Value> {
    let spec = Rc::new(
        TokenSpec::builder()
            .literal("{", Token::BraceOpen)
            .literal("}", Token::BraceClose)
            .literal("[", Token::BracketOpen)
            .literal("]", Token::BracketClose)
            .literal(",", Token::Comma)
            .literal(":", Token::Colon)
            .rule(Rc::new(
                Pattern::new(Token::Str, r#"^"([^"\\]|\\.)*""#).unwrap(),
            ))
            .rule(Rc::new(
                Pattern::new(
                    Token::Number,
                    r"^-?(0|[1-9][0-9]*)(\.[0-9]+)?([eE][+-]?[0-9]+)?",
                )
                .unwrap(),
            ))
            .rule(Rc::new(Pattern::new(Token::Ws, r"^\s+").unwrap()))
            .identifier(Rc::new(Pattern::new(Token::Word, r"^[a-z]+").unwrap()))
            .keyword("true", Token::True)
            .keyword("false", Token::False)
            .keyword("null", Token::Null)
            .whitespace(Token::Ws)
            .build()
            .unwrap(),
    );

    let value: Rc<RuleProduction<Token, Value>> = Rc::new(RuleProduction::init("value"));

    let member = Rc::new(RuleProduction::new(
        "member",
        RuleExpr::token(Token::Str)
            .then(RuleExpr::silent(Token::Colon))
            .then(RuleExpr::prod(&value)),
    ));

    let object = Rc::new(
        BracketedListProduction::new(
            "object",
            Token::BraceOpen,
            Token::BraceClose,
            ListElement::prod(&member),
        )
        .separated_by(Token::Comma)
        .allow_empty(),
    );

    let array = Rc::new(
        BracketedListProduction::new(
            "array",
            Token::BracketOpen,
            Token::BracketClose,
            ListElement::prod(&value),
        )
        .separated_by(Token::Comma)
        .allow_empty(),
    );

    value
        .set_alternatives(vec![
            RuleAlt::when(vec![Token::BraceOpen], RuleExpr::prod(&object)),
            RuleAlt::when(vec![Token::BracketOpen], RuleExpr::prod(&array)),
            RuleAlt::otherwise(
                RuleExpr::token(Token::Str)
                    .or(RuleExpr::token(Token::Number))
                    .or(RuleExpr::token(Token::True))
                    .or(RuleExpr::token(Token::False))
                    .or(RuleExpr::token(Token::Null)),
            ),
        ])
        .unwrap();

    let main = Rc::new(RuleProduction::new(
        "main",
        RuleExpr::prod(&value).then(RuleExpr::eof()),
    ));

    Parser::new(spec, main).unwrap()
}

#[test]
fn parses_a_document_like_serde_json() {
    let input = r#"{"a": [1, 2.5, "x"], "b": {"c": true, "d": null}, "e": false}"#;
    let parser = json_parser();
    let mut builder = Builder::new();

    let parsed = parser.parse(input.as_bytes(), &mut builder);
    let expected: serde_json::Value = serde_json::from_str(input).unwrap();
    assert_eq!(parsed, Ok(Value::Json(expected)));
    assert!(builder.errors.is_empty());
}

#[test]
fn scalar_documents() {
    let parser = json_parser();
    for input in ["true", "null", "-12", r#""hi""#, "[]", "{}"] {
        let mut builder = Builder::new();
        let parsed = parser.parse(input.as_bytes(), &mut builder);
        let expected: serde_json::Value = serde_json::from_str(input).unwrap();
        assert_eq!(parsed, Ok(Value::Json(expected)), "input: {}", input);
    }
}

#[test]
fn an_unknown_word_fails_to_tokenize_into_the_grammar() {
    let parser = json_parser();
    let mut builder = Builder::new();
    assert_eq!(parser.parse(b"truthy", &mut builder), Err(Unmatched));
}
