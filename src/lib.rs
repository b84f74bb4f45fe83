//! Lexgram is a construction toolkit for tokenizers and recursive descent parsers
//! of small, hand-written languages (calculators, C-like tokenizers, configuration grammars).
//!
//! # Overview
//!
//! The user declares a [token specification](TokenSpec) and a grammar of
//! [productions](IProduction); the library supplies a linear-time [Tokenizer]
//! and a recursive descent parser with single-token lookahead,
//! [operator-precedence parsing](crate::production::OperatorProduction) for
//! infix/prefix/postfix operators, and structured error reporting through a
//! caller-supplied [Visitor].
//!
//! # Design
//!
//! Tokens are dispatched by a byte-indexed literal trie fused with declared
//! [rule matchers](ILexeme) and a keyword/identifier disambiguator.
//! The grammar is a graph of production utilities like
//! [TokenProduction](crate::production::TokenProduction),
//! [RuleProduction](crate::production::RuleProduction),
//! [ListProduction](crate::production::ListProduction), and
//! [OperatorProduction](crate::production::OperatorProduction), composed with
//! [Rc](std::rc::Rc) references so that recursive grammars can be tied late with
//! [init](crate::production::RuleProduction::init)/`set_rule`.
//! Parsed constructs are not collected into a tree; every successful production
//! calls the visitor with the forwarded tokens and sub-values, and the callback's
//! return value becomes the production's parse value.
//!
//! # Example
//!
//! A small arithmetic calculator:
//!
//! ```
//! use lexgram::lexeme::Pattern;
//! use lexgram::production::operators as op;
//! use lexgram::production::{OperatorProduction, TokenProduction};
//! use lexgram::{
//!     Arg, ErrorKind, ParseResult, Parser, TokenImpl, TokenSpec, Tokenizer, Unmatched, Visitor,
//! };
//! use std::rc::Rc;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
//! enum Tok {
//!     Number,
//!     Plus,
//!     Minus,
//!     Star,
//!     OpenParen,
//!     CloseParen,
//!     Space,
//!     Error,
//!     Eof,
//! }
//!
//! impl TokenImpl for Tok {
//!     fn eof() -> Self { Tok::Eof }
//!     fn error() -> Self { Tok::Error }
//!     fn name(&self) -> &'static str {
//!         match self {
//!             Tok::Number => "<number>",
//!             Tok::Plus => "+",
//!             Tok::Minus => "-",
//!             Tok::Star => "*",
//!             Tok::OpenParen => "(",
//!             Tok::CloseParen => ")",
//!             Tok::Space => "<space>",
//!             Tok::Error => "<error>",
//!             Tok::Eof => "<eof>",
//!         }
//!     }
//! }
//!
//! let spec = Rc::new(
//!     TokenSpec::builder()
//!         .literal("+", Tok::Plus)
//!         .literal("-", Tok::Minus)
//!         .literal("*", Tok::Star)
//!         .literal("(", Tok::OpenParen)
//!         .literal(")", Tok::CloseParen)
//!         .rule(Rc::new(Pattern::new(Tok::Number, r"^[0-9]+").unwrap()))
//!         .rule(Rc::new(Pattern::new(Tok::Space, r"^[ \t]+").unwrap()))
//!         .whitespace(Tok::Space)
//!         .build()
//!         .unwrap(),
//! );
//!
//! let number = Rc::new(TokenProduction::new("number", Tok::Number));
//! let expr: Rc<OperatorProduction<Tok, i64>> = Rc::new(OperatorProduction::init("expr"));
//!
//! let atom = op::atom(&number).or(op::parenthesized(Tok::OpenParen, Tok::CloseParen));
//! let product = op::bin_op_left(vec![Tok::Star], atom);
//! let sum = op::bin_op_left(vec![Tok::Plus, Tok::Minus], product);
//! expr.set_rule(op::expr(sum)).unwrap();
//!
//! struct Calc;
//!
//! impl Visitor<Tok> for Calc {
//!     type Value = i64;
//!
//!     fn production(
//!         &mut self,
//!         production: &'static str,
//!         args: Vec<Arg<Tok, i64>>,
//!     ) -> ParseResult<i64> {
//!         match (production, args.as_slice()) {
//!             ("number", [Arg::Token(tok)]) => {
//!                 Ok(tok.text().parse::<i64>().map_err(|_| Unmatched)?)
//!             }
//!             ("expr", [Arg::Value(v)]) => Ok(*v),
//!             ("expr", [Arg::Value(l), Arg::Token(op), Arg::Value(r)]) => match op.kind {
//!                 Tok::Plus => Ok(l + r),
//!                 Tok::Minus => Ok(l - r),
//!                 Tok::Star => Ok(l * r),
//!                 _ => Err(Unmatched),
//!             },
//!             _ => Err(Unmatched),
//!         }
//!     }
//!
//!     fn error(&mut self, _error: ErrorKind<Tok>, _tokenizer: &Tokenizer<Tok>) {}
//! }
//!
//! let parser = Parser::new(spec, expr).unwrap();
//! assert_eq!(parser.parse(b"1 + 2 * 3", &mut Calc), Ok(7));
//! assert_eq!(parser.parse(b"(1 + 2) * 3", &mut Calc), Ok(9));
//! ```

mod error;
pub mod lexeme;
mod match_result;
mod parsing;
pub mod production;
mod spec;
mod token;
mod tokenization;
mod trie;
pub mod util;

use crate::util::{Code, Log};
use once_cell::unsync::OnceCell;
use std::collections::HashSet;
use std::fmt::{Debug, Display, Write};
use std::hash::Hash;
use std::rc::Rc;

/// A trait implemented by the user's token kind enum.
///
/// A token kind is a small copyable tag. Two kinds are reserved: [eof](TokenImpl::eof),
/// produced when the cursor reaches the end of input, and [error](TokenImpl::error),
/// produced for unrecognized byte runs. Neither may be produced by a matcher.
/// Every kind carries a display [name](TokenImpl::name) used for grammar listings
/// and diagnostics.
pub trait TokenImpl: Copy + Debug + Eq + Hash + Ord {
    fn eof() -> Self;
    fn error() -> Self;
    fn name(&self) -> &'static str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// A token produced by the [Tokenizer].
///
/// The spelling is a non-owning view into the original input buffer; the buffer
/// outlives every token derived from it. Tokens are copied by value into
/// [Visitor] callbacks.
pub struct Token<'i, TL: TokenImpl> {
    pub kind: TL,
    pub spelling: &'i [u8],
    pub offset: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// A kind-checked witness over a [Token].
///
/// A static token of kind `T` is constructed only when the raw token's kind
/// equals `T`; [map](StaticToken::map) derives a parsed payload from the
/// spelling (for example the integer value of a digit token).
pub struct StaticToken<'i, TL: TokenImpl> {
    token: Token<'i, TL>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// The outcome of running the match engine at a byte cursor.
pub enum MatchResult<TL> {
    /// No forward progress is possible.
    Unmatched,
    /// `bump` bytes form an unrecognized run to skip.
    Error { bump: usize },
    /// `bump` bytes form a token of `kind`.
    Success { kind: TL, bump: usize },
    /// The cursor is at the end of input.
    Eof,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Absence of a parse value.
///
/// An unmatched production yields no value and propagates silently; reported
/// diagnostics go through [Visitor::error] before the propagation starts.
pub struct Unmatched;

/// A result returned from a production parse: a value, or [Unmatched].
pub type ParseResult<V> = Result<V, Unmatched>;

#[derive(Debug, Clone)]
/// A sub-result forwarded to [Visitor::production], in the left-to-right order
/// of the production's elements.
pub enum Arg<'i, TL: TokenImpl, V> {
    /// A matched token (silent tokens are omitted).
    Token(Token<'i, TL>),
    /// The parse value of a sub-production.
    Value(V),
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A diagnostic reported to [Visitor::error] before the current parse returns
/// [Unmatched].
pub enum ErrorKind<TL: TokenImpl> {
    /// The production expected a token of the given kind at the current cursor.
    UnexpectedToken {
        production: &'static str,
        expected: TL,
    },
    /// A token alternation exhausted its alternatives.
    ExhaustedTokenChoice {
        production: &'static str,
        alternatives: Vec<TL>,
    },
    /// A guarded production choice fired no branch.
    ExhaustedChoice { production: &'static str },
    /// An expression boundary rejected a trailing operator.
    IllegalOperatorChain { production: &'static str, op: TL },
}

#[derive(Debug)]
/// An error returned due to failed validation of the token specification or
/// the grammar.
pub struct ImplementationError {
    message: String,
    what: String,
}

/// The caller-supplied record of callbacks driving a parse.
///
/// For every successful production the runtime invokes
/// [production](Visitor::production) with the production's identifier and the
/// forwarded sub-results; the return value becomes the production's parse
/// value. Returning `Err(Unmatched)` from a callback aborts the parse and
/// propagates. Every reported diagnostic goes through [error](Visitor::error)
/// together with the tokenizer state, so the consumer can format a source
/// location.
pub trait Visitor<TL: TokenImpl> {
    type Value;

    fn production(
        &mut self,
        production: &'static str,
        args: Vec<Arg<'_, TL, Self::Value>>,
    ) -> ParseResult<Self::Value>;

    fn error(&mut self, error: ErrorKind<TL>, tokenizer: &Tokenizer<'_, TL>);
}

/// An interface implemented by rule-token matchers of a [TokenSpec].
///
/// The match engine calls [try_match](ILexeme::try_match) at byte positions of
/// the input; a matcher may succeed with its [token](ILexeme::token), report an
/// unrecognized run, or decline. A matcher additionally declares the literal
/// kinds it conflicts with (for example a float matcher starting with `.` when
/// `.` is also a literal); the engine re-checks the matcher wherever those
/// literals win.
pub trait ILexeme {
    type Token: TokenImpl;

    fn try_match(&self, code: &Code, pointer: usize) -> MatchResult<Self::Token>;

    fn token(&self) -> Self::Token;

    fn conflicting_literals(&self) -> &[Self::Token] {
        &[]
    }

    fn grammar_field(&self) -> (Self::Token, String);
}

#[derive(Clone, Debug)]
struct LiteralTrie<TToken> {
    token: Option<TToken>,
    children: Vec<(u8, LiteralTrie<TToken>)>,
    conflicts: Vec<usize>,
}

/// An immutable token specification: the fused dispatcher built from literal
/// tokens, rule matchers, keywords, and whitespace marks.
///
/// Build one with [TokenSpec::builder]. Matching follows longest-literal
/// dispatch through a byte trie, with declared conflict rules re-checked at
/// the literals they conflict with, remaining rules tried in declaration
/// order, and a composite keyword/identifier disambiguator when an identifier
/// rule is declared.
pub struct TokenSpec<TL: TokenImpl> {
    trie: LiteralTrie<TL>,
    rules: Vec<Rc<dyn ILexeme<Token = TL>>>,
    whitespace: Vec<TL>,
    literals: Vec<(String, TL)>,
    keywords: Vec<(String, TL)>,
    debug: OnceCell<Log<&'static str>>,
}

/// An ordered builder of token descriptors for a [TokenSpec].
pub struct TokenSpecBuilder<TL: TokenImpl> {
    literals: Vec<(String, TL)>,
    rules: Vec<Rc<dyn ILexeme<Token = TL>>>,
    identifier: Option<usize>,
    keywords: Vec<(String, TL)>,
    whitespace: Vec<TL>,
}

/// A cursor stream of tokens over an input buffer.
///
/// The tokenizer keeps `(begin, cursor, end)` with the last match result
/// primed for the cursor; [peek](Tokenizer::peek) is pure and idempotent,
/// [bump](Tokenizer::bump) advances and skips whitespace-marked kinds, and
/// [reset](Tokenizer::reset) re-positions the cursor anywhere in range.
/// Unrecognized runs surface as tokens of the reserved `error` kind.
pub struct Tokenizer<'i, TL: TokenImpl> {
    code: Code<'i>,
    spec: Rc<TokenSpec<TL>>,
    cursor: usize,
    last: MatchResult<TL>,
}

/// A lazy iterator of tokens, ending at end of input.
pub struct Tokens<'i, TL: TokenImpl> {
    tokenizer: Tokenizer<'i, TL>,
}

/// A trait implemented by production utilities which are used to write the
/// grammar of the parser.
pub trait IProduction: Display {
    type Token: TokenImpl;
    type Value;

    /// The unique identifier of the production, forwarded to the visitor as
    /// the production tag.
    fn identifier(&self) -> &'static str;

    /// Collect the token kinds this production can start with.
    fn impl_first_set(&self, first_set: &mut HashSet<Self::Token>);

    /// Write grammar for the production.
    fn impl_grammar(
        &self,
        writer: &mut dyn Write,
        added_rules: &mut HashSet<&'static str>,
    ) -> Result<(), std::fmt::Error>;

    /// Validate this production and its children: left recursion, choice
    /// ambiguity, and structural constraints.
    ///
    /// `first_path` holds the identifiers of productions currently entered at
    /// first position (no token consumed yet); `validated` holds productions
    /// already fully checked.
    fn validate(
        &self,
        first_path: &mut Vec<&'static str>,
        validated: &mut HashSet<&'static str>,
    ) -> Result<(), ImplementationError>;

    /// Parse this production at the tokenizer's cursor, routing matched
    /// constructs and diagnostics to the visitor.
    fn parse(
        &self,
        tokenizer: &mut Tokenizer<'_, Self::Token>,
        visitor: &mut dyn Visitor<Self::Token, Value = Self::Value>,
    ) -> ParseResult<Self::Value>;
}

/// A parser assembled from a [TokenSpec] and a start production.
///
/// Construction validates the whole production graph; parsing drives the start
/// production over a fresh [Tokenizer] for the given input.
pub struct Parser<TL: TokenImpl, V> {
    spec: Rc<TokenSpec<TL>>,
    start: Rc<dyn IProduction<Token = TL, Value = V>>,
}
