//! A module consists of lexeme utilities which match rule tokens at byte
//! positions of the input.
//!
//! A [TokenSpec](crate::TokenSpec) dispatches fixed spellings through its
//! literal trie; everything else (numbers, identifiers, whitespace, comments)
//! is matched by a rule lexeme implementing [ILexeme](crate::ILexeme).
//! A [Pattern] matches an anchored regular expression, while a [Thunk] wraps an
//! open-coded function for token shapes a regular expression cannot express
//! (for example a matcher that reports part of the input as an unrecognized
//! run).
//!
//! # Example
//!
//! ```
//! use lexgram::lexeme::Pattern;
//! use lexgram::{TokenImpl, TokenSpec, Tokenizer};
//! use std::rc::Rc;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
//! enum Token {
//!     Id,
//!     Space,
//!     Error,
//!     Eof,
//! }
//!
//! impl TokenImpl for Token {
//!     fn eof() -> Self { Self::Eof }
//!     fn error() -> Self { Self::Error }
//!     fn name(&self) -> &'static str {
//!         match self {
//!             Token::Id => "<id>",
//!             Token::Space => "<space>",
//!             Token::Error => "<error>",
//!             Token::Eof => "<eof>",
//!         }
//!     }
//! }
//!
//! let spec = Rc::new(
//!     TokenSpec::builder()
//!         .rule(Rc::new(Pattern::new(Token::Id, r"^[_a-zA-Z][_0-9a-zA-Z]*").unwrap()))
//!         .rule(Rc::new(Pattern::new(Token::Space, r"^\s+").unwrap()))
//!         .whitespace(Token::Space)
//!         .build()
//!         .unwrap(),
//! );
//!
//! let tokens: Vec<_> = Tokenizer::new(&spec, b"abc xy")
//!     .tokens()
//!     .map(|t| (t.kind, t.offset))
//!     .collect();
//! assert_eq!(tokens, vec![(Token::Id, 0), (Token::Id, 4)]);
//! ```

mod pattern;
mod thunk;

use crate::util::{Code, Log};
use crate::{MatchResult, TokenImpl};
use once_cell::unsync::OnceCell;
use regex::bytes::Regex;

pub(crate) trait LexemeLogger {
    fn log_cell(&self) -> &OnceCell<Log<&'static str>>;

    fn log_result<T: TokenImpl>(&self, _pointer: usize, _code: &Code, _result: &MatchResult<T>) {
        #[cfg(debug_assertions)]
        if let Some(log_label) = self.log_cell().get() {
            match _result {
                MatchResult::Success { kind, bump } => {
                    if log_label.order() >= Log::Success(()).order() {
                        println!(
                            "[{}; LexemeSuccess]: token: {:?} at {} consuming {}",
                            log_label,
                            kind,
                            _code.obtain_position(_pointer),
                            bump
                        )
                    }
                }
                _ => {
                    if log_label.order() >= Log::Result(()).order() {
                        println!(
                            "[{}; LexemeMiss]: at {}",
                            log_label,
                            _code.obtain_position(_pointer)
                        )
                    }
                }
            }
        }
    }
}

/// A regular expression based rule lexeme.
///
/// The provided expression is matched at incremental positions of the input
/// bytes. The expression must be anchored to the start of the match
/// (`^`) and must not match an empty string.
///
/// A pattern whose first byte overlaps a declared literal (for example a float
/// pattern starting with `.` while `.` is a literal) should declare the
/// conflict with [conflicts_with](Pattern::conflicts_with) so the match engine
/// re-checks the pattern wherever that literal wins.
pub struct Pattern<TL: TokenImpl> {
    token: TL,
    regexp: Regex,
    conflicts: Vec<TL>,
    log: OnceCell<Log<&'static str>>,
}

/// An open-coded rule lexeme.
///
/// The wrapped function receives the remaining input bytes and returns a full
/// [MatchResult], so it can also report an unrecognized run (for example `12`
/// in `12anumber` for an integer matcher that forbids a trailing letter).
pub struct Thunk<TL: TokenImpl, TF: Fn(&[u8]) -> MatchResult<TL>> {
    token: TL,
    thunk: TF,
    conflicts: Vec<TL>,
    log: OnceCell<Log<&'static str>>,
}
