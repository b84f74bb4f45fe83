//! A module consists of production utilities which are helper utilities to
//! write the grammar for the parser.
//!
//! Each production utility represents a defined rule of derivation. A
//! [TokenProduction] matches exactly one token of a declared kind. A
//! [RuleProduction] derives a PEG-like rule built from token atoms, silent
//! tokens, sequences, token choices, and guarded production choices. A
//! [ListProduction] (or [BracketedListProduction]) derives a separated
//! repetition, and an [OperatorProduction] derives an operator-precedence
//! expression assembled from the combinators in [operators].
//!
//! Productions are composed through [Rc](std::rc::Rc) references and report
//! matched constructs to the caller's [Visitor](crate::Visitor); a recursive
//! grammar is tied late with `init()` and `set_rule(..)`.

mod list;
pub mod operators;
mod rule;
mod token_production;

#[cfg(test)]
mod __tests__;

use crate::util::{Code, Log};
use crate::{IProduction, TokenImpl};
use once_cell::unsync::OnceCell;
use self::operators::OpExpr;
use std::collections::HashSet;
use std::marker::PhantomData;
use std::rc::Rc;

pub(crate) struct NTHelper {
    pub(crate) identifier: &'static str,
    debugger: OnceCell<Log<&'static str>>,
}

impl NTHelper {
    pub(crate) fn new(identifier: &'static str) -> Self {
        Self {
            identifier,
            debugger: OnceCell::new(),
        }
    }

    pub(crate) fn assign_debugger(&self, debugger: Log<&'static str>) -> Result<(), String> {
        self.debugger
            .set(debugger)
            .map_err(|err| format!("Debugger {} is already set for this production.", err))
    }
}

pub(crate) trait ProductionLogger {
    fn get_debugger(&self) -> Option<&Log<&'static str>>;

    fn log_entry(&self) {
        #[cfg(debug_assertions)]
        if let Some(log_label) = self.get_debugger() {
            if log_label.order() >= Log::Verbose(()).order() {
                println!("Entering '{}'", log_label)
            }
        }
    }

    fn log_success(&self, _code: &Code, _start: usize, _end: usize) {
        #[cfg(debug_assertions)]
        if let Some(log_label) = self.get_debugger() {
            if log_label.order() >= Log::Success(()).order() {
                println!(
                    "Parsing Success for '{}': from {} to {}.",
                    log_label,
                    _code.obtain_position(_start),
                    _code.obtain_position(_end),
                )
            }
        }
    }

    fn log_unparsed(&self, _code: &Code, _index: usize) {
        #[cfg(debug_assertions)]
        if let Some(log_label) = self.get_debugger() {
            if log_label.order() >= Log::Result(()).order() {
                println!(
                    "Unparsed production '{}': at {}.",
                    log_label,
                    _code.obtain_position(_index),
                )
            }
        }
    }
}

impl ProductionLogger for NTHelper {
    fn get_debugger(&self) -> Option<&Log<&'static str>> {
        self.debugger.get()
    }
}

/// A terminal production which matches exactly one token of the declared kind
/// and forwards it to the visitor.
pub struct TokenProduction<TL: TokenImpl, V> {
    token: TL,
    nt_helper: NTHelper,
    _value: PhantomData<V>,
}

/// A PEG-like rule expression: the body of a [RuleProduction] alternative.
pub enum RuleExpr<TL: TokenImpl, V> {
    /// Consume a token of the exact kind and forward it.
    Token(TL),
    /// Consume a token of the exact kind without forwarding it.
    Silent(TL),
    /// Forward whatever token is current; the catch-all sink of a choice.
    AnyToken,
    /// Match only when the tokenizer reports done.
    Eof,
    /// Recursively parse another production and forward its value.
    Prod(Rc<dyn IProduction<Token = TL, Value = V>>),
    /// Parse every element in order, short-circuiting on unmatched.
    Seq(Vec<RuleExpr<TL, V>>),
    /// One-token-lookahead alternation between token-shaped rules with
    /// pairwise disjoint leading sets.
    Choice(Vec<RuleExpr<TL, V>>),
    /// `A / empty`, decided by `A`'s leading set.
    Opt(Box<RuleExpr<TL, V>>),
}

#[derive(Clone)]
/// The peek predicate guarding a [RuleAlt].
pub enum Guard<TL: TokenImpl> {
    /// Fires when the next tokens are exactly these kinds (nothing is
    /// consumed).
    Peek(Vec<TL>),
    /// Always fires.
    Else,
}

/// A guarded alternative of a [RuleProduction].
pub struct RuleAlt<TL: TokenImpl, V> {
    pub(crate) guard: Guard<TL>,
    pub(crate) rule: RuleExpr<TL, V>,
}

pub(crate) struct LeftRecursion<TL> {
    pub(crate) index: usize,
    pub(crate) first: HashSet<TL>,
}

/// A production derived from guarded PEG-like alternatives.
///
/// Alternatives are tried in order; a [Guard::Peek] guard commits its branch
/// by one-token-shaped lookahead, a [Guard::Else] branch always commits. For
/// every successful alternative the visitor receives the production tag and
/// the forwarded tokens and sub-values in order.
///
/// A single direct left-recursive alternative `P := P tail` is rewritten into
/// iteration: a seed alternative parses first, then the tail is folded
/// through the visitor while its leading set accepts the next token.
pub struct RuleProduction<TL: TokenImpl, V> {
    alternatives: OnceCell<Vec<RuleAlt<TL, V>>>,
    left_recursion: OnceCell<Option<LeftRecursion<TL>>>,
    nt_helper: NTHelper,
}

/// The element of a list production: a token kind or a production.
pub enum ListElement<TL: TokenImpl, V> {
    Token(TL),
    Prod(Rc<dyn IProduction<Token = TL, Value = V>>),
}

/// A production which derives `element (separator element)*`.
///
/// The optional `end` token bounds the list without being consumed;
/// `allow_empty` and `allow_trailing` require it. The visitor receives one
/// call per list step: an empty call for a permitted empty list, the first
/// element alone, then `(accumulated, element)` for every further element.
pub struct ListProduction<TL: TokenImpl, V> {
    element: ListElement<TL, V>,
    separator: Option<TL>,
    end: Option<TL>,
    allow_empty: bool,
    allow_trailing: bool,
    nt_helper: NTHelper,
}

/// A [ListProduction] framed by required open and close tokens; the close
/// token is the list's end.
pub struct BracketedListProduction<TL: TokenImpl, V> {
    open: TL,
    close: TL,
    element: ListElement<TL, V>,
    separator: Option<TL>,
    allow_empty: bool,
    allow_trailing: bool,
    nt_helper: NTHelper,
}

/// An operator-precedence production assembled from the combinators in
/// [operators].
///
/// The production drives a Pratt-style parse over its combinator tree and
/// reports every applied operator to the visitor: `(op, rhs)` for prefix
/// operators, `(lhs, op)` for postfix, `(lhs, op, rhs)` for binary, and a
/// single-value call converting an atom.
pub struct OperatorProduction<TL: TokenImpl, V> {
    rule: OnceCell<OpExpr<TL, V>>,
    nt_helper: NTHelper,
}
