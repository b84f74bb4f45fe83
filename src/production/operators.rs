//! Operator-precedence combinators for an
//! [OperatorProduction](crate::production::OperatorProduction).
//!
//! A hierarchy is assembled from the inside out: an [atom] (optionally
//! alternated with [parenthesized] through [OpExpr::or]) forms the operand,
//! prefix/postfix levels bind tightest, and each binary level wraps the level
//! that binds tighter than itself. `single` levels apply their operator at
//! most once, `left`/`right` levels fold chains with the named associativity,
//! and `chain` parses like `left` while leaving the flat interpretation to the
//! visitor. The `*_prod_*` variants take the operator from a sub-production
//! instead of a token set. [expr] marks an expression boundary: a trailing
//! operator of the wrapped hierarchy is reported as an illegal operator
//! chain.

use crate::production::{NTHelper, OperatorProduction, ProductionLogger};
use crate::util::Log;
use crate::{
    Arg, ErrorKind, IProduction, ImplementationError, ParseResult, TokenImpl, Tokenizer, Unmatched,
    Visitor,
};
use once_cell::unsync::OnceCell;
use std::collections::HashSet;
use std::fmt::Display;
use std::rc::Rc;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Assoc {
    Single,
    Left,
    Right,
    Chain,
}

enum OpMatch<TL: TokenImpl, V> {
    Tokens(Vec<TL>),
    Prod(
        Rc<dyn IProduction<Token = TL, Value = V>>,
        OnceCell<HashSet<TL>>,
    ),
}

impl<TL: TokenImpl, V> OpMatch<TL, V> {
    fn matches(&self, kind: TL) -> bool {
        match self {
            OpMatch::Tokens(kinds) => kinds.contains(&kind),
            OpMatch::Prod(production, first) => first
                .get_or_init(|| {
                    let mut set = HashSet::new();
                    production.impl_first_set(&mut set);
                    set
                })
                .contains(&kind),
        }
    }

    fn collect(&self, set: &mut HashSet<TL>) {
        match self {
            OpMatch::Tokens(kinds) => set.extend(kinds.iter().copied()),
            OpMatch::Prod(production, _) => production.impl_first_set(set),
        }
    }

    fn consume<'i>(
        &self,
        tokenizer: &mut Tokenizer<'i, TL>,
        visitor: &mut dyn Visitor<TL, Value = V>,
    ) -> ParseResult<Arg<'i, TL, V>> {
        match self {
            OpMatch::Tokens(_) => {
                let token = tokenizer.peek();
                tokenizer.bump();
                Ok(Arg::Token(token))
            }
            OpMatch::Prod(production, _) => {
                Ok(Arg::Value(production.parse(tokenizer, visitor)?))
            }
        }
    }

    fn validate(
        &self,
        identifier: &'static str,
        at_first: bool,
        first_path: &mut Vec<&'static str>,
        validated: &mut HashSet<&'static str>,
    ) -> Result<(), ImplementationError> {
        match self {
            OpMatch::Tokens(kinds) => {
                if kinds.is_empty() {
                    Err(ImplementationError::new(
                        "EmptyOperatorSet".to_string(),
                        format!("An operator level of '{}' has no operator tokens.", identifier),
                    ))
                } else {
                    Ok(())
                }
            }
            OpMatch::Prod(production, _) => {
                if at_first {
                    production.validate(first_path, validated)
                } else {
                    production.validate(&mut Vec::new(), validated)
                }
            }
        }
    }

    fn impl_grammar(
        &self,
        writer: &mut dyn std::fmt::Write,
        added_rules: &mut HashSet<&'static str>,
    ) -> Result<(), std::fmt::Error> {
        match self {
            OpMatch::Tokens(_) => Ok(()),
            OpMatch::Prod(production, _) => production.impl_grammar(writer, added_rules),
        }
    }
}

impl<TL: TokenImpl, V> Clone for OpMatch<TL, V> {
    fn clone(&self) -> Self {
        match self {
            OpMatch::Tokens(kinds) => OpMatch::Tokens(kinds.clone()),
            OpMatch::Prod(production, first) => OpMatch::Prod(production.clone(), first.clone()),
        }
    }
}

impl<TL: TokenImpl, V> Display for OpMatch<TL, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OpMatch::Tokens(kinds) => {
                for (index, kind) in kinds.iter().enumerate() {
                    if index > 0 {
                        write!(f, "/")?;
                    }
                    write!(f, "[&{}]", kind.name())?;
                }
                Ok(())
            }
            OpMatch::Prod(production, _) => write!(f, "{}", production.identifier()),
        }
    }
}

enum OpNode<TL: TokenImpl, V> {
    Atom(Rc<dyn IProduction<Token = TL, Value = V>>),
    Parens {
        open: TL,
        close: TL,
    },
    Prefix {
        ops: OpMatch<TL, V>,
        chain: bool,
        operand: Box<OpExpr<TL, V>>,
    },
    Postfix {
        ops: OpMatch<TL, V>,
        chain: bool,
        operand: Box<OpExpr<TL, V>>,
    },
    Binary {
        ops: OpMatch<TL, V>,
        assoc: Assoc,
        operand: Box<OpExpr<TL, V>>,
    },
    Bounded(Box<OpExpr<TL, V>>),
    Choice(Vec<OpExpr<TL, V>>),
}

/// A node of an operator hierarchy, built by the combinator functions of this
/// module.
pub struct OpExpr<TL: TokenImpl, V> {
    node: OpNode<TL, V>,
}

impl<TL: TokenImpl, V> Clone for OpNode<TL, V> {
    fn clone(&self) -> Self {
        match self {
            OpNode::Atom(production) => OpNode::Atom(production.clone()),
            OpNode::Parens { open, close } => OpNode::Parens {
                open: *open,
                close: *close,
            },
            OpNode::Prefix { ops, chain, operand } => OpNode::Prefix {
                ops: ops.clone(),
                chain: *chain,
                operand: operand.clone(),
            },
            OpNode::Postfix { ops, chain, operand } => OpNode::Postfix {
                ops: ops.clone(),
                chain: *chain,
                operand: operand.clone(),
            },
            OpNode::Binary { ops, assoc, operand } => OpNode::Binary {
                ops: ops.clone(),
                assoc: *assoc,
                operand: operand.clone(),
            },
            OpNode::Bounded(inner) => OpNode::Bounded(inner.clone()),
            OpNode::Choice(branches) => OpNode::Choice(branches.clone()),
        }
    }
}

impl<TL: TokenImpl, V> Clone for OpExpr<TL, V> {
    fn clone(&self) -> Self {
        Self {
            node: self.node.clone(),
        }
    }
}

/// The base operand: a sub-production converted through the visitor's
/// single-value call.
pub fn atom<P: IProduction + 'static>(production: &Rc<P>) -> OpExpr<P::Token, P::Value> {
    OpExpr {
        node: OpNode::Atom(production.clone()),
    }
}

/// A parenthesized recursion into the whole expression; part of an
/// `atom(..).or(parenthesized(..))` alternative.
pub fn parenthesized<TL: TokenImpl, V>(open: TL, close: TL) -> OpExpr<TL, V> {
    OpExpr {
        node: OpNode::Parens { open, close },
    }
}

fn prefix<TL: TokenImpl, V>(ops: OpMatch<TL, V>, chain: bool, operand: OpExpr<TL, V>) -> OpExpr<TL, V> {
    OpExpr {
        node: OpNode::Prefix {
            ops,
            chain,
            operand: Box::new(operand),
        },
    }
}

fn postfix<TL: TokenImpl, V>(ops: OpMatch<TL, V>, chain: bool, operand: OpExpr<TL, V>) -> OpExpr<TL, V> {
    OpExpr {
        node: OpNode::Postfix {
            ops,
            chain,
            operand: Box::new(operand),
        },
    }
}

fn binary<TL: TokenImpl, V>(ops: OpMatch<TL, V>, assoc: Assoc, operand: OpExpr<TL, V>) -> OpExpr<TL, V> {
    OpExpr {
        node: OpNode::Binary {
            ops,
            assoc,
            operand: Box::new(operand),
        },
    }
}

/// An optional prefix operator, applied at most once.
pub fn pre_op_single<TL: TokenImpl, V>(ops: Vec<TL>, operand: OpExpr<TL, V>) -> OpExpr<TL, V> {
    prefix(OpMatch::Tokens(ops), false, operand)
}

/// A prefix operator repeated zero or more times.
pub fn pre_op_chain<TL: TokenImpl, V>(ops: Vec<TL>, operand: OpExpr<TL, V>) -> OpExpr<TL, V> {
    prefix(OpMatch::Tokens(ops), true, operand)
}

/// An optional postfix operator, applied at most once.
pub fn post_op_single<TL: TokenImpl, V>(ops: Vec<TL>, operand: OpExpr<TL, V>) -> OpExpr<TL, V> {
    postfix(OpMatch::Tokens(ops), false, operand)
}

/// A postfix operator repeated zero or more times.
pub fn post_op_chain<TL: TokenImpl, V>(ops: Vec<TL>, operand: OpExpr<TL, V>) -> OpExpr<TL, V> {
    postfix(OpMatch::Tokens(ops), true, operand)
}

/// A binary level applied at most once; chaining it is left to the outer
/// levels or reported at an [expr] boundary.
pub fn bin_op_single<TL: TokenImpl, V>(ops: Vec<TL>, operand: OpExpr<TL, V>) -> OpExpr<TL, V> {
    binary(OpMatch::Tokens(ops), Assoc::Single, operand)
}

/// A left-associative binary level.
pub fn bin_op_left<TL: TokenImpl, V>(ops: Vec<TL>, operand: OpExpr<TL, V>) -> OpExpr<TL, V> {
    binary(OpMatch::Tokens(ops), Assoc::Left, operand)
}

/// A right-associative binary level.
pub fn bin_op_right<TL: TokenImpl, V>(ops: Vec<TL>, operand: OpExpr<TL, V>) -> OpExpr<TL, V> {
    binary(OpMatch::Tokens(ops), Assoc::Right, operand)
}

/// A chained binary level: parsed like a left fold, with the flat
/// interpretation left to the visitor.
pub fn bin_op_chain<TL: TokenImpl, V>(ops: Vec<TL>, operand: OpExpr<TL, V>) -> OpExpr<TL, V> {
    binary(OpMatch::Tokens(ops), Assoc::Chain, operand)
}

/// Like [pre_op_single], with the operator parsed by a sub-production.
pub fn pre_prod_single<P: IProduction + 'static>(
    op: &Rc<P>,
    operand: OpExpr<P::Token, P::Value>,
) -> OpExpr<P::Token, P::Value> {
    prefix(OpMatch::Prod(op.clone(), OnceCell::new()), false, operand)
}

/// Like [pre_op_chain], with the operator parsed by a sub-production.
pub fn pre_prod_chain<P: IProduction + 'static>(
    op: &Rc<P>,
    operand: OpExpr<P::Token, P::Value>,
) -> OpExpr<P::Token, P::Value> {
    prefix(OpMatch::Prod(op.clone(), OnceCell::new()), true, operand)
}

/// Like [post_op_single], with the operator parsed by a sub-production.
pub fn post_prod_single<P: IProduction + 'static>(
    op: &Rc<P>,
    operand: OpExpr<P::Token, P::Value>,
) -> OpExpr<P::Token, P::Value> {
    postfix(OpMatch::Prod(op.clone(), OnceCell::new()), false, operand)
}

/// Like [post_op_chain], with the operator parsed by a sub-production.
pub fn post_prod_chain<P: IProduction + 'static>(
    op: &Rc<P>,
    operand: OpExpr<P::Token, P::Value>,
) -> OpExpr<P::Token, P::Value> {
    postfix(OpMatch::Prod(op.clone(), OnceCell::new()), true, operand)
}

/// Like [bin_op_single], with the operator parsed by a sub-production.
pub fn bin_prod_single<P: IProduction + 'static>(
    op: &Rc<P>,
    operand: OpExpr<P::Token, P::Value>,
) -> OpExpr<P::Token, P::Value> {
    binary(OpMatch::Prod(op.clone(), OnceCell::new()), Assoc::Single, operand)
}

/// Like [bin_op_left], with the operator parsed by a sub-production.
pub fn bin_prod_left<P: IProduction + 'static>(
    op: &Rc<P>,
    operand: OpExpr<P::Token, P::Value>,
) -> OpExpr<P::Token, P::Value> {
    binary(OpMatch::Prod(op.clone(), OnceCell::new()), Assoc::Left, operand)
}

/// Like [bin_op_right], with the operator parsed by a sub-production.
pub fn bin_prod_right<P: IProduction + 'static>(
    op: &Rc<P>,
    operand: OpExpr<P::Token, P::Value>,
) -> OpExpr<P::Token, P::Value> {
    binary(OpMatch::Prod(op.clone(), OnceCell::new()), Assoc::Right, operand)
}

/// Like [bin_op_chain], with the operator parsed by a sub-production.
pub fn bin_prod_chain<P: IProduction + 'static>(
    op: &Rc<P>,
    operand: OpExpr<P::Token, P::Value>,
) -> OpExpr<P::Token, P::Value> {
    binary(OpMatch::Prod(op.clone(), OnceCell::new()), Assoc::Chain, operand)
}

/// Mark an expression boundary: after parsing, a peeked operator of the
/// wrapped hierarchy reports an illegal operator chain.
pub fn expr<TL: TokenImpl, V>(operand: OpExpr<TL, V>) -> OpExpr<TL, V> {
    OpExpr {
        node: OpNode::Bounded(Box::new(operand)),
    }
}

impl<TL: TokenImpl, V> OpExpr<TL, V> {
    /// Alternate with another hierarchy sharing a common atom; the first
    /// branch accepting the next token wins.
    pub fn or(self, alternative: OpExpr<TL, V>) -> Self {
        match self.node {
            OpNode::Choice(mut branches) => {
                branches.push(alternative);
                OpExpr {
                    node: OpNode::Choice(branches),
                }
            }
            node => OpExpr {
                node: OpNode::Choice(vec![OpExpr { node }, alternative]),
            },
        }
    }

    /// Whether `kind` is an infix operator of this level or a level below.
    fn has_matching_precedence(&self, kind: TL) -> bool {
        match &self.node {
            OpNode::Atom(_) | OpNode::Parens { .. } => false,
            OpNode::Prefix { operand, .. } => operand.has_matching_precedence(kind),
            OpNode::Postfix { ops, operand, .. } | OpNode::Binary { ops, operand, .. } => {
                ops.matches(kind) || operand.has_matching_precedence(kind)
            }
            OpNode::Bounded(inner) => inner.has_matching_precedence(kind),
            OpNode::Choice(branches) => {
                branches.iter().any(|branch| branch.has_matching_precedence(kind))
            }
        }
    }

    /// Whether `kind` decides operand entry for this branch: its parenthesis
    /// open or one of its prefix operators.
    fn decisive_entry(&self, kind: TL) -> bool {
        match &self.node {
            OpNode::Atom(_) => false,
            OpNode::Parens { open, .. } => kind == *open,
            OpNode::Prefix { ops, operand, .. } => {
                ops.matches(kind) || operand.decisive_entry(kind)
            }
            OpNode::Postfix { operand, .. } | OpNode::Binary { operand, .. } => {
                operand.decisive_entry(kind)
            }
            OpNode::Bounded(inner) => inner.decisive_entry(kind),
            OpNode::Choice(branches) => branches.iter().any(|branch| branch.decisive_entry(kind)),
        }
    }

    pub(crate) fn impl_first_set(&self, set: &mut HashSet<TL>) {
        match &self.node {
            OpNode::Atom(production) => production.impl_first_set(set),
            OpNode::Parens { open, .. } => {
                set.insert(*open);
            }
            OpNode::Prefix { ops, operand, .. } => {
                ops.collect(set);
                operand.impl_first_set(set);
            }
            OpNode::Postfix { operand, .. } | OpNode::Binary { operand, .. } => {
                operand.impl_first_set(set)
            }
            OpNode::Bounded(inner) => inner.impl_first_set(set),
            OpNode::Choice(branches) => {
                for branch in branches {
                    branch.impl_first_set(set);
                }
            }
        }
    }

    fn validate(
        &self,
        identifier: &'static str,
        first_path: &mut Vec<&'static str>,
        validated: &mut HashSet<&'static str>,
    ) -> Result<(), ImplementationError> {
        match &self.node {
            OpNode::Atom(production) => production.validate(first_path, validated),
            OpNode::Parens { .. } => Ok(()),
            OpNode::Prefix { ops, operand, .. } => {
                ops.validate(identifier, true, first_path, validated)?;
                operand.validate(identifier, first_path, validated)
            }
            OpNode::Postfix { ops, operand, .. } | OpNode::Binary { ops, operand, .. } => {
                ops.validate(identifier, false, first_path, validated)?;
                operand.validate(identifier, first_path, validated)
            }
            OpNode::Bounded(inner) => inner.validate(identifier, first_path, validated),
            OpNode::Choice(branches) => {
                if branches.is_empty() {
                    return Err(ImplementationError::new(
                        "EmptyChoice".to_string(),
                        format!("An operator choice of '{}' has no branches.", identifier),
                    ));
                }
                for branch in branches {
                    branch.validate(identifier, first_path, validated)?;
                }
                Ok(())
            }
        }
    }

    fn impl_grammar(
        &self,
        writer: &mut dyn std::fmt::Write,
        added_rules: &mut HashSet<&'static str>,
    ) -> Result<(), std::fmt::Error> {
        match &self.node {
            OpNode::Atom(production) => production.impl_grammar(writer, added_rules),
            OpNode::Parens { .. } => Ok(()),
            OpNode::Prefix { ops, operand, .. }
            | OpNode::Postfix { ops, operand, .. }
            | OpNode::Binary { ops, operand, .. } => {
                ops.impl_grammar(writer, added_rules)?;
                operand.impl_grammar(writer, added_rules)
            }
            OpNode::Bounded(inner) => inner.impl_grammar(writer, added_rules),
            OpNode::Choice(branches) => {
                for branch in branches {
                    branch.impl_grammar(writer, added_rules)?;
                }
                Ok(())
            }
        }
    }

    fn parse_infix_operand(
        &self,
        production: &OperatorProduction<TL, V>,
        tokenizer: &mut Tokenizer<'_, TL>,
        visitor: &mut dyn Visitor<TL, Value = V>,
    ) -> ParseResult<V> {
        match &self.node {
            OpNode::Atom(operand) => {
                let value = operand.parse(tokenizer, visitor)?;
                visitor.production(production.identifier(), vec![Arg::Value(value)])
            }
            OpNode::Parens { open, close } => {
                if tokenizer.peek().is(*open) {
                    tokenizer.bump();
                    let value = production
                        .get_rule()
                        .parse_binary(production, tokenizer, visitor)?;
                    if tokenizer.peek().is(*close) {
                        tokenizer.bump();
                        Ok(value)
                    } else {
                        visitor.error(
                            ErrorKind::UnexpectedToken {
                                production: production.identifier(),
                                expected: *close,
                            },
                            tokenizer,
                        );
                        Err(Unmatched)
                    }
                } else {
                    visitor.error(
                        ErrorKind::UnexpectedToken {
                            production: production.identifier(),
                            expected: *open,
                        },
                        tokenizer,
                    );
                    Err(Unmatched)
                }
            }
            OpNode::Prefix { ops, chain, operand } => {
                if ops.matches(tokenizer.peek().kind) {
                    let op = ops.consume(tokenizer, visitor)?;
                    let value = if *chain {
                        self.parse_infix_operand(production, tokenizer, visitor)?
                    } else {
                        operand.parse_infix_operand(production, tokenizer, visitor)?
                    };
                    visitor.production(production.identifier(), vec![op, Arg::Value(value)])
                } else {
                    operand.parse_infix_operand(production, tokenizer, visitor)
                }
            }
            OpNode::Postfix { ops, chain, operand } => {
                let mut value = operand.parse_infix_operand(production, tokenizer, visitor)?;
                while ops.matches(tokenizer.peek().kind) {
                    let op = ops.consume(tokenizer, visitor)?;
                    value =
                        visitor.production(production.identifier(), vec![Arg::Value(value), op])?;
                    if !*chain {
                        break;
                    }
                }
                Ok(value)
            }
            OpNode::Binary { operand, .. } => {
                operand.parse_infix_operand(production, tokenizer, visitor)
            }
            OpNode::Bounded(inner) => inner.parse_infix_operand(production, tokenizer, visitor),
            OpNode::Choice(branches) => {
                let kind = tokenizer.peek().kind;
                if let Some(branch) = unique_decisive(branches, kind) {
                    return branch.parse_infix_operand(production, tokenizer, visitor);
                }
                match branches.first() {
                    Some(branch) => branch.parse_infix_operand(production, tokenizer, visitor),
                    None => Err(Unmatched),
                }
            }
        }
    }

    pub(crate) fn parse_binary(
        &self,
        production: &OperatorProduction<TL, V>,
        tokenizer: &mut Tokenizer<'_, TL>,
        visitor: &mut dyn Visitor<TL, Value = V>,
    ) -> ParseResult<V> {
        match &self.node {
            OpNode::Binary { .. } => {
                let lhs = self.parse_infix_operand(production, tokenizer, visitor)?;
                self.parse_binary_from(lhs, production, tokenizer, visitor)
            }
            OpNode::Bounded(inner) => {
                let value = inner.parse_binary(production, tokenizer, visitor)?;
                check_boundary(inner, value, production, tokenizer, visitor)
            }
            OpNode::Choice(branches) => {
                let kind = tokenizer.peek().kind;
                if let Some(branch) = unique_decisive(branches, kind) {
                    return branch.parse_binary(production, tokenizer, visitor);
                }
                let lhs = match branches.first() {
                    Some(branch) => branch.parse_infix_operand(production, tokenizer, visitor)?,
                    None => return Err(Unmatched),
                };
                let op = tokenizer.peek().kind;
                match branches
                    .iter()
                    .find(|branch| branch.has_matching_precedence(op))
                {
                    Some(branch) => branch.parse_binary_from(lhs, production, tokenizer, visitor),
                    None => Ok(lhs),
                }
            }
            _ => self.parse_infix_operand(production, tokenizer, visitor),
        }
    }

    fn parse_binary_from(
        &self,
        lhs: V,
        production: &OperatorProduction<TL, V>,
        tokenizer: &mut Tokenizer<'_, TL>,
        visitor: &mut dyn Visitor<TL, Value = V>,
    ) -> ParseResult<V> {
        match &self.node {
            OpNode::Atom(_) | OpNode::Parens { .. } => Ok(lhs),
            OpNode::Prefix { operand, .. } => {
                operand.parse_binary_from(lhs, production, tokenizer, visitor)
            }
            OpNode::Postfix { ops, chain, operand } => {
                let mut lhs = lhs;
                loop {
                    let kind = tokenizer.peek().kind;
                    if ops.matches(kind) {
                        let op = ops.consume(tokenizer, visitor)?;
                        lhs = visitor
                            .production(production.identifier(), vec![Arg::Value(lhs), op])?;
                        if !*chain {
                            break;
                        }
                    } else if operand.has_matching_precedence(kind) {
                        lhs = operand.parse_binary_from(lhs, production, tokenizer, visitor)?;
                    } else {
                        break;
                    }
                }
                Ok(lhs)
            }
            OpNode::Binary { ops, assoc, operand } => {
                let mut lhs = lhs;
                loop {
                    let kind = tokenizer.peek().kind;
                    if ops.matches(kind) {
                        let op = ops.consume(tokenizer, visitor)?;
                        let rhs = match assoc {
                            Assoc::Right => self.parse_binary(production, tokenizer, visitor)?,
                            _ => operand.parse_binary(production, tokenizer, visitor)?,
                        };
                        lhs = visitor.production(
                            production.identifier(),
                            vec![Arg::Value(lhs), op, Arg::Value(rhs)],
                        )?;
                        match assoc {
                            Assoc::Single | Assoc::Right => break,
                            _ => {}
                        }
                    } else if operand.has_matching_precedence(kind) {
                        lhs = operand.parse_binary_from(lhs, production, tokenizer, visitor)?;
                    } else {
                        break;
                    }
                }
                Ok(lhs)
            }
            OpNode::Bounded(inner) => {
                let value = inner.parse_binary_from(lhs, production, tokenizer, visitor)?;
                check_boundary(inner, value, production, tokenizer, visitor)
            }
            OpNode::Choice(branches) => {
                let kind = tokenizer.peek().kind;
                match branches
                    .iter()
                    .find(|branch| branch.has_matching_precedence(kind))
                {
                    Some(branch) => branch.parse_binary_from(lhs, production, tokenizer, visitor),
                    None => Ok(lhs),
                }
            }
        }
    }
}

/// The branch committed by an entry token: exactly one branch must claim it.
/// A token shared between branches (a common parenthesis) decides nothing.
fn unique_decisive<TL: TokenImpl, V>(
    branches: &[OpExpr<TL, V>],
    kind: TL,
) -> Option<&OpExpr<TL, V>> {
    let mut found = None;
    for branch in branches {
        if branch.decisive_entry(kind) {
            if found.is_some() {
                return None;
            }
            found = Some(branch);
        }
    }
    found
}

fn check_boundary<TL: TokenImpl, V>(
    inner: &OpExpr<TL, V>,
    value: V,
    production: &OperatorProduction<TL, V>,
    tokenizer: &mut Tokenizer<'_, TL>,
    visitor: &mut dyn Visitor<TL, Value = V>,
) -> ParseResult<V> {
    let kind = tokenizer.peek().kind;
    if inner.has_matching_precedence(kind) {
        visitor.error(
            ErrorKind::IllegalOperatorChain {
                production: production.identifier(),
                op: kind,
            },
            tokenizer,
        );
        Err(Unmatched)
    } else {
        Ok(value)
    }
}

impl<TL: TokenImpl, V> Display for OpExpr<TL, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.node {
            OpNode::Atom(production) => write!(f, "{}", production.identifier()),
            OpNode::Parens { open, close } => {
                write!(f, "[{}] <expr> [{}]", open.name(), close.name())
            }
            OpNode::Prefix { ops, chain, operand } => {
                write!(f, "({}){} {}", ops, if *chain { "*" } else { "?" }, operand)
            }
            OpNode::Postfix { ops, chain, operand } => {
                write!(f, "{} ({}){}", operand, ops, if *chain { "*" } else { "?" })
            }
            OpNode::Binary { ops, assoc, operand } => match assoc {
                Assoc::Single => write!(f, "{o} ({p} {o})?", o = operand, p = ops),
                _ => write!(f, "{o} ({p} {o})*", o = operand, p = ops),
            },
            OpNode::Bounded(inner) => write!(f, "expr({})", inner),
            OpNode::Choice(branches) => {
                for (index, branch) in branches.iter().enumerate() {
                    if index > 0 {
                        write!(f, " / ")?;
                    }
                    write!(f, "{}", branch)?;
                }
                Ok(())
            }
        }
    }
}

impl<TL: TokenImpl, V> OperatorProduction<TL, V> {
    /// Create a new [OperatorProduction] without a rule, to be tied later
    /// with [set_rule](OperatorProduction::set_rule) for a recursive grammar.
    /// ## Arguments
    /// * `identifier` - An unique identifier.
    pub fn init(identifier: &'static str) -> Self {
        Self {
            rule: OnceCell::new(),
            nt_helper: NTHelper::new(identifier),
        }
    }

    /// Create a new [OperatorProduction] from a combinator tree.
    pub fn new(identifier: &'static str, rule: OpExpr<TL, V>) -> Self {
        let rule_cell = OnceCell::new();
        if let Err(_) = rule_cell.set(rule) {
            panic!("Internal error.");
        }
        Self {
            rule: rule_cell,
            nt_helper: NTHelper::new(identifier),
        }
    }

    /// Set the combinator tree for a production created with
    /// [init](OperatorProduction::init).
    pub fn set_rule(&self, rule: OpExpr<TL, V>) -> Result<(), String> {
        self.rule
            .set(rule)
            .map_err(|_| format!("Rule is already set for {}.", self.nt_helper.identifier))
    }

    /// Set a log label to debug the production based on the level of [Log].
    pub fn set_log(&self, debugger: Log<&'static str>) -> Result<(), String> {
        self.nt_helper.assign_debugger(debugger)
    }

    pub(crate) fn get_rule(&self) -> &OpExpr<TL, V> {
        self.rule.get_or_init(|| {
            if cfg!(debug_assertions) {
                panic!(
                    "Rule is not set for {}. Validate productions before parsing.",
                    self.nt_helper.identifier
                )
            }
            OpExpr {
                node: OpNode::Choice(Vec::new()),
            }
        })
    }
}

impl<TL: TokenImpl, V> Display for OperatorProduction<TL, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.nt_helper.identifier)
    }
}

impl<TL: TokenImpl, V> IProduction for OperatorProduction<TL, V> {
    type Token = TL;
    type Value = V;

    fn identifier(&self) -> &'static str {
        self.nt_helper.identifier
    }

    fn impl_first_set(&self, first_set: &mut HashSet<Self::Token>) {
        self.get_rule().impl_first_set(first_set);
    }

    fn impl_grammar(
        &self,
        writer: &mut dyn std::fmt::Write,
        added_rules: &mut HashSet<&'static str>,
    ) -> Result<(), std::fmt::Error> {
        if added_rules.insert(self.nt_helper.identifier) {
            writeln!(
                writer,
                "{}\n{:>6} {}\n{:>6}",
                self.nt_helper.identifier,
                ":",
                self.get_rule(),
                ";"
            )?;
            self.get_rule().impl_grammar(writer, added_rules)?;
        }
        Ok(())
    }

    fn validate(
        &self,
        first_path: &mut Vec<&'static str>,
        validated: &mut HashSet<&'static str>,
    ) -> Result<(), ImplementationError> {
        if first_path.contains(&self.nt_helper.identifier) {
            return Err(ImplementationError::new(
                "LeftRecursion".to_string(),
                format!(
                    "Production '{}' is left recursive through its first symbol.",
                    self.nt_helper.identifier
                ),
            ));
        }
        if !validated.insert(self.nt_helper.identifier) {
            return Ok(());
        }
        if self.rule.get().is_none() {
            return Err(ImplementationError::new(
                "UnsetProduction".to_string(),
                format!("Rule is not set for '{}'.", self.nt_helper.identifier),
            ));
        }

        first_path.push(self.nt_helper.identifier);
        let result = self
            .get_rule()
            .validate(self.nt_helper.identifier, first_path, validated);
        first_path.pop();
        result
    }

    fn parse(
        &self,
        tokenizer: &mut Tokenizer<'_, Self::Token>,
        visitor: &mut dyn Visitor<Self::Token, Value = Self::Value>,
    ) -> ParseResult<Self::Value> {
        self.nt_helper.log_entry();
        let start = tokenizer.offset();
        let result = self.get_rule().parse_binary(self, tokenizer, visitor);
        match &result {
            Ok(_) => self
                .nt_helper
                .log_success(tokenizer.code(), start, tokenizer.offset()),
            Err(_) => self.nt_helper.log_unparsed(tokenizer.code(), start),
        }
        result
    }
}
