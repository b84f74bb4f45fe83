use crate::production::{Guard, LeftRecursion, NTHelper, ProductionLogger, RuleAlt, RuleExpr, RuleProduction};
use crate::util::Log;
use crate::{
    Arg, ErrorKind, IProduction, ImplementationError, ParseResult, TokenImpl, Tokenizer, Unmatched,
    Visitor,
};
use once_cell::unsync::OnceCell;
use std::collections::HashSet;
use std::fmt::Display;
use std::rc::Rc;

impl<TL: TokenImpl, V> RuleExpr<TL, V> {
    pub fn token(kind: TL) -> Self {
        RuleExpr::Token(kind)
    }

    pub fn silent(kind: TL) -> Self {
        RuleExpr::Silent(kind)
    }

    pub fn any_token() -> Self {
        RuleExpr::AnyToken
    }

    pub fn eof() -> Self {
        RuleExpr::Eof
    }

    pub fn prod<P: IProduction<Token = TL, Value = V> + 'static>(production: &Rc<P>) -> Self {
        RuleExpr::Prod(production.clone())
    }

    /// Sequence: parse `self`, then `next`.
    pub fn then(self, next: RuleExpr<TL, V>) -> Self {
        match self {
            RuleExpr::Seq(mut elements) => {
                elements.push(next);
                RuleExpr::Seq(elements)
            }
            other => RuleExpr::Seq(vec![other, next]),
        }
    }

    /// Token choice: one-token-lookahead alternation with `alternative`.
    pub fn or(self, alternative: RuleExpr<TL, V>) -> Self {
        match self {
            RuleExpr::Choice(mut alternatives) => {
                alternatives.push(alternative);
                RuleExpr::Choice(alternatives)
            }
            other => RuleExpr::Choice(vec![other, alternative]),
        }
    }

    /// `self / empty`.
    pub fn opt(self) -> Self {
        RuleExpr::Opt(Box::new(self))
    }
}

impl<TL: TokenImpl, V> Clone for RuleExpr<TL, V> {
    fn clone(&self) -> Self {
        match self {
            RuleExpr::Token(kind) => RuleExpr::Token(*kind),
            RuleExpr::Silent(kind) => RuleExpr::Silent(*kind),
            RuleExpr::AnyToken => RuleExpr::AnyToken,
            RuleExpr::Eof => RuleExpr::Eof,
            RuleExpr::Prod(production) => RuleExpr::Prod(production.clone()),
            RuleExpr::Seq(elements) => RuleExpr::Seq(elements.clone()),
            RuleExpr::Choice(alternatives) => RuleExpr::Choice(alternatives.clone()),
            RuleExpr::Opt(inner) => RuleExpr::Opt(inner.clone()),
        }
    }
}

impl<TL: TokenImpl, V> Clone for RuleAlt<TL, V> {
    fn clone(&self) -> Self {
        Self {
            guard: self.guard.clone(),
            rule: self.rule.clone(),
        }
    }
}

impl<TL: TokenImpl, V> Display for RuleExpr<TL, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuleExpr::Token(kind) => write!(f, "[&{}]", kind.name()),
            RuleExpr::Silent(kind) => write!(f, "[{}]", kind.name()),
            RuleExpr::AnyToken => write!(f, "<any>"),
            RuleExpr::Eof => write!(f, "<eof>"),
            RuleExpr::Prod(production) => write!(f, "{}", production.identifier()),
            RuleExpr::Seq(elements) => {
                for (index, element) in elements.iter().enumerate() {
                    if index > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", element)?;
                }
                Ok(())
            }
            RuleExpr::Choice(alternatives) => {
                write!(f, "(")?;
                for (index, alternative) in alternatives.iter().enumerate() {
                    if index > 0 {
                        write!(f, " / ")?;
                    }
                    write!(f, "{}", alternative)?;
                }
                write!(f, ")")
            }
            RuleExpr::Opt(inner) => write!(f, "({})?", inner),
        }
    }
}

/// Collect the leading token kinds of an expression, in declaration order.
pub(crate) fn expr_first_list<TL: TokenImpl, V>(expr: &RuleExpr<TL, V>, list: &mut Vec<TL>) {
    let push = |kind: TL, list: &mut Vec<TL>| {
        if !list.contains(&kind) {
            list.push(kind);
        }
    };
    match expr {
        RuleExpr::Token(kind) | RuleExpr::Silent(kind) => push(*kind, list),
        RuleExpr::AnyToken => {}
        RuleExpr::Eof => push(TL::eof(), list),
        RuleExpr::Prod(production) => {
            let mut set = HashSet::new();
            production.impl_first_set(&mut set);
            for kind in set {
                push(kind, list);
            }
        }
        RuleExpr::Seq(elements) => seq_first_list(elements, list),
        RuleExpr::Choice(alternatives) => {
            for alternative in alternatives {
                expr_first_list(alternative, list);
            }
        }
        RuleExpr::Opt(inner) => expr_first_list(inner, list),
    }
}

pub(crate) fn seq_first_list<TL: TokenImpl, V>(elements: &[RuleExpr<TL, V>], list: &mut Vec<TL>) {
    for element in elements {
        expr_first_list(element, list);
        if !expr_nullable(element) {
            break;
        }
    }
}

pub(crate) fn expr_nullable<TL: TokenImpl, V>(expr: &RuleExpr<TL, V>) -> bool {
    match expr {
        RuleExpr::Opt(_) | RuleExpr::Eof => true,
        RuleExpr::Seq(elements) => elements.iter().all(expr_nullable),
        RuleExpr::Choice(alternatives) => alternatives.iter().any(expr_nullable),
        _ => false,
    }
}

pub(crate) fn expr_token_shaped<TL: TokenImpl, V>(expr: &RuleExpr<TL, V>) -> bool {
    match expr {
        RuleExpr::Token(_) | RuleExpr::Silent(_) | RuleExpr::AnyToken | RuleExpr::Eof => true,
        RuleExpr::Prod(_) => false,
        RuleExpr::Seq(elements) => elements.iter().all(expr_token_shaped),
        RuleExpr::Choice(alternatives) => alternatives.iter().all(expr_token_shaped),
        RuleExpr::Opt(inner) => expr_token_shaped(inner),
    }
}

fn expr_is_sink<TL: TokenImpl, V>(expr: &RuleExpr<TL, V>) -> bool {
    match expr {
        RuleExpr::AnyToken => true,
        RuleExpr::Seq(elements) => matches!(elements.first(), Some(RuleExpr::AnyToken)),
        _ => false,
    }
}

fn expr_grammar<TL: TokenImpl, V>(
    expr: &RuleExpr<TL, V>,
    writer: &mut dyn std::fmt::Write,
    added_rules: &mut HashSet<&'static str>,
) -> Result<(), std::fmt::Error> {
    match expr {
        RuleExpr::Prod(production) => production.impl_grammar(writer, added_rules),
        RuleExpr::Seq(elements) | RuleExpr::Choice(elements) => {
            for element in elements {
                expr_grammar(element, writer, added_rules)?;
            }
            Ok(())
        }
        RuleExpr::Opt(inner) => expr_grammar(inner, writer, added_rules),
        _ => Ok(()),
    }
}

/// Peek a sequence of token kinds without consuming anything.
pub(crate) fn guard_matches<TL: TokenImpl>(
    kinds: &[TL],
    tokenizer: &mut Tokenizer<'_, TL>,
) -> bool {
    let saved = tokenizer.offset();
    let mut matched = true;
    for kind in kinds {
        if tokenizer.peek().is(*kind) {
            tokenizer.bump();
        } else {
            matched = false;
            break;
        }
    }
    tokenizer.reset(saved);
    matched
}

impl<TL: TokenImpl, V> RuleAlt<TL, V> {
    /// An alternative taken when the next tokens are exactly `peek`.
    pub fn when(peek: Vec<TL>, rule: RuleExpr<TL, V>) -> Self {
        Self {
            guard: Guard::Peek(peek),
            rule,
        }
    }

    /// An alternative taken when no earlier guard fired.
    pub fn otherwise(rule: RuleExpr<TL, V>) -> Self {
        Self {
            guard: Guard::Else,
            rule,
        }
    }
}

impl<TL: TokenImpl, V> RuleProduction<TL, V> {
    /// Create a new [RuleProduction] without a rule, to be tied later with
    /// [set_rule](RuleProduction::set_rule) for a recursive grammar.
    /// ## Arguments
    /// * `identifier` - An unique identifier.
    pub fn init(identifier: &'static str) -> Self {
        Self {
            alternatives: OnceCell::new(),
            left_recursion: OnceCell::new(),
            nt_helper: NTHelper::new(identifier),
        }
    }

    /// Create a new [RuleProduction] from a single rule expression.
    pub fn new(identifier: &'static str, rule: RuleExpr<TL, V>) -> Self {
        Self::choice(identifier, vec![RuleAlt::otherwise(rule)])
    }

    /// Create a new [RuleProduction] from guarded alternatives, tried in
    /// order.
    pub fn choice(identifier: &'static str, alternatives: Vec<RuleAlt<TL, V>>) -> Self {
        let alternatives_cell = OnceCell::new();
        if let Err(_) = alternatives_cell.set(alternatives) {
            panic!("Internal error.");
        }
        Self {
            alternatives: alternatives_cell,
            left_recursion: OnceCell::new(),
            nt_helper: NTHelper::new(identifier),
        }
    }

    /// Set the rule for a production created with [init](RuleProduction::init).
    pub fn set_rule(&self, rule: RuleExpr<TL, V>) -> Result<(), String> {
        self.set_alternatives(vec![RuleAlt::otherwise(rule)])
    }

    /// Set guarded alternatives for a production created with
    /// [init](RuleProduction::init).
    pub fn set_alternatives(&self, alternatives: Vec<RuleAlt<TL, V>>) -> Result<(), String> {
        self.alternatives.set(alternatives).map_err(|_| {
            format!(
                "Alternatives are already set for {}.",
                self.nt_helper.identifier
            )
        })
    }

    /// Set a log label to debug the production based on the level of [Log].
    pub fn set_log(&self, debugger: Log<&'static str>) -> Result<(), String> {
        self.nt_helper.assign_debugger(debugger)
    }

    fn get_alternatives(&self) -> &Vec<RuleAlt<TL, V>> {
        self.alternatives.get_or_init(|| {
            if cfg!(debug_assertions) {
                panic!(
                    "Alternatives are not set for {}. Validate productions before parsing.",
                    self.nt_helper.identifier
                )
            }
            Vec::new()
        })
    }

    fn is_left_recursive(&self, rule: &RuleExpr<TL, V>) -> bool {
        match rule {
            RuleExpr::Seq(elements) => match elements.first() {
                Some(RuleExpr::Prod(production)) => {
                    production.identifier() == self.nt_helper.identifier
                }
                _ => false,
            },
            RuleExpr::Prod(production) => production.identifier() == self.nt_helper.identifier,
            _ => false,
        }
    }

    fn analyze_left_recursion(&self) -> Result<Option<LeftRecursion<TL>>, ImplementationError> {
        let mut found = None;
        for (index, alternative) in self.get_alternatives().iter().enumerate() {
            if !self.is_left_recursive(&alternative.rule) {
                continue;
            }
            if found.is_some() {
                return Err(ImplementationError::new(
                    "LeftRecursion".to_string(),
                    format!(
                        "Production '{}' has more than one left recursive alternative.",
                        self.nt_helper.identifier
                    ),
                ));
            }
            found = Some(index);
        }

        let index = match found {
            Some(index) => index,
            None => return Ok(None),
        };

        let elements = match &self.get_alternatives()[index].rule {
            RuleExpr::Seq(elements) if elements.len() > 1 => elements,
            _ => {
                return Err(ImplementationError::new(
                    "LeftRecursion".to_string(),
                    format!(
                        "Left recursive alternative of '{}' must be a sequence with a tail.",
                        self.nt_helper.identifier
                    ),
                ));
            }
        };

        let mut leading = Vec::new();
        seq_first_list(&elements[1..], &mut leading);
        if leading.is_empty() {
            return Err(ImplementationError::new(
                "LeftRecursion".to_string(),
                format!(
                    "Left recursive tail of '{}' must start with a token.",
                    self.nt_helper.identifier
                ),
            ));
        }

        Ok(Some(LeftRecursion {
            index,
            first: leading.into_iter().collect(),
        }))
    }

    fn left_recursion_analysis(&self) -> &Option<LeftRecursion<TL>> {
        if self.left_recursion.get().is_none() {
            let analysis = self
                .analyze_left_recursion()
                .expect("Left recursion error should have been caught in validation");
            let _ = self.left_recursion.set(analysis);
        }
        self.left_recursion
            .get()
            .expect("Left recursion analysis is cached")
    }

    fn parse_expr<'i>(
        &self,
        expr: &RuleExpr<TL, V>,
        tokenizer: &mut Tokenizer<'i, TL>,
        visitor: &mut dyn Visitor<TL, Value = V>,
        args: &mut Vec<Arg<'i, TL, V>>,
    ) -> ParseResult<()> {
        match expr {
            RuleExpr::Token(kind) => {
                let token = tokenizer.peek();
                if token.is(*kind) {
                    tokenizer.bump();
                    args.push(Arg::Token(token));
                    Ok(())
                } else {
                    visitor.error(
                        ErrorKind::UnexpectedToken {
                            production: self.nt_helper.identifier,
                            expected: *kind,
                        },
                        tokenizer,
                    );
                    Err(Unmatched)
                }
            }
            RuleExpr::Silent(kind) => {
                let token = tokenizer.peek();
                if token.is(*kind) {
                    tokenizer.bump();
                    Ok(())
                } else {
                    visitor.error(
                        ErrorKind::UnexpectedToken {
                            production: self.nt_helper.identifier,
                            expected: *kind,
                        },
                        tokenizer,
                    );
                    Err(Unmatched)
                }
            }
            RuleExpr::AnyToken => {
                let token = tokenizer.peek();
                tokenizer.bump();
                args.push(Arg::Token(token));
                Ok(())
            }
            RuleExpr::Eof => {
                if tokenizer.is_done() {
                    Ok(())
                } else {
                    visitor.error(
                        ErrorKind::UnexpectedToken {
                            production: self.nt_helper.identifier,
                            expected: TL::eof(),
                        },
                        tokenizer,
                    );
                    Err(Unmatched)
                }
            }
            RuleExpr::Prod(production) => {
                let value = production.parse(tokenizer, visitor)?;
                args.push(Arg::Value(value));
                Ok(())
            }
            RuleExpr::Seq(elements) => {
                for element in elements {
                    self.parse_expr(element, tokenizer, visitor, args)?;
                }
                Ok(())
            }
            RuleExpr::Choice(alternatives) => {
                let kind = tokenizer.peek().kind;
                let mut sink = None;
                for alternative in alternatives {
                    if expr_is_sink(alternative) {
                        if sink.is_none() {
                            sink = Some(alternative);
                        }
                        continue;
                    }
                    let mut leading = Vec::new();
                    expr_first_list(alternative, &mut leading);
                    if leading.contains(&kind) {
                        return self.parse_expr(alternative, tokenizer, visitor, args);
                    }
                }
                if let Some(sink) = sink {
                    return self.parse_expr(sink, tokenizer, visitor, args);
                }

                let mut alternative_kinds = Vec::new();
                for alternative in alternatives {
                    expr_first_list(alternative, &mut alternative_kinds);
                }
                visitor.error(
                    ErrorKind::ExhaustedTokenChoice {
                        production: self.nt_helper.identifier,
                        alternatives: alternative_kinds,
                    },
                    tokenizer,
                );
                Err(Unmatched)
            }
            RuleExpr::Opt(inner) => {
                let mut leading = Vec::new();
                expr_first_list(inner, &mut leading);
                if leading.contains(&tokenizer.peek().kind) {
                    self.parse_expr(inner, tokenizer, visitor, args)
                } else {
                    Ok(())
                }
            }
        }
    }

    fn validate_expr(
        &self,
        expr: &RuleExpr<TL, V>,
        at_first: bool,
        first_path: &mut Vec<&'static str>,
        validated: &mut HashSet<&'static str>,
    ) -> Result<(), ImplementationError> {
        match expr {
            RuleExpr::Token(_) | RuleExpr::Silent(_) | RuleExpr::AnyToken | RuleExpr::Eof => Ok(()),
            RuleExpr::Prod(production) => {
                if at_first {
                    production.validate(first_path, validated)
                } else {
                    production.validate(&mut Vec::new(), validated)
                }
            }
            RuleExpr::Seq(elements) => {
                let mut at_first = at_first;
                for element in elements {
                    self.validate_expr(element, at_first, first_path, validated)?;
                    if !expr_nullable(element) {
                        at_first = false;
                    }
                }
                Ok(())
            }
            RuleExpr::Choice(alternatives) => {
                let mut seen: Vec<TL> = Vec::new();
                for alternative in alternatives {
                    if !expr_token_shaped(alternative) {
                        return Err(ImplementationError::new(
                            "TokenChoice".to_string(),
                            format!(
                                "A token choice in '{}' accepts only token shaped alternatives.",
                                self.nt_helper.identifier
                            ),
                        ));
                    }
                    if expr_is_sink(alternative) {
                        continue;
                    }
                    let mut leading = Vec::new();
                    expr_first_list(alternative, &mut leading);
                    for kind in leading {
                        if seen.contains(&kind) {
                            return Err(ImplementationError::new(
                                "AmbiguousTokenChoice".to_string(),
                                format!(
                                    "A token choice in '{}' cannot be resolved with one token lookahead: '{}' leads more than one alternative.",
                                    self.nt_helper.identifier,
                                    kind.name()
                                ),
                            ));
                        }
                        seen.push(kind);
                    }
                }
                Ok(())
            }
            RuleExpr::Opt(inner) => {
                if !expr_token_shaped(inner) {
                    return Err(ImplementationError::new(
                        "TokenChoice".to_string(),
                        format!(
                            "opt(..) in '{}' accepts only token shaped rules.",
                            self.nt_helper.identifier
                        ),
                    ));
                }
                self.validate_expr(inner, at_first, first_path, validated)
            }
        }
    }
}

impl<TL: TokenImpl, V> Display for RuleProduction<TL, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.nt_helper.identifier)
    }
}

impl<TL: TokenImpl, V> IProduction for RuleProduction<TL, V> {
    type Token = TL;
    type Value = V;

    fn identifier(&self) -> &'static str {
        self.nt_helper.identifier
    }

    fn impl_first_set(&self, first_set: &mut HashSet<Self::Token>) {
        for alternative in self.get_alternatives() {
            if self.is_left_recursive(&alternative.rule) {
                continue;
            }
            let mut leading = Vec::new();
            expr_first_list(&alternative.rule, &mut leading);
            first_set.extend(leading);
        }
    }

    fn impl_grammar(
        &self,
        writer: &mut dyn std::fmt::Write,
        added_rules: &mut HashSet<&'static str>,
    ) -> Result<(), std::fmt::Error> {
        if added_rules.insert(self.nt_helper.identifier) {
            writeln!(writer, "{}", self.nt_helper.identifier)?;
            for (index, alternative) in self.get_alternatives().iter().enumerate() {
                let prefix = if index == 0 { ":" } else { "|" };
                writeln!(writer, "{:>6} {}", prefix, alternative.rule)?;
            }
            writeln!(writer, "{:>6}", ";")?;

            for alternative in self.get_alternatives() {
                expr_grammar(&alternative.rule, writer, added_rules)?;
            }
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
        // Mark at entry so that recursive references terminate.
        if !validated.insert(self.nt_helper.identifier) {
            return Ok(());
        }
        if self.alternatives.get().is_none() {
            return Err(ImplementationError::new(
                "UnsetProduction".to_string(),
                format!(
                    "Alternatives are not set for '{}'.",
                    self.nt_helper.identifier
                ),
            ));
        }

        if self.left_recursion.get().is_none() {
            let analysis = self.analyze_left_recursion()?;
            let _ = self.left_recursion.set(analysis);
        }
        let left_index = self
            .left_recursion
            .get()
            .and_then(|analysis| analysis.as_ref())
            .map(|left_recursion| left_recursion.index);

        first_path.push(self.nt_helper.identifier);
        let mut result = Ok(());
        for (index, alternative) in self.get_alternatives().iter().enumerate() {
            result = if left_index == Some(index) {
                match &alternative.rule {
                    RuleExpr::Seq(elements) => {
                        let mut tail_result = Ok(());
                        for element in &elements[1..] {
                            tail_result =
                                self.validate_expr(element, false, &mut Vec::new(), validated);
                            if tail_result.is_err() {
                                break;
                            }
                        }
                        tail_result
                    }
                    _ => Ok(()),
                }
            } else {
                self.validate_expr(&alternative.rule, true, first_path, validated)
            };
            if result.is_err() {
                break;
            }
        }
        first_path.pop();
        result?;
        Ok(())
    }

    fn parse(
        &self,
        tokenizer: &mut Tokenizer<'_, Self::Token>,
        visitor: &mut dyn Visitor<Self::Token, Value = Self::Value>,
    ) -> ParseResult<Self::Value> {
        self.nt_helper.log_entry();
        let start = tokenizer.offset();

        let alternatives = self.get_alternatives();
        let left_recursion = self.left_recursion_analysis();

        let mut chosen = None;
        for (index, alternative) in alternatives.iter().enumerate() {
            if let Some(left_recursion) = left_recursion {
                if left_recursion.index == index {
                    continue;
                }
            }
            match &alternative.guard {
                Guard::Else => {
                    chosen = Some(index);
                    break;
                }
                Guard::Peek(kinds) => {
                    if guard_matches(kinds, tokenizer) {
                        chosen = Some(index);
                        break;
                    }
                }
            }
        }

        let seed = match chosen {
            Some(index) => index,
            None => {
                self.nt_helper.log_unparsed(tokenizer.code(), start);
                visitor.error(
                    ErrorKind::ExhaustedChoice {
                        production: self.nt_helper.identifier,
                    },
                    tokenizer,
                );
                return Err(Unmatched);
            }
        };

        let mut args = Vec::new();
        self.parse_expr(&alternatives[seed].rule, tokenizer, visitor, &mut args)?;
        let mut accumulated = visitor.production(self.nt_helper.identifier, args)?;

        if let Some(left_recursion) = left_recursion {
            if let RuleExpr::Seq(elements) = &alternatives[left_recursion.index].rule {
                while left_recursion.first.contains(&tokenizer.peek().kind) {
                    let mut args = vec![Arg::Value(accumulated)];
                    for element in &elements[1..] {
                        self.parse_expr(element, tokenizer, visitor, &mut args)?;
                    }
                    accumulated = visitor.production(self.nt_helper.identifier, args)?;
                }
            }
        }

        self.nt_helper
            .log_success(tokenizer.code(), start, tokenizer.offset());
        Ok(accumulated)
    }
}
