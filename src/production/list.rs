use crate::production::{
    BracketedListProduction, ListElement, ListProduction, NTHelper, ProductionLogger,
};
use crate::util::Log;
use crate::{
    Arg, ErrorKind, IProduction, ImplementationError, ParseResult, TokenImpl, Tokenizer, Unmatched,
    Visitor,
};
use std::collections::HashSet;
use std::fmt::Display;
use std::rc::Rc;

impl<TL: TokenImpl, V> ListElement<TL, V> {
    pub fn prod<P: IProduction<Token = TL, Value = V> + 'static>(production: &Rc<P>) -> Self {
        ListElement::Prod(production.clone())
    }

    fn impl_first_set(&self, first_set: &mut HashSet<TL>) {
        match self {
            ListElement::Token(kind) => {
                first_set.insert(*kind);
            }
            ListElement::Prod(production) => production.impl_first_set(first_set),
        }
    }

    fn validate(
        &self,
        first_path: &mut Vec<&'static str>,
        validated: &mut HashSet<&'static str>,
    ) -> Result<(), ImplementationError> {
        match self {
            ListElement::Token(_) => Ok(()),
            ListElement::Prod(production) => production.validate(first_path, validated),
        }
    }
}

impl<TL: TokenImpl, V> Clone for ListElement<TL, V> {
    fn clone(&self) -> Self {
        match self {
            ListElement::Token(kind) => ListElement::Token(*kind),
            ListElement::Prod(production) => ListElement::Prod(production.clone()),
        }
    }
}

impl<TL: TokenImpl, V> Display for ListElement<TL, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListElement::Token(kind) => write!(f, "[&{}]", kind.name()),
            ListElement::Prod(production) => write!(f, "{}", production.identifier()),
        }
    }
}

fn parse_element<'i, TL: TokenImpl, V>(
    identifier: &'static str,
    element: &ListElement<TL, V>,
    tokenizer: &mut Tokenizer<'i, TL>,
    visitor: &mut dyn Visitor<TL, Value = V>,
) -> ParseResult<Arg<'i, TL, V>> {
    match element {
        ListElement::Token(kind) => {
            let token = tokenizer.peek();
            if token.is(*kind) {
                tokenizer.bump();
                Ok(Arg::Token(token))
            } else {
                visitor.error(
                    ErrorKind::UnexpectedToken {
                        production: identifier,
                        expected: *kind,
                    },
                    tokenizer,
                );
                Err(Unmatched)
            }
        }
        ListElement::Prod(production) => Ok(Arg::Value(production.parse(tokenizer, visitor)?)),
    }
}

/// Consume a separator and decide whether another element follows.
fn parse_separator<TL: TokenImpl>(
    separator: Option<TL>,
    end: Option<TL>,
    allow_trailing: bool,
    tokenizer: &mut Tokenizer<'_, TL>,
) -> bool {
    match separator {
        Some(separator) => {
            if tokenizer.peek().is(separator) {
                tokenizer.bump();
                if allow_trailing {
                    if let Some(end) = end {
                        if tokenizer.peek().is(end) {
                            return false;
                        }
                    }
                }
                true
            } else {
                false
            }
        }
        None => match end {
            Some(end) => !tokenizer.peek().is(end),
            None => false,
        },
    }
}

fn parse_list<TL: TokenImpl, V>(
    identifier: &'static str,
    element: &ListElement<TL, V>,
    separator: Option<TL>,
    end: Option<TL>,
    allow_empty: bool,
    allow_trailing: bool,
    tokenizer: &mut Tokenizer<'_, TL>,
    visitor: &mut dyn Visitor<TL, Value = V>,
) -> ParseResult<V> {
    if allow_empty {
        if let Some(end) = end {
            if tokenizer.peek().is(end) {
                return visitor.production(identifier, Vec::new());
            }
        }
    }

    let first = parse_element(identifier, element, tokenizer, visitor)?;
    let mut accumulated = visitor.production(identifier, vec![first])?;

    while parse_separator(separator, end, allow_trailing, tokenizer) {
        let next = parse_element(identifier, element, tokenizer, visitor)?;
        accumulated = visitor.production(identifier, vec![Arg::Value(accumulated), next])?;
    }

    Ok(accumulated)
}

fn validate_flags(
    identifier: &'static str,
    has_separator: bool,
    has_end: bool,
    allow_empty: bool,
    allow_trailing: bool,
) -> Result<(), ImplementationError> {
    if (allow_empty || allow_trailing || !has_separator) && !has_end {
        return Err(ImplementationError::new(
            "ListEnd".to_string(),
            format!(
                "List production '{}' requires an end token for empty, trailing, or separator-less lists.",
                identifier
            ),
        ));
    }
    Ok(())
}

impl<TL: TokenImpl, V> ListProduction<TL, V> {
    /// Create a new [ListProduction] for an element repetition.
    /// ## Arguments
    /// * `identifier` - An unique identifier.
    /// * `element` - The repeated element: a token kind or a production.
    pub fn new(identifier: &'static str, element: ListElement<TL, V>) -> Self {
        Self {
            element,
            separator: None,
            end: None,
            allow_empty: false,
            allow_trailing: false,
            nt_helper: NTHelper::new(identifier),
        }
    }

    /// Separate elements by a token kind; the separator is consumed silently.
    pub fn separated_by(mut self, separator: TL) -> Self {
        self.separator = Some(separator);
        self
    }

    /// Bound the list by a token kind; the end token is not consumed.
    pub fn ends_with(mut self, end: TL) -> Self {
        self.end = Some(end);
        self
    }

    /// Permit an empty list; requires an end token.
    pub fn allow_empty(mut self) -> Self {
        self.allow_empty = true;
        self
    }

    /// Permit a trailing separator; requires an end token.
    pub fn allow_trailing(mut self) -> Self {
        self.allow_trailing = true;
        self
    }

    /// Set a log label to debug the production based on the level of [Log].
    pub fn set_log(&self, debugger: Log<&'static str>) -> Result<(), String> {
        self.nt_helper.assign_debugger(debugger)
    }
}

impl<TL: TokenImpl, V> Display for ListProduction<TL, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.nt_helper.identifier)
    }
}

impl<TL: TokenImpl, V> IProduction for ListProduction<TL, V> {
    type Token = TL;
    type Value = V;

    fn identifier(&self) -> &'static str {
        self.nt_helper.identifier
    }

    fn impl_first_set(&self, first_set: &mut HashSet<Self::Token>) {
        self.element.impl_first_set(first_set);
        if self.allow_empty {
            if let Some(end) = self.end {
                first_set.insert(end);
            }
        }
    }

    fn impl_grammar(
        &self,
        writer: &mut dyn std::fmt::Write,
        added_rules: &mut HashSet<&'static str>,
    ) -> Result<(), std::fmt::Error> {
        if added_rules.insert(self.nt_helper.identifier) {
            write!(writer, "{}\n{:>6} ", self.nt_helper.identifier, ":")?;
            match self.separator {
                Some(separator) => write!(
                    writer,
                    "{e} ([{s}] {e})*",
                    e = self.element,
                    s = separator.name()
                )?,
                None => write!(writer, "{e} ({e})*", e = self.element)?,
            }
            if self.allow_trailing {
                if let Some(separator) = self.separator {
                    write!(writer, " ([{}])?", separator.name())?;
                }
            }
            writeln!(writer, "\n{:>6}", ";")?;

            if let ListElement::Prod(production) = &self.element {
                production.impl_grammar(writer, added_rules)?;
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
        if !validated.insert(self.nt_helper.identifier) {
            return Ok(());
        }
        validate_flags(
            self.nt_helper.identifier,
            self.separator.is_some(),
            self.end.is_some(),
            self.allow_empty,
            self.allow_trailing,
        )?;

        first_path.push(self.nt_helper.identifier);
        let result = self.element.validate(first_path, validated);
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
        let result = parse_list(
            self.nt_helper.identifier,
            &self.element,
            self.separator,
            self.end,
            self.allow_empty,
            self.allow_trailing,
            tokenizer,
            visitor,
        );
        match &result {
            Ok(_) => self
                .nt_helper
                .log_success(tokenizer.code(), start, tokenizer.offset()),
            Err(_) => self.nt_helper.log_unparsed(tokenizer.code(), start),
        }
        result
    }
}

impl<TL: TokenImpl, V> BracketedListProduction<TL, V> {
    /// Create a new [BracketedListProduction] framed by open and close tokens.
    /// ## Arguments
    /// * `identifier` - An unique identifier.
    /// * `open` - Required opening token.
    /// * `close` - Required closing token; also the list's end.
    /// * `element` - The repeated element: a token kind or a production.
    pub fn new(identifier: &'static str, open: TL, close: TL, element: ListElement<TL, V>) -> Self {
        Self {
            open,
            close,
            element,
            separator: None,
            allow_empty: false,
            allow_trailing: false,
            nt_helper: NTHelper::new(identifier),
        }
    }

    /// Separate elements by a token kind; the separator is consumed silently.
    pub fn separated_by(mut self, separator: TL) -> Self {
        self.separator = Some(separator);
        self
    }

    /// Permit an empty list.
    pub fn allow_empty(mut self) -> Self {
        self.allow_empty = true;
        self
    }

    /// Permit a trailing separator.
    pub fn allow_trailing(mut self) -> Self {
        self.allow_trailing = true;
        self
    }

    /// Set a log label to debug the production based on the level of [Log].
    pub fn set_log(&self, debugger: Log<&'static str>) -> Result<(), String> {
        self.nt_helper.assign_debugger(debugger)
    }
}

impl<TL: TokenImpl, V> Display for BracketedListProduction<TL, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.nt_helper.identifier)
    }
}

impl<TL: TokenImpl, V> IProduction for BracketedListProduction<TL, V> {
    type Token = TL;
    type Value = V;

    fn identifier(&self) -> &'static str {
        self.nt_helper.identifier
    }

    fn impl_first_set(&self, first_set: &mut HashSet<Self::Token>) {
        first_set.insert(self.open);
    }

    fn impl_grammar(
        &self,
        writer: &mut dyn std::fmt::Write,
        added_rules: &mut HashSet<&'static str>,
    ) -> Result<(), std::fmt::Error> {
        if added_rules.insert(self.nt_helper.identifier) {
            write!(
                writer,
                "{}\n{:>6} [{}] ",
                self.nt_helper.identifier,
                ":",
                self.open.name()
            )?;
            match self.separator {
                Some(separator) => write!(
                    writer,
                    "{e} ([{s}] {e})*",
                    e = self.element,
                    s = separator.name()
                )?,
                None => write!(writer, "{e} ({e})*", e = self.element)?,
            }
            writeln!(writer, " [{}]\n{:>6}", self.close.name(), ";")?;

            if let ListElement::Prod(production) = &self.element {
                production.impl_grammar(writer, added_rules)?;
            }
        }
        Ok(())
    }

    fn validate(
        &self,
        _: &mut Vec<&'static str>,
        validated: &mut HashSet<&'static str>,
    ) -> Result<(), ImplementationError> {
        if !validated.insert(self.nt_helper.identifier) {
            return Ok(());
        }
        // The element never sits at first position: the open token is
        // consumed before it.
        self.element.validate(&mut Vec::new(), validated)
    }

    fn parse(
        &self,
        tokenizer: &mut Tokenizer<'_, Self::Token>,
        visitor: &mut dyn Visitor<Self::Token, Value = Self::Value>,
    ) -> ParseResult<Self::Value> {
        self.nt_helper.log_entry();
        let start = tokenizer.offset();

        if tokenizer.peek().is(self.open) {
            tokenizer.bump();
        } else {
            self.nt_helper.log_unparsed(tokenizer.code(), start);
            visitor.error(
                ErrorKind::UnexpectedToken {
                    production: self.nt_helper.identifier,
                    expected: self.open,
                },
                tokenizer,
            );
            return Err(Unmatched);
        }

        let accumulated = parse_list(
            self.nt_helper.identifier,
            &self.element,
            self.separator,
            Some(self.close),
            self.allow_empty,
            self.allow_trailing,
            tokenizer,
            visitor,
        )?;

        if tokenizer.peek().is(self.close) {
            tokenizer.bump();
            self.nt_helper
                .log_success(tokenizer.code(), start, tokenizer.offset());
            Ok(accumulated)
        } else {
            self.nt_helper.log_unparsed(tokenizer.code(), start);
            visitor.error(
                ErrorKind::UnexpectedToken {
                    production: self.nt_helper.identifier,
                    expected: self.close,
                },
                tokenizer,
            );
            Err(Unmatched)
        }
    }
}
