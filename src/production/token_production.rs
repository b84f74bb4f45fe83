use crate::production::{NTHelper, ProductionLogger, TokenProduction};
use crate::util::Log;
use crate::{
    Arg, ErrorKind, IProduction, ImplementationError, ParseResult, StaticToken, TokenImpl,
    Tokenizer, Unmatched, Visitor,
};
use std::collections::HashSet;
use std::fmt::Display;
use std::marker::PhantomData;

impl<TL: TokenImpl, V> TokenProduction<TL, V> {
    /// Create a new [TokenProduction].
    /// ## Arguments
    /// * `identifier` - An unique identifier.
    /// * `token` - The token kind to be matched.
    pub fn new(identifier: &'static str, token: TL) -> Self {
        Self {
            token,
            nt_helper: NTHelper::new(identifier),
            _value: PhantomData,
        }
    }

    pub fn token(&self) -> TL {
        self.token
    }

    /// Set a log label to debug the production based on the level of [Log].
    pub fn set_log(&self, debugger: Log<&'static str>) -> Result<(), String> {
        self.nt_helper.assign_debugger(debugger)
    }
}

impl<TL: TokenImpl, V> Display for TokenProduction<TL, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.nt_helper.identifier)
    }
}

impl<TL: TokenImpl, V> IProduction for TokenProduction<TL, V> {
    type Token = TL;
    type Value = V;

    fn identifier(&self) -> &'static str {
        self.nt_helper.identifier
    }

    fn impl_first_set(&self, first_set: &mut HashSet<Self::Token>) {
        first_set.insert(self.token);
    }

    fn impl_grammar(
        &self,
        writer: &mut dyn std::fmt::Write,
        added_rules: &mut HashSet<&'static str>,
    ) -> Result<(), std::fmt::Error> {
        if added_rules.insert(self.nt_helper.identifier) {
            writeln!(
                writer,
                "{}\n{:>6} [&{}]\n{:>6}",
                self.nt_helper.identifier,
                ":",
                self.token.name(),
                ";"
            )?;
        }
        Ok(())
    }

    fn validate(
        &self,
        _: &mut Vec<&'static str>,
        _: &mut HashSet<&'static str>,
    ) -> Result<(), ImplementationError> {
        Ok(())
    }

    fn parse(
        &self,
        tokenizer: &mut Tokenizer<'_, Self::Token>,
        visitor: &mut dyn Visitor<Self::Token, Value = Self::Value>,
    ) -> ParseResult<Self::Value> {
        self.nt_helper.log_entry();

        match StaticToken::try_new(tokenizer.peek(), self.token) {
            Some(matched) => {
                tokenizer.bump();
                self.nt_helper.log_success(
                    tokenizer.code(),
                    matched.token().offset,
                    matched.token().offset + matched.token().len(),
                );
                visitor.production(self.identifier(), vec![Arg::Token(matched.token())])
            }
            None => {
                self.nt_helper
                    .log_unparsed(tokenizer.code(), tokenizer.offset());
                visitor.error(
                    ErrorKind::UnexpectedToken {
                        production: self.identifier(),
                        expected: self.token,
                    },
                    tokenizer,
                );
                Err(Unmatched)
            }
        }
    }
}
