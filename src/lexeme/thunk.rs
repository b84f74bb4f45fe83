use super::{LexemeLogger, Thunk};
use crate::util::{Code, Log};
use crate::{ILexeme, MatchResult, TokenImpl};
use once_cell::unsync::OnceCell;

impl<TL: TokenImpl, TF: Fn(&[u8]) -> MatchResult<TL>> Thunk<TL, TF> {
    /// Create a new [Thunk] lexeme from an open-coded matcher function.
    /// ## Arguments
    /// * `token` - Nominal token kind of the lexeme.
    /// * `thunk` - Matcher called with the remaining input bytes.
    pub fn new(token: TL, thunk: TF) -> Self {
        Self {
            token,
            thunk,
            conflicts: Vec::new(),
            log: OnceCell::new(),
        }
    }

    /// Declare the literal kinds this matcher conflicts with.
    pub fn conflicts_with(mut self, literals: Vec<TL>) -> Self {
        self.conflicts = literals;
        self
    }

    /// Set a log label to debug the lexeme.
    pub fn set_log(&self, log: Log<&'static str>) -> Result<(), String> {
        self.log
            .set(log)
            .map_err(|err| format!("Log label {} is already assigned.", err))
    }
}

impl<TL: TokenImpl, TF: Fn(&[u8]) -> MatchResult<TL>> LexemeLogger for Thunk<TL, TF> {
    fn log_cell(&self) -> &OnceCell<Log<&'static str>> {
        &self.log
    }
}

impl<TL: TokenImpl, TF: Fn(&[u8]) -> MatchResult<TL>> ILexeme for Thunk<TL, TF> {
    type Token = TL;

    fn try_match(&self, code: &Code, pointer: usize) -> MatchResult<TL> {
        let result = (self.thunk)(&code.value[pointer..]);
        debug_assert!(
            !result.is_eof(),
            "a lexeme must not report end of input itself"
        );
        self.log_result(pointer, code, &result);
        result
    }

    fn token(&self) -> TL {
        self.token
    }

    fn conflicting_literals(&self) -> &[TL] {
        &self.conflicts
    }

    fn grammar_field(&self) -> (TL, String) {
        (self.token, format!("<{}>", self.token.name()))
    }
}
