use super::{LexemeLogger, Pattern};
use crate::util::{Code, Log};
use crate::{ILexeme, MatchResult, TokenImpl};
use once_cell::unsync::OnceCell;
use regex::bytes::Regex;

impl<TL: TokenImpl> Pattern<TL> {
    /// Create a new [Pattern] lexeme for a token kind and a regular expression.
    /// ## Arguments
    /// * `token` - Token to be returned for a match.
    /// * `pattern` - Regular expression to be matched. The expression must be
    /// anchored to the start of the match with `^`.
    pub fn new(token: TL, pattern: &str) -> Result<Self, String> {
        let regexp = Regex::new(pattern)
            .map_err(|err| format!("Pattern should be a valid regex expression.{:?}", err))?;

        if regexp.is_match(b"") {
            return Err(format!(
                "Regex expression '{}' should not be nullable.",
                regexp.as_str()
            ));
        }

        Ok(Self {
            regexp,
            token,
            conflicts: Vec::new(),
            log: OnceCell::new(),
        })
    }

    /// Declare the literal kinds this pattern conflicts with.
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

impl<TL: TokenImpl> LexemeLogger for Pattern<TL> {
    fn log_cell(&self) -> &OnceCell<Log<&'static str>> {
        &self.log
    }
}

impl<TL: TokenImpl> ILexeme for Pattern<TL> {
    type Token = TL;

    fn try_match(&self, code: &Code, pointer: usize) -> MatchResult<TL> {
        let result = match self.regexp.find(&code.value[pointer..]) {
            Some(m) => {
                debug_assert_eq!(m.start(), 0);
                if m.end() > 0 {
                    MatchResult::success(self.token, m.end())
                } else {
                    MatchResult::Unmatched
                }
            }
            None => MatchResult::Unmatched,
        };
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
        (
            self.token,
            format!("/{}/", self.regexp.as_str().replace('/', "\\/")),
        )
    }
}
