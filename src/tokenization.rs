use crate::util::{Code, Position};
use crate::{MatchResult, Token, TokenImpl, TokenSpec, Tokenizer, Tokens};
use std::rc::Rc;

impl<'i, TL: TokenImpl> Tokenizer<'i, TL> {
    /// Create a tokenizer over an input buffer.
    ///
    /// Construction primes the match state for position 0 and skips leading
    /// whitespace-marked tokens.
    pub fn new(spec: &Rc<TokenSpec<TL>>, input: &'i [u8]) -> Self {
        let mut tokenizer = Self {
            code: Code::new(input),
            spec: spec.clone(),
            cursor: 0,
            last: MatchResult::Unmatched,
        };
        tokenizer.reset(0);
        tokenizer
    }

    /// The token at the cursor. Pure and idempotent. When the stream is
    /// finished an eof token with an empty spelling is returned; an
    /// unrecognized run surfaces as a token of the reserved error kind.
    pub fn peek(&self) -> Token<'i, TL> {
        let input: &'i [u8] = self.code.value;
        match self.last {
            MatchResult::Success { kind, bump } => {
                Token::new(kind, &input[self.cursor..self.cursor + bump], self.cursor)
            }
            MatchResult::Error { bump } => Token::new(
                TL::error(),
                &input[self.cursor..self.cursor + bump],
                self.cursor,
            ),
            MatchResult::Eof | MatchResult::Unmatched => {
                Token::new(TL::eof(), &input[self.cursor..self.cursor], self.cursor)
            }
        }
    }

    /// Equivalent to [peek](Tokenizer::peek) followed by [bump](Tokenizer::bump).
    pub fn get(&mut self) -> Token<'i, TL> {
        let result = self.peek();
        self.bump();
        result
    }

    /// Advance the cursor past the current match and skip whitespace-marked
    /// kinds. A bump at end of input is a no-op.
    pub fn bump(&mut self) {
        self.reset(self.cursor + self.last.bump());
    }

    /// Set the cursor to an absolute byte position, re-match, and skip
    /// whitespace. The position must lie within the input.
    pub fn reset(&mut self, position: usize) {
        self.reset_impl(position);
        if self.spec.has_whitespace() {
            self.skip_whitespace();
        }
    }

    /// True iff the match at the cursor carries no byte advance, which holds
    /// at end of input.
    pub fn is_done(&self) -> bool {
        self.last.bump() == 0
    }

    /// Byte offset of the cursor from the beginning of the input.
    pub fn offset(&self) -> usize {
        self.cursor
    }

    /// Byte length of the input.
    pub fn end(&self) -> usize {
        self.code.value.len()
    }

    /// Line and column at the cursor, for diagnostics.
    pub fn position(&self) -> Position {
        self.code.obtain_position(self.cursor)
    }

    pub fn code(&self) -> &Code<'i> {
        &self.code
    }

    pub fn spec(&self) -> &Rc<TokenSpec<TL>> {
        &self.spec
    }

    /// Turn the tokenizer into a lazy token iterator.
    pub fn tokens(self) -> Tokens<'i, TL> {
        Tokens { tokenizer: self }
    }

    fn reset_impl(&mut self, position: usize) {
        debug_assert!(position <= self.code.value.len(), "position out of range");
        self.cursor = position;
        self.last = self.spec.try_match(&self.code, self.cursor);

        #[cfg(debug_assertions)]
        if let Some(log_label) = self.spec.debugger() {
            if log_label.order() >= crate::util::Log::Success(()).order() {
                if let MatchResult::Success { kind, .. } = self.last {
                    println!(
                        "[{}; Token]: {:?} at {}",
                        log_label,
                        kind,
                        self.code.obtain_position(self.cursor)
                    );
                }
            }
        }
    }

    fn skip_whitespace(&mut self) {
        while let MatchResult::Success { kind, bump } = self.last {
            if self.spec.is_whitespace(kind) {
                self.reset_impl(self.cursor + bump);
            } else {
                break;
            }
        }
    }
}

impl<'i, TL: TokenImpl> Iterator for Tokens<'i, TL> {
    type Item = Token<'i, TL>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.tokenizer.is_done() {
            None
        } else {
            Some(self.tokenizer.get())
        }
    }
}

impl<'i, TL: TokenImpl> Tokens<'i, TL> {
    pub fn tokenizer(&self) -> &Tokenizer<'i, TL> {
        &self.tokenizer
    }
}
