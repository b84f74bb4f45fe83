use crate::{StaticToken, Token, TokenImpl};
use std::fmt::{Display, Formatter};

impl<'i, TL: TokenImpl> Token<'i, TL> {
    pub fn new(kind: TL, spelling: &'i [u8], offset: usize) -> Self {
        Self {
            kind,
            spelling,
            offset,
        }
    }

    /// Whether this token has the given kind.
    pub fn is(&self, kind: TL) -> bool {
        self.kind == kind
    }

    pub fn is_eof(&self) -> bool {
        self.kind == TL::eof()
    }

    pub fn is_error(&self) -> bool {
        self.kind == TL::error()
    }

    /// The spelling as text. The engine is byte oriented; a non UTF-8
    /// spelling yields an empty string.
    pub fn text(&self) -> &'i str {
        std::str::from_utf8(self.spelling).unwrap_or_default()
    }

    /// Byte length of the spelling.
    pub fn len(&self) -> usize {
        self.spelling.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spelling.is_empty()
    }
}

impl<TL: TokenImpl> Display for Token<'_, TL> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("")
            .field(&self.kind)
            .field(&self.offset)
            .field(&self.text())
            .finish()
    }
}

impl<'i, TL: TokenImpl> StaticToken<'i, TL> {
    /// Wrap a token after checking that it carries the expected kind.
    pub fn try_new(token: Token<'i, TL>, kind: TL) -> Option<Self> {
        if token.kind == kind {
            Some(Self { token })
        } else {
            None
        }
    }

    pub fn token(&self) -> Token<'i, TL> {
        self.token
    }

    pub fn kind(&self) -> TL {
        self.token.kind
    }

    /// Derive a parsed payload from the spelling.
    pub fn map<P, F: FnOnce(Token<'i, TL>) -> P>(&self, parse: F) -> P {
        parse(self.token)
    }
}

impl<TL: TokenImpl> Display for StaticToken<'_, TL> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.token)
    }
}
