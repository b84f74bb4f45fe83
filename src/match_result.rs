use crate::{MatchResult, TokenImpl};

impl<TL: TokenImpl> MatchResult<TL> {
    pub fn error(bump: usize) -> Self {
        debug_assert!(bump > 0, "error bump must not be 0");
        MatchResult::Error { bump }
    }

    pub fn success(kind: TL, bump: usize) -> Self {
        debug_assert!(bump > 0, "success bump must not be 0");
        debug_assert!(
            kind != TL::eof() && kind != TL::error(),
            "matchers must not produce a reserved kind"
        );
        MatchResult::Success { kind, bump }
    }

    /// The byte advance carried by this result; 0 for [Unmatched](MatchResult::Unmatched)
    /// and [Eof](MatchResult::Eof).
    pub fn bump(&self) -> usize {
        match self {
            MatchResult::Error { bump } | MatchResult::Success { bump, .. } => *bump,
            MatchResult::Unmatched | MatchResult::Eof => 0,
        }
    }

    pub fn is_unmatched(&self) -> bool {
        matches!(self, MatchResult::Unmatched)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, MatchResult::Error { .. })
    }

    pub fn is_success(&self) -> bool {
        matches!(self, MatchResult::Success { .. })
    }

    pub fn is_eof(&self) -> bool {
        matches!(self, MatchResult::Eof)
    }

    pub fn is_matched(&self) -> bool {
        !self.is_unmatched()
    }
}
