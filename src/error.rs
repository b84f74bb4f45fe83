use crate::{ErrorKind, ImplementationError, TokenImpl};
use std::fmt::{Display, Formatter};

impl ImplementationError {
    pub fn new(what: String, message: String) -> Self {
        Self { message, what }
    }

    pub fn what(&self) -> &str {
        &self.what
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for ImplementationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "ImplementationError: {}-{}", self.what, self.message)
    }
}

impl<TL: TokenImpl> ErrorKind<TL> {
    /// The identifier of the production which reported the diagnostic.
    pub fn production(&self) -> &'static str {
        match self {
            ErrorKind::UnexpectedToken { production, .. }
            | ErrorKind::ExhaustedTokenChoice { production, .. }
            | ErrorKind::ExhaustedChoice { production }
            | ErrorKind::IllegalOperatorChain { production, .. } => production,
        }
    }
}

impl<TL: TokenImpl> Display for ErrorKind<TL> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::UnexpectedToken {
                production,
                expected,
            } => {
                write!(f, "'{}' expected '{}'", production, expected.name())
            }
            ErrorKind::ExhaustedTokenChoice {
                production,
                alternatives,
            } => {
                write!(f, "'{}' expected one of ", production)?;
                for (index, alternative) in alternatives.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "'{}'", alternative.name())?;
                }
                Ok(())
            }
            ErrorKind::ExhaustedChoice { production } => {
                write!(f, "'{}' matched none of its alternatives", production)
            }
            ErrorKind::IllegalOperatorChain { production, op } => {
                write!(
                    f,
                    "'{}' must not be chained with operator '{}'",
                    production,
                    op.name()
                )
            }
        }
    }
}
