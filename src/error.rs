// Per-request failure taxonomy shared by both engines.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// Malformed or out-of-range request field.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Reading id absent from the reading store.
    #[error("not found: {0}")]
    NotFound(String),

    /// Reading store unreachable, timed out, or returned garbage.
    #[error("unavailable: {0}")]
    Unavailable(String),
}

impl EngineError {
    /// Stable snake_case tag reported to clients next to the message.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidArgument(_) => "invalid_argument",
            Self::NotFound(_) => "not_found",
            Self::Unavailable(_) => "unavailable",
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
