//! Crate error type.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StubError>;

/// Errors surfaced by the codec, the interner and the symbol graph.
#[derive(Debug, Error)]
pub enum StubError {
    /// Encoded unit bytes are malformed or truncated.
    #[error("corrupt unit payload: {0}")]
    CorruptPayload(String),
    /// The interner ran out of 32-bit identifiers.
    #[error("name table exhausted: {0}")]
    NameTableFull(&'static str),
    /// A qualified name id that the table never issued.
    #[error("unknown qualified name id {0}")]
    UnknownName(u32),
    /// Caller violated an entry-point contract.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// Options could not be parsed.
    #[error("failed to parse index options: {0}")]
    Config(#[from] toml::de::Error),
}

impl StubError {
    pub(crate) fn corrupt(reason: impl Into<String>) -> Self {
        StubError::CorruptPayload(reason.into())
    }

    /// Returns true for decode faults that discard a single unit.
    pub fn is_corrupt_payload(&self) -> bool {
        matches!(self, StubError::CorruptPayload(_))
    }
}
