//! Error types for the TLV codec and the mutation engine.

use thiserror::Error;

/// Codec-level failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TlvError {
    /// Declared length (or var-number width) runs past the end of the buffer
    #[error("truncated input: needed {needed} bytes, {remaining} remaining")]
    TruncatedInput {
        /// Bytes the element claims to need
        needed: usize,
        /// Bytes actually left in the buffer
        remaining: usize,
    },

    /// Buffer was empty where an element was expected
    #[error("empty input")]
    EmptyInput,
}

/// Engine failures that must reach the caller.
///
/// Everything recoverable (malformed fields, budget exhaustion, absent fields)
/// is handled inside the engine as a no-op or a synthesis step and never shows
/// up here.
#[derive(Debug, Error)]
pub enum MutatorError {
    #[error("codec error: {0}")]
    Tlv(#[from] TlvError),

    /// The digest provider could not hash the parameters field
    #[error("parameters digest unavailable: {0}")]
    DigestUnavailable(String),

    /// The digest provider returned a digest of the wrong size
    #[error("parameters digest has {actual} bytes, expected {expected}")]
    DigestLength { expected: usize, actual: usize },

    /// The libafl havoc stack failed on a leaf value
    #[error("byte mutation failed: {0}")]
    Havoc(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl From<MutatorError> for libafl::Error {
    fn from(e: MutatorError) -> Self {
        libafl::Error::illegal_state(e.to_string())
    }
}

impl From<serde_json::Error> for MutatorError {
    fn from(e: serde_json::Error) -> Self {
        MutatorError::Config(e.to_string())
    }
}
