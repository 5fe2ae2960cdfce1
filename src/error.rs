//! Error types for assignment construction and proving.

use thiserror::Error;

/// Errors detected before any proving work starts.
///
/// Every variant describes a property of the input or configuration, so
/// retrying with the same input yields the same error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// A buffer or pattern element does not fit in one byte.
    #[error("Byte out of range at index {index}: {value} is not in [0, 255]")]
    ByteOutOfRange { index: usize, value: u64 },

    /// A required pattern does not occur in the padded buffer.
    #[error("Pattern not found: {0:?}")]
    PatternNotFound(String),

    /// A selector points outside the pattern's valid window.
    #[error(
        "Selector for {pattern:?} points at offset {offset}, outside the valid window [0, {last_valid}]"
    )]
    SelectorWindowViolation {
        pattern: String,
        offset: usize,
        last_valid: usize,
    },

    /// A configured pattern literal has the wrong length for its slot.
    #[error("Pattern {pattern:?} must be {expected} bytes, got {actual}")]
    PatternLength {
        pattern: String,
        expected: usize,
        actual: usize,
    },

    /// The buffer length cannot hold every pattern.
    #[error("Invalid max_len {max_len}: must be at least {min}")]
    InvalidMaxLen { max_len: usize, min: usize },

    /// A signal in an externally supplied signal set is malformed.
    #[error("Invalid signal '{name}': {reason}")]
    InvalidSignal { name: String, reason: String },

    /// The stated commitment differs from the fold over the buffer.
    #[error("Commitment mismatch: stated {stated}, recomputed {computed}")]
    CommitmentMismatch { stated: String, computed: String },
}

/// Errors raised by the proof interface.
#[derive(Error, Debug)]
pub enum ProverError {
    #[error(transparent)]
    Build(#[from] BuildError),

    /// Opaque failure reported by the proving backend, passed through as is.
    #[error("Proving backend error: {0:?}")]
    Backend(halo2_proofs::plonk::Error),
}

impl From<halo2_proofs::plonk::Error> for ProverError {
    fn from(err: halo2_proofs::plonk::Error) -> Self {
        ProverError::Backend(err)
    }
}
