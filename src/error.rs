//! Error types for stat-name encoding

use thiserror::Error;

/// Result type alias for encoding operations
pub type Result<T> = std::result::Result<T, EncodeError>;

/// Errors reported while encoding stat names.
///
/// Only capacity violations are recoverable. Decode failures (an unterminated
/// varint, a symbol missing from the table) indicate a corrupt symbol table
/// and panic instead, since continuing would silently mis-identify stats.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EncodeError {
    /// Encoded payload cannot fit behind the 2-byte length prefix
    #[error("encoded stat name requires {bytes} bytes, exceeding the {max}-byte limit")]
    NameTooLong { bytes: usize, max: usize },

    /// More names than a one-byte list count can hold
    #[error("stat name list of {count} names exceeds the maximum of {max}")]
    TooManyNames { count: usize, max: usize },
}
