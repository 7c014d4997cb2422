//! Error types for sgail-term.

use std::collections::TryReserveError;
use std::fmt;

/// Error type for terminal state operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TermError {
    /// An allocating operation failed. Callers either surface this or
    /// degrade (search skips the screen, parsers drop the input).
    #[error("out of memory")]
    OutOfMemory,

    /// The formatter's underlying writer refused bytes. Partial output
    /// already written stays in the writer.
    #[error("formatter write failed")]
    WriteFailed,

    /// The primary screen cannot be removed from a screen set.
    #[error("the primary screen cannot be removed")]
    PrimaryScreenRemoval,

    /// The requested screen has not been initialized.
    #[error("screen not initialized")]
    ScreenNotInitialized,
}

/// Result type alias for sgail-term operations.
pub type Result<T> = std::result::Result<T, TermError>;

impl From<fmt::Error> for TermError {
    fn from(_: fmt::Error) -> Self {
        Self::WriteFailed
    }
}

impl From<TryReserveError> for TermError {
    fn from(_: TryReserveError) -> Self {
        Self::OutOfMemory
    }
}
