//! Common result and error types for the svprep toolchain.

/// The standard result type for fallible internal operations.
///
/// `Err` indicates a broken graph invariant (a bug in svprep or in the stage
/// that produced the IR), not a user-facing problem. User-facing failures are
/// reported through the diagnostics sink.
pub type PrepResult<T> = Result<T, InternalError>;

/// An internal error indicating a bug, not a user input problem.
#[derive(Debug, thiserror::Error)]
#[error("internal compiler error: {message}")]
pub struct InternalError {
    /// Description of the internal error.
    pub message: String,
}

impl InternalError {
    /// Creates a new internal error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<String> for InternalError {
    fn from(message: String) -> Self {
        Self { message }
    }
}
