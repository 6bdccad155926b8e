//! Errors that abort preparation of a module.

use svprep_common::{InternalError, Loc};
use thiserror::Error;

/// A failure that excludes one module from emission.
#[derive(Debug, Error)]
pub enum LegalizeError {
    /// The module contains an operation from a dialect the emitter cannot
    /// print; an earlier stage should have lowered it.
    #[error("module '{module}' contains '{dialect}.{op}', which cannot be emitted")]
    UnsupportedConstruct {
        /// Name of the failing module.
        module: String,
        /// Dialect of the offending operation.
        dialect: String,
        /// Operation name within the dialect.
        op: String,
        /// Location of the offending operation.
        loc: Loc,
    },

    /// A graph invariant this pass relies on did not hold.
    #[error(transparent)]
    Internal(#[from] InternalError),
}

impl LegalizeError {
    /// Returns the source location associated with the error.
    pub fn loc(&self) -> Loc {
        match self {
            LegalizeError::UnsupportedConstruct { loc, .. } => *loc,
            LegalizeError::Internal(_) => Loc::UNKNOWN,
        }
    }
}
