//! Shared foundational types used across the svprep emission-preparation toolchain.
//!
//! This crate provides interned identifiers, source locations attached to IR
//! nodes, and the internal-error result type.

#![warn(missing_docs)]

pub mod ident;
pub mod loc;
pub mod result;

pub use ident::{Ident, Interner};
pub use loc::Loc;
pub use result::{InternalError, PrepResult};
