//! Module-scoped diagnostics for emission preparation.
//!
//! Preparation failures are reported as structured [`Diagnostic`] messages
//! carrying a severity, a code, the failing module and the source location of
//! the offending node. The thread-safe [`DiagnosticSink`] collects them while
//! modules are prepared in parallel, and [`TerminalRenderer`] formats them.

#![warn(missing_docs)]

pub mod code;
pub mod diagnostic;
pub mod renderer;
pub mod severity;
pub mod sink;

pub use code::{Category, DiagnosticCode};
pub use diagnostic::Diagnostic;
pub use renderer::{DiagnosticRenderer, TerminalRenderer};
pub use severity::Severity;
pub use sink::DiagnosticSink;
