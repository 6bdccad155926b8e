//! Structured diagnostic messages scoped to a module.

use crate::code::DiagnosticCode;
use crate::severity::Severity;
use serde::{Deserialize, Serialize};
use svprep_common::Loc;

/// A diagnostic raised while preparing one module for emission.
///
/// Every diagnostic names the module it belongs to, since a failure aborts
/// preparation of that module only and the rest of the design carries on.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Diagnostic {
    /// The severity level of this diagnostic.
    pub severity: Severity,
    /// The code identifying the kind of diagnostic.
    pub code: DiagnosticCode,
    /// The main diagnostic message.
    pub message: String,
    /// Name of the module being prepared.
    pub module: String,
    /// Location of the offending node.
    pub loc: Loc,
    /// Explanatory footnotes.
    pub notes: Vec<String>,
    /// Actionable suggestions.
    pub help: Vec<String>,
}

impl Diagnostic {
    fn with_severity(
        severity: Severity,
        code: DiagnosticCode,
        message: impl Into<String>,
        module: impl Into<String>,
        loc: Loc,
    ) -> Self {
        Self {
            severity,
            code,
            message: message.into(),
            module: module.into(),
            loc,
            notes: Vec::new(),
            help: Vec::new(),
        }
    }

    /// Creates an error diagnostic for the given module.
    pub fn error(
        code: DiagnosticCode,
        message: impl Into<String>,
        module: impl Into<String>,
        loc: Loc,
    ) -> Self {
        Self::with_severity(Severity::Error, code, message, module, loc)
    }

    /// Creates a warning diagnostic for the given module.
    pub fn warning(
        code: DiagnosticCode,
        message: impl Into<String>,
        module: impl Into<String>,
        loc: Loc,
    ) -> Self {
        Self::with_severity(Severity::Warning, code, message, module, loc)
    }

    /// Adds a note to this diagnostic.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Adds a help message to this diagnostic.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help.push(help.into());
        self
    }
}
