//! Diagnostic rendering for terminal output.

use crate::diagnostic::Diagnostic;
use crate::severity::Severity;
use svprep_common::Interner;

/// Trait for rendering diagnostics into formatted output strings.
pub trait DiagnosticRenderer {
    /// Renders a single diagnostic into a formatted string.
    fn render(&self, diag: &Diagnostic, interner: &Interner) -> String;
}

/// Renders diagnostics in a rustc-like terminal format:
///
/// ```text
/// error[E501]: unsupported operation 'seq.compreg' in module 'top'
///   --> top.fir:12:5
///    = help: lower this operation before preparing the design for emission
/// ```
pub struct TerminalRenderer {
    /// Whether to use ANSI color codes in output.
    pub color: bool,
}

impl TerminalRenderer {
    /// Creates a new terminal renderer.
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    fn paint(&self, severity: Severity, text: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        let code = match severity {
            Severity::Error => "31",
            Severity::Warning => "33",
            Severity::Note => "36",
        };
        format!("\x1b[1;{code}m{text}\x1b[0m")
    }
}

impl DiagnosticRenderer for TerminalRenderer {
    fn render(&self, diag: &Diagnostic, interner: &Interner) -> String {
        let header = format!("{}[{}]", diag.severity, diag.code);
        let mut out = format!(
            "{}: {} in module '{}'\n",
            self.paint(diag.severity, &header),
            diag.message,
            diag.module
        );
        if let Some(file) = diag.loc.file {
            out.push_str(&format!(
                "  --> {}:{}:{}\n",
                interner.resolve(file),
                diag.loc.line,
                diag.loc.col
            ));
        }
        for note in &diag.notes {
            out.push_str(&format!("   = note: {note}\n"));
        }
        for help in &diag.help {
            out.push_str(&format!("   = help: {help}\n"));
        }
        out
    }
}
