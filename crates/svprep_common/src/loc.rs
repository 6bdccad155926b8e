//! Source locations carried by IR nodes for diagnostics.

use crate::ident::Ident;
use serde::{Deserialize, Serialize};

/// A file/line/column location inherited from the front end that built the IR.
///
/// Nodes synthesized during preparation copy the location of the node that
/// caused them to exist, so diagnostics still point at user source.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct Loc {
    /// The interned file name, or `None` when the location is unknown.
    pub file: Option<Ident>,
    /// One-based line number.
    pub line: u32,
    /// One-based column number.
    pub col: u32,
}

impl Loc {
    /// A location used when the front end provided none.
    pub const UNKNOWN: Loc = Loc {
        file: None,
        line: 0,
        col: 0,
    };

    /// Creates a location in the given file.
    pub fn new(file: Ident, line: u32, col: u32) -> Self {
        Self {
            file: Some(file),
            line,
            col,
        }
    }

    /// Returns `true` if this is [`Loc::UNKNOWN`].
    pub fn is_unknown(&self) -> bool {
        self.file.is_none()
    }
}

impl Default for Loc {
    fn default() -> Self {
        Self::UNKNOWN
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_is_default() {
        assert!(Loc::default().is_unknown());
        assert_eq!(Loc::default(), Loc::UNKNOWN);
    }

    #[test]
    fn known_location() {
        let loc = Loc::new(Ident::from_raw(3), 10, 4);
        assert!(!loc.is_unknown());
        assert_eq!(loc.line, 10);
        assert_eq!(loc.col, 4);
    }

    #[test]
    fn serde_roundtrip() {
        let loc = Loc::new(Ident::from_raw(1), 7, 2);
        let json = serde_json::to_string(&loc).unwrap();
        let back: Loc = serde_json::from_str(&json).unwrap();
        assert_eq!(loc, back);
    }
}
