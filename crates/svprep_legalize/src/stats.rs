//! Per-module counters of the rewrites performed.

use serde::{Deserialize, Serialize};
use std::ops::AddAssign;

/// What preparation did to one module (or a whole design, once summed).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrepareStats {
    /// Temporary declarations created by spilling or anchoring.
    pub temporaries: usize,
    /// Always-inline expressions cloned for an extra use.
    pub duplicated: usize,
    /// Nodes moved out of procedural regions.
    pub hoisted: usize,
    /// Variadic operators rebuilt as balanced binary trees.
    pub balanced: usize,
    /// Expressions redirected to an existing assigned declaration.
    pub reused: usize,
    /// Use-before-definition violations resolved.
    pub forward_refs: usize,
    /// Side-effecting expressions captured into registers.
    pub side_effects_extracted: usize,
    /// Dead expressions removed before legalization.
    pub pruned: usize,
}

impl PrepareStats {
    /// Returns `true` if nothing was rewritten.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl AddAssign for PrepareStats {
    fn add_assign(&mut self, rhs: Self) {
        self.temporaries += rhs.temporaries;
        self.duplicated += rhs.duplicated;
        self.hoisted += rhs.hoisted;
        self.balanced += rhs.balanced;
        self.reused += rhs.reused;
        self.forward_refs += rhs.forward_refs;
        self.side_effects_extracted += rhs.side_effects_extracted;
        self.pruned += rhs.pruned;
    }
}
