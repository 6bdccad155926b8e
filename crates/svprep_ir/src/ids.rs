//! Opaque ID newtypes for graph entities.

use crate::arena::ArenaId;
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(u32);

        impl $name {
            /// Creates an ID from a raw `u32` index.
            pub fn from_raw(index: u32) -> Self {
                Self(index)
            }

            /// Returns the raw `u32` index.
            pub fn as_raw(self) -> u32 {
                self.0
            }
        }

        impl ArenaId for $name {
            fn from_raw(index: u32) -> Self {
                Self(index)
            }

            fn as_raw(self) -> u32 {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

define_id!(
    /// A module in a [`Design`](crate::design::Design).
    ModuleId,
    "module#"
);

define_id!(
    /// A node (operation) within a module.
    NodeId,
    "node#"
);

define_id!(
    /// A value: a module input port or a node result.
    ValueId,
    "value#"
);

define_id!(
    /// A block: the ordered node list of a region.
    BlockId,
    "block#"
);

define_id!(
    /// An interned type in a module's [`TypeDb`](crate::types::TypeDb).
    TypeId,
    "type#"
);
