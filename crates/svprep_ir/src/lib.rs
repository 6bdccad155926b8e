//! The module graph consumed by emission preparation.
//!
//! A design is a set of [`Module`]s. Each module owns arenas of nodes, values
//! and blocks; nodes reference values by ID, values record their defining
//! node and every operand slot using them, and blocks hold linked node lists
//! tagged with graph or procedural semantics.

#![warn(missing_docs)]

pub mod arena;
pub mod design;
pub mod ids;
pub mod module;
pub mod mutate;
pub mod node;
pub mod op;
pub mod print;
pub mod types;

pub use arena::{Arena, ArenaId};
pub use design::Design;
pub use ids::{BlockId, ModuleId, NodeId, TypeId, ValueId};
pub use module::{BlockNodes, Module};
pub use mutate::InsertPoint;
pub use node::{Block, Node, Port, PortDirection, Use, Value, ValueDef};
pub use op::{
    canonicalize_constant, EventEdge, ICmpPredicate, OpCategory, OpKind, RegionKind, ResetKind,
    ResetSpec,
};
pub use print::print_module;
pub use types::{Type, TypeDb};
