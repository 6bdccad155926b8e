//! Nodes, values, uses and blocks: the vertices and edges of a module graph.

use crate::ids::{BlockId, NodeId, TypeId, ValueId};
use crate::op::{OpKind, RegionKind};
use serde::{Deserialize, Serialize};
use svprep_common::{Ident, Loc};

/// Where a value comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueDef {
    /// The `index`-th input port of the module.
    Port {
        /// Index into the module's input ports.
        index: u32,
    },
    /// The `index`-th result of `node`.
    Result {
        /// The defining node.
        node: NodeId,
        /// Result position.
        index: u32,
    },
}

/// One operand slot referencing a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Use {
    /// The node owning the operand slot.
    pub node: NodeId,
    /// The operand position within that node.
    pub operand: u32,
}

/// A typed, single-definition datum.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Value {
    /// The value's type.
    pub ty: TypeId,
    /// The port or node result defining this value.
    pub def: ValueDef,
    /// Every live operand slot referencing this value, in the order the
    /// references were made.
    pub uses: Vec<Use>,
}

/// An operation in the graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// What the node does.
    pub kind: OpKind,
    /// Operand values, in order.
    pub operands: Vec<ValueId>,
    /// Result values, in order.
    pub results: Vec<ValueId>,
    /// Nested regions, one block each.
    pub regions: Vec<BlockId>,
    /// Declared name for storage cells; a name hint for expressions.
    pub name: Option<Ident>,
    /// Two-state semantics marker carried by arithmetic nodes.
    pub two_state: bool,
    /// The block containing this node.
    pub parent: BlockId,
    /// Source location.
    pub loc: Loc,
    /// Set once the node has been erased; erased nodes appear in no block.
    pub erased: bool,
    /// The preceding node in the parent block.
    pub(crate) prev: Option<NodeId>,
    /// The following node in the parent block.
    pub(crate) next: Option<NodeId>,
    /// Ordering key; strictly increasing along the parent block.
    pub(crate) order: u64,
}

/// An ordered node list; the single block of a region.
///
/// Nodes are linked through their `prev`/`next` fields, so insertion,
/// removal and order comparison never scan the block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    /// Execution semantics.
    pub kind: RegionKind,
    /// The node owning this region, or `None` for the module body.
    pub parent: Option<NodeId>,
    pub(crate) first: Option<NodeId>,
    pub(crate) last: Option<NodeId>,
    pub(crate) len: usize,
}

impl Block {
    /// Creates an empty block.
    pub fn new(kind: RegionKind, parent: Option<NodeId>) -> Self {
        Self {
            kind,
            parent,
            first: None,
            last: None,
            len: 0,
        }
    }

    /// Returns `true` for procedural blocks.
    pub fn is_procedural(&self) -> bool {
        self.kind == RegionKind::Procedural
    }

    /// Returns the first node in emission order.
    pub fn first(&self) -> Option<NodeId> {
        self.first
    }

    /// Returns the last node in emission order.
    pub fn last(&self) -> Option<NodeId> {
        self.last
    }

    /// Returns the number of nodes in the block.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the block holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Port direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PortDirection {
    /// Driven from outside the module.
    Input,
    /// Driven by the module's `output` terminator.
    Output,
}

/// A module port.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Port {
    /// Port name.
    pub name: Ident,
    /// Direction.
    pub direction: PortDirection,
    /// Port type.
    pub ty: TypeId,
    /// The value seen inside the module, for inputs.
    pub value: Option<ValueId>,
}
