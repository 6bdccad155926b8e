//! Modules: the unit of preparation.
//!
//! A [`Module`] owns every node, value and block reachable from its body, and
//! its own [`TypeDb`]. Nothing inside a module refers to another module's
//! storage, so modules can be prepared independently.

use crate::arena::Arena;
use crate::ids::{BlockId, NodeId, TypeId, ValueId};
use crate::node::{Block, Node, Port, PortDirection, Use, Value, ValueDef};
use crate::op::{OpKind, RegionKind};
use crate::types::TypeDb;
use serde::{Deserialize, Serialize};
use svprep_common::{Ident, Loc};

/// A single hardware module.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Module {
    /// The module name.
    pub name: Ident,
    /// Location of the module declaration.
    pub loc: Loc,
    /// Ports in declaration order.
    pub ports: Vec<Port>,
    /// Types used by this module.
    pub types: TypeDb,
    /// Every node ever created; erased nodes are tombstoned.
    pub nodes: Arena<NodeId, Node>,
    /// Every value ever created.
    pub values: Arena<ValueId, Value>,
    /// Every block ever created.
    pub blocks: Arena<BlockId, Block>,
    /// The module body.
    pub body: BlockId,
}

impl Module {
    /// Creates an empty module with a graph-region body.
    pub fn new(name: Ident, loc: Loc) -> Self {
        let mut blocks = Arena::new();
        let body = blocks.alloc(Block::new(RegionKind::Graph, None));
        Self {
            name,
            loc,
            ports: Vec::new(),
            types: TypeDb::new(),
            nodes: Arena::new(),
            values: Arena::new(),
            blocks,
            body,
        }
    }

    /// Adds an input port and returns the value it provides to the body.
    pub fn add_input(&mut self, name: Ident, ty: TypeId) -> ValueId {
        let index = self.input_count() as u32;
        let value = self.values.alloc(Value {
            ty,
            def: ValueDef::Port { index },
            uses: Vec::new(),
        });
        self.ports.push(Port {
            name,
            direction: PortDirection::Input,
            ty,
            value: Some(value),
        });
        value
    }

    /// Adds an output port. Its driver is the matching `output` operand.
    pub fn add_output(&mut self, name: Ident, ty: TypeId) {
        self.ports.push(Port {
            name,
            direction: PortDirection::Output,
            ty,
            value: None,
        });
    }

    /// Iterates over the input ports in order.
    pub fn inputs(&self) -> impl Iterator<Item = &Port> {
        self.ports
            .iter()
            .filter(|p| p.direction == PortDirection::Input)
    }

    /// Returns the number of input ports.
    pub fn input_count(&self) -> usize {
        self.inputs().count()
    }

    /// Returns the name of the `index`-th input port.
    pub fn input_name(&self, index: u32) -> Option<Ident> {
        self.inputs().nth(index as usize).map(|p| p.name)
    }

    /// Returns the node with the given ID.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    /// Returns the node with the given ID mutably.
    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id]
    }

    /// Returns the value with the given ID.
    pub fn value(&self, id: ValueId) -> &Value {
        &self.values[id]
    }

    /// Returns the block with the given ID.
    pub fn block(&self, id: BlockId) -> &Block {
        &self.blocks[id]
    }

    /// Returns the `index`-th result of a node.
    ///
    /// # Panics
    ///
    /// Panics if the node has fewer results.
    pub fn result(&self, node: NodeId, index: usize) -> ValueId {
        self.nodes[node].results[index]
    }

    /// Returns the type of a value.
    pub fn value_type(&self, value: ValueId) -> TypeId {
        self.values[value].ty
    }

    /// Returns the node defining a value, or `None` for ports.
    pub fn defining_node(&self, value: ValueId) -> Option<NodeId> {
        match self.values[value].def {
            ValueDef::Result { node, .. } => Some(node),
            ValueDef::Port { .. } => None,
        }
    }

    /// Returns `true` if the value is an input port.
    pub fn is_port(&self, value: ValueId) -> bool {
        matches!(self.values[value].def, ValueDef::Port { .. })
    }

    /// Returns the kind of the node defining a value, if any.
    pub fn defining_kind(&self, value: ValueId) -> Option<&OpKind> {
        self.defining_node(value).map(|n| &self.nodes[n].kind)
    }

    /// Returns every use of every result of a node, result by result.
    pub fn node_uses(&self, node: NodeId) -> Vec<Use> {
        self.nodes[node]
            .results
            .iter()
            .flat_map(|&r| self.values[r].uses.iter().copied())
            .collect()
    }

    /// Returns the users of a node's results, one entry per use.
    pub fn users(&self, node: NodeId) -> Vec<NodeId> {
        self.node_uses(node).into_iter().map(|u| u.node).collect()
    }

    /// Returns the total number of uses across a node's results.
    pub fn use_count(&self, node: NodeId) -> usize {
        self.nodes[node]
            .results
            .iter()
            .map(|&r| self.values[r].uses.len())
            .sum()
    }

    /// Returns `true` if the node's results have no uses.
    pub fn is_unused(&self, node: NodeId) -> bool {
        self.use_count(node) == 0
    }

    /// Returns the user when a node has exactly one use.
    pub fn single_user(&self, node: NodeId) -> Option<NodeId> {
        match self.node_uses(node).as_slice() {
            [only] => Some(only.node),
            _ => None,
        }
    }

    /// Returns the node owning the region that contains `node`.
    pub fn parent_node(&self, node: NodeId) -> Option<NodeId> {
        self.blocks[self.nodes[node].parent].parent
    }

    /// Returns `true` if `node` sits directly in a procedural block.
    pub fn in_procedural_region(&self, node: NodeId) -> bool {
        self.blocks[self.nodes[node].parent].is_procedural()
    }

    /// Iterates over the nodes of a block in emission order.
    pub fn block_nodes(&self, block: BlockId) -> BlockNodes<'_> {
        let b = &self.blocks[block];
        BlockNodes {
            module: self,
            front: b.first,
            back: b.last,
            remaining: b.len,
        }
    }

    /// Returns the node following `node` in its block.
    pub fn next_node(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node].next
    }

    /// Returns the node preceding `node` in its block.
    pub fn prev_node(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node].prev
    }

    /// Returns `true` if `a` comes strictly before `b`. Both must sit
    /// directly in the same block.
    pub fn is_before(&self, a: NodeId, b: NodeId) -> bool {
        debug_assert_eq!(self.nodes[a].parent, self.nodes[b].parent);
        self.nodes[a].order < self.nodes[b].order
    }

    /// Walks up from `node` to the ancestor (or `node` itself) sitting
    /// directly in `block`.
    pub fn ancestor_in_block(&self, node: NodeId, block: BlockId) -> Option<NodeId> {
        let mut current = node;
        loop {
            if self.nodes[current].parent == block {
                return Some(current);
            }
            current = self.parent_node(current)?;
        }
    }

    /// Returns `true` if the storage value is read through `ReadInOut` of
    /// a plain declaration, or is a port.
    pub fn is_simple_read_or_port(&self, value: ValueId) -> bool {
        let Some(def) = self.defining_node(value) else {
            return true;
        };
        let read = &self.nodes[def];
        if read.kind != OpKind::ReadInOut {
            return false;
        }
        self.defining_kind(read.operands[0])
            .is_some_and(|k| k.is_declaration())
    }

    /// Returns every live block in pre-order, starting with the body.
    pub fn blocks_preorder(&self) -> Vec<BlockId> {
        let mut out = Vec::new();
        let mut stack = vec![self.body];
        while let Some(block) = stack.pop() {
            out.push(block);
            for node in self.block_nodes(block).rev() {
                for &region in self.nodes[node].regions.iter().rev() {
                    stack.push(region);
                }
            }
        }
        out
    }

    /// Returns every live node, block by block in pre-order.
    pub fn live_nodes(&self) -> Vec<NodeId> {
        self.blocks_preorder()
            .into_iter()
            .flat_map(move |b| self.block_nodes(b))
            .collect()
    }

    /// Returns the `output` terminator of the body, if present.
    pub fn output_node(&self) -> Option<NodeId> {
        self.block_nodes(self.body)
            .rev()
            .find(|&n| self.nodes[n].kind == OpKind::Output)
    }
}

/// Iterator over the nodes of one block, see [`Module::block_nodes`].
#[derive(Debug, Clone)]
pub struct BlockNodes<'a> {
    module: &'a Module,
    front: Option<NodeId>,
    back: Option<NodeId>,
    remaining: usize,
}

impl Iterator for BlockNodes<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        if self.remaining == 0 {
            return None;
        }
        let node = self.front?;
        self.remaining -= 1;
        self.front = self.module.nodes[node].next;
        Some(node)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl DoubleEndedIterator for BlockNodes<'_> {
    fn next_back(&mut self) -> Option<NodeId> {
        if self.remaining == 0 {
            return None;
        }
        let node = self.back?;
        self.remaining -= 1;
        self.back = self.module.nodes[node].prev;
        Some(node)
    }
}

impl ExactSizeIterator for BlockNodes<'_> {}
