//! In-place graph mutation.
//!
//! Every mutation keeps the use lists consistent: creating or erasing a node,
//! or rewriting one of its operands, updates the `uses` of the values
//! involved.

use crate::ids::{BlockId, NodeId, TypeId, ValueId};
use crate::module::Module;
use crate::node::{Block, Node, Use, Value, ValueDef};
use crate::op::OpKind;
use svprep_common::Loc;

/// Gap left between the ordering keys of neighbouring nodes. Inserting into
/// a closed gap renumbers the block.
const ORDER_STRIDE: u64 = 1 << 20;

/// Where a created or moved node lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertPoint {
    /// Immediately before the anchor, in the anchor's block.
    Before(NodeId),
    /// Immediately after the anchor, in the anchor's block.
    After(NodeId),
    /// At the front of a block.
    Start(BlockId),
    /// At the end of a block.
    End(BlockId),
}

impl Module {
    /// Creates a node with fresh results of the given types and one empty
    /// region per region the kind owns.
    pub fn create_node(
        &mut self,
        at: InsertPoint,
        kind: OpKind,
        operands: Vec<ValueId>,
        result_types: Vec<TypeId>,
    ) -> NodeId {
        self.create_node_at(at, kind, operands, result_types, Loc::UNKNOWN)
    }

    /// Like [`create_node`](Self::create_node) with an explicit location.
    pub fn create_node_at(
        &mut self,
        at: InsertPoint,
        kind: OpKind,
        operands: Vec<ValueId>,
        result_types: Vec<TypeId>,
        loc: Loc,
    ) -> NodeId {
        let id = self.nodes.next_id();
        let (block, prev, next) = self.resolve(at);

        let results = result_types
            .into_iter()
            .enumerate()
            .map(|(i, ty)| {
                self.values.alloc(Value {
                    ty,
                    def: ValueDef::Result {
                        node: id,
                        index: i as u32,
                    },
                    uses: Vec::new(),
                })
            })
            .collect();
        let regions = kind
            .region_kinds()
            .into_iter()
            .map(|rk| self.blocks.alloc(Block::new(rk, Some(id))))
            .collect();
        for (i, &operand) in operands.iter().enumerate() {
            self.values[operand].uses.push(Use {
                node: id,
                operand: i as u32,
            });
        }

        let allocated = self.nodes.alloc(Node {
            kind,
            operands,
            results,
            regions,
            name: None,
            two_state: false,
            parent: block,
            loc,
            erased: false,
            prev: None,
            next: None,
            order: 0,
        });
        debug_assert_eq!(allocated, id);
        self.link(id, block, prev, next);
        id
    }

    /// Clones a node's kind, operands, attributes and result types into a new
    /// node at `at`. Nested regions are created empty.
    pub fn clone_node(&mut self, node: NodeId, at: InsertPoint) -> NodeId {
        let source = &self.nodes[node];
        let kind = source.kind.clone();
        let operands = source.operands.clone();
        let name = source.name;
        let two_state = source.two_state;
        let loc = source.loc;
        let result_types = source
            .results
            .iter()
            .map(|&r| self.values[r].ty)
            .collect();
        let clone = self.create_node_at(at, kind, operands, result_types, loc);
        let n = &mut self.nodes[clone];
        n.name = name;
        n.two_state = two_state;
        clone
    }

    /// Moves a node to a new position. Moving a node relative to itself is a
    /// no-op.
    pub fn move_node(&mut self, node: NodeId, at: InsertPoint) {
        if matches!(at, InsertPoint::Before(anchor) | InsertPoint::After(anchor) if anchor == node)
        {
            return;
        }
        debug_assert!(!self.nodes[node].erased, "moving erased {node:?}");
        self.detach(node);
        let (block, prev, next) = self.resolve(at);
        self.link(node, block, prev, next);
    }

    /// Erases a node together with everything nested in its regions, and
    /// drops the uses its operands held.
    ///
    /// The node's results must already be unused.
    pub fn erase_node(&mut self, node: NodeId) {
        if self.nodes[node].erased {
            return;
        }
        debug_assert!(self.is_unused(node), "erasing {node:?} with live uses");
        let mut stack = vec![node];
        let mut doomed = Vec::new();
        while let Some(n) = stack.pop() {
            doomed.push(n);
            for &region in &self.nodes[n].regions {
                stack.extend(self.block_nodes(region));
            }
        }
        // Innermost first so nested operand uses go before their definers.
        for &n in doomed.iter().rev() {
            let operands = self.nodes[n].operands.clone();
            for (i, operand) in operands.into_iter().enumerate() {
                self.remove_use(
                    operand,
                    Use {
                        node: n,
                        operand: i as u32,
                    },
                );
            }
            for region in self.nodes[n].regions.clone() {
                let block = &mut self.blocks[region];
                block.first = None;
                block.last = None;
                block.len = 0;
            }
        }
        self.detach(node);
        for &n in &doomed {
            self.nodes[n].erased = true;
        }
    }

    /// Points operand `index` of `node` at `value`.
    pub fn set_operand(&mut self, node: NodeId, index: usize, value: ValueId) {
        let old = self.nodes[node].operands[index];
        if old == value {
            return;
        }
        let u = Use {
            node,
            operand: index as u32,
        };
        self.remove_use(old, u);
        self.values[value].uses.push(u);
        self.nodes[node].operands[index] = value;
    }

    /// Redirects every use of `from` to `to`.
    pub fn replace_all_uses_with(&mut self, from: ValueId, to: ValueId) {
        if from == to {
            return;
        }
        let uses = std::mem::take(&mut self.values[from].uses);
        for u in &uses {
            self.nodes[u.node].operands[u.operand as usize] = to;
        }
        self.values[to].uses.extend(uses);
    }

    fn remove_use(&mut self, value: ValueId, u: Use) {
        let uses = &mut self.values[value].uses;
        if let Some(pos) = uses.iter().position(|&x| x == u) {
            uses.remove(pos);
        }
    }

    /// Unlinks a live node from its block.
    fn detach(&mut self, node: NodeId) {
        let Node {
            parent, prev, next, ..
        } = self.nodes[node];
        match prev {
            Some(p) => self.nodes[p].next = next,
            None => self.blocks[parent].first = next,
        }
        match next {
            Some(n) => self.nodes[n].prev = prev,
            None => self.blocks[parent].last = prev,
        }
        let n = &mut self.nodes[node];
        n.prev = None;
        n.next = None;
        self.blocks[parent].len -= 1;
    }

    /// Links a detached node into `block` between `prev` and `next`, which
    /// must be neighbours there.
    fn link(&mut self, node: NodeId, block: BlockId, prev: Option<NodeId>, next: Option<NodeId>) {
        match prev {
            Some(p) => self.nodes[p].next = Some(node),
            None => self.blocks[block].first = Some(node),
        }
        match next {
            Some(n) => self.nodes[n].prev = Some(node),
            None => self.blocks[block].last = Some(node),
        }
        self.blocks[block].len += 1;
        let n = &mut self.nodes[node];
        n.parent = block;
        n.prev = prev;
        n.next = next;

        let low = prev.map_or(0, |p| self.nodes[p].order);
        match next {
            None => self.nodes[node].order = low + ORDER_STRIDE,
            Some(n) => {
                let high = self.nodes[n].order;
                if high.saturating_sub(low) < 2 {
                    self.renumber(block);
                } else {
                    self.nodes[node].order = low + (high - low) / 2;
                }
            }
        }
    }

    /// Spreads the ordering keys of a block evenly again.
    fn renumber(&mut self, block: BlockId) {
        let mut order = 0;
        let mut cursor = self.blocks[block].first;
        while let Some(node) = cursor {
            order += ORDER_STRIDE;
            self.nodes[node].order = order;
            cursor = self.nodes[node].next;
        }
    }

    /// Resolves an insertion point to a block and the neighbours the new node
    /// goes between.
    fn resolve(&self, at: InsertPoint) -> (BlockId, Option<NodeId>, Option<NodeId>) {
        match at {
            InsertPoint::Before(anchor) | InsertPoint::After(anchor) => {
                let block = self.nodes[anchor].parent;
                // An anchor that is no longer in its block resolves to the end.
                if self.nodes[anchor].erased {
                    return (block, self.blocks[block].last, None);
                }
                match at {
                    InsertPoint::Before(_) => (block, self.nodes[anchor].prev, Some(anchor)),
                    _ => (block, Some(anchor), self.nodes[anchor].next),
                }
            }
            InsertPoint::Start(block) => (block, None, self.blocks[block].first),
            InsertPoint::End(block) => (block, self.blocks[block].last, None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use svprep_common::Interner;

    fn setup() -> (Module, ValueId, TypeId) {
        let interner = Interner::new();
        let mut m = Module::new(interner.get_or_intern("m"), Loc::UNKNOWN);
        let i4 = m.types.int(4);
        let a = m.add_input(interner.get_or_intern("a"), i4);
        (m, a, i4)
    }

    #[test]
    fn create_registers_uses() {
        let (mut m, a, i4) = setup();
        let body = m.body;
        let n = m.create_node(InsertPoint::End(body), OpKind::Add, vec![a, a], vec![i4]);
        assert_eq!(m.value(a).uses.len(), 2);
        assert_eq!(m.node(n).results.len(), 1);
        assert_eq!(m.node(n).parent, body);
    }

    #[test]
    fn insert_before_and_after() {
        let (mut m, a, i4) = setup();
        let body = m.body;
        let x = m.create_node(InsertPoint::End(body), OpKind::Xor, vec![a, a], vec![i4]);
        let before = m.create_node(InsertPoint::Before(x), OpKind::Or, vec![a, a], vec![i4]);
        let after = m.create_node(InsertPoint::After(x), OpKind::And, vec![a, a], vec![i4]);
        let start = m.create_node(InsertPoint::Start(body), OpKind::Mul, vec![a, a], vec![i4]);
        assert_eq!(m.block_nodes(body).collect::<Vec<_>>(), vec![start, before, x, after]);
    }

    #[test]
    fn move_relative_to_self_is_noop() {
        let (mut m, a, i4) = setup();
        let body = m.body;
        let x = m.create_node(InsertPoint::End(body), OpKind::Xor, vec![a, a], vec![i4]);
        let y = m.create_node(InsertPoint::End(body), OpKind::Or, vec![a, a], vec![i4]);
        m.move_node(x, InsertPoint::Before(x));
        assert_eq!(m.block_nodes(body).collect::<Vec<_>>(), vec![x, y]);
        m.move_node(x, InsertPoint::After(y));
        assert_eq!(m.block_nodes(body).collect::<Vec<_>>(), vec![y, x]);
    }

    #[test]
    fn move_into_nested_region() {
        let (mut m, a, i4) = setup();
        let body = m.body;
        let x = m.create_node(InsertPoint::End(body), OpKind::Xor, vec![a, a], vec![i4]);
        let init = m.create_node(InsertPoint::End(body), OpKind::Initial, vec![], vec![]);
        let inner = m.node(init).regions[0];
        m.move_node(x, InsertPoint::End(inner));
        assert_eq!(m.node(x).parent, inner);
        assert_eq!(m.block_nodes(body).collect::<Vec<_>>(), vec![init]);
    }

    #[test]
    fn erase_drops_operand_uses_recursively() {
        let (mut m, a, i4) = setup();
        let body = m.body;
        let init = m.create_node(InsertPoint::End(body), OpKind::Initial, vec![], vec![]);
        let inner = m.node(init).regions[0];
        let x = m.create_node(InsertPoint::End(inner), OpKind::Xor, vec![a, a], vec![i4]);
        m.erase_node(init);
        assert!(m.value(a).uses.is_empty());
        assert!(m.node(x).erased);
        assert!(m.block(body).is_empty());
    }

    #[test]
    fn set_operand_and_rauw() {
        let (mut m, a, i4) = setup();
        let body = m.body;
        let c = m.create_node(
            InsertPoint::End(body),
            OpKind::Constant { value: 1 },
            vec![],
            vec![i4],
        );
        let cv = m.result(c, 0);
        let add = m.create_node(InsertPoint::End(body), OpKind::Add, vec![a, a], vec![i4]);
        m.set_operand(add, 1, cv);
        assert_eq!(m.value(a).uses.len(), 1);
        assert_eq!(m.value(cv).uses.len(), 1);
        m.replace_all_uses_with(a, cv);
        assert!(m.value(a).uses.is_empty());
        assert_eq!(m.node(add).operands, vec![cv, cv]);
    }

    #[test]
    fn clone_copies_attributes() {
        let (mut m, a, i4) = setup();
        let body = m.body;
        let x = m.create_node(InsertPoint::End(body), OpKind::Add, vec![a, a], vec![i4]);
        m.node_mut(x).two_state = true;
        let c = m.clone_node(x, InsertPoint::Before(x));
        assert!(m.node(c).two_state);
        assert_ne!(m.result(c, 0), m.result(x, 0));
        assert_eq!(m.value(a).uses.len(), 4);
        assert_eq!(m.block_nodes(body).collect::<Vec<_>>(), vec![c, x]);
    }

    #[test]
    fn repeated_front_inserts_keep_order() {
        let (mut m, a, i4) = setup();
        let body = m.body;
        let mut created = Vec::new();
        for _ in 0..64 {
            created.push(m.create_node(InsertPoint::Start(body), OpKind::Xor, vec![a, a], vec![i4]));
        }
        created.reverse();
        assert_eq!(m.block_nodes(body).collect::<Vec<_>>(), created);
        assert_eq!(m.block(body).len(), 64);
        for pair in created.windows(2) {
            assert!(m.is_before(pair[0], pair[1]));
            assert_eq!(m.next_node(pair[0]), Some(pair[1]));
        }
        let back: Vec<_> = m.block_nodes(body).rev().collect();
        assert_eq!(back.first(), created.last());
    }

    #[test]
    fn interleaved_moves_keep_links_consistent() {
        let (mut m, a, i4) = setup();
        let body = m.body;
        let nodes: Vec<_> = (0..8)
            .map(|_| m.create_node(InsertPoint::End(body), OpKind::Or, vec![a, a], vec![i4]))
            .collect();
        // Squeeze every node in between the first two, one after another.
        for &n in &nodes[2..] {
            m.move_node(n, InsertPoint::Before(nodes[1]));
        }
        let expected: Vec<_> = std::iter::once(nodes[0])
            .chain(nodes[2..].iter().copied())
            .chain(std::iter::once(nodes[1]))
            .collect();
        assert_eq!(m.block_nodes(body).collect::<Vec<_>>(), expected);
        for pair in expected.windows(2) {
            assert!(m.is_before(pair[0], pair[1]));
            assert_eq!(m.prev_node(pair[1]), Some(pair[0]));
        }
        assert_eq!(m.block(body).first(), Some(nodes[0]));
        assert_eq!(m.block(body).last(), Some(nodes[1]));

        m.erase_node(nodes[4]);
        m.erase_node(nodes[4]);
        assert_eq!(m.block(body).len(), 7);
        assert_eq!(m.next_node(nodes[3]), Some(nodes[5]));
    }
}
