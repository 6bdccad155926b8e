//! Shared graph builders and invariant checks for the integration tests.

#![allow(dead_code)]

use svprep_common::{Interner, Loc};
use svprep_config::LoweringOptions;
use svprep_ir::{
    print_module, BlockId, InsertPoint, Module, NodeId, OpKind, RegionKind, TypeId, ValueId,
};
use svprep_legalize::{
    legalize_module, prepare_module, ExprOracle, LegalizeError, PrepareStats, SvOracle,
};

/// A module under construction together with its interner.
pub struct Builder {
    pub interner: Interner,
    pub module: Module,
}

impl Builder {
    pub fn new(name: &str) -> Self {
        let interner = Interner::new();
        let module = Module::new(interner.get_or_intern(name), Loc::UNKNOWN);
        Self { interner, module }
    }

    pub fn body(&self) -> BlockId {
        self.module.body
    }

    pub fn int(&mut self, width: u32) -> TypeId {
        self.module.types.int(width)
    }

    pub fn input(&mut self, name: &str, width: u32) -> ValueId {
        let ty = self.int(width);
        self.module.add_input(self.interner.get_or_intern(name), ty)
    }

    pub fn output(&mut self, name: &str, width: u32) {
        let ty = self.int(width);
        self.module.add_output(self.interner.get_or_intern(name), ty);
    }

    /// Appends a single-result expression of the given width.
    pub fn expr(&mut self, block: BlockId, kind: OpKind, operands: Vec<ValueId>, width: u32) -> ValueId {
        let ty = self.int(width);
        let node = self
            .module
            .create_node(InsertPoint::End(block), kind, operands, vec![ty]);
        self.module.result(node, 0)
    }

    pub fn constant(&mut self, block: BlockId, value: i64, width: u32) -> ValueId {
        self.expr(block, OpKind::Constant { value }, vec![], width)
    }

    /// Appends a result-less node such as a connection or a control node.
    pub fn stmt(&mut self, block: BlockId, kind: OpKind, operands: Vec<ValueId>) -> NodeId {
        self.module
            .create_node(InsertPoint::End(block), kind, operands, vec![])
    }

    /// Appends a named declaration of `kind` holding `width` bits.
    pub fn decl(&mut self, block: BlockId, kind: OpKind, name: &str, width: u32) -> ValueId {
        let ty = self.int(width);
        let storage = self.module.types.inout(ty);
        let node = self
            .module
            .create_node(InsertPoint::End(block), kind, vec![], vec![storage]);
        self.module.node_mut(node).name = Some(self.interner.get_or_intern(name));
        self.module.result(node, 0)
    }

    pub fn read(&mut self, block: BlockId, storage: ValueId) -> ValueId {
        let storage_ty = self.module.value_type(storage);
        let ty = self
            .module
            .types
            .inout_element(storage_ty)
            .expect("read of non-storage value");
        let node = self
            .module
            .create_node(InsertPoint::End(block), OpKind::ReadInOut, vec![storage], vec![ty]);
        self.module.result(node, 0)
    }

    pub fn region(&self, node: NodeId, index: usize) -> BlockId {
        self.module.node(node).regions[index]
    }

    pub fn ident(&self, name: &str) -> svprep_common::Ident {
        self.interner.get_or_intern(name)
    }

    pub fn print(&self) -> String {
        print_module(&self.module, &self.interner)
    }

    pub fn legalize(&mut self, options: &LoweringOptions) -> Result<PrepareStats, LegalizeError> {
        legalize_module(&mut self.module, &self.interner, options, &SvOracle)
    }

    pub fn prepare(&mut self, options: &LoweringOptions) -> Result<PrepareStats, LegalizeError> {
        prepare_module(&mut self.module, &self.interner, options, &SvOracle)
    }
}

/// Every use in a graph block, nested uses included, sits at or after the
/// position of its definition.
pub fn assert_no_forward_refs(m: &Module) {
    let live = m.live_nodes();
    for block in m.blocks_preorder() {
        if m.block(block).kind != RegionKind::Graph {
            continue;
        }
        for &user in &live {
            let Some(user_at) = m.ancestor_in_block(user, block) else {
                continue;
            };
            for &operand in &m.node(user).operands {
                let Some(def) = m.defining_node(operand) else {
                    continue;
                };
                let Some(def_at) = m.ancestor_in_block(def, block) else {
                    continue;
                };
                assert!(
                    def_at == user_at || m.is_before(def_at, user_at),
                    "{user:?} uses {operand:?} before its definition {def:?}"
                );
            }
        }
    }
}

/// Side-effecting expressions in procedural code feed exactly one blocking
/// assignment into a declaration.
pub fn assert_side_effects_single_use(m: &Module) {
    for node in m.live_nodes() {
        if !m.in_procedural_region(node)
            || !SvOracle.is_expression(m, node)
            || SvOracle.is_memory_effect_free(m, node)
        {
            continue;
        }
        let uses = m.node_uses(node);
        assert_eq!(uses.len(), 1, "{node:?} has {} uses", uses.len());
        let assign = m.node(uses[0].node);
        assert_eq!(assign.kind, OpKind::BPAssign);
        assert_eq!(uses[0].operand, 1);
        assert!(m
            .defining_kind(assign.operands[0])
            .is_some_and(|k| k.is_declaration()));
    }
}

/// Local declarations lead their procedural block; blocks of syntactic
/// wrappers hold none.
pub fn assert_declarations_lead(m: &Module) {
    for block in m.blocks_preorder() {
        let b = m.block(block);
        if !b.is_procedural() {
            continue;
        }
        let wrapper = b
            .parent
            .is_some_and(|owner| m.node(owner).kind.is_syntactic_wrapper());
        let mut seen_other = false;
        for node in m.block_nodes(block) {
            if m.node(node).kind == OpKind::Logic {
                assert!(!wrapper, "{node:?} declared inside a syntactic wrapper");
                assert!(!seen_other, "{node:?} declared after a statement");
            } else {
                seen_other = true;
            }
        }
    }
}

/// Every always-inline node has a single use in its own block, with nothing
/// but other always-inline nodes between the two.
pub fn assert_always_inline_beside_users(m: &Module) {
    for node in m.live_nodes() {
        if !SvOracle.is_always_inline(m, node) {
            continue;
        }
        let uses = m.node_uses(node);
        assert_eq!(uses.len(), 1, "{node:?} has {} uses", uses.len());
        let user = uses[0].node;
        assert_eq!(m.node(user).parent, m.node(node).parent, "{node:?} is not beside {user:?}");
        assert!(m.is_before(node, user), "{node:?} follows its user {user:?}");
        let mut between = m.next_node(node);
        while let Some(n) = between.filter(|&n| n != user) {
            assert!(
                SvOracle.is_always_inline(m, n),
                "{n:?} separates {node:?} from its user {user:?}"
            );
            between = m.next_node(n);
        }
    }
}
