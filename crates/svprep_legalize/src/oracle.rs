//! The expression-classification seam.
//!
//! Which nodes count as expressions, which must always be printed inline and
//! which the emitter can print inline at their use site are properties of the
//! emitter, not of this pass. The legalizer asks an [`ExprOracle`] and never
//! decides these itself; [`SvOracle`] mirrors the SystemVerilog emitter.

use svprep_config::LoweringOptions;
use svprep_ir::{Module, NodeId, OpCategory, OpKind, ValueId};

/// Verbatim expressions longer than this are printed out of line.
const MAX_INLINE_VERBATIM_LEN: usize = 32;

/// Classifies nodes the way the emitter will treat them.
pub trait ExprOracle: Sync {
    /// Returns `true` if the node is printed as (part of) an expression.
    fn is_expression(&self, module: &Module, node: NodeId) -> bool;

    /// Returns `true` if the emitter can print the node inline at every use.
    fn is_inlineable_at_use(
        &self,
        module: &Module,
        node: NodeId,
        options: &LoweringOptions,
    ) -> bool;

    /// Returns `true` for nodes that must never be spilled and are printed
    /// inline at each use.
    fn is_always_inline(&self, module: &Module, node: NodeId) -> bool;

    /// Returns `true` for constant expressions.
    fn is_constant_expression(&self, module: &Module, node: NodeId) -> bool;

    /// Returns `true` if evaluating the node has no side effects.
    fn is_memory_effect_free(&self, module: &Module, node: NodeId) -> bool;
}

/// The SystemVerilog emitter's classification rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct SvOracle;

impl SvOracle {
    /// Returns `true` if a multiply-used node is cheap enough to print once
    /// per use.
    fn is_duplicatable(&self, module: &Module, node: NodeId) -> bool {
        let n = module.node(node);
        if n.operands.is_empty() {
            return match &n.kind {
                OpKind::Constant { .. } => true,
                OpKind::VerbatimExpr { text, side_effects } => {
                    !side_effects && text.len() <= MAX_INLINE_VERBATIM_LEN
                }
                _ => false,
            };
        }
        match &n.kind {
            OpKind::Extract { .. } | OpKind::StructExtract { .. } => true,
            OpKind::ArrayGet => {
                let index = n.operands[1];
                match module.defining_kind(index) {
                    None | Some(OpKind::Constant { .. }) => true,
                    Some(OpKind::ReadInOut) => module.is_simple_read_or_port(index),
                    Some(_) => false,
                }
            }
            _ => false,
        }
    }

    /// Bit and field selection must apply to a named vector, not an
    /// arbitrary expression.
    fn is_ok_to_bit_select_from(&self, module: &Module, value: ValueId) -> bool {
        match module.defining_kind(value) {
            None => true,
            Some(kind) => matches!(
                kind,
                OpKind::ReadInOut | OpKind::StructExtract { .. } | OpKind::ArrayGet
            ),
        }
    }

    fn is_unable_to_inline(&self, module: &Module, node: NodeId, options: &LoweringOptions) -> bool {
        let n = module.node(node);
        match &n.kind {
            OpKind::StructCreate => return true,
            OpKind::VerbatimExpr { text, .. } if text.len() > MAX_INLINE_VERBATIM_LEN => {
                return true
            }
            _ => {}
        }
        for u in module.node_uses(node) {
            let user = module.node(u.node);
            let selects = matches!(
                user.kind,
                OpKind::Extract { .. } | OpKind::ArrayGet | OpKind::StructExtract { .. }
            );
            if selects && u.operand == 0 {
                let value = user.operands[0];
                if !self.is_ok_to_bit_select_from(module, value) {
                    return true;
                }
            }
            if !options.allow_expr_in_event_control
                && matches!(user.kind, OpKind::Always { .. } | OpKind::AlwaysFF { .. })
            {
                return true;
            }
        }
        false
    }
}

impl ExprOracle for SvOracle {
    fn is_expression(&self, module: &Module, node: NodeId) -> bool {
        matches!(
            module.node(node).kind.category(),
            OpCategory::Expression | OpCategory::Read
        )
    }

    fn is_inlineable_at_use(
        &self,
        module: &Module,
        node: NodeId,
        options: &LoweringOptions,
    ) -> bool {
        // Replaced by one field extraction per result before emission.
        if module.node(node).kind == OpKind::StructExplode {
            return true;
        }
        let uses = module.node_uses(node);
        if uses.is_empty() {
            return true;
        }
        if let [only] = uses.as_slice() {
            let user = &module.node(only.node).kind;
            if matches!(
                user,
                OpKind::Output | OpKind::Assign | OpKind::BPAssign | OpKind::PAssign
            ) {
                return true;
            }
        }
        if options.disallow_mux_inlining && module.node(node).kind == OpKind::Mux {
            return false;
        }
        if uses.len() > 1 && !self.is_duplicatable(module, node) {
            return false;
        }
        !self.is_unable_to_inline(module, node, options)
    }

    fn is_always_inline(&self, module: &Module, node: NodeId) -> bool {
        matches!(
            module.node(node).kind,
            OpKind::ReadInOut | OpKind::ArrayIndexInOut | OpKind::StructFieldInOut { .. }
        )
    }

    fn is_constant_expression(&self, module: &Module, node: NodeId) -> bool {
        matches!(module.node(node).kind, OpKind::Constant { .. })
    }

    fn is_memory_effect_free(&self, module: &Module, node: NodeId) -> bool {
        let kind = &module.node(node).kind;
        matches!(
            kind.category(),
            OpCategory::Expression | OpCategory::Read | OpCategory::Declaration
        ) && !kind.has_side_effects()
    }
}
