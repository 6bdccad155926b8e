//! Local rewrites that make expressions printable or prettier: balancing of
//! variadic operators, `a + -c` to `a - c`, and struct explosion.
//!
//! Each rewrite returns the first node it created so the legalization scan
//! can revisit the new nodes.

use crate::context::PrepareCx;
use crate::spill::lower_always_inline_operands;
use svprep_common::{InternalError, PrepResult};
use svprep_ir::{canonicalize_constant, InsertPoint, NodeId, OpKind, TypeId, ValueId};

/// Returns `true` if `node` is a commutative variadic operator worth
/// rebuilding as a binary tree.
pub(crate) fn is_balanceable(cx: &PrepareCx<'_>, node: NodeId) -> bool {
    let n = cx.module.node(node);
    n.operands.len() > 2
        && n.results.len() == 1
        && n.regions.is_empty()
        && n.kind.is_commutative()
        && cx.is_memory_effect_free(node)
}

struct TreeBuilder {
    kind: OpKind,
    ty: TypeId,
    two_state: bool,
    anchor: NodeId,
    created: Vec<NodeId>,
}

impl TreeBuilder {
    /// Splits at the midpoint and builds both halves before the node
    /// combining them. Depth is logarithmic in the operand count.
    fn build(&mut self, cx: &mut PrepareCx<'_>, operands: &[ValueId]) -> ValueId {
        let (lhs, rhs) = match operands {
            [single] => return *single,
            [lhs, rhs] => (*lhs, *rhs),
            _ => {
                let half = operands.len() / 2;
                let lhs = self.build(cx, &operands[..half]);
                let rhs = self.build(cx, &operands[half..]);
                (lhs, rhs)
            }
        };
        let loc = cx.module.node(self.anchor).loc;
        let node = cx.module.create_node_at(
            InsertPoint::Before(self.anchor),
            self.kind.clone(),
            vec![lhs, rhs],
            vec![self.ty],
            loc,
        );
        cx.module.node_mut(node).two_state = self.two_state;
        self.created.push(node);
        cx.module.result(node, 0)
    }
}

/// Rebuilds an N-ary commutative operator as a balanced tree of N-1 binary
/// nodes. The name hint moves to the root; the two-state marker is kept on
/// every node.
pub(crate) fn balance_variadic(cx: &mut PrepareCx<'_>, node: NodeId) -> PrepResult<NodeId> {
    let n = cx.module.node(node);
    let operands = n.operands.clone();
    let name = n.name;
    let old = cx.module.result(node, 0);
    let mut builder = TreeBuilder {
        kind: n.kind.clone(),
        ty: cx.module.value_type(old),
        two_state: n.two_state,
        anchor: node,
        created: Vec::new(),
    };
    let root = builder.build(cx, &operands);
    if let Some(root_node) = cx.module.defining_node(root) {
        cx.module.node_mut(root_node).name = name;
    }
    cx.module.replace_all_uses_with(old, root);
    cx.module.erase_node(node);
    for &created in &builder.created {
        lower_always_inline_operands(cx, created);
    }
    cx.stats.balanced += 1;
    tracing::debug!(
        module = %cx.module_name,
        node = ?node,
        operands = operands.len(),
        "balanced variadic operator"
    );
    builder
        .created
        .first()
        .copied()
        .ok_or_else(|| InternalError::new(format!("balancing {node:?} created no nodes")))
}

/// Returns the negative constant feeding the right-hand side of a binary add.
pub(crate) fn negative_constant_rhs(cx: &PrepareCx<'_>, node: NodeId) -> Option<NodeId> {
    let n = cx.module.node(node);
    if n.kind != OpKind::Add || n.operands.len() != 2 {
        return None;
    }
    let cst = cx.module.defining_node(n.operands[1])?;
    match cx.module.node(cst).kind {
        OpKind::Constant { value } if value < 0 => Some(cst),
        _ => None,
    }
}

/// Rewrites `a + c` with negative `c` into `a - (-c)`. Removes `c` if nothing
/// else uses it and returns the new positive constant.
pub(crate) fn rewrite_add_with_negative_constant(
    cx: &mut PrepareCx<'_>,
    add: NodeId,
    cst: NodeId,
) -> NodeId {
    let OpKind::Constant { value } = cx.module.node(cst).kind else {
        return add;
    };
    let n = cx.module.node(add);
    let lhs = n.operands[0];
    let name = n.name;
    let two_state = n.two_state;
    let loc = n.loc;
    let old = cx.module.result(add, 0);
    let ty = cx.module.value_type(old);
    let width = cx.module.types.bit_width(ty).unwrap_or(64);
    let negated = canonicalize_constant(value.wrapping_neg(), width);

    let positive = cx.module.create_node_at(
        InsertPoint::Before(add),
        OpKind::Constant { value: negated },
        vec![],
        vec![ty],
        loc,
    );
    let positive_value = cx.module.result(positive, 0);
    let sub = cx.module.create_node_at(
        InsertPoint::Before(add),
        OpKind::Sub,
        vec![lhs, positive_value],
        vec![ty],
        loc,
    );
    let sub_node = cx.module.node_mut(sub);
    sub_node.two_state = two_state;
    sub_node.name = name;
    let sub_value = cx.module.result(sub, 0);
    cx.module.replace_all_uses_with(old, sub_value);
    cx.module.erase_node(add);
    if cx.module.is_unused(cst) {
        cx.module.erase_node(cst);
    }
    lower_always_inline_operands(cx, sub);
    tracing::debug!(module = %cx.module_name, node = ?add, "rewrote add of negative constant");
    positive
}

/// Replaces a struct explosion with one field extraction per result.
/// Returns the first extraction, or `None` for a struct without fields.
pub(crate) fn lower_struct_explode(cx: &mut PrepareCx<'_>, node: NodeId) -> Option<NodeId> {
    let n = cx.module.node(node);
    let input = *n.operands.first()?;
    let results = n.results.clone();
    let loc = n.loc;
    let fields = cx
        .module
        .types
        .struct_fields(cx.module.value_type(input))
        .to_vec();

    let mut first = None;
    let mut extracts = Vec::new();
    for (result, (field, _)) in results.into_iter().zip(fields) {
        let ty = cx.module.value_type(result);
        let extract = cx.module.create_node_at(
            InsertPoint::Before(node),
            OpKind::StructExtract { field },
            vec![input],
            vec![ty],
            loc,
        );
        first.get_or_insert(extract);
        extracts.push(extract);
        let extract_value = cx.module.result(extract, 0);
        cx.module.replace_all_uses_with(result, extract_value);
    }
    cx.module.erase_node(node);
    for extract in extracts {
        lower_always_inline_operands(cx, extract);
    }
    tracing::debug!(module = %cx.module_name, node = ?node, "exploded struct into field extracts");
    first
}
