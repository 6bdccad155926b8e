//! Moving logic out of procedural regions for targets without local
//! variables.
//!
//! Without `automatic` declarations nothing inside an `always` or `initial`
//! block can be spilled, so expressions are hoisted to the enclosing graph
//! region and side-effecting calls are captured into module-level registers.

use crate::context::PrepareCx;
use svprep_common::PrepResult;
use svprep_ir::{InsertPoint, NodeId, OpKind};

/// Ensures a side-effecting expression is used only by a single blocking
/// assignment into a `reg` or `logic`.
///
/// Declares a register before the outermost enclosing process, redirects all
/// uses to a read of it and assigns the expression to it right after the
/// call. Returns `true` if the node was rewritten.
pub(crate) fn rewrite_side_effecting_expr(cx: &mut PrepareCx<'_>, node: NodeId) -> PrepResult<bool> {
    let m = &*cx.module;
    if let Some(user) = m.single_user(node) {
        if m.node(user).kind == OpKind::BPAssign {
            let dest = m.node(user).operands[0];
            if matches!(m.defining_kind(dest), Some(OpKind::Reg | OpKind::Logic)) {
                return Ok(false);
            }
        }
    }
    let [result] = m.node(node).results.as_slice() else {
        return Ok(false);
    };
    let result = *result;
    let loc = m.node(node).loc;
    let ty = m.value_type(result);

    let anchor = cx.find_parent_in_non_procedural_region(node)?;
    let storage = cx.storage_type_of(result);
    let reg = cx
        .module
        .create_node_at(InsertPoint::Before(anchor), OpKind::Reg, vec![], vec![storage], loc);
    let reg_value = cx.module.result(reg, 0);
    let read = cx.module.create_node_at(
        InsertPoint::Before(anchor),
        OpKind::ReadInOut,
        vec![reg_value],
        vec![ty],
        loc,
    );
    let read_value = cx.module.result(read, 0);
    cx.module.replace_all_uses_with(result, read_value);
    cx.module.create_node_at(
        InsertPoint::After(node),
        OpKind::BPAssign,
        vec![reg_value, result],
        vec![],
        loc,
    );
    cx.stats.side_effects_extracted += 1;
    tracing::debug!(module = %cx.module_name, node = ?node, "captured side effect into register");
    Ok(true)
}

/// Hoists a side-effect-free expression out of procedural code.
///
/// Moves all the way out to the graph region in one step when every operand
/// is defined outside procedural code, otherwise one region level, and not at
/// all when an operand is defined in the node's own block. Always-inline
/// expressions stay put unless they deal in storage. Returns `true` if the
/// node moved.
pub(crate) fn hoist_non_side_effect_expr(cx: &mut PrepareCx<'_>, node: NodeId) -> PrepResult<bool> {
    let m = &*cx.module;
    let n = m.node(node);
    if cx.is_always_inline(node) {
        let storage = n.kind == OpKind::ReadInOut
            || n
                .results
                .first()
                .is_some_and(|&r| m.types.is_inout(m.value_type(r)));
        if !storage {
            return Ok(false);
        }
    }

    let mut anchor = cx.find_parent_in_non_procedural_region(node)?;
    let mut nested_operand = false;
    for &operand in &n.operands {
        let Some(def) = m.defining_node(operand) else {
            continue;
        };
        if m.in_procedural_region(def) {
            if m.node(def).parent == n.parent {
                return Ok(false);
            }
            nested_operand = true;
        }
    }
    if nested_operand {
        let Some(parent) = m.parent_node(node) else {
            return Ok(false);
        };
        anchor = parent;
    }

    cx.module.move_node(node, InsertPoint::Before(anchor));
    cx.stats.hoisted += 1;
    tracing::debug!(module = %cx.module_name, node = ?node, anchor = ?anchor, "hoisted expression");
    Ok(true)
}
