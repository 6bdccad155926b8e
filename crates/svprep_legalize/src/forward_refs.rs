//! Resolution of use-before-definition in graph regions.
//!
//! Graph regions are order-insensitive, but the emitted text is not: a name
//! must be declared before it is referenced. Resolution runs in two phases so
//! detection never observes its own relocations.

use crate::context::PrepareCx;
use crate::spill::lower_users_to_temporary_wire;
use std::collections::HashSet;
use svprep_common::PrepResult;
use svprep_ir::{BlockId, InsertPoint, NodeId, OpKind};

/// Returns the nodes of `block`, in order, that some earlier node of the
/// block uses. Users nested in regions count as their enclosing node.
fn find_out_of_order(cx: &PrepareCx<'_>, block: BlockId) -> Vec<NodeId> {
    let m = &*cx.module;
    let mut seen = HashSet::new();
    let mut out_of_order = Vec::new();
    for node in m.block_nodes(block) {
        let used_earlier = m
            .users(node)
            .into_iter()
            .filter_map(|user| m.ancestor_in_block(user, block))
            .any(|user| seen.contains(&user));
        seen.insert(node);
        if used_earlier {
            out_of_order.push(node);
        }
    }
    out_of_order
}

/// A declaration with no operands can be placed anywhere.
fn is_movable_declaration(cx: &PrepareCx<'_>, node: NodeId) -> bool {
    let n = cx.module.node(node);
    n.operands.is_empty()
        && n.results.len() == 1
        && cx.module.types.is_inout(cx.module.value_type(n.results[0]))
}

/// Moves or spills every node of a graph block that is used before its
/// definition.
///
/// Movable declarations and constants go to the front of the block, a read
/// of a movable declaration goes there together with its declaration, and
/// anything else is spilled through a wire declared at the front.
pub(crate) fn resolve_forward_references(cx: &mut PrepareCx<'_>, block: BlockId) -> PrepResult<()> {
    for node in find_out_of_order(cx, block) {
        cx.stats.forward_refs += 1;
        tracing::debug!(module = %cx.module_name, node = ?node, "resolving use before definition");
        if is_movable_declaration(cx, node) || cx.oracle.is_constant_expression(cx.module, node) {
            move_to_front(cx, block, node);
            continue;
        }
        if cx.module.node(node).kind == OpKind::ReadInOut {
            let storage = cx.module.node(node).operands[0];
            if let Some(decl) = cx.module.defining_node(storage) {
                if is_movable_declaration(cx, decl) {
                    move_to_front(cx, block, node);
                    move_to_front(cx, block, decl);
                    continue;
                }
            }
        }
        lower_users_to_temporary_wire(cx, node, true)?;
    }
    Ok(())
}

fn move_to_front(cx: &mut PrepareCx<'_>, block: BlockId, node: NodeId) {
    cx.module.move_node(node, InsertPoint::Start(block));
}
