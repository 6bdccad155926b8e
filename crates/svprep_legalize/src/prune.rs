//! Dead-logic pruning ahead of legalization.
//!
//! Removes side-effect-free expressions whose results nothing uses, following
//! operands backwards as their last users disappear, so legalization never
//! spills or duplicates logic that would not be printed.

use crate::context::PrepareCx;
use svprep_ir::NodeId;

fn is_dead(cx: &PrepareCx<'_>, node: NodeId) -> bool {
    !cx.module.node(node).erased
        && cx.is_expression(node)
        && cx.is_memory_effect_free(node)
        && cx.module.is_unused(node)
}

/// Erases dead expressions throughout the module. Returns the number erased.
pub(crate) fn prune_dead_logic(cx: &mut PrepareCx<'_>) -> usize {
    let mut worklist: Vec<NodeId> = cx
        .module
        .live_nodes()
        .into_iter()
        .filter(|&n| is_dead(cx, n))
        .collect();
    let mut pruned = 0;
    while let Some(node) = worklist.pop() {
        if !is_dead(cx, node) {
            continue;
        }
        let operands = cx.module.node(node).operands.clone();
        cx.module.erase_node(node);
        pruned += 1;
        for operand in operands {
            if let Some(def) = cx.module.defining_node(operand) {
                if is_dead(cx, def) {
                    worklist.push(def);
                }
            }
        }
    }
    cx.stats.pruned += pruned;
    if pruned > 0 {
        tracing::debug!(module = %cx.module_name, pruned, "pruned dead logic");
    }
    pruned
}
