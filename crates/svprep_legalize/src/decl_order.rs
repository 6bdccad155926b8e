//! Placement of `logic` declarations in procedural blocks.
//!
//! An `automatic logic` declaration must precede every statement of the block
//! that declares it. Purely syntactic wrappers such as a procedural `ifdef`
//! open no scope, so declarations inside them belong to the enclosing block.

use crate::context::PrepareCx;
use svprep_ir::{BlockId, InsertPoint, NodeId, OpKind};

/// Returns the block where declarations for `node`'s block go.
fn find_logic_insertion_point(cx: &PrepareCx<'_>, node: NodeId) -> BlockId {
    let mut current = node;
    while let Some(parent) = cx.module.parent_node(current) {
        if !cx.module.node(parent).kind.is_syntactic_wrapper() {
            break;
        }
        current = parent;
    }
    cx.module.node(current).parent
}

/// Moves every `logic` in `block` to the front of its declaration scope,
/// keeping their relative order.
pub(crate) fn reorder_declarations(cx: &mut PrepareCx<'_>, block: BlockId) {
    let Some(front) = cx.module.block(block).first() else {
        return;
    };
    let target = find_logic_insertion_point(cx, front);
    let mut placed: Option<NodeId> = None;
    for node in cx.module.block_nodes(block).collect::<Vec<_>>() {
        if cx.module.node(node).kind != OpKind::Logic {
            continue;
        }
        let in_place =
            cx.module.node(node).parent == target && cx.module.prev_node(node) == placed;
        if !in_place {
            let at = match placed {
                Some(prev) => InsertPoint::After(prev),
                None => InsertPoint::Start(target),
            };
            cx.module.move_node(node, at);
            tracing::trace!(module = %cx.module_name, node = ?node, "moved declaration to scope start");
        }
        placed = Some(node);
    }
}
