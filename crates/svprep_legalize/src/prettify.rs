//! Output-quality spilling after legalization.
//!
//! Once legalization has fixed the shape of every expression, large or named
//! expressions in graph regions are given temporaries of their own so the
//! emitted text stays readable. Procedural regions are left alone.

use crate::context::PrepareCx;
use crate::cost::CostModel;
use crate::spill::lower_users_to_temporary_wire;
use svprep_common::PrepResult;
use svprep_config::WireSpillingHeuristic;
use svprep_ir::{BlockId, NodeId, OpKind};

/// Returns `true` for users that already give the value a name of its own.
fn names_its_operand(kind: &OpKind) -> bool {
    matches!(
        kind,
        OpKind::Output | OpKind::Assign | OpKind::BPAssign | OpKind::PAssign
    )
}

/// Decides whether spilling `node` would improve the output.
pub(crate) fn should_spill_wire_based_on_state(
    cx: &PrepareCx<'_>,
    costs: &mut CostModel,
    node: NodeId,
) -> bool {
    let m = &*cx.module;
    let n = m.node(node);
    let Some(&result) = n.results.first() else {
        return false;
    };
    if m.types.is_inout(m.value_type(result))
        || matches!(n.kind, OpKind::ReadInOut | OpKind::Constant { .. })
    {
        return false;
    }

    if let Some(user) = m.single_user(node) {
        let user_kind = &m.node(user).kind;
        if names_its_operand(user_kind) || matches!(user_kind, OpKind::Instance { .. }) {
            return false;
        }
        // A bitcast prints as nothing, so look through one.
        if *user_kind == OpKind::Bitcast {
            if let Some(next) = m.single_user(user) {
                if names_its_operand(&m.node(next).kind) {
                    return false;
                }
            }
        }
    }

    let cost = costs.cost(m, result);
    if cost > cx.options.maximum_number_of_terms_per_expression {
        return true;
    }
    dispatch_heuristic(cx, cost, node)
}

fn dispatch_heuristic(cx: &PrepareCx<'_>, cost: usize, node: NodeId) -> bool {
    if cx
        .options
        .is_wire_spilling_heuristic_enabled(WireSpillingHeuristic::SpillLargeTermsWithNamehints)
    {
        if let Some(hint) = cx.module.node(node).name {
            // Hints without the internal `_` prefix came from the user.
            if !cx.interner.resolve(hint).starts_with('_')
                || cost >= cx.options.wire_spilling_namehint_term_limit
            {
                return true;
            }
        }
    }
    false
}

/// Spills expressions of `block` worth a temporary, then recurses into the
/// regions of the block's nodes.
pub(crate) fn prettify_block(
    cx: &mut PrepareCx<'_>,
    costs: &mut CostModel,
    block: BlockId,
) -> PrepResult<()> {
    if cx.module.block(block).is_procedural() {
        return Ok(());
    }
    for node in cx.module.block_nodes(block).collect::<Vec<_>>() {
        if cx.module.node(node).erased || !cx.is_expression(node) {
            continue;
        }
        if should_spill_wire_based_on_state(cx, costs, node) {
            lower_users_to_temporary_wire(cx, node, false)?;
        }
    }
    for node in cx.module.block_nodes(block).collect::<Vec<_>>() {
        for region in cx.module.node(node).regions.clone() {
            prettify_block(cx, costs, region)?;
        }
    }
    Ok(())
}
