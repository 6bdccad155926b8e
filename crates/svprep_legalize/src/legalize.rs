//! The legalization scan.
//!
//! Each block is visited innermost first, so everything hoisted out of a
//! nested region lands ahead of the outer scan position and is visited
//! again at its new home. Within a block, rewrites either continue with the
//! node that followed the current one or rewind to the first node they
//! created.

use crate::context::PrepareCx;
use crate::decl_order::reorder_declarations;
use crate::error::LegalizeError;
use crate::forward_refs::resolve_forward_references;
use crate::hoist::{hoist_non_side_effect_expr, rewrite_side_effecting_expr};
use crate::instance::{lower_instance_results, spill_instance_inputs};
use crate::rewrite::{
    balance_variadic, is_balanceable, lower_struct_explode, negative_constant_rhs,
    rewrite_add_with_negative_constant,
};
use crate::spill::{lower_always_inline, lower_users_to_temporary_wire, reuse_existing_inout};
use std::collections::HashSet;
use svprep_common::PrepResult;
use svprep_ir::{BlockId, InsertPoint, NodeId, OpKind, ValueId};

/// Where the scan continues after a node was handled.
enum Flow {
    Next,
    Rewind(NodeId),
}

/// Legalizes `block` and every region nested in it.
pub(crate) fn legalize_block(cx: &mut PrepareCx<'_>, block: BlockId) -> Result<(), LegalizeError> {
    for node in cx.module.block_nodes(block).collect::<Vec<_>>() {
        for region in cx.module.node(node).regions.clone() {
            legalize_block(cx, region)?;
        }
    }

    let mut visited = HashSet::new();
    let mut cursor = cx.module.block(block).first();
    while let Some(node) = cursor {
        let prev = cx.module.prev_node(node);
        let next = cx.module.next_node(node);
        cursor = match legalize_node(cx, block, node, &mut visited)? {
            Flow::Rewind(to) => Some(to),
            Flow::Next => match next {
                Some(n) if is_in_block(cx, n, block) => Some(n),
                // The follower itself was erased or moved away.
                _ if is_in_block(cx, node, block) => cx.module.next_node(node),
                _ => match prev {
                    Some(p) if is_in_block(cx, p, block) => cx.module.next_node(p),
                    _ => cx.module.block(block).first(),
                },
            },
        };
    }

    if cx.module.block(block).is_procedural() {
        reorder_declarations(cx, block);
    } else {
        resolve_forward_references(cx, block)?;
    }
    Ok(())
}

fn is_in_block(cx: &PrepareCx<'_>, node: NodeId, block: BlockId) -> bool {
    let n = cx.module.node(node);
    !n.erased && n.parent == block
}

fn legalize_node(
    cx: &mut PrepareCx<'_>,
    block: BlockId,
    node: NodeId,
    visited: &mut HashSet<NodeId>,
) -> Result<Flow, LegalizeError> {
    let procedural = cx.module.block(block).is_procedural();
    let options = cx.options;

    let kind = cx.module.node(node).kind.clone();
    match &kind {
        OpKind::Foreign { dialect, name } => {
            return Err(LegalizeError::UnsupportedConstruct {
                module: cx.module_name.clone(),
                dialect: dialect.clone(),
                op: name.clone(),
                loc: cx.module.node(node).loc,
            });
        }
        OpKind::Instance { .. } => {
            lower_instance_results(cx, node);
            if options.disallow_expression_inlining_in_ports {
                spill_instance_inputs(cx, node);
            }
        }
        OpKind::Logic if procedural && options.disallow_local_variables => {
            let anchor = cx.find_parent_in_non_procedural_region(node)?;
            cx.module.move_node(node, InsertPoint::Before(anchor));
            cx.stats.hoisted += 1;
            return Ok(Flow::Next);
        }
        OpKind::Always { .. } | OpKind::AlwaysFF { .. } if !options.allow_expr_in_event_control => {
            for event in cx.module.node(node).operands.clone() {
                enforce_wire(cx, node, event)?;
            }
            return Ok(Flow::Next);
        }
        _ => {}
    }

    let is_expression = cx.is_expression(node);

    if options.disallow_local_variables && is_expression && procedural {
        let moved = if cx.is_memory_effect_free(node) {
            hoist_non_side_effect_expr(cx, node)?
        } else {
            rewrite_side_effecting_expr(cx, node)?
        };
        if moved {
            return Ok(Flow::Next);
        }
    }

    if cx.is_always_inline(node) {
        if cx.module.is_unused(node) {
            cx.module.erase_node(node);
        } else if visited.insert(node) {
            lower_always_inline(cx, node);
        }
        return Ok(Flow::Next);
    }

    if is_expression
        && !cx.oracle.is_inlineable_at_use(cx.module, node, options)
        && (procedural || !reuse_existing_inout(cx, node)?)
    {
        if options.disallow_local_variables {
            if !procedural || hoist_non_side_effect_expr(cx, node)? {
                if !cx.module.in_procedural_region(node) {
                    lower_users_to_temporary_wire(cx, node, false)?;
                }
                if procedural {
                    return Ok(Flow::Next);
                }
            }
        } else {
            lower_users_to_temporary_wire(cx, node, false)?;
        }
    }

    if is_balanceable(cx, node) {
        return Ok(Flow::Rewind(balance_variadic(cx, node)?));
    }

    if let Some(cst) = negative_constant_rhs(cx, node) {
        return Ok(Flow::Rewind(rewrite_add_with_negative_constant(cx, node, cst)));
    }

    if cx.module.node(node).kind == OpKind::StructExplode {
        return Ok(match lower_struct_explode(cx, node) {
            Some(first) => Flow::Rewind(first),
            None => Flow::Next,
        });
    }

    // Spilling may never be needed for this node, but if the emitter ends up
    // printing it out of line an assigned declaration can stand in for it.
    if !procedural && is_expression {
        reuse_existing_inout(cx, node)?;
    }
    Ok(Flow::Next)
}

/// Routes an event-control operand of `process` through a wire so the
/// sensitivity list names a signal instead of an expression.
fn enforce_wire(cx: &mut PrepareCx<'_>, process: NodeId, value: ValueId) -> PrepResult<()> {
    if cx.module.is_simple_read_or_port(value)
        || matches!(cx.module.defining_kind(value), Some(OpKind::Instance { .. }))
    {
        return Ok(());
    }
    let body = cx.module.body;
    let loc = cx.module.node(process).loc;
    let ty = cx.module.value_type(value);
    let storage = cx.storage_type_of(value);
    let wire = cx
        .module
        .create_node_at(InsertPoint::Start(body), OpKind::Wire, vec![], vec![storage], loc);
    let wire_value = cx.module.result(wire, 0);
    let read = cx.module.create_node_at(
        InsertPoint::Before(process),
        OpKind::ReadInOut,
        vec![wire_value],
        vec![ty],
        loc,
    );
    let read_value = cx.module.result(read, 0);
    cx.module.replace_all_uses_with(value, read_value);
    cx.module.create_node_at(
        InsertPoint::Before(process),
        OpKind::Assign,
        vec![wire_value, value],
        vec![],
        loc,
    );
    lower_always_inline(cx, read);
    cx.stats.temporaries += 1;
    tracing::debug!(module = %cx.module_name, node = ?process, "moved event expression into wire");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::SvOracle;
    use pretty_assertions::assert_eq;
    use svprep_common::{Interner, Loc};
    use svprep_config::LoweringOptions;
    use svprep_ir::{print_module, EventEdge, Module};

    fn run(m: &mut Module, interner: &Interner, options: &LoweringOptions) -> Result<(), LegalizeError> {
        let mut cx = PrepareCx::new(m, interner, options, &SvOracle);
        let body = cx.module.body;
        legalize_block(&mut cx, body)
    }

    #[test]
    fn foreign_node_is_rejected() {
        let interner = Interner::new();
        let mut m = Module::new(interner.get_or_intern("top"), Loc::UNKNOWN);
        let body = m.body;
        m.create_node(
            InsertPoint::End(body),
            OpKind::Foreign {
                dialect: "seq".into(),
                name: "compreg".into(),
            },
            vec![],
            vec![],
        );
        let err = run(&mut m, &interner, &LoweringOptions::default()).unwrap_err();
        assert!(matches!(err, LegalizeError::UnsupportedConstruct { ref op, .. } if op == "compreg"));
    }

    fn clocked(interner: &Interner) -> (Module, NodeId, ValueId) {
        let mut m = Module::new(interner.get_or_intern("top"), Loc::UNKNOWN);
        let i1 = m.types.int(1);
        let a = m.add_input(interner.get_or_intern("a"), i1);
        let b = m.add_input(interner.get_or_intern("b"), i1);
        let body = m.body;
        let and = m.create_node(InsertPoint::End(body), OpKind::And, vec![a, b], vec![i1]);
        (m, and, a)
    }

    #[test]
    fn event_expression_is_spilled_before_its_process() {
        let interner = Interner::new();
        let (mut m, and, _) = clocked(&interner);
        let body = m.body;
        let clk = m.result(and, 0);
        m.create_node(
            InsertPoint::End(body),
            OpKind::Always {
                edges: vec![EventEdge::Posedge],
            },
            vec![clk],
            vec![],
        );
        run(&mut m, &interner, &LoweringOptions::default()).unwrap();
        assert_eq!(
            print_module(&m, &interner),
            "module @top(in %a: i1, in %b: i1) {\n\
             \x20 %0 = and %a, %b : i1\n\
             \x20 %1 = wire {name = \"_and_a_b\"} : !inout<i1>\n\
             \x20 assign %1, %0\n\
             \x20 %2 = read_inout %1 : i1\n\
             \x20 always posedge %2 {\n\
             \x20 }\n\
             }\n"
        );
    }

    #[test]
    fn enforce_wire_routes_later_expression() {
        let interner = Interner::new();
        let (mut m, and, a) = clocked(&interner);
        let clk = m.result(and, 0);
        let always = m.create_node(
            InsertPoint::Before(and),
            OpKind::Always {
                edges: vec![EventEdge::Posedge, EventEdge::Negedge],
            },
            vec![clk, a],
            vec![],
        );
        let options = LoweringOptions::default();
        let mut cx = PrepareCx::new(&mut m, &interner, &options, &SvOracle);
        enforce_wire(&mut cx, always, clk).unwrap();
        enforce_wire(&mut cx, always, a).unwrap();
        assert_eq!(cx.stats.temporaries, 1);
        assert_eq!(
            print_module(&m, &interner),
            "module @top(in %a: i1, in %b: i1) {\n\
             \x20 %0 = wire : !inout<i1>\n\
             \x20 assign %0, %2\n\
             \x20 %1 = read_inout %0 : i1\n\
             \x20 always posedge, negedge %1, %a {\n\
             \x20 }\n\
             \x20 %2 = and %a, %b : i1\n\
             }\n"
        );
    }

    #[test]
    fn procedural_logic_is_hoisted_without_local_variables() {
        let interner = Interner::new();
        let mut m = Module::new(interner.get_or_intern("top"), Loc::UNKNOWN);
        let i8 = m.types.int(8);
        let io8 = m.types.inout(i8);
        let body = m.body;
        let init = m.create_node(InsertPoint::End(body), OpKind::Initial, vec![], vec![]);
        let region = m.node(init).regions[0];
        let logic = m.create_node(InsertPoint::End(region), OpKind::Logic, vec![], vec![io8]);
        let options = LoweringOptions {
            disallow_local_variables: true,
            ..Default::default()
        };
        run(&mut m, &interner, &options).unwrap();
        assert_eq!(m.node(logic).parent, body);
        assert_eq!(m.block_nodes(body).collect::<Vec<_>>(), vec![logic, init]);
    }

    #[test]
    fn unused_read_is_erased() {
        let interner = Interner::new();
        let mut m = Module::new(interner.get_or_intern("top"), Loc::UNKNOWN);
        let i8 = m.types.int(8);
        let io8 = m.types.inout(i8);
        let body = m.body;
        let wire = m.create_node(InsertPoint::End(body), OpKind::Wire, vec![], vec![io8]);
        let w = m.result(wire, 0);
        let read = m.create_node(InsertPoint::End(body), OpKind::ReadInOut, vec![w], vec![i8]);
        run(&mut m, &interner, &LoweringOptions::default()).unwrap();
        assert!(m.node(read).erased);
        assert_eq!(m.block_nodes(body).collect::<Vec<_>>(), vec![wire]);
    }
}
