//! Materializing expressions into named temporaries.
//!
//! Spilling gives an expression's result a declaration of its own: uses read
//! the declaration and a connection right after the expression stores into
//! it. The same machinery duplicates always-inline expressions next to each
//! user and redirects uses to declarations the design already assigns.

use crate::context::PrepareCx;
use svprep_common::{Ident, PrepResult};
use svprep_ir::{InsertPoint, NodeId, OpKind, ValueDef, ValueId};

/// Returns the name of a value as it will appear in the output, if it has an
/// obvious one: port names, declaration names behind reads, and name hints.
fn direct_name(cx: &PrepareCx<'_>, value: ValueId) -> Option<String> {
    let m = &*cx.module;
    match m.value(value).def {
        ValueDef::Port { index } => m.input_name(index).map(|n| cx.interner.resolve(n).to_string()),
        ValueDef::Result { node, .. } => {
            let n = m.node(node);
            if let Some(hint) = n.name {
                return Some(cx.interner.resolve(hint).to_string());
            }
            if n.kind == OpKind::ReadInOut {
                let decl = m.defining_node(n.operands[0])?;
                return m
                    .node(decl)
                    .name
                    .map(|name| cx.interner.resolve(name).to_string());
            }
            None
        }
    }
}

/// Picks a name for the temporary holding `value`: the defining node's name
/// hint if present, otherwise one derived from the expression's operands.
/// Derived names always start with `_`.
pub(crate) fn infer_structural_name(cx: &PrepareCx<'_>, value: ValueId) -> Option<Ident> {
    let m = &*cx.module;
    let node = m.defining_node(value)?;
    let n = m.node(node);
    if let Some(hint) = n.name {
        return Some(hint);
    }
    let base = match &n.kind {
        OpKind::ReadInOut => direct_name(cx, value)?,
        OpKind::Extract { low } => format!("{}_{low}", direct_name(cx, n.operands[0])?),
        kind => {
            let names: Vec<String> = n
                .operands
                .iter()
                .filter_map(|&o| direct_name(cx, o))
                .collect();
            if names.is_empty() {
                return None;
            }
            format!("{}_{}", kind.mnemonic(), names.join("_"))
        }
    };
    let name = if base.starts_with('_') {
        base
    } else {
        format!("_{base}")
    };
    Some(cx.intern(&name))
}

/// Stores every result of `node` into a fresh declaration and redirects all
/// uses to reads of it.
///
/// Procedural blocks get `logic` and a blocking assignment; graph blocks get
/// a `wire` and a continuous assignment. The declaration is placed right
/// after `node` so the emitter can fold the assignment into it, unless
/// `at_block_begin` asks for it at the front of the block to break a cycle.
pub(crate) fn lower_users_to_temporary_wire(
    cx: &mut PrepareCx<'_>,
    node: NodeId,
    at_block_begin: bool,
) -> PrepResult<()> {
    let results = cx.module.node(node).results.clone();
    if let [result] = results.as_slice() {
        let name = infer_structural_name(cx, *result);
        cx.module.node_mut(node).name = None;
        create_wire_for_result(cx, node, *result, name, at_block_begin);
        return Ok(());
    }
    for result in results {
        create_wire_for_result(cx, node, result, None, at_block_begin);
    }
    Ok(())
}

fn create_wire_for_result(
    cx: &mut PrepareCx<'_>,
    node: NodeId,
    result: ValueId,
    name: Option<Ident>,
    at_block_begin: bool,
) {
    let block = cx.module.node(node).parent;
    let procedural = cx.module.block(block).is_procedural();
    let loc = cx.module.node(node).loc;
    let ty = cx.module.value_type(result);
    let storage = cx.storage_type_of(result);

    let decl_kind = if procedural { OpKind::Logic } else { OpKind::Wire };
    let decl = cx
        .module
        .create_node_at(InsertPoint::Start(block), decl_kind, vec![], vec![storage], loc);
    cx.module.node_mut(decl).name = name;
    let wire = cx.module.result(decl, 0);

    for u in cx.module.value(result).uses.clone() {
        let read = cx.module.create_node_at(
            InsertPoint::Before(u.node),
            OpKind::ReadInOut,
            vec![wire],
            vec![ty],
            loc,
        );
        let read_value = cx.module.result(read, 0);
        cx.module.set_operand(u.node, u.operand as usize, read_value);
    }

    let connect_kind = if procedural {
        OpKind::BPAssign
    } else {
        OpKind::Assign
    };
    cx.module.create_node_at(
        InsertPoint::After(node),
        connect_kind,
        vec![wire, result],
        vec![],
        loc,
    );
    if !at_block_begin {
        cx.module.move_node(decl, InsertPoint::After(node));
    }
    cx.stats.temporaries += 1;
    tracing::debug!(
        module = %cx.module_name,
        node = ?node,
        name = name.map(|n| cx.interner.resolve(n)).unwrap_or(""),
        "spilled expression to temporary"
    );
}

/// If exactly one use of `node` is a top-level continuous assignment, points
/// every other use at a read of the assigned declaration instead, so the
/// assignment doubles as the spill.
///
/// Only valid for an expression in a graph region. Returns `true` if any use
/// was redirected.
pub(crate) fn reuse_existing_inout(cx: &mut PrepareCx<'_>, node: NodeId) -> PrepResult<bool> {
    let m = &*cx.module;
    let [result] = m.node(node).results.as_slice() else {
        return Ok(false);
    };
    let mut assign = None;
    let mut others = Vec::new();
    for u in &m.value(*result).uses {
        if m.node(u.node).kind == OpKind::Assign {
            // A second assignment, a conditional one, or one storing through
            // this value leaves no single declaration to reuse.
            if assign.is_some() || m.parent_node(u.node).is_some() || u.operand != 1 {
                return Ok(false);
            }
            assign = Some(u.node);
            continue;
        }
        others.push(*u);
    }
    let Some(assign) = assign else {
        return Ok(false);
    };
    if others.is_empty() {
        return Ok(false);
    }
    let src = m.node(assign).operands[1];
    if matches!(m.defining_kind(src), Some(OpKind::Constant { .. })) {
        return Ok(false);
    }
    let dest = m.node(assign).operands[0];
    let ty = cx.element_type_of(dest)?;
    let loc = m.node(assign).loc;

    for u in others {
        let read = cx.module.create_node_at(
            InsertPoint::Before(u.node),
            OpKind::ReadInOut,
            vec![dest],
            vec![ty],
            loc,
        );
        let read_value = cx.module.result(read, 0);
        cx.module.set_operand(u.node, u.operand as usize, read_value);
        lower_always_inline(cx, read);
    }
    if let Some(dest_def) = cx.module.defining_node(dest) {
        if cx.is_always_inline(dest_def) {
            lower_always_inline(cx, dest_def);
        }
    }
    cx.stats.reused += 1;
    tracing::debug!(module = %cx.module_name, node = ?node, "reused assigned declaration");
    Ok(true)
}

/// Gives an always-inline node one copy per use, each placed immediately
/// before its user, and does the same for any always-inline operands the
/// copies carry along.
pub(crate) fn lower_always_inline(cx: &mut PrepareCx<'_>, node: NodeId) {
    let mut worklist = vec![node];
    while let Some(op) = worklist.pop() {
        if cx.module.node(op).erased || cx.module.node(op).results.len() != 1 {
            continue;
        }
        let result = cx.module.result(op, 0);
        while cx.module.value(result).uses.len() > 1 {
            let u = cx.module.value(result).uses[0];
            let clone = cx.module.clone_node(op, InsertPoint::Before(u.node));
            let clone_value = cx.module.result(clone, 0);
            cx.module.set_operand(u.node, u.operand as usize, clone_value);
            cx.stats.duplicated += 1;
            push_always_inline_operands(cx, clone, &mut worklist);
        }
        let Some(first) = cx.module.value(result).uses.first().copied() else {
            continue;
        };
        cx.module.move_node(op, InsertPoint::Before(first.node));
        push_always_inline_operands(cx, op, &mut worklist);
    }
}

/// Places the always-inline operands of a freshly built node right before
/// it. Rewrites insert new users ahead of the node they replace, which would
/// otherwise leave reads stranded in front of them.
pub(crate) fn lower_always_inline_operands(cx: &mut PrepareCx<'_>, node: NodeId) {
    for operand in cx.module.node(node).operands.clone() {
        if let Some(def) = cx.module.defining_node(operand) {
            if cx.is_always_inline(def) {
                lower_always_inline(cx, def);
            }
        }
    }
}

fn push_always_inline_operands(cx: &PrepareCx<'_>, node: NodeId, worklist: &mut Vec<NodeId>) {
    // Reversed so the first operand is handled first and lands first.
    for &operand in cx.module.node(node).operands.iter().rev() {
        if let Some(def) = cx.module.defining_node(operand) {
            if cx.is_always_inline(def) {
                worklist.push(def);
            }
        }
    }
}
