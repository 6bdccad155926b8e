//! Anchoring instance ports to wires.

use crate::context::PrepareCx;
use crate::spill::lower_always_inline;
use svprep_ir::{InsertPoint, NodeId, OpKind};

/// Returns `_<instance>_<port>`, falling back to the port index for unnamed
/// ports.
fn port_wire_name(instance: &str, port: Option<&str>, index: usize) -> String {
    match port {
        Some(name) => format!("_{instance}_{name}"),
        None => format!("_{instance}_{index}"),
    }
}

fn instance_names(cx: &PrepareCx<'_>, inst: NodeId, outputs: bool) -> (String, Vec<Option<String>>) {
    match &cx.module.node(inst).kind {
        OpKind::Instance {
            instance_name,
            input_names,
            output_names,
            ..
        } => {
            let ports = if outputs { output_names } else { input_names };
            (
                cx.interner.resolve(*instance_name).to_string(),
                ports
                    .iter()
                    .map(|p| p.map(|n| cx.interner.resolve(n).to_string()))
                    .collect(),
            )
        }
        _ => (String::new(), Vec::new()),
    }
}

/// Makes every instance output flow into a dedicated wire declared at the top
/// of the module, unless its only use is the module output or a continuous
/// assignment in the instance's own block; such an assignment is moved right
/// after the instance. Assignments nested in an `ifdef` stay where they are.
pub(crate) fn lower_instance_results(cx: &mut PrepareCx<'_>, inst: NodeId) {
    let (instance, ports) = instance_names(cx, inst, true);
    let body = cx.module.body;
    let loc = cx.module.node(inst).loc;
    let results = cx.module.node(inst).results.clone();
    for (index, result) in results.into_iter().enumerate() {
        let uses = cx.module.value(result).uses.clone();
        if let [only] = uses.as_slice() {
            match cx.module.node(only.node).kind {
                OpKind::Output => continue,
                OpKind::Assign
                    if cx.module.node(only.node).parent == cx.module.node(inst).parent =>
                {
                    cx.module.move_node(only.node, InsertPoint::After(inst));
                    continue;
                }
                _ => {}
            }
        }

        let name = port_wire_name(&instance, ports.get(index).and_then(|p| p.as_deref()), index);
        let ty = cx.module.value_type(result);
        let storage = cx.storage_type_of(result);
        let decl = cx
            .module
            .create_node_at(InsertPoint::Start(body), OpKind::Wire, vec![], vec![storage], loc);
        cx.module.node_mut(decl).name = Some(cx.intern(&name));
        let wire = cx.module.result(decl, 0);
        for u in uses {
            let read = cx.module.create_node_at(
                InsertPoint::Before(u.node),
                OpKind::ReadInOut,
                vec![wire],
                vec![ty],
                loc,
            );
            let read_value = cx.module.result(read, 0);
            cx.module.set_operand(u.node, u.operand as usize, read_value);
            lower_always_inline(cx, read);
        }
        cx.module.create_node_at(
            InsertPoint::After(inst),
            OpKind::Assign,
            vec![wire, result],
            vec![],
            loc,
        );
        cx.stats.temporaries += 1;
        tracing::debug!(module = %cx.module_name, wire = %name, "anchored instance output");
    }
}

/// Drives every instance input that is not already a port or a plain read
/// from a wire of its own.
pub(crate) fn spill_instance_inputs(cx: &mut PrepareCx<'_>, inst: NodeId) {
    let (instance, ports) = instance_names(cx, inst, false);
    let body = cx.module.body;
    let loc = cx.module.node(inst).loc;
    let operands = cx.module.node(inst).operands.clone();
    for (index, src) in operands.into_iter().enumerate() {
        if cx.module.is_simple_read_or_port(src) {
            continue;
        }
        let name = port_wire_name(&instance, ports.get(index).and_then(|p| p.as_deref()), index);
        let ty = cx.module.value_type(src);
        let storage = cx.storage_type_of(src);
        let decl = cx
            .module
            .create_node_at(InsertPoint::Start(body), OpKind::Wire, vec![], vec![storage], loc);
        cx.module.node_mut(decl).name = Some(cx.intern(&name));
        let wire = cx.module.result(decl, 0);
        let read = cx.module.create_node_at(
            InsertPoint::Before(inst),
            OpKind::ReadInOut,
            vec![wire],
            vec![ty],
            loc,
        );
        cx.module.create_node_at(
            InsertPoint::Before(inst),
            OpKind::Assign,
            vec![wire, src],
            vec![],
            loc,
        );
        let read_value = cx.module.result(read, 0);
        cx.module.set_operand(inst, index, read_value);
        cx.stats.temporaries += 1;
        tracing::debug!(module = %cx.module_name, wire = %name, "anchored instance input");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::SvOracle;
    use pretty_assertions::assert_eq;
    use svprep_common::{Interner, Loc};
    use svprep_config::LoweringOptions;
    use svprep_ir::{print_module, Module};

    fn instance_kind(interner: &Interner, inputs: &[&str], outputs: &[Option<&str>]) -> OpKind {
        OpKind::Instance {
            module: interner.get_or_intern("child"),
            instance_name: interner.get_or_intern("u0"),
            input_names: inputs
                .iter()
                .map(|n| Some(interner.get_or_intern(n)))
                .collect(),
            output_names: outputs
                .iter()
                .map(|n| n.map(|s| interner.get_or_intern(s)))
                .collect(),
        }
    }

    #[test]
    fn outputs_get_named_wires() {
        let interner = Interner::new();
        let mut m = Module::new(interner.get_or_intern("top"), Loc::UNKNOWN);
        let i8 = m.types.int(8);
        let a = m.add_input(interner.get_or_intern("a"), i8);
        m.add_output(interner.get_or_intern("y"), i8);
        let body = m.body;
        let inst = m.create_node(
            InsertPoint::End(body),
            instance_kind(&interner, &["x"], &[Some("q"), None]),
            vec![a],
            vec![i8, i8],
        );
        let q = m.result(inst, 0);
        let r = m.result(inst, 1);
        let add = m.create_node(InsertPoint::End(body), OpKind::Add, vec![q, r], vec![i8]);
        let sum = m.result(add, 0);
        m.create_node(InsertPoint::End(body), OpKind::Output, vec![sum], vec![]);

        let options = LoweringOptions::default();
        let mut cx = PrepareCx::new(&mut m, &interner, &options, &SvOracle);
        lower_instance_results(&mut cx, inst);
        assert_eq!(cx.stats.temporaries, 2);
        let expected = "\
module @top(in %a: i8, out y: i8) {
  %0 = wire {name = \"_u0_1\"} : !inout<i8>
  %1 = wire {name = \"_u0_q\"} : !inout<i8>
  %2, %3 = instance \"u0\" @child %a : i8, i8
  assign %0, %3
  assign %1, %2
  %4 = read_inout %1 : i8
  %5 = read_inout %0 : i8
  %6 = add %4, %5 : i8
  output %6
}
";
        assert_eq!(print_module(&m, &interner), expected);
    }

    #[test]
    fn single_assign_use_moves_after_instance() {
        let interner = Interner::new();
        let mut m = Module::new(interner.get_or_intern("top"), Loc::UNKNOWN);
        let i8 = m.types.int(8);
        let io8 = m.types.inout(i8);
        let a = m.add_input(interner.get_or_intern("a"), i8);
        let body = m.body;
        let wire = m.create_node(InsertPoint::End(body), OpKind::Wire, vec![], vec![io8]);
        let w = m.result(wire, 0);
        let inst = m.create_node(
            InsertPoint::End(body),
            instance_kind(&interner, &["x"], &[Some("q")]),
            vec![a],
            vec![i8],
        );
        let q = m.result(inst, 0);
        let assign = m.create_node(InsertPoint::Before(inst), OpKind::Assign, vec![w, q], vec![]);
        let options = LoweringOptions::default();
        let mut cx = PrepareCx::new(&mut m, &interner, &options, &SvOracle);
        lower_instance_results(&mut cx, inst);
        assert_eq!(cx.stats.temporaries, 0);
        assert_eq!(m.block_nodes(body).collect::<Vec<_>>(), vec![wire, inst, assign]);
    }

    #[test]
    fn conditional_assign_use_stays_in_its_region() {
        let interner = Interner::new();
        let mut m = Module::new(interner.get_or_intern("top"), Loc::UNKNOWN);
        let i8 = m.types.int(8);
        let io8 = m.types.inout(i8);
        let a = m.add_input(interner.get_or_intern("a"), i8);
        let body = m.body;
        let wire = m.create_node(InsertPoint::End(body), OpKind::Wire, vec![], vec![io8]);
        let w = m.result(wire, 0);
        let inst = m.create_node(
            InsertPoint::End(body),
            instance_kind(&interner, &["x"], &[Some("q")]),
            vec![a],
            vec![i8],
        );
        let q = m.result(inst, 0);
        let ifdef = m.create_node(
            InsertPoint::End(body),
            OpKind::IfDef {
                macro_name: interner.get_or_intern("SIM"),
            },
            vec![],
            vec![],
        );
        let then = m.node(ifdef).regions[0];
        let assign = m.create_node(InsertPoint::End(then), OpKind::Assign, vec![w, q], vec![]);
        let options = LoweringOptions::default();
        let mut cx = PrepareCx::new(&mut m, &interner, &options, &SvOracle);
        lower_instance_results(&mut cx, inst);
        assert_eq!(cx.stats.temporaries, 1);
        assert_eq!(m.node(assign).parent, then);
        let anchored = m.node(assign).operands[1];
        assert_eq!(
            m.defining_kind(anchored),
            Some(&OpKind::ReadInOut),
            "the conditional assignment reads the anchoring wire"
        );
        assert_eq!(m.block(then).len(), 2);
    }

    #[test]
    fn constant_input_goes_through_wire() {
        let interner = Interner::new();
        let mut m = Module::new(interner.get_or_intern("top"), Loc::UNKNOWN);
        let i8 = m.types.int(8);
        let a = m.add_input(interner.get_or_intern("a"), i8);
        let body = m.body;
        let c = m.create_node(
            InsertPoint::End(body),
            OpKind::Constant { value: 7 },
            vec![],
            vec![i8],
        );
        let cv = m.result(c, 0);
        let inst = m.create_node(
            InsertPoint::End(body),
            instance_kind(&interner, &["x", "y"], &[]),
            vec![a, cv],
            vec![],
        );
        let options = LoweringOptions::default();
        let mut cx = PrepareCx::new(&mut m, &interner, &options, &SvOracle);
        spill_instance_inputs(&mut cx, inst);
        let expected = "\
module @top(in %a: i8) {
  %0 = wire {name = \"_u0_y\"} : !inout<i8>
  %1 = constant 7 : i8
  %2 = read_inout %0 : i8
  assign %0, %1
  instance \"u0\" @child %a, %2
}
";
        assert_eq!(print_module(&m, &interner), expected);
    }
}
