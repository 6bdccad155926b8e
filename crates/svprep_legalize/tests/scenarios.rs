//! End-to-end rewrites on small modules, checked against the IR dump.

mod common;

use common::Builder;
use pretty_assertions::assert_eq;
use svprep_config::LoweringOptions;
use svprep_ir::{Module, OpKind, Type, ValueId};

/// Depth of the tree of `kind` nodes producing `value`; leaves count zero.
fn tree_depth(m: &Module, value: ValueId, kind: &OpKind) -> usize {
    match m.defining_node(value) {
        Some(node) if m.node(node).kind == *kind => {
            1 + m
                .node(node)
                .operands
                .iter()
                .map(|&o| tree_depth(m, o, kind))
                .max()
                .unwrap_or(0)
        }
        _ => 0,
    }
}

#[test]
fn five_operand_add_becomes_balanced_tree() {
    let mut b = Builder::new("top");
    let xs: Vec<ValueId> = (0..5).map(|i| b.input(&format!("x{i}"), 8)).collect();
    b.output("y", 8);
    let body = b.body();
    let sum = b.expr(body, OpKind::Add, xs, 8);
    let out = b.stmt(body, OpKind::Output, vec![sum]);

    let stats = b.legalize(&LoweringOptions::default()).unwrap();
    assert_eq!(stats.balanced, 1);

    let adds: Vec<_> = b
        .module
        .live_nodes()
        .into_iter()
        .filter(|&n| b.module.node(n).kind == OpKind::Add)
        .collect();
    assert_eq!(adds.len(), 4);
    for &add in &adds {
        assert_eq!(b.module.node(add).operands.len(), 2);
    }
    let root = b.module.node(out).operands[0];
    assert_eq!(tree_depth(&b.module, root, &OpKind::Add), 3);
}

#[test]
fn constant_instance_input_goes_through_wire() {
    let mut b = Builder::new("top");
    b.output("y", 8);
    let body = b.body();
    let c = b.constant(body, 5, 8);
    let i8 = b.int(8);
    let kind = OpKind::Instance {
        module: b.ident("child"),
        instance_name: b.ident("u0"),
        input_names: vec![Some(b.ident("in"))],
        output_names: vec![Some(b.ident("out"))],
    };
    let inst = b
        .module
        .create_node(svprep_ir::InsertPoint::End(body), kind, vec![c], vec![i8]);
    let y = b.module.result(inst, 0);
    b.stmt(body, OpKind::Output, vec![y]);

    let options = LoweringOptions {
        disallow_expression_inlining_in_ports: true,
        ..Default::default()
    };
    let stats = b.legalize(&options).unwrap();
    assert_eq!(stats.temporaries, 1);
    assert_eq!(
        b.print(),
        "\
module @top(out y: i8) {
  %0 = wire {name = \"_u0_in\"} : !inout<i8>
  %1 = constant 5 : i8
  %2 = read_inout %0 : i8
  assign %0, %1
  %3 = instance \"u0\" @child %2 : i8
  output %3
}
"
    );
}

#[test]
fn constant_instance_input_stays_inline_by_default() {
    let mut b = Builder::new("top");
    let body = b.body();
    let c = b.constant(body, 5, 8);
    let kind = OpKind::Instance {
        module: b.ident("child"),
        instance_name: b.ident("u0"),
        input_names: vec![Some(b.ident("in"))],
        output_names: vec![],
    };
    let inst = b
        .module
        .create_node(svprep_ir::InsertPoint::End(body), kind, vec![c], vec![]);
    b.legalize(&LoweringOptions::default()).unwrap();
    assert_eq!(b.module.node(inst).operands, vec![c]);
}

#[test]
fn add_of_negative_constant_becomes_sub() {
    let mut b = Builder::new("top");
    let a = b.input("a", 8);
    b.output("y", 8);
    let body = b.body();
    let c = b.constant(body, -3, 8);
    let sum = b.expr(body, OpKind::Add, vec![a, c], 8);
    b.stmt(body, OpKind::Output, vec![sum]);

    b.legalize(&LoweringOptions::default()).unwrap();
    assert_eq!(
        b.print(),
        "\
module @top(in %a: i8, out y: i8) {
  %0 = constant 3 : i8
  %1 = sub %a, %0 : i8
  output %1
}
"
    );
}

#[test]
fn shared_expression_reuses_assigned_wire() {
    let mut b = Builder::new("top");
    let a = b.input("a", 8);
    let bb = b.input("b", 8);
    b.output("y", 8);
    b.output("z", 8);
    let body = b.body();
    let w = b.decl(body, OpKind::Wire, "w", 8);
    let product = b.expr(body, OpKind::Mul, vec![a, bb], 8);
    b.stmt(body, OpKind::Assign, vec![w, product]);
    let y = b.expr(body, OpKind::Xor, vec![product, a], 8);
    let z = b.expr(body, OpKind::Or, vec![product, bb], 8);
    b.stmt(body, OpKind::Output, vec![y, z]);

    let stats = b.legalize(&LoweringOptions::default()).unwrap();
    assert_eq!(stats.reused, 1);
    assert_eq!(stats.temporaries, 0);
    let declarations = b
        .module
        .live_nodes()
        .into_iter()
        .filter(|&n| b.module.node(n).kind.is_declaration())
        .count();
    assert_eq!(declarations, 1);
    assert_eq!(
        b.print(),
        "\
module @top(in %a: i8, in %b: i8, out y: i8, out z: i8) {
  %0 = wire {name = \"w\"} : !inout<i8>
  %1 = mul %a, %b : i8
  assign %0, %1
  %2 = read_inout %0 : i8
  %3 = xor %2, %a : i8
  %4 = read_inout %0 : i8
  %5 = or %4, %b : i8
  output %3, %5
}
"
    );
}

#[test]
fn shared_expression_without_assignment_is_spilled() {
    let mut b = Builder::new("top");
    let a = b.input("a", 8);
    let bb = b.input("b", 8);
    b.output("y", 8);
    b.output("z", 8);
    let body = b.body();
    let product = b.expr(body, OpKind::Mul, vec![a, bb], 8);
    let y = b.expr(body, OpKind::Xor, vec![product, a], 8);
    let z = b.expr(body, OpKind::Or, vec![product, bb], 8);
    b.stmt(body, OpKind::Output, vec![y, z]);

    let stats = b.legalize(&LoweringOptions::default()).unwrap();
    assert_eq!(stats.temporaries, 1);
    assert_eq!(
        b.print(),
        "\
module @top(in %a: i8, in %b: i8, out y: i8, out z: i8) {
  %0 = mul %a, %b : i8
  %1 = wire {name = \"_mul_a_b\"} : !inout<i8>
  assign %1, %0
  %2 = read_inout %1 : i8
  %3 = xor %2, %a : i8
  %4 = read_inout %1 : i8
  %5 = or %4, %b : i8
  output %3, %5
}
"
    );
}

#[test]
fn struct_explode_becomes_field_extracts() {
    let mut b = Builder::new("top");
    let i1 = b.int(1);
    let i4 = b.int(4);
    let i8 = b.int(8);
    let fields = vec![(b.ident("valid"), i1), (b.ident("data"), i8), (b.ident("tag"), i4)];
    let ty = b.module.types.intern(Type::Struct { fields });
    let p_name = b.ident("p");
    let p = b.module.add_input(p_name, ty);
    let body = b.body();
    let explode = b.module.create_node(
        svprep_ir::InsertPoint::End(body),
        OpKind::StructExplode,
        vec![p],
        vec![i1, i8, i4],
    );
    let results = b.module.node(explode).results.clone();
    let out = b.stmt(body, OpKind::Output, results);

    b.legalize(&LoweringOptions::default()).unwrap();
    assert!(b.module.node(explode).erased);
    let outputs = b.module.node(out).operands.clone();
    assert_eq!(outputs.len(), 3);
    for (value, field) in outputs.iter().zip(["valid", "data", "tag"]) {
        let node = b.module.defining_node(*value).unwrap();
        assert_eq!(
            b.module.node(node).kind,
            OpKind::StructExtract {
                field: b.ident(field)
            }
        );
        assert_eq!(b.module.node(node).operands, vec![p]);
        assert_eq!(b.module.value(*value).uses.len(), 1);
    }
}

#[test]
fn unused_always_inline_node_is_deleted() {
    let mut b = Builder::new("top");
    let body = b.body();
    let w = b.decl(body, OpKind::Wire, "w", 8);
    let r = b.read(body, w);
    let read = b.module.defining_node(r).unwrap();
    b.legalize(&LoweringOptions::default()).unwrap();
    assert!(b.module.node(read).erased);
    assert_eq!(b.module.block(body).len(), 1);
}

#[test]
fn shared_read_is_duplicated_next_to_each_user() {
    let mut b = Builder::new("top");
    let a = b.input("a", 8);
    b.output("y", 8);
    b.output("z", 8);
    let body = b.body();
    let w = b.decl(body, OpKind::Wire, "w", 8);
    let r = b.read(body, w);
    let y = b.expr(body, OpKind::Xor, vec![r, a], 8);
    let z = b.expr(body, OpKind::And, vec![r, a], 8);
    b.stmt(body, OpKind::Output, vec![y, z]);

    let stats = b.legalize(&LoweringOptions::default()).unwrap();
    assert_eq!(stats.duplicated, 1);
    assert_eq!(
        b.print(),
        "\
module @top(in %a: i8, out y: i8, out z: i8) {
  %0 = wire {name = \"w\"} : !inout<i8>
  %1 = read_inout %0 : i8
  %2 = xor %1, %a : i8
  %3 = read_inout %0 : i8
  %4 = and %3, %a : i8
  output %2, %4
}
"
    );
}

#[test]
fn foreign_operation_is_rejected() {
    let mut b = Builder::new("top");
    let body = b.body();
    b.stmt(
        body,
        OpKind::Foreign {
            dialect: "seq".into(),
            name: "firreg".into(),
        },
        vec![],
    );
    let err = b.legalize(&LoweringOptions::default()).unwrap_err();
    assert_eq!(
        err.to_string(),
        "module 'top' contains 'seq.firreg', which cannot be emitted"
    );
}
