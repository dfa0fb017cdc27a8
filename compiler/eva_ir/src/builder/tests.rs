#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::*;
use crate::inst::Op;

/// Builder positioned in the entry block of `i32 test_fn()`.
fn setup() -> (IrBuilder, FunctionId, BlockId) {
    let mut irb = IrBuilder::new("builder_test");
    let fn_ty = irb.fn_type(TypeId::I32, &[], false);
    let func = irb.declare_function("test_fn", fn_ty, &[]);
    let entry = irb.append_block(func, "entry");
    irb.set_current_function(func);
    irb.position_at_end(entry);
    (irb, func, entry)
}

fn ops(irb: &IrBuilder, func: FunctionId, block: BlockId) -> Vec<Op> {
    let f = irb.module().function(func);
    f.block(block).insts.iter().map(|&i| f.inst(i).op.clone()).collect()
}

#[test]
fn constants_carry_their_types() {
    let mut irb = IrBuilder::new("c");
    let a = irb.const_i32(7);
    let b = irb.const_bool(true);
    let i8p = irb.ptr_type(TypeId::I8);
    let n = irb.const_null(i8p);
    assert_eq!(irb.type_of(a), TypeId::I32);
    assert_eq!(irb.type_of(b), TypeId::I1);
    assert_eq!(irb.type_of(n), i8p);
    assert_eq!(irb.module().value(a).kind, ValueKind::ConstInt(7));
}

#[test]
fn entry_allocas_are_grouped_at_the_top() {
    let (mut irb, func, entry) = setup();
    let one = irb.const_i32(1);
    let first = irb.create_entry_alloca(func, "a", TypeId::I32);
    irb.store(one, first);

    let body = irb.append_block(func, "body");
    irb.br(body);
    irb.position_at_end(body);
    let second = irb.create_entry_alloca(func, "b", TypeId::I32);
    irb.store(one, second);
    irb.ret(one);

    let entry_ops = ops(&irb, func, entry);
    assert!(matches!(entry_ops[0], Op::Alloca { .. }));
    assert!(matches!(entry_ops[1], Op::Alloca { .. }));
    assert!(matches!(entry_ops[2], Op::Store { .. }));
    assert!(matches!(entry_ops[3], Op::Br { .. }));
    // Insertion point is unchanged.
    assert_eq!(irb.current_block(), Some(body));
    assert!(irb.current_block_terminated());
}

#[test]
fn detached_blocks_join_layout_when_attached() {
    let (mut irb, func, _) = setup();
    let late = irb.create_block(func, "late");
    let early = irb.append_block(func, "early");
    assert_eq!(irb.module().function(func).block_count(), 2);
    irb.attach_block(func, late);
    irb.attach_block(func, late);

    let order: Vec<BlockId> = irb.module().function(func).blocks().map(|(id, _)| id).collect();
    assert_eq!(order.len(), 3);
    assert_eq!(order[1], early);
    assert_eq!(order[2], late);
}

#[test]
fn local_names_are_uniqued() {
    let (mut irb, func, _) = setup();
    let a = irb.create_entry_alloca(func, "x", TypeId::I32);
    let b = irb.create_entry_alloca(func, "x", TypeId::I32);
    let c = irb.load(TypeId::I32, a, "");
    let d = irb.load(TypeId::I32, b, "");
    let names: Vec<&str> = [a, b, c, d]
        .iter()
        .map(|&v| irb.module().value(v).name.as_str())
        .collect();
    assert_eq!(names, ["x", "x1", "tmp", "tmp1"]);
}

#[test]
fn blocks_share_the_local_namespace() {
    let (mut irb, func, _) = setup();
    let then_a = irb.append_block(func, "then");
    let then_b = irb.append_block(func, "then");
    let f = irb.module().function(func);
    assert_eq!(f.block(then_a).name, "then");
    assert_eq!(f.block(then_b).name, "then1");
}

#[test]
fn module_symbols_are_uniqued() {
    let mut irb = IrBuilder::new("m");
    let ty = irb.fn_type(TypeId::I32, &[], false);
    let a = irb.declare_function("square", ty, &[]);
    let b = irb.declare_function("square", ty, &[]);
    assert_eq!(irb.function_name(a), "square");
    assert_eq!(irb.function_name(b), "square.1");
    assert_eq!(irb.get_function("square"), Some(a));
    assert_eq!(irb.get_or_declare_function("square", ty), a);
}

#[test]
fn params_take_given_names() {
    let mut irb = IrBuilder::new("m");
    let ty = irb.fn_type(TypeId::I32, &[TypeId::I32, TypeId::I32], false);
    let f = irb.declare_function("add", ty, &["x"]);
    let names: Vec<String> = irb
        .params(f)
        .iter()
        .map(|&p| irb.module().value(p).name.clone())
        .collect();
    assert_eq!(names, ["x", "arg"]);
}

#[test]
fn struct_gep_yields_field_pointer() {
    let (mut irb, func, _) = setup();
    let point = irb.named_struct("Point");
    irb.set_struct_body(point, &[TypeId::I32, TypeId::I64]);
    let slot = irb.create_entry_alloca(func, "p", point);
    let field = irb.struct_gep(point, slot, 1, "y");
    let expected = irb.ptr_type(TypeId::I64);
    assert_eq!(irb.type_of(field), expected);
    assert_eq!(irb.codegen_error_count(), 0);
}

#[test]
fn call_returns_callee_result_type() {
    let (mut irb, _, _) = setup();
    let i8p = irb.ptr_type(TypeId::I8);
    let malloc_ty = irb.fn_type(i8p, &[TypeId::I64], false);
    let malloc = irb.declare_function("malloc", malloc_ty, &[]);
    let size = irb.const_i64(16);
    let raw = irb.call_function(malloc, &[size], "raw").unwrap();
    assert_eq!(irb.type_of(raw), i8p);
}

#[test]
fn misuse_is_recorded_not_panicking() {
    let mut irb = IrBuilder::new("bad");
    let one = irb.const_i32(1);
    let v = irb.add(one, one, "sum");
    assert!(matches!(irb.module().value(v).kind, ValueKind::Undef));
    irb.load(TypeId::I32, one, "x");
    assert_eq!(irb.codegen_error_count(), 2);
    let err = irb.finish().err().unwrap();
    assert_eq!(err.location, "builder");
}

#[test]
fn calling_a_non_function_is_recorded() {
    let (mut irb, _, _) = setup();
    let one = irb.const_i32(1);
    assert!(irb.call(one, &[], "r").is_none());
    assert_eq!(irb.codegen_error_count(), 1);
}
