#![allow(clippy::unwrap_used, clippy::expect_used)]

use crate::{Constant, FunctionId, IrBuilder, Module, TypeId, VerifyError};

fn start(name: &str) -> (IrBuilder, FunctionId) {
    let mut b = IrBuilder::new("verify_test");
    let ty = b.fn_type(TypeId::I32, &[], false);
    let f = b.declare_function(name, ty, &[]);
    let entry = b.append_block(f, "entry");
    b.set_current_function(f);
    b.position_at_end(entry);
    (b, f)
}

fn check(b: IrBuilder) -> Result<(), VerifyError> {
    let module: Module = b.finish().unwrap();
    module.verify()
}

#[test]
fn accepts_well_formed_function() {
    let (mut b, _) = start("ok");
    let one = b.const_i32(1);
    b.ret(one);
    assert_eq!(check(b), Ok(()));
}

#[test]
fn rejects_missing_terminator() {
    let (mut b, f) = start("f");
    b.create_entry_alloca(f, "x", TypeId::I32);
    let err = check(b).unwrap_err();
    assert_eq!(err.location, "function `f`");
    assert!(err.message.contains("does not end with a terminator"));
}

#[test]
fn rejects_empty_block() {
    let (b, _) = start("f");
    assert!(check(b).unwrap_err().message.contains("is empty"));
}

#[test]
fn rejects_code_after_terminator() {
    let (mut b, _) = start("f");
    let one = b.const_i32(1);
    b.ret(one);
    b.ret(one);
    assert!(check(b).unwrap_err().message.contains("middle of block"));
}

#[test]
fn rejects_store_type_mismatch() {
    let (mut b, f) = start("f");
    let slot = b.create_entry_alloca(f, "x", TypeId::I32);
    let flag = b.const_bool(true);
    b.store(flag, slot);
    let one = b.const_i32(1);
    b.ret(one);
    let err = check(b).unwrap_err();
    assert!(err.message.contains("store of `i1` through `i32*`"), "{err}");
}

#[test]
fn rejects_wrong_return_type() {
    let (mut b, _) = start("f");
    let flag = b.const_bool(false);
    b.ret(flag);
    assert!(check(b).unwrap_err().message.contains("returns `i1`"));
}

#[test]
fn rejects_value_from_other_function() {
    let (mut b, f) = start("f");
    let slot = b.create_entry_alloca(f, "x", TypeId::I32);
    let one = b.const_i32(1);
    b.ret(one);

    let ty = b.fn_type(TypeId::I32, &[], false);
    let g = b.declare_function("g", ty, &[]);
    let entry = b.append_block(g, "entry");
    b.set_current_function(g);
    b.position_at_end(entry);
    let v = b.load(TypeId::I32, slot, "x");
    b.ret(v);

    let err = check(b).unwrap_err();
    assert_eq!(err.location, "function `g`");
    assert!(err.message.contains("belongs to function `f`"));
}

#[test]
fn rejects_call_arity_and_argument_types() {
    let (mut b, _) = start("f");
    let sq_ty = b.fn_type(TypeId::I32, &[TypeId::I32], false);
    let sq = b.declare_function("square", sq_ty, &[]);
    b.call_function(sq, &[], "r");
    let one = b.const_i32(1);
    b.ret(one);
    assert!(check(b).unwrap_err().message.contains("with 0 arguments, expected 1"));

    let (mut b, _) = start("f");
    let sq_ty = b.fn_type(TypeId::I32, &[TypeId::I32], false);
    let sq = b.declare_function("square", sq_ty, &[]);
    let flag = b.const_bool(true);
    b.call_function(sq, &[flag], "r");
    let one = b.const_i32(1);
    b.ret(one);
    assert!(check(b).unwrap_err().message.contains("argument 0"));
}

#[test]
fn variadic_calls_accept_extra_arguments() {
    let (mut b, _) = start("f");
    let i8p = b.ptr_type(TypeId::I8);
    let printf_ty = b.fn_type(TypeId::I32, &[i8p], true);
    let printf = b.declare_function("printf", printf_ty, &[]);
    let fmt = b.global_string_ptr("%d %d", ".str");
    let one = b.const_i32(1);
    let wide = b.const_i64(2);
    let r = b.call_function(printf, &[fmt, one, wide], "").unwrap();
    b.ret(r);
    assert_eq!(check(b), Ok(()));
}

#[test]
fn rejects_phi_with_foreign_predecessor() {
    let (mut b, f) = start("f");
    let entry = b.current_block().unwrap();
    let other = b.append_block(f, "other");
    let join = b.append_block(f, "join");
    b.br(join);
    b.position_at_end(other);
    b.br(join);
    b.position_at_end(join);
    let one = b.const_i32(1);
    let stray = b.create_block(f, "stray");
    b.attach_block(f, stray);
    let v = b.phi(TypeId::I32, &[(one, entry), (one, stray)], "v");
    b.ret(v);
    b.position_at_end(stray);
    b.ret(one);
    assert!(check(b).unwrap_err().message.contains("does not branch to `join`"));
}

#[test]
fn rejects_branch_to_detached_block() {
    let (mut b, f) = start("f");
    let nowhere = b.create_block(f, "nowhere");
    b.br(nowhere);
    assert!(check(b).unwrap_err().message.contains("outside the layout"));
}

#[test]
fn rejects_mistyped_global_initializer() {
    let mut b = IrBuilder::new("g");
    let i8p = b.ptr_type(TypeId::I8);
    b.add_global("bad", i8p, Some(Constant::Int(3)), false);
    let err = check(b).unwrap_err();
    assert_eq!(err.location, "global `@bad`");
}
