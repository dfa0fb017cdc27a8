//! External functions and globals every Eva module starts with.
//!
//! `printf` and `malloc` come from the C library and are resolved at link
//! time. `@VERSION` is a mutable `i32` global visible to the whole program.

use eva_ir::{Constant, FunctionId, IrBuilder, TypeId};

use super::scope::{Scope, ScopeBinding};

/// Value of the `VERSION` global.
pub const VERSION: i64 = 42;

/// Runtime entry points the lowering calls directly.
#[derive(Clone, Copy, Debug)]
pub struct RuntimeFunctions {
    /// `i32 printf(i8*, ...)`
    pub printf: FunctionId,
    /// `i8* malloc(i64)`
    pub malloc: FunctionId,
}

/// Declare the C runtime functions used by generated code.
///
/// Call this once per module before any function compilation.
pub fn declare_runtime(builder: &mut IrBuilder) -> RuntimeFunctions {
    let i8_ptr = builder.ptr_type(TypeId::I8);

    // -- I/O --
    let printf_ty = builder.fn_type(TypeId::I32, &[i8_ptr], true);
    let printf = builder.get_or_declare_function("printf", printf_ty);

    // -- Memory --
    let malloc_ty = builder.fn_type(i8_ptr, &[TypeId::I64], false);
    let malloc = builder.get_or_declare_function("malloc", malloc_ty);

    RuntimeFunctions { printf, malloc }
}

/// Create the predefined globals and bind them in `scope`.
pub fn define_globals(builder: &mut IrBuilder, scope: &mut Scope) {
    let version = builder.add_global("VERSION", TypeId::I32, Some(Constant::Int(VERSION)), false);
    scope.define(
        "VERSION",
        ScopeBinding::Storage {
            ptr: builder.global_value(version),
            ty: TypeId::I32,
            owner: None,
        },
    );
}
