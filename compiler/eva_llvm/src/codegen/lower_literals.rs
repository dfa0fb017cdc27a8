//! Literal and symbol lowering.
//!
//! The simplest expression kinds: constants and variable references. These
//! produce values without control flow.

use eva_ir::{TypeId, ValueId};

use super::expr_lowerer::{ExprLowerer, LowerResult};
use super::scope::ScopeBinding;

impl ExprLowerer<'_> {
    /// Numbers are `i32`; literals outside that range wrap.
    pub(crate) fn lower_number(&mut self, n: i64) -> ValueId {
        self.builder.const_i32(n as i32)
    }

    /// String literals become private NUL-terminated globals; the value is an
    /// `i8*` to the first byte.
    pub(crate) fn lower_string(&mut self, text: &str) -> ValueId {
        self.builder.global_string_ptr(text, ".str")
    }

    /// `true` / `false`, or a variable or function reference.
    pub(crate) fn lower_symbol(&mut self, name: &str) -> LowerResult {
        match name {
            "true" => return Ok(self.builder.const_bool(true)),
            "false" => return Ok(self.builder.const_bool(false)),
            _ => {}
        }
        match self.scope.lookup(name)? {
            ScopeBinding::Storage { ptr, ty, .. } => Ok(self.builder.load(ty, ptr, name)),
            ScopeBinding::Function(f) => Ok(self.builder.function_value(f)),
        }
    }

    /// The `i32 0` used where a form has no meaningful value.
    pub(crate) fn unit(&mut self) -> ValueId {
        self.builder.const_int(TypeId::I32, 0)
    }
}
