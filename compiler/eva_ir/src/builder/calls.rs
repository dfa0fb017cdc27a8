//! Direct and indirect calls.

use super::IrBuilder;
use crate::inst::Op;
use crate::value_id::{FunctionId, TypeId, ValueId};

impl IrBuilder {
    /// Call through `callee`, which must have function-pointer type: either a
    /// function's own value or a loaded function pointer. Returns `None` for
    /// `void` callees.
    pub fn call(&mut self, callee: ValueId, args: &[ValueId], name: &str) -> Option<ValueId> {
        let callee_ty = self.type_of(callee);
        let Some(fn_ty) = self
            .module
            .types
            .pointee(callee_ty)
            .filter(|&t| self.module.types.fn_sig(t).is_some())
        else {
            let shown = self.type_name(callee_ty);
            self.record_codegen_error(format!("call through non-function `{shown}`"));
            return None;
        };
        let ret = self
            .module
            .types
            .fn_sig(fn_ty)
            .map_or(TypeId::VOID, |sig| sig.ret);
        self.insert(
            Op::Call {
                callee,
                fn_ty,
                args: args.to_vec(),
            },
            ret,
            name,
        )
    }

    /// Call a known function directly.
    pub fn call_function(
        &mut self,
        function: FunctionId,
        args: &[ValueId],
        name: &str,
    ) -> Option<ValueId> {
        let callee = self.function_value(function);
        self.call(callee, args, name)
    }
}
