//! Call lowering.
//!
//! A callee is any expression whose value is a function pointer: a `def`
//! name, a variable holding a function, or a `method` lookup. A class
//! instance in callee position is a functor and is invoked through its
//! `__call__` method with the instance as `self`.

use eva_ir::{TypeId, ValueId};
use eva_syntax::Exp;
use tracing::trace;

use super::expr_lowerer::{ExprLowerer, LowerResult};
use crate::error::CompileError;

/// Method invoked when an instance is called like a function.
pub(crate) const FUNCTOR_METHOD: &str = "__call__";

impl ExprLowerer<'_> {
    /// `(printf fmt args...)`. Booleans are promoted to `i32`.
    pub(crate) fn lower_printf(&mut self, args: &[Exp]) -> LowerResult {
        let Some((format, rest)) = args.split_first() else {
            return Err(CompileError::malformed("printf", "missing format string"));
        };
        let format = self.lower(format)?;
        let i8_ptr = self.builder.ptr_type(TypeId::I8);
        let mut values = vec![self.coerce(format, i8_ptr, "printf format")?];
        for exp in rest {
            let value = self.lower(exp)?;
            let value = if self.builder.type_of(value) == TypeId::I1 {
                self.builder.zext(value, TypeId::I32, "")
            } else {
                value
            };
            values.push(value);
        }
        let printf = self.runtime.printf;
        match self.builder.call_function(printf, &values, "") {
            Some(result) => Ok(result),
            None => Ok(self.unit()),
        }
    }

    /// `(callee args...)` where `callee` is not a special form.
    pub(crate) fn lower_call(&mut self, callee: &Exp, args: &[Exp]) -> LowerResult {
        let callee_val = self.lower(callee)?;
        let mut values = Vec::with_capacity(args.len() + 1);
        for arg in args {
            values.push(self.lower(arg)?);
        }
        self.call_value(callee_val, values, &callee.to_string())
    }

    /// Call `callee` with already lowered arguments.
    pub(crate) fn call_value(
        &mut self,
        callee: ValueId,
        mut args: Vec<ValueId>,
        what: &str,
    ) -> LowerResult {
        let callee_ty = self.builder.type_of(callee);
        if let Some(sig) = self.builder.types().callee_sig(callee_ty) {
            let (params, variadic) = (sig.params.clone(), sig.variadic);
            return self.emit_call(callee, &params, variadic, args, what);
        }

        let class = self
            .classes
            .class_of(self.builder.types(), callee_ty)
            .map(|info| info.name.clone());
        let Some(class) = class else {
            return Err(self.mismatch(&format!("call of `{what}`"), "function", callee_ty));
        };
        trace!(%class, "functor call");
        let method = self.load_method(&class, callee, FUNCTOR_METHOD)?;
        args.insert(0, callee);
        self.call_value(method, args, &format!("{class}.{FUNCTOR_METHOD}"))
    }

    fn emit_call(
        &mut self,
        callee: ValueId,
        params: &[TypeId],
        variadic: bool,
        args: Vec<ValueId>,
        what: &str,
    ) -> LowerResult {
        let arity_ok = if variadic {
            args.len() >= params.len()
        } else {
            args.len() == params.len()
        };
        if !arity_ok {
            return Err(CompileError::malformed(
                what,
                format!("expects {} argument(s), found {}", params.len(), args.len()),
            ));
        }

        let mut coerced = Vec::with_capacity(args.len());
        for (i, arg) in args.into_iter().enumerate() {
            coerced.push(match params.get(i) {
                Some(&param_ty) => self.coerce(arg, param_ty, &format!("argument {} of `{what}`", i + 1))?,
                None => arg,
            });
        }
        match self.builder.call(callee, &coerced, "") {
            Some(result) => Ok(result),
            None => Ok(self.unit()),
        }
    }
}
