//! Function and method compilation.
//!
//! `(def name (params...) [-> type] body...)` follows the declare-then-define
//! pattern:
//!
//! 1. **Declare**: resolve the signature and add the IR function. Plain
//!    functions are bound in the declaring scope before their body is
//!    compiled, so they can recurse. Methods are named `Class_method` and
//!    registered with their class instead.
//! 2. **Define**: open the entry block, copy each parameter into its own
//!    stack slot inside a function scope chained to the declaring scope,
//!    lower the body as an implicit `begin` and return its last value.
//!
//! The caller's insertion point is saved and restored around the body, so
//! a `def` may appear anywhere, including inside another function.

use eva_ir::{FunctionId, TypeId};
use eva_syntax::Exp;
use tracing::debug;

use super::expr_lowerer::{ExprLowerer, LowerResult};
use super::scope::{ScopeBinding, ScopeKind};
use crate::error::CompileError;

// ---------------------------------------------------------------------------
// FunctionDef
// ---------------------------------------------------------------------------

/// The parts of a `def` form.
#[derive(Clone, Copy, Debug)]
pub(crate) struct FunctionDef<'e> {
    pub name: &'e str,
    pub params: &'e [Exp],
    /// Annotated return type, if any.
    pub ret: Option<&'e str>,
    pub body: &'e [Exp],
}

impl<'e> FunctionDef<'e> {
    /// Split a `def` form. `exp` must be the whole list, `def` included.
    pub(crate) fn parse(exp: &'e Exp) -> LowerResult<Self> {
        let items = exp.as_list().unwrap_or_default();
        let [_, name, params, rest @ ..] = items else {
            return Err(CompileError::malformed(
                "def",
                "expected (def name (params...) body...)",
            ));
        };
        let name = ExprLowerer::expect_symbol("def", name, "function name")?;
        let Some(params) = params.as_list() else {
            return Err(CompileError::malformed(
                "def",
                format!("parameter list of `{name}` must be a list, found `{params}`"),
            ));
        };
        let (ret, body) = match rest {
            [arrow, ret, body @ ..] if arrow.as_symbol() == Some("->") => {
                let ret = ExprLowerer::expect_symbol("def", ret, "return type")?;
                (Some(ret), body)
            }
            body => (None, body),
        };
        if body.is_empty() {
            return Err(CompileError::malformed(
                "def",
                format!("function `{name}` has no body"),
            ));
        }
        Ok(FunctionDef {
            name,
            params,
            ret,
            body,
        })
    }
}

impl ExprLowerer<'_> {
    // -----------------------------------------------------------------------
    // Declaration
    // -----------------------------------------------------------------------

    /// Function type and parameter names for `def`.
    fn signature<'e>(&mut self, def: &FunctionDef<'e>) -> LowerResult<(TypeId, Vec<&'e str>)> {
        let mut names = Vec::with_capacity(def.params.len());
        let mut types = Vec::with_capacity(def.params.len());
        for param in def.params {
            let (name, ty) = self.param_type(param)?;
            names.push(name);
            types.push(ty);
        }
        let ret = match def.ret {
            Some(ret) => self.resolve_type(ret)?,
            None => TypeId::I32,
        };
        Ok((self.builder.fn_type(ret, &types, false), names))
    }

    /// Declare a method of `class` as `Class_method`.
    pub(crate) fn declare_method(&mut self, class: &str, def: &FunctionDef<'_>) -> LowerResult<FunctionId> {
        let (fn_ty, names) = self.signature(def)?;
        Ok(self
            .builder
            .declare_function(&format!("{class}_{}", def.name), fn_ty, &names))
    }

    /// `(def ...)` outside a class: compile the function and bind its name.
    /// The form's value is the function pointer.
    pub(crate) fn lower_def(&mut self, exp: &Exp) -> LowerResult {
        let def = FunctionDef::parse(exp)?;
        let (fn_ty, names) = self.signature(&def)?;
        let function = self.builder.declare_function(def.name, fn_ty, &names);
        self.scope.define(def.name, ScopeBinding::Function(function));
        self.compile_function_body(function, &def)?;
        Ok(self.builder.function_value(function))
    }

    // -----------------------------------------------------------------------
    // Definition
    // -----------------------------------------------------------------------

    /// Emit the body of the declared `function`.
    pub(crate) fn compile_function_body(
        &mut self,
        function: FunctionId,
        def: &FunctionDef<'_>,
    ) -> LowerResult<()> {
        let previous_function = self.current_function;
        let previous_block = self.builder.current_block();

        let entry = self.builder.append_block(function, "entry");
        self.builder.set_current_function(function);
        self.builder.position_at_end(entry);
        self.current_function = function;

        let result = self.with_scope(ScopeKind::Function, |this| {
            this.lower_function_body(function, def)
        });

        self.current_function = previous_function;
        self.builder.set_current_function(previous_function);
        match previous_block {
            Some(block) => self.builder.position_at_end(block),
            None => self.builder.clear_position(),
        }
        debug!(function = self.builder.function_name(function), ok = result.is_ok(), "compiled function");
        result
    }

    fn lower_function_body(&mut self, function: FunctionId, def: &FunctionDef<'_>) -> LowerResult<()> {
        for (param, value) in def.params.iter().zip(self.builder.params(function)) {
            let (name, ty) = self.param_type(param)?;
            let slot = self.builder.create_entry_alloca(function, name, ty);
            self.builder.store(value, slot);
            self.scope.define(
                name,
                ScopeBinding::Storage {
                    ptr: slot,
                    ty,
                    owner: Some(function),
                },
            );
        }

        let value = self.lower_sequence(def.name, def.body)?;
        let ret_ty = self.return_type(function);
        let value = self.coerce(value, ret_ty, &format!("return value of `{}`", def.name))?;
        self.builder.ret(value);
        Ok(())
    }

    fn return_type(&self, function: FunctionId) -> TypeId {
        let fn_ty = self.builder.function_type(function);
        self.builder
            .types()
            .fn_sig(fn_ty)
            .map_or(TypeId::I32, |sig| sig.ret)
    }
}
