//! Expression lowering coordinator.
//!
//! `ExprLowerer` owns the lowering context (scope, current function, current
//! class) and dispatches each [`Exp`] to a focused `lower_*` method
//! implemented in a separate file.
//!
//! # Architecture
//!
//! ```text
//! ExprLowerer
//!   ├── lower_literals.rs     numbers, strings, booleans, symbols
//!   ├── lower_operators.rs    + - * /  and comparisons
//!   ├── lower_control_flow.rs if, while, begin, var, set
//!   ├── lower_calls.rs        printf, named and computed calls
//!   ├── lower_objects.rs      class, new, prop, method
//!   └── function_compiler.rs  def and method bodies
//! ```

use std::mem;

use eva_ir::{FunctionId, IrBuilder, TypeId, ValueId};
use eva_syntax::Exp;
use tracing::trace;

use super::class_layout::ClassRegistry;
use super::runtime_decl::RuntimeFunctions;
use super::scope::{Scope, ScopeKind};
use crate::error::CompileError;

pub type LowerResult<T = ValueId> = Result<T, CompileError>;

// ---------------------------------------------------------------------------
// ExprLowerer
// ---------------------------------------------------------------------------

/// Lowers Eva expressions into the function under construction.
pub struct ExprLowerer<'a> {
    pub(crate) builder: &'a mut IrBuilder,
    pub(crate) classes: &'a mut ClassRegistry,
    pub(crate) runtime: RuntimeFunctions,
    /// Current lexical scope (owned; swapped via `mem::replace` for blocks).
    pub(crate) scope: Scope,
    /// The IR function currently receiving instructions.
    pub(crate) current_function: FunctionId,
    /// Class whose body is being compiled, for `self` typing.
    pub(crate) current_class: Option<String>,
}

impl<'a> ExprLowerer<'a> {
    pub fn new(
        builder: &'a mut IrBuilder,
        classes: &'a mut ClassRegistry,
        runtime: RuntimeFunctions,
        scope: Scope,
        current_function: FunctionId,
    ) -> Self {
        Self {
            builder,
            classes,
            runtime,
            scope,
            current_function,
            current_class: None,
        }
    }

    // -----------------------------------------------------------------------
    // Main dispatch
    // -----------------------------------------------------------------------

    /// Lower `exp` at the current insertion point and return its value.
    pub fn lower(&mut self, exp: &Exp) -> LowerResult {
        eva_stack::maybe_grow(|| match exp {
            Exp::Number(n) => Ok(self.lower_number(*n)),
            Exp::String(text) => Ok(self.lower_string(text)),
            Exp::Symbol(name) => self.lower_symbol(name),
            Exp::List(items) => self.lower_list(exp, items),
        })
    }

    fn lower_list(&mut self, exp: &Exp, items: &[Exp]) -> LowerResult {
        let Some((head, args)) = items.split_first() else {
            return Err(CompileError::malformed("()", "empty list is not an expression"));
        };
        let Exp::Symbol(tag) = head else {
            return self.lower_call(head, args);
        };
        trace!(form = %tag, args = args.len(), "lower");
        match tag.as_str() {
            // --- Operators (lower_operators.rs) ---
            "+" | "-" | "*" | "/" => self.lower_arithmetic(tag, args),
            ">" | "<" | "==" | "!=" | ">=" | "<=" => self.lower_comparison(tag, args),

            // --- Control flow (lower_control_flow.rs) ---
            "if" => self.lower_if(args),
            "while" => self.lower_while(args),
            "begin" => self.lower_begin(args),
            "var" => self.lower_var(args),
            "set" => self.lower_set(args),

            // --- Functions (function_compiler.rs) ---
            "def" => self.lower_def(exp),

            // --- Calls (lower_calls.rs) ---
            "printf" => self.lower_printf(args),

            // --- Objects (lower_objects.rs) ---
            "class" => self.lower_class(args),
            "new" => self.lower_new(args),
            "prop" => self.lower_prop(args),
            "method" => self.lower_method(args),

            _ => self.lower_call(head, args),
        }
    }

    /// Lower `exps` in order, yielding the last value.
    pub(crate) fn lower_sequence(&mut self, form: &str, exps: &[Exp]) -> LowerResult {
        let Some((last, init)) = exps.split_last() else {
            return Err(CompileError::malformed(form, "expected at least one expression"));
        };
        for exp in init {
            self.lower(exp)?;
        }
        self.lower(last)
    }

    // -----------------------------------------------------------------------
    // Scope handling
    // -----------------------------------------------------------------------

    /// Run `f` inside a fresh child scope, restoring the parent afterwards
    /// whether or not `f` succeeds.
    pub(crate) fn with_scope<T>(
        &mut self,
        kind: ScopeKind,
        f: impl FnOnce(&mut Self) -> LowerResult<T>,
    ) -> LowerResult<T> {
        let parent = mem::take(&mut self.scope);
        self.scope = Scope::child(parent, kind);
        let result = f(self);
        let child = mem::take(&mut self.scope);
        self.scope = child.into_parent().unwrap_or_default();
        result
    }

    // -----------------------------------------------------------------------
    // Shared helpers
    // -----------------------------------------------------------------------

    /// Fail unless `args` has exactly `n` elements.
    pub(crate) fn expect_args(form: &str, args: &[Exp], n: usize) -> LowerResult<()> {
        if args.len() == n {
            Ok(())
        } else {
            Err(CompileError::malformed(
                form,
                format!("expected {n} operand(s), found {}", args.len()),
            ))
        }
    }

    pub(crate) fn expect_symbol<'e>(form: &str, exp: &'e Exp, what: &str) -> LowerResult<&'e str> {
        exp.as_symbol()
            .ok_or_else(|| CompileError::malformed(form, format!("{what} must be a name, found `{exp}`")))
    }

    pub(crate) fn type_name(&self, ty: TypeId) -> String {
        self.builder.type_name(ty)
    }

    pub(crate) fn mismatch(&self, context: &str, expected: &str, found: TypeId) -> CompileError {
        CompileError::TypeMismatch {
            context: context.to_string(),
            expected: expected.to_string(),
            found: self.type_name(found),
        }
    }

    /// Convert `value` to `target`: integers are widened or narrowed,
    /// pointers are bitcast.
    pub(crate) fn coerce(&mut self, value: ValueId, target: TypeId, context: &str) -> LowerResult {
        let from = self.builder.type_of(value);
        if from == target {
            return Ok(value);
        }
        let types = self.builder.types();
        let bits = (types.int_bits(from), types.int_bits(target));
        let both_pointers = types.is_pointer(from) && types.is_pointer(target);
        match bits {
            (Some(have), Some(want)) if have < want => Ok(self.builder.zext(value, target, "")),
            (Some(_), Some(_)) => Ok(self.builder.trunc(value, target, "")),
            _ if both_pointers => Ok(self.builder.bitcast(value, target, "")),
            _ => Err(CompileError::TypeMismatch {
                context: context.to_string(),
                expected: self.type_name(target),
                found: self.type_name(from),
            }),
        }
    }
}
