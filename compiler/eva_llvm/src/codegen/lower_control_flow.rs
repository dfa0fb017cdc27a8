//! Control flow, blocks and variables.
//!
//! `if` and `while` are lowered into basic blocks:
//!
//! ```text
//! if:     cur ─┬─▶ then ─┐          while:  cur ─▶ cond ─┬─▶ body ─┐
//!              └─▶ else ─┴─▶ ifend                ▲      └─▶ loopend
//!                                                 └──────────────┘
//! ```
//!
//! `else` and `ifend` (and `body` / `loopend`) are created detached and
//! attached once their predecessors are complete, so nested forms keep the
//! block layout in source order.

use eva_ir::{IntPredicate, TypeId, ValueId};
use eva_syntax::Exp;

use super::expr_lowerer::{ExprLowerer, LowerResult};
use super::scope::{ScopeBinding, ScopeKind};
use crate::error::CompileError;

impl ExprLowerer<'_> {
    // -----------------------------------------------------------------------
    // Conditionals
    // -----------------------------------------------------------------------

    /// `(if cond then [else])`.
    ///
    /// When both branches produce the same type the result is a phi named
    /// `tmpif`; otherwise the form is evaluated for effect and yields `i32 0`.
    pub(crate) fn lower_if(&mut self, args: &[Exp]) -> LowerResult {
        if !(2..=3).contains(&args.len()) {
            return Err(CompileError::malformed(
                "if",
                format!("expected (if cond then [else]), found {} operand(s)", args.len()),
            ));
        }
        let cond = self.lower(&args[0])?;
        let cond = self.to_condition(cond, "if")?;

        let function = self.current_function;
        let then_bb = self.builder.append_block(function, "then");
        let else_bb = self.builder.create_block(function, "else");
        let end_bb = self.builder.create_block(function, "ifend");
        self.builder.cond_br(cond, then_bb, else_bb);

        // Then branch
        self.builder.position_at_end(then_bb);
        let then_val = self.lower(&args[1])?;
        let then_exit = self.builder.current_block().unwrap_or(then_bb);
        self.builder.br(end_bb);

        // Else branch
        self.builder.attach_block(function, else_bb);
        self.builder.position_at_end(else_bb);
        let else_val = match args.get(2) {
            Some(exp) => self.lower(exp)?,
            None => self.unit(),
        };
        let else_exit = self.builder.current_block().unwrap_or(else_bb);
        self.builder.br(end_bb);

        // Merge
        self.builder.attach_block(function, end_bb);
        self.builder.position_at_end(end_bb);
        let ty = self.builder.type_of(then_val);
        if ty == self.builder.type_of(else_val) {
            Ok(self
                .builder
                .phi(ty, &[(then_val, then_exit), (else_val, else_exit)], "tmpif"))
        } else {
            Ok(self.unit())
        }
    }

    /// Reduce a value to `i1`: integers and pointers compare against zero.
    pub(crate) fn to_condition(&mut self, value: ValueId, form: &str) -> LowerResult {
        let ty = self.builder.type_of(value);
        if ty == TypeId::I1 {
            return Ok(value);
        }
        let zero = if self.builder.types().is_int(ty) {
            self.builder.const_int(ty, 0)
        } else if self.builder.types().is_pointer(ty) {
            self.builder.const_null(ty)
        } else {
            return Err(self.mismatch(&format!("condition of `{form}`"), "i1", ty));
        };
        Ok(self.builder.icmp(IntPredicate::Ne, value, zero, "tobool"))
    }

    // -----------------------------------------------------------------------
    // Loops
    // -----------------------------------------------------------------------

    /// `(while cond body)`, always yielding `i32 0`.
    pub(crate) fn lower_while(&mut self, args: &[Exp]) -> LowerResult {
        Self::expect_args("while", args, 2)?;
        let function = self.current_function;
        let cond_bb = self.builder.append_block(function, "cond");
        let body_bb = self.builder.create_block(function, "body");
        let end_bb = self.builder.create_block(function, "loopend");
        self.builder.br(cond_bb);

        // Condition
        self.builder.position_at_end(cond_bb);
        let cond = self.lower(&args[0])?;
        let cond = self.to_condition(cond, "while")?;
        self.builder.cond_br(cond, body_bb, end_bb);

        // Body, then back-edge
        self.builder.attach_block(function, body_bb);
        self.builder.position_at_end(body_bb);
        self.lower(&args[1])?;
        self.builder.br(cond_bb);

        self.builder.attach_block(function, end_bb);
        self.builder.position_at_end(end_bb);
        Ok(self.unit())
    }

    // -----------------------------------------------------------------------
    // Blocks
    // -----------------------------------------------------------------------

    /// `(begin e1 e2 ...)`: a new scope; yields the last value.
    pub(crate) fn lower_begin(&mut self, args: &[Exp]) -> LowerResult {
        self.with_scope(ScopeKind::Block, |this| this.lower_sequence("begin", args))
    }

    // -----------------------------------------------------------------------
    // Variables
    // -----------------------------------------------------------------------

    /// `(var name init)` or `(var (name type) init)`.
    ///
    /// An unannotated variable takes the type of its initializer. The slot is
    /// allocated in the entry block and its pointer is the form's value.
    pub(crate) fn lower_var(&mut self, args: &[Exp]) -> LowerResult {
        Self::expect_args("var", args, 2)?;
        let (name, declared) = self.typed_name("var", &args[0])?;
        let init = self.lower(&args[1])?;
        let ty = declared.unwrap_or_else(|| self.builder.type_of(init));
        let value = self.coerce(init, ty, &format!("initializer of `{name}`"))?;

        let slot = self
            .builder
            .create_entry_alloca(self.current_function, name, ty);
        self.builder.store(value, slot);
        self.scope.define(
            name,
            ScopeBinding::Storage {
                ptr: slot,
                ty,
                owner: Some(self.current_function),
            },
        );
        Ok(slot)
    }

    /// `(set name value)` or `(set (prop obj field) value)`; yields the
    /// stored value.
    pub(crate) fn lower_set(&mut self, args: &[Exp]) -> LowerResult {
        Self::expect_args("set", args, 2)?;
        let target = &args[0];
        match target {
            Exp::Symbol(name) => {
                let ScopeBinding::Storage { ptr, ty, .. } = self.scope.lookup(name)? else {
                    return Err(CompileError::malformed(
                        "set",
                        format!("cannot assign to function `{name}`"),
                    ));
                };
                let value = self.lower(&args[1])?;
                let value = self.coerce(value, ty, &format!("assignment to `{name}`"))?;
                self.builder.store(value, ptr);
                Ok(value)
            }
            Exp::List(items) if target.is_tagged("prop") => {
                let (ptr, ty) = self.field_address(&items[1..])?;
                let value = self.lower(&args[1])?;
                let value = self.coerce(value, ty, "field assignment")?;
                self.builder.store(value, ptr);
                Ok(value)
            }
            other => Err(CompileError::malformed(
                "set",
                format!("cannot assign to `{other}`"),
            )),
        }
    }
}
