//! Arithmetic and comparison lowering.
//!
//! Both operands are evaluated left to right. Operands of different integer
//! widths (e.g. a comparison result added to a number) are zero-extended to
//! the wider one. Comparisons are unsigned and produce `i1`.

use eva_ir::{BinOp, IntPredicate, ValueId};
use eva_syntax::Exp;

use super::expr_lowerer::{ExprLowerer, LowerResult};

impl ExprLowerer<'_> {
    /// `(+ a b)`, `(- a b)`, `(* a b)`, `(/ a b)`.
    pub(crate) fn lower_arithmetic(&mut self, op: &str, args: &[Exp]) -> LowerResult {
        let (bin_op, name) = match op {
            "+" => (BinOp::Add, "tmpadd"),
            "-" => (BinOp::Sub, "tmpsub"),
            "*" => (BinOp::Mul, "tmpmul"),
            _ => (BinOp::SDiv, "tmpdiv"),
        };
        let (lhs, rhs) = self.lower_int_operands(op, args)?;
        Ok(self.builder.binary(bin_op, lhs, rhs, name))
    }

    /// `(> a b)` and friends.
    pub(crate) fn lower_comparison(&mut self, op: &str, args: &[Exp]) -> LowerResult {
        let pred = match op {
            ">" => IntPredicate::Ugt,
            "<" => IntPredicate::Ult,
            "==" => IntPredicate::Eq,
            "!=" => IntPredicate::Ne,
            ">=" => IntPredicate::Uge,
            _ => IntPredicate::Ule,
        };
        let (lhs, rhs) = self.lower_int_operands(op, args)?;
        Ok(self.builder.icmp(pred, lhs, rhs, "tmpcmp"))
    }

    /// Lower two integer operands and bring them to a common width.
    fn lower_int_operands(&mut self, op: &str, args: &[Exp]) -> LowerResult<(ValueId, ValueId)> {
        Self::expect_args(op, args, 2)?;
        let lhs = self.lower(&args[0])?;
        let rhs = self.lower(&args[1])?;

        let lhs_ty = self.builder.type_of(lhs);
        let rhs_ty = self.builder.type_of(rhs);
        let types = self.builder.types();
        let (Some(lhs_bits), Some(rhs_bits)) = (types.int_bits(lhs_ty), types.int_bits(rhs_ty))
        else {
            let bad = if types.is_int(lhs_ty) { rhs_ty } else { lhs_ty };
            return Err(self.mismatch(&format!("operand of `{op}`"), "number", bad));
        };

        Ok(if lhs_bits < rhs_bits {
            (self.builder.zext(lhs, rhs_ty, ""), rhs)
        } else if rhs_bits < lhs_bits {
            (lhs, self.builder.zext(rhs, lhs_ty, ""))
        } else {
            (lhs, rhs)
        })
    }
}
