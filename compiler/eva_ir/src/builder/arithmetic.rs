//! Integer arithmetic and comparisons.

use super::IrBuilder;
use crate::inst::{BinOp, IntPredicate, Op};
use crate::value_id::{TypeId, ValueId};

impl IrBuilder {
    pub fn binary(&mut self, op: BinOp, lhs: ValueId, rhs: ValueId, name: &str) -> ValueId {
        let ty = self.type_of(lhs);
        if !self.module.types.is_int(ty) {
            let shown = self.type_name(ty);
            self.record_codegen_error(format!("`{}` on non-integer `{shown}`", op.mnemonic()));
            return self.undef(ty);
        }
        self.insert_value(Op::Binary { op, lhs, rhs }, ty, name)
    }

    #[inline]
    pub fn add(&mut self, lhs: ValueId, rhs: ValueId, name: &str) -> ValueId {
        self.binary(BinOp::Add, lhs, rhs, name)
    }

    #[inline]
    pub fn sub(&mut self, lhs: ValueId, rhs: ValueId, name: &str) -> ValueId {
        self.binary(BinOp::Sub, lhs, rhs, name)
    }

    #[inline]
    pub fn mul(&mut self, lhs: ValueId, rhs: ValueId, name: &str) -> ValueId {
        self.binary(BinOp::Mul, lhs, rhs, name)
    }

    #[inline]
    pub fn sdiv(&mut self, lhs: ValueId, rhs: ValueId, name: &str) -> ValueId {
        self.binary(BinOp::SDiv, lhs, rhs, name)
    }

    /// Integer comparison producing `i1`.
    pub fn icmp(&mut self, pred: IntPredicate, lhs: ValueId, rhs: ValueId, name: &str) -> ValueId {
        self.insert_value(Op::ICmp { pred, lhs, rhs }, TypeId::I1, name)
    }
}
