//! Casts.

use super::IrBuilder;
use crate::inst::{CastOp, Op};
use crate::value_id::{TypeId, ValueId};

impl IrBuilder {
    pub fn cast(&mut self, op: CastOp, value: ValueId, to: TypeId, name: &str) -> ValueId {
        self.insert_value(Op::Cast { op, value, to }, to, name)
    }

    /// Reinterpret a pointer as another pointer type.
    pub fn bitcast(&mut self, value: ValueId, to: TypeId, name: &str) -> ValueId {
        self.cast(CastOp::Bitcast, value, to, name)
    }

    pub fn zext(&mut self, value: ValueId, to: TypeId, name: &str) -> ValueId {
        self.cast(CastOp::ZExt, value, to, name)
    }

    pub fn trunc(&mut self, value: ValueId, to: TypeId, name: &str) -> ValueId {
        self.cast(CastOp::Trunc, value, to, name)
    }
}
