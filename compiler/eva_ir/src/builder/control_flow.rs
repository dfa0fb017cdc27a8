//! Terminators and phi nodes.

use super::IrBuilder;
use crate::inst::Op;
use crate::value_id::{BlockId, TypeId, ValueId};

impl IrBuilder {
    pub fn br(&mut self, dest: BlockId) {
        self.insert(Op::Br { dest }, TypeId::VOID, "");
    }

    pub fn cond_br(&mut self, cond: ValueId, then_bb: BlockId, else_bb: BlockId) {
        self.insert(
            Op::CondBr {
                cond,
                then_bb,
                else_bb,
            },
            TypeId::VOID,
            "",
        );
    }

    pub fn ret(&mut self, value: ValueId) {
        self.insert(Op::Ret { value: Some(value) }, TypeId::VOID, "");
    }

    pub fn ret_void(&mut self) {
        self.insert(Op::Ret { value: None }, TypeId::VOID, "");
    }

    /// Phi merging `incoming` (value, predecessor) pairs.
    pub fn phi(&mut self, ty: TypeId, incoming: &[(ValueId, BlockId)], name: &str) -> ValueId {
        self.insert_value(
            Op::Phi {
                ty,
                incoming: incoming.to_vec(),
            },
            ty,
            name,
        )
    }
}
