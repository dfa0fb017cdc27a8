//! Instruction set.

use crate::value_id::{BlockId, TypeId, ValueId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    SDiv,
}

impl BinOp {
    pub fn mnemonic(self) -> &'static str {
        match self {
            BinOp::Add => "add",
            BinOp::Sub => "sub",
            BinOp::Mul => "mul",
            BinOp::SDiv => "sdiv",
        }
    }
}

/// Integer comparison predicates. Orderings are unsigned.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IntPredicate {
    Eq,
    Ne,
    Ugt,
    Uge,
    Ult,
    Ule,
}

impl IntPredicate {
    pub fn mnemonic(self) -> &'static str {
        match self {
            IntPredicate::Eq => "eq",
            IntPredicate::Ne => "ne",
            IntPredicate::Ugt => "ugt",
            IntPredicate::Uge => "uge",
            IntPredicate::Ult => "ult",
            IntPredicate::Ule => "ule",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CastOp {
    Bitcast,
    ZExt,
    Trunc,
}

impl CastOp {
    pub fn mnemonic(self) -> &'static str {
        match self {
            CastOp::Bitcast => "bitcast",
            CastOp::ZExt => "zext",
            CastOp::Trunc => "trunc",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Op {
    Alloca {
        ty: TypeId,
    },
    Load {
        ty: TypeId,
        ptr: ValueId,
    },
    Store {
        value: ValueId,
        ptr: ValueId,
    },
    Binary {
        op: BinOp,
        lhs: ValueId,
        rhs: ValueId,
    },
    ICmp {
        pred: IntPredicate,
        lhs: ValueId,
        rhs: ValueId,
    },
    /// `getelementptr inbounds %S, %S* ptr, i32 0, i32 index`
    StructGep {
        struct_ty: TypeId,
        ptr: ValueId,
        index: u32,
    },
    Cast {
        op: CastOp,
        value: ValueId,
        to: TypeId,
    },
    /// `fn_ty` is the callee's function type (not the pointer type).
    Call {
        callee: ValueId,
        fn_ty: TypeId,
        args: Vec<ValueId>,
    },
    Phi {
        ty: TypeId,
        incoming: Vec<(ValueId, BlockId)>,
    },
    Br {
        dest: BlockId,
    },
    CondBr {
        cond: ValueId,
        then_bb: BlockId,
        else_bb: BlockId,
    },
    Ret {
        value: Option<ValueId>,
    },
}

impl Op {
    pub fn is_terminator(&self) -> bool {
        matches!(self, Op::Br { .. } | Op::CondBr { .. } | Op::Ret { .. })
    }

    /// Every value this instruction reads.
    pub fn operands(&self) -> Vec<ValueId> {
        match self {
            Op::Alloca { .. } | Op::Br { .. } => Vec::new(),
            Op::Load { ptr, .. } | Op::StructGep { ptr, .. } => vec![*ptr],
            Op::Store { value, ptr } => vec![*value, *ptr],
            Op::Binary { lhs, rhs, .. } | Op::ICmp { lhs, rhs, .. } => vec![*lhs, *rhs],
            Op::Cast { value, .. } => vec![*value],
            Op::Call { callee, args, .. } => {
                let mut all = Vec::with_capacity(args.len() + 1);
                all.push(*callee);
                all.extend_from_slice(args);
                all
            }
            Op::Phi { incoming, .. } => incoming.iter().map(|(v, _)| *v).collect(),
            Op::CondBr { cond, .. } => vec![*cond],
            Op::Ret { value } => value.iter().copied().collect(),
        }
    }

    /// Blocks this instruction refers to (branch targets and phi predecessors).
    pub fn blocks(&self) -> Vec<BlockId> {
        match self {
            Op::Br { dest } => vec![*dest],
            Op::CondBr {
                then_bb, else_bb, ..
            } => vec![*then_bb, *else_bb],
            Op::Phi { incoming, .. } => incoming.iter().map(|(_, b)| *b).collect(),
            _ => Vec::new(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Instruction {
    pub op: Op,
    pub result: Option<ValueId>,
    pub block: BlockId,
}
