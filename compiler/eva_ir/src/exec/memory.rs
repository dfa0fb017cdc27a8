//! Slot-addressed memory for the interpreter.
//!
//! Memory is a list of allocations, each a vector of slots. A scalar
//! (integer, pointer, function pointer) occupies one slot; aggregates are
//! flattened, so field `i` of a struct sits at the sum of the slot counts of
//! fields `0..i`. `malloc(n)` hands out `n` slots, which is never less than
//! the slot count of a type whose byte size is `n`.

use crate::error::ExecError;
use crate::types::{Type, TypeTable};
use crate::value_id::{FunctionId, TypeId};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pointer {
    pub alloc: u32,
    pub offset: u64,
}

/// A runtime value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RtValue {
    /// Integer stored zero-extended to 64 bits.
    Int { bits: u32, value: u64 },
    Ptr(Pointer),
    Null,
    Func(FunctionId),
    Undef,
}

pub(crate) fn mask(bits: u32, value: u64) -> u64 {
    if bits >= 64 {
        value
    } else {
        value & ((1u64 << bits) - 1)
    }
}

impl RtValue {
    pub fn int(bits: u32, value: i64) -> Self {
        RtValue::Int {
            bits,
            value: mask(bits, value as u64),
        }
    }

    /// Sign-extended integer value.
    pub fn as_i64(self) -> Option<i64> {
        match self {
            RtValue::Int { bits, value } if bits == 0 || bits >= 64 => Some(value as i64),
            RtValue::Int { bits, value } => {
                let shift = 64 - bits;
                Some(((value << shift) as i64) >> shift)
            }
            _ => None,
        }
    }

    /// Zero-extended integer value.
    pub fn as_u64(self) -> Option<u64> {
        match self {
            RtValue::Int { value, .. } => Some(value),
            _ => None,
        }
    }
}

/// Number of slots a value of `ty` occupies.
pub(crate) fn slot_count(types: &TypeTable, ty: TypeId) -> u64 {
    match types.get(ty) {
        Type::Void => 0,
        Type::Int(_) | Type::Pointer(_) | Type::Function(_) => 1,
        Type::Array { elem, len } => len * slot_count(types, *elem),
        Type::Struct(_) => types
            .struct_fields(ty)
            .map_or(0, |fields| fields.iter().map(|&f| slot_count(types, f)).sum()),
    }
}

#[derive(Default)]
pub(crate) struct Memory {
    allocs: Vec<Vec<RtValue>>,
}

impl Memory {
    pub(crate) fn allocate(&mut self, slots: u64) -> Pointer {
        let alloc = u32::try_from(self.allocs.len()).unwrap_or(u32::MAX);
        let len = usize::try_from(slots.max(1)).unwrap_or(usize::MAX);
        self.allocs.push(vec![RtValue::Undef; len]);
        Pointer { alloc, offset: 0 }
    }

    fn slot(&mut self, ptr: Pointer) -> Result<&mut RtValue, ExecError> {
        let offset = usize::try_from(ptr.offset).map_err(|_| ExecError::OutOfBounds)?;
        self.allocs
            .get_mut(ptr.alloc as usize)
            .and_then(|a| a.get_mut(offset))
            .ok_or(ExecError::OutOfBounds)
    }

    pub(crate) fn read(&mut self, ptr: Pointer) -> Result<RtValue, ExecError> {
        self.slot(ptr).map(|v| *v)
    }

    pub(crate) fn write(&mut self, ptr: Pointer, value: RtValue) -> Result<(), ExecError> {
        *self.slot(ptr)? = value;
        Ok(())
    }

    /// Bytes of the NUL-terminated string starting at `ptr`.
    pub(crate) fn c_string(&mut self, mut ptr: Pointer) -> Result<Vec<u8>, ExecError> {
        let mut bytes = Vec::new();
        loop {
            match self.read(ptr)? {
                RtValue::Int { value: 0, .. } => return Ok(bytes),
                RtValue::Int { value, .. } => bytes.push(u8::try_from(value & 0xff).unwrap_or(0)),
                _ => return Err(ExecError::Unsupported("non-byte in C string".to_string())),
            }
            ptr.offset += 1;
        }
    }
}
