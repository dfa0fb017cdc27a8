//! Target data layout queries.

use crate::types::{Type, TypeTable};
use crate::value_id::TypeId;

/// Size and alignment rules for a 64-bit target with natural alignment.
#[derive(Clone, Copy, Debug)]
pub struct DataLayout {
    pub pointer_size: u64,
}

impl Default for DataLayout {
    fn default() -> Self {
        DataLayout { pointer_size: 8 }
    }
}

impl DataLayout {
    /// ABI alignment of `ty` in bytes.
    pub fn align(&self, types: &TypeTable, ty: TypeId) -> u64 {
        match types.get(ty) {
            Type::Void => 1,
            Type::Int(bits) => u64::from(bits.div_ceil(8)).next_power_of_two().min(8),
            Type::Pointer(_) | Type::Function(_) => self.pointer_size,
            Type::Array { elem, .. } => self.align(types, *elem),
            Type::Struct(_) => types.struct_fields(ty).map_or(1, |fields| {
                fields
                    .iter()
                    .map(|&f| self.align(types, f))
                    .max()
                    .unwrap_or(1)
            }),
        }
    }

    /// Bytes `malloc` must provide for one value of `ty`, tail padding included.
    /// Opaque structs report 0.
    pub fn alloc_size(&self, types: &TypeTable, ty: TypeId) -> u64 {
        match types.get(ty) {
            Type::Void => 0,
            Type::Int(bits) => {
                let bytes = u64::from(bits.div_ceil(8));
                bytes.next_multiple_of(self.align(types, ty))
            }
            Type::Pointer(_) | Type::Function(_) => self.pointer_size,
            Type::Array { elem, len } => len * self.alloc_size(types, *elem),
            Type::Struct(_) => {
                let Some(fields) = types.struct_fields(ty) else {
                    return 0;
                };
                let mut offset: u64 = 0;
                for &field in fields {
                    offset = offset.next_multiple_of(self.align(types, field));
                    offset += self.alloc_size(types, field);
                }
                offset.next_multiple_of(self.align(types, ty))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_sizes() {
        let mut types = TypeTable::new();
        let dl = DataLayout::default();
        let ptr = types.pointer(TypeId::I8);
        assert_eq!(dl.alloc_size(&types, TypeId::I1), 1);
        assert_eq!(dl.alloc_size(&types, TypeId::I8), 1);
        assert_eq!(dl.alloc_size(&types, TypeId::I32), 4);
        assert_eq!(dl.alloc_size(&types, TypeId::I64), 8);
        assert_eq!(dl.alloc_size(&types, ptr), 8);
    }

    #[test]
    fn struct_with_vtable_slot_is_padded() {
        let mut types = TypeTable::new();
        let dl = DataLayout::default();
        let vtable = types.named_struct("Point_vTable");
        let vtable_ptr = types.pointer(vtable);
        let point = types.named_struct("Point");
        types.set_struct_body(point, vec![vtable_ptr, TypeId::I32, TypeId::I32]);
        assert_eq!(dl.alloc_size(&types, point), 16);

        let odd = types.named_struct("Odd");
        types.set_struct_body(odd, vec![vtable_ptr, TypeId::I32]);
        assert_eq!(dl.alloc_size(&types, odd), 16);

        let packed = types.named_struct("Bytes");
        types.set_struct_body(packed, vec![TypeId::I8, TypeId::I1, TypeId::I32]);
        assert_eq!(dl.alloc_size(&types, packed), 8);
    }

    #[test]
    fn arrays_and_opaque() {
        let mut types = TypeTable::new();
        let dl = DataLayout::default();
        let arr = types.array(TypeId::I8, 13);
        assert_eq!(dl.alloc_size(&types, arr), 13);
        let opaque = types.named_struct("Later");
        assert_eq!(dl.alloc_size(&types, opaque), 0);
    }
}
