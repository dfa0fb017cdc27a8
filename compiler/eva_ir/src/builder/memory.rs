//! Stack slots, loads, stores and struct field addressing.

use super::IrBuilder;
use crate::inst::Op;
use crate::value_id::{FunctionId, TypeId, ValueId};

impl IrBuilder {
    /// `alloca` at the insertion point.
    pub fn alloca(&mut self, ty: TypeId, name: &str) -> ValueId {
        let ptr_ty = self.ptr_type(ty);
        self.insert_value(Op::Alloca { ty }, ptr_ty, name)
    }

    /// `alloca` in the entry block of `function`, after the allocas already
    /// there. The insertion point is left unchanged.
    pub fn create_entry_alloca(&mut self, function: FunctionId, name: &str, ty: TypeId) -> ValueId {
        let ptr_ty = self.ptr_type(ty);
        let Some(entry) = self.entry_block(function) else {
            let fname = self.function_name(function).to_string();
            self.record_codegen_error(format!("entry alloca in `{fname}` which has no blocks"));
            return self.undef(ptr_ty);
        };

        let f = self.module.function(function);
        let at = f
            .block(entry)
            .insts
            .iter()
            .take_while(|&&inst| matches!(f.inst(inst).op, Op::Alloca { .. }))
            .count();

        match self.insert_at(function, entry, at, Op::Alloca { ty }, ptr_ty, name) {
            Some(v) => v,
            None => self.undef(ptr_ty),
        }
    }

    /// Load a `ty` from `ptr`, which must be a `ty*`.
    pub fn load(&mut self, ty: TypeId, ptr: ValueId, name: &str) -> ValueId {
        let ptr_ty = self.type_of(ptr);
        if !self.module.types.is_pointer(ptr_ty) {
            let shown = self.type_name(ptr_ty);
            self.record_codegen_error(format!("load through non-pointer `{shown}`"));
            return self.undef(ty);
        }
        self.insert_value(Op::Load { ty, ptr }, ty, name)
    }

    pub fn store(&mut self, value: ValueId, ptr: ValueId) {
        let ptr_ty = self.type_of(ptr);
        if !self.module.types.is_pointer(ptr_ty) {
            let shown = self.type_name(ptr_ty);
            self.record_codegen_error(format!("store through non-pointer `{shown}`"));
            return;
        }
        self.insert(Op::Store { value, ptr }, TypeId::VOID, "");
    }

    /// Address of field `index` of the struct `ptr` points to.
    pub fn struct_gep(&mut self, struct_ty: TypeId, ptr: ValueId, index: u32, name: &str) -> ValueId {
        let field_ty = self
            .module
            .types
            .struct_fields(struct_ty)
            .and_then(|fields| fields.get(index as usize).copied());
        let Some(field_ty) = field_ty else {
            let shown = self.type_name(struct_ty);
            self.record_codegen_error(format!("struct_gep index {index} out of range for `{shown}`"));
            let i8_ptr = self.ptr_type(TypeId::I8);
            return self.undef(i8_ptr);
        };
        let result_ty = self.ptr_type(field_ty);
        self.insert_value(
            Op::StructGep {
                struct_ty,
                ptr,
                index,
            },
            result_ty,
            name,
        )
    }
}
