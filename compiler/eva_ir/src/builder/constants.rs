//! Constants and globals for `IrBuilder`.

use super::IrBuilder;
use crate::module::{Constant, Linkage, ValueKind};
use crate::value_id::{GlobalId, TypeId, ValueId};

impl IrBuilder {
    pub fn const_int(&mut self, ty: TypeId, value: i64) -> ValueId {
        if !self.module.types.is_int(ty) {
            let shown = self.type_name(ty);
            self.record_codegen_error(format!("integer constant of type `{shown}`"));
        }
        self.module.add_value(ty, ValueKind::ConstInt(value), String::new())
    }

    #[inline]
    pub fn const_i32(&mut self, value: i32) -> ValueId {
        self.const_int(TypeId::I32, i64::from(value))
    }

    #[inline]
    pub fn const_i64(&mut self, value: i64) -> ValueId {
        self.const_int(TypeId::I64, value)
    }

    #[inline]
    pub fn const_bool(&mut self, value: bool) -> ValueId {
        self.const_int(TypeId::I1, i64::from(value))
    }

    /// Null of pointer type `ty`.
    pub fn const_null(&mut self, ty: TypeId) -> ValueId {
        self.module.add_value(ty, ValueKind::Null, String::new())
    }

    /// Add a module global. `name` is made unique if already taken.
    pub fn add_global(
        &mut self,
        name: &str,
        value_ty: TypeId,
        init: Option<Constant>,
        constant: bool,
    ) -> GlobalId {
        self.module
            .add_global(name, value_ty, init, constant, Linkage::External)
    }

    /// Replace the initializer of an existing global.
    pub fn set_global_init(&mut self, global: GlobalId, init: Constant) {
        self.module.set_global_init(global, init);
    }

    /// Pointer value addressing `global`.
    pub fn global_value(&self, global: GlobalId) -> ValueId {
        self.module.global(global).value
    }

    pub fn get_global(&self, name: &str) -> Option<GlobalId> {
        self.module.global_named(name)
    }

    /// Emit a private NUL-terminated byte array holding `text` and return an
    /// `i8*` to its first byte.
    pub fn global_string_ptr(&mut self, text: &str, name: &str) -> ValueId {
        let mut bytes = text.as_bytes().to_vec();
        bytes.push(0);
        let len = bytes.len() as u64;
        let array_ty = self.module.types.array(TypeId::I8, len);
        let global = self.module.add_global(
            name,
            array_ty,
            Some(Constant::Bytes(bytes)),
            true,
            Linkage::Private,
        );
        let i8_ptr = self.module.types.pointer(TypeId::I8);
        self.module
            .add_value(i8_ptr, ValueKind::StringPtr(global), String::new())
    }
}
