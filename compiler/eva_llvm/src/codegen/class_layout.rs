//! Class layout and vtables.
//!
//! Every class instance is a struct whose slot [`VTABLE_INDEX`] points at
//! the class's vtable, followed by the fields. A subclass starts from copies
//! of its parent's field and method lists and appends its own members, so
//! inherited field indices and vtable slots never move. Overriding a method
//! replaces the implementation in its existing slot.
//!
//! ```text
//! %Point3D = type { %Point3D_vTable*, i32, i32, i32 }
//!                   ^ reserved         x    y    z
//! %Point3D_vTable = type { i32 (%Point3D*, i32, i32, i32)*, i32 (%Point*)* }
//! ```
//!
//! A class is declared (opaque struct, inherited lists), populated with its
//! own `var` and `def` members, then finalized: the struct body, the vtable
//! struct type and the constant `@Name_vTable` global are emitted once.

use eva_ir::{Constant, FunctionId, GlobalId, IrBuilder, TypeId, TypeTable};
use eva_syntax::Exp;
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::error::CompileError;

/// Slot of the vtable pointer in every instance.
pub const VTABLE_INDEX: u32 = 0;

/// Slots preceding the first field.
pub const RESERVED_FIELDS_COUNT: u32 = 1;

// ---------------------------------------------------------------------------
// ClassInfo
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldInfo {
    pub name: String,
    pub ty: TypeId,
    /// Value stored by `new` before the constructor runs.
    pub init: Option<Exp>,
    /// Class that declared the field last.
    pub owner: String,
}

/// One vtable slot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MethodSlot {
    pub name: String,
    /// Most-derived implementation so far.
    pub function: FunctionId,
    /// Class that supplied `function`.
    pub owner: String,
}

#[derive(Clone, Debug)]
pub struct ClassInfo {
    pub name: String,
    pub parent: Option<String>,
    /// The instance struct type (not the pointer).
    pub ty: TypeId,
    pub vtable_ty: TypeId,
    /// The `Name_vTable` global, once finalized.
    pub vtable: Option<GlobalId>,
    fields: Vec<FieldInfo>,
    field_indices: FxHashMap<String, usize>,
    methods: Vec<MethodSlot>,
    method_indices: FxHashMap<String, usize>,
}

impl ClassInfo {
    /// Merged field list, inherited fields first.
    pub fn fields(&self) -> &[FieldInfo] {
        &self.fields
    }

    /// Merged method list in vtable order.
    pub fn methods(&self) -> &[MethodSlot] {
        &self.methods
    }

    pub fn is_finalized(&self) -> bool {
        self.vtable.is_some()
    }

    /// Struct index of `field`, counting the reserved slot.
    pub fn field_index(&self, field: &str) -> Option<u32> {
        self.field_indices
            .get(field)
            .map(|&i| i as u32 + RESERVED_FIELDS_COUNT)
    }

    pub fn field(&self, field: &str) -> Option<&FieldInfo> {
        self.field_indices.get(field).map(|&i| &self.fields[i])
    }

    /// Vtable slot of `method`.
    pub fn method_index(&self, method: &str) -> Option<u32> {
        self.method_indices.get(method).map(|&i| i as u32)
    }

    /// The implementation `method` dispatches to for this exact class.
    pub fn resolve_method(&self, method: &str) -> Option<FunctionId> {
        self.method_indices
            .get(method)
            .map(|&i| self.methods[i].function)
    }

    /// Append `name`, or take over the inherited field of the same name in
    /// place. The slot and type of an inherited field never change.
    fn add_field(&mut self, name: &str, ty: TypeId, init: Option<Exp>) -> Result<(), CompileError> {
        match self.field_indices.get(name) {
            Some(&i) if self.fields[i].owner == self.name => Err(CompileError::class(
                &self.name,
                format!("field `{name}` is already defined"),
            )),
            Some(&i) if self.fields[i].ty != ty => Err(CompileError::class(
                &self.name,
                format!("field `{name}` is redeclared with a different type"),
            )),
            Some(&i) => {
                let field = &mut self.fields[i];
                field.init = init;
                field.owner.clone_from(&self.name);
                Ok(())
            }
            None => {
                self.field_indices.insert(name.to_string(), self.fields.len());
                self.fields.push(FieldInfo {
                    name: name.to_string(),
                    ty,
                    init,
                    owner: self.name.clone(),
                });
                Ok(())
            }
        }
    }

    fn add_method(&mut self, name: &str, function: FunctionId) -> Result<(), CompileError> {
        let slot = MethodSlot {
            name: name.to_string(),
            function,
            owner: self.name.clone(),
        };
        match self.method_indices.get(name) {
            Some(&i) if self.methods[i].owner == self.name => Err(CompileError::class(
                &self.name,
                format!("method `{name}` is defined twice"),
            )),
            Some(&i) => {
                self.methods[i] = slot;
                Ok(())
            }
            None => {
                self.method_indices.insert(name.to_string(), self.methods.len());
                self.methods.push(slot);
                Ok(())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// ClassRegistry
// ---------------------------------------------------------------------------

/// All classes of one compilation, by name and by struct type.
#[derive(Debug, Default)]
pub struct ClassRegistry {
    classes: FxHashMap<String, ClassInfo>,
    by_type: FxHashMap<TypeId, String>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&ClassInfo> {
        self.classes.get(name)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Register `name` with an opaque struct, inheriting `parent`'s lists.
    pub fn declare(
        &mut self,
        builder: &mut IrBuilder,
        name: &str,
        parent: Option<&str>,
    ) -> Result<&ClassInfo, CompileError> {
        if self.classes.contains_key(name) {
            return Err(CompileError::class(name, "class is already defined"));
        }
        let (fields, methods) = match parent {
            None => (Vec::new(), Vec::new()),
            Some(parent_name) => {
                let parent = self
                    .classes
                    .get(parent_name)
                    .filter(|p| p.is_finalized())
                    .ok_or_else(|| {
                        CompileError::class(name, format!("unknown parent class `{parent_name}`"))
                    })?;
                (parent.fields.clone(), parent.methods.clone())
            }
        };
        let ty = builder.named_struct(name);
        let vtable_ty = builder.named_struct(&format!("{name}_vTable"));
        let field_indices = index_by_name(fields.iter().map(|f| f.name.as_str()));
        let method_indices = index_by_name(methods.iter().map(|m| m.name.as_str()));
        debug!(class = name, ?parent, "declare class");
        self.by_type.insert(ty, name.to_string());
        let info = self
            .classes
            .entry(name.to_string())
            .or_insert(ClassInfo {
                name: name.to_string(),
                parent: parent.map(str::to_string),
                ty,
                vtable_ty,
                vtable: None,
                fields,
                field_indices,
                methods,
                method_indices,
            });
        Ok(&*info)
    }

    /// Append `field` with an optional initializer, or re-initialize the
    /// inherited field of the same name.
    pub fn add_field(
        &mut self,
        class: &str,
        field: &str,
        ty: TypeId,
        init: Option<Exp>,
    ) -> Result<(), CompileError> {
        self.get_mut(class)?.add_field(field, ty, init)
    }

    /// Append `method`, or override the inherited slot of the same name.
    pub fn add_method(
        &mut self,
        class: &str,
        method: &str,
        function: FunctionId,
    ) -> Result<(), CompileError> {
        self.get_mut(class)?.add_method(method, function)
    }

    /// Emit the struct body, the vtable type and the vtable constant.
    pub fn finalize(&mut self, builder: &mut IrBuilder, class: &str) -> Result<(), CompileError> {
        let info = self.get_mut(class)?;
        if info.is_finalized() {
            return Err(CompileError::class(class, "class is already finalized"));
        }

        let slot_types: Vec<TypeId> = info
            .methods
            .iter()
            .map(|m| {
                let fn_ty = builder.function_type(m.function);
                builder.ptr_type(fn_ty)
            })
            .collect();
        builder.set_struct_body(info.vtable_ty, &slot_types);

        let vtable_ptr = builder.ptr_type(info.vtable_ty);
        let body: Vec<TypeId> = std::iter::once(vtable_ptr)
            .chain(info.fields.iter().map(|f| f.ty))
            .collect();
        builder.set_struct_body(info.ty, &body);

        let init = Constant::Struct(
            info.methods
                .iter()
                .map(|m| Constant::Function(m.function))
                .collect(),
        );
        let vtable = builder.add_global(&format!("{class}_vTable"), info.vtable_ty, Some(init), true);
        info.vtable = Some(vtable);
        debug!(
            class,
            fields = info.fields.len(),
            methods = info.methods.len(),
            "finalize class"
        );
        Ok(())
    }

    /// The class whose instances have pointer type `ty`.
    pub fn class_of(&self, types: &TypeTable, ty: TypeId) -> Option<&ClassInfo> {
        let pointee = types.pointee(ty)?;
        self.by_type
            .get(&pointee)
            .and_then(|name| self.classes.get(name))
    }

    /// Struct index of `field` in `class`.
    pub fn field_index(&self, class: &str, field: &str) -> Result<u32, CompileError> {
        self.get_class(class)?
            .field_index(field)
            .ok_or_else(|| CompileError::class(class, format!("no field named `{field}`")))
    }

    /// Vtable slot of `method` in `class`.
    pub fn method_index(&self, class: &str, method: &str) -> Result<u32, CompileError> {
        self.get_class(class)?
            .method_index(method)
            .ok_or_else(|| CompileError::class(class, format!("no method named `{method}`")))
    }

    fn get_class(&self, class: &str) -> Result<&ClassInfo, CompileError> {
        self.classes
            .get(class)
            .ok_or_else(|| CompileError::UnknownType {
                name: class.to_string(),
            })
    }

    fn get_mut(&mut self, class: &str) -> Result<&mut ClassInfo, CompileError> {
        self.classes
            .get_mut(class)
            .ok_or_else(|| CompileError::UnknownType {
                name: class.to_string(),
            })
    }
}

fn index_by_name<'a>(names: impl Iterator<Item = &'a str>) -> FxHashMap<String, usize> {
    names
        .enumerate()
        .map(|(i, name)| (name.to_string(), i))
        .collect()
}

#[cfg(test)]
mod tests;
