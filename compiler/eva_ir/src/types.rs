//! Type interning.
//!
//! Structural types (`i32`, `i8*`, `[4 x i8]`, `i32 (i8*, ...)`) are hash-consed
//! so equal types share a [`TypeId`] and type equality is id equality. Named
//! structs are nominal: each [`TypeTable::named_struct`] call creates a distinct
//! type whose body may be filled in later, which is how recursive class
//! layouts (`%Node = type { %Node_vTable*, %Node* }`) are built.

use std::fmt;

use rustc_hash::FxHashMap;

use crate::value_id::{StructId, TypeId};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Type {
    Void,
    Int(u32),
    /// Typed pointer to the pointee type.
    Pointer(TypeId),
    Array { elem: TypeId, len: u64 },
    Function(FnSig),
    Struct(StructId),
}

/// Function signature.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FnSig {
    pub ret: TypeId,
    pub params: Vec<TypeId>,
    pub variadic: bool,
}

/// A nominal struct. `fields` is `None` while the struct is opaque.
#[derive(Clone, Debug)]
pub struct NamedStruct {
    pub name: String,
    pub ty: TypeId,
    pub fields: Option<Vec<TypeId>>,
}

pub struct TypeTable {
    types: Vec<Type>,
    interned: FxHashMap<Type, TypeId>,
    structs: Vec<NamedStruct>,
    struct_names: FxHashMap<String, StructId>,
}

impl Default for TypeTable {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeTable {
    /// Create a table with the primitive types pre-interned at their fixed ids.
    pub fn new() -> Self {
        let mut table = TypeTable {
            types: Vec::new(),
            interned: FxHashMap::default(),
            structs: Vec::new(),
            struct_names: FxHashMap::default(),
        };
        for ty in [
            Type::Void,
            Type::Int(1),
            Type::Int(8),
            Type::Int(32),
            Type::Int(64),
        ] {
            table.intern(ty);
        }
        debug_assert_eq!(table.intern(Type::Int(32)), TypeId::I32);
        table
    }

    pub fn intern(&mut self, ty: Type) -> TypeId {
        if let Some(&id) = self.interned.get(&ty) {
            return id;
        }
        let id = TypeId::from_index(self.types.len());
        self.types.push(ty.clone());
        self.interned.insert(ty, id);
        id
    }

    pub fn get(&self, id: TypeId) -> &Type {
        &self.types[id.index()]
    }

    pub fn int(&mut self, bits: u32) -> TypeId {
        self.intern(Type::Int(bits))
    }

    pub fn pointer(&mut self, pointee: TypeId) -> TypeId {
        self.intern(Type::Pointer(pointee))
    }

    pub fn array(&mut self, elem: TypeId, len: u64) -> TypeId {
        self.intern(Type::Array { elem, len })
    }

    pub fn function(&mut self, ret: TypeId, params: Vec<TypeId>, variadic: bool) -> TypeId {
        self.intern(Type::Function(FnSig {
            ret,
            params,
            variadic,
        }))
    }

    /// Create a new opaque named struct.
    ///
    /// Names are unique per table: a clash gets a `.N` suffix.
    pub fn named_struct(&mut self, name: &str) -> TypeId {
        let mut unique = name.to_string();
        let mut n = 0;
        while self.struct_names.contains_key(&unique) {
            n += 1;
            unique = format!("{name}.{n}");
        }
        let sid = StructId::from_index(self.structs.len());
        let ty = self.intern(Type::Struct(sid));
        self.structs.push(NamedStruct {
            name: unique.clone(),
            ty,
            fields: None,
        });
        self.struct_names.insert(unique, sid);
        ty
    }

    pub fn struct_named(&self, name: &str) -> Option<TypeId> {
        self.struct_names
            .get(name)
            .map(|sid| self.structs[sid.index()].ty)
    }

    /// Give an opaque struct its body. Returns `false` if `ty` is not a named struct.
    pub fn set_struct_body(&mut self, ty: TypeId, fields: Vec<TypeId>) -> bool {
        match *self.get(ty) {
            Type::Struct(sid) => {
                self.structs[sid.index()].fields = Some(fields);
                true
            }
            _ => false,
        }
    }

    fn named(&self, ty: TypeId) -> Option<&NamedStruct> {
        match *self.get(ty) {
            Type::Struct(sid) => Some(&self.structs[sid.index()]),
            _ => None,
        }
    }

    pub fn struct_fields(&self, ty: TypeId) -> Option<&[TypeId]> {
        self.named(ty)?.fields.as_deref()
    }

    pub fn struct_name(&self, ty: TypeId) -> Option<&str> {
        self.named(ty).map(|s| s.name.as_str())
    }

    /// Named structs in creation order.
    pub fn structs(&self) -> impl Iterator<Item = &NamedStruct> {
        self.structs.iter()
    }

    pub fn pointee(&self, ty: TypeId) -> Option<TypeId> {
        match *self.get(ty) {
            Type::Pointer(inner) => Some(inner),
            _ => None,
        }
    }

    pub fn fn_sig(&self, ty: TypeId) -> Option<&FnSig> {
        match self.get(ty) {
            Type::Function(sig) => Some(sig),
            _ => None,
        }
    }

    /// Signature behind a function-pointer type.
    pub fn callee_sig(&self, ty: TypeId) -> Option<&FnSig> {
        self.fn_sig(self.pointee(ty)?)
    }

    pub fn int_bits(&self, ty: TypeId) -> Option<u32> {
        match *self.get(ty) {
            Type::Int(bits) => Some(bits),
            _ => None,
        }
    }

    pub fn is_int(&self, ty: TypeId) -> bool {
        self.int_bits(ty).is_some()
    }

    pub fn is_pointer(&self, ty: TypeId) -> bool {
        self.pointee(ty).is_some()
    }

    /// Textual form of `ty`, e.g. `%Point*` or `i32 (i8*, ...)`.
    pub fn display(&self, ty: TypeId) -> TypeDisplay<'_> {
        TypeDisplay { table: self, ty }
    }
}

pub struct TypeDisplay<'a> {
    table: &'a TypeTable,
    ty: TypeId,
}

impl fmt::Display for TypeDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let table = self.table;
        match table.get(self.ty) {
            Type::Void => f.write_str("void"),
            Type::Int(bits) => write!(f, "i{bits}"),
            Type::Pointer(inner) => write!(f, "{}*", table.display(*inner)),
            Type::Array { elem, len } => write!(f, "[{len} x {}]", table.display(*elem)),
            Type::Struct(sid) => write!(f, "%{}", table.structs[sid.index()].name),
            Type::Function(sig) => {
                write!(f, "{} (", table.display(sig.ret))?;
                for (i, param) in sig.params.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", table.display(*param))?;
                }
                if sig.variadic {
                    if !sig.params.is_empty() {
                        f.write_str(", ")?;
                    }
                    f.write_str("...")?;
                }
                f.write_str(")")
            }
        }
    }
}
