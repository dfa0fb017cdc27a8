//! Opaque `Copy` handles into the [`Module`](crate::Module) arenas.
//!
//! Every type, value, block, instruction, function and global lives in a
//! `Vec` owned by the module; callers only ever hold these `u32` indices.

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u32);

        impl $name {
            #[inline]
            pub(crate) fn from_index(index: usize) -> Self {
                Self(u32::try_from(index).unwrap_or(u32::MAX))
            }

            /// The raw index.
            #[inline]
            pub fn raw(self) -> u32 {
                self.0
            }

            #[inline]
            pub(crate) fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

define_id!(
    /// Handle to an interned type.
    TypeId
);
define_id!(
    /// Handle to a value (constant, function, global, parameter or instruction result).
    ValueId
);
define_id!(
    /// Handle to a basic block inside a function.
    BlockId
);
define_id!(
    /// Handle to a module function (defined or declared).
    FunctionId
);
define_id!(
    /// Handle to a module global variable.
    GlobalId
);
define_id!(
    /// Handle to an instruction inside a function.
    InstId
);
define_id!(
    /// Handle to a named struct type.
    StructId
);

impl TypeId {
    pub const VOID: Self = Self(0);
    pub const I1: Self = Self(1);
    pub const I8: Self = Self(2);
    pub const I32: Self = Self(3);
    pub const I64: Self = Self(4);
}
