//! Typed SSA intermediate representation for the Eva compiler.
//!
//! A small, self-contained model of the LLVM IR subset the Eva code
//! generator emits, with typed pointers:
//!
//! - [`TypeTable`]: interned integer, pointer, array, function and named
//!   struct types.
//! - [`Module`]: functions, basic blocks, instructions and globals, all
//!   addressed by `Copy` ids ([`ValueId`], [`BlockId`], ...).
//! - [`IrBuilder`]: insertion-point based construction.
//! - [`verify_module`]: structural and type checks.
//! - [`Module::to_ir`]: LLVM assembly text.
//! - [`DataLayout`]: `alloc_size` for heap allocation.
//! - [`exec`]: a reference interpreter used by tests and `--run`.

mod builder;
mod error;
pub mod exec;
mod inst;
mod layout;
mod module;
mod printer;
mod types;
mod value_id;
mod verify;

pub use builder::IrBuilder;
pub use error::{ExecError, VerifyError};
pub use inst::{BinOp, CastOp, Instruction, IntPredicate, Op};
pub use layout::DataLayout;
pub use module::{Block, Constant, Function, Global, Linkage, Module, ValueData, ValueKind};
pub use types::{FnSig, NamedStruct, Type, TypeTable};
pub use value_id::{BlockId, FunctionId, GlobalId, InstId, StructId, TypeId, ValueId};
pub use verify::verify_module;

impl Module {
    /// Run [`verify_module`] on this module.
    pub fn verify(&self) -> Result<(), VerifyError> {
        verify_module(self)
    }
}
