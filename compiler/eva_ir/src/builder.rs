//! ID-based instruction builder.
//!
//! `IrBuilder` owns the [`Module`] under construction and an insertion
//! point (current function + current block). Callers only handle `Copy`
//! ids. Misuse such as emitting without an insertion point or loading
//! through a non-pointer is not a panic: the builder records a codegen
//! error, returns an `undef` placeholder, and [`IrBuilder::finish`] refuses
//! to hand out the module.
//!
//! # Method Organization
//!
//! | Category | File | Methods |
//! |----------|------|---------|
//! | Constants / globals | `constants.rs` | `const_i32`, `const_bool`, `const_null`, `global_string_ptr`, `add_global` |
//! | Memory | `memory.rs` | `alloca`, `create_entry_alloca`, `load`, `store`, `struct_gep` |
//! | Arithmetic / compare | `arithmetic.rs` | `add`, `sub`, `mul`, `sdiv`, `icmp` |
//! | Conversions | `conversions.rs` | `bitcast`, `zext`, `trunc` |
//! | Control flow | `control_flow.rs` | `br`, `cond_br`, `phi`, `ret`, `ret_void` |
//! | Calls | `calls.rs` | `call` |
//! | Types / blocks / functions | here | `ptr_type`, `fn_type`, `append_block`, `declare_function`, ... |

mod arithmetic;
mod calls;
mod constants;
mod control_flow;
mod conversions;
mod memory;

#[cfg(test)]
mod tests;

use tracing::error;

use crate::error::VerifyError;
use crate::inst::{Instruction, Op};
use crate::module::{Block, Module, ValueKind};
use crate::value_id::{BlockId, FunctionId, InstId, TypeId, ValueId};

pub struct IrBuilder {
    module: Module,
    current_function: Option<FunctionId>,
    current_block: Option<BlockId>,
    /// Messages for misuse detected while building.
    errors: Vec<String>,
}

impl IrBuilder {
    pub fn new(module_name: &str) -> Self {
        IrBuilder {
            module: Module::new(module_name),
            current_function: None,
            current_block: None,
            errors: Vec::new(),
        }
    }

    pub fn module(&self) -> &Module {
        &self.module
    }

    pub fn set_target_triple(&mut self, triple: &str) {
        self.module.target_triple = Some(triple.to_string());
    }

    pub(crate) fn record_codegen_error(&mut self, message: String) {
        error!(%message, "codegen error");
        self.errors.push(message);
    }

    pub fn codegen_error_count(&self) -> usize {
        self.errors.len()
    }

    /// Hand out the finished module, or the first recorded codegen error.
    pub fn finish(self) -> Result<Module, VerifyError> {
        match self.errors.into_iter().next() {
            Some(message) => Err(VerifyError::new("builder", message)),
            None => Ok(self.module),
        }
    }

    // -----------------------------------------------------------------------
    // Types
    // -----------------------------------------------------------------------

    pub fn type_of(&self, value: ValueId) -> TypeId {
        self.module.type_of(value)
    }

    pub fn types(&self) -> &crate::TypeTable {
        &self.module.types
    }

    pub fn ptr_type(&mut self, pointee: TypeId) -> TypeId {
        self.module.types.pointer(pointee)
    }

    pub fn array_type(&mut self, elem: TypeId, len: u64) -> TypeId {
        self.module.types.array(elem, len)
    }

    pub fn fn_type(&mut self, ret: TypeId, params: &[TypeId], variadic: bool) -> TypeId {
        self.module.types.function(ret, params.to_vec(), variadic)
    }

    pub fn named_struct(&mut self, name: &str) -> TypeId {
        self.module.types.named_struct(name)
    }

    pub fn set_struct_body(&mut self, ty: TypeId, fields: &[TypeId]) {
        if !self.module.types.set_struct_body(ty, fields.to_vec()) {
            let shown = self.module.types.display(ty).to_string();
            self.record_codegen_error(format!("set_struct_body on non-struct `{shown}`"));
        }
    }

    /// Render a type for diagnostics.
    pub fn type_name(&self, ty: TypeId) -> String {
        self.module.types.display(ty).to_string()
    }

    // -----------------------------------------------------------------------
    // Functions
    // -----------------------------------------------------------------------

    /// Add a function with signature `fn_ty`. Parameter names are optional.
    pub fn declare_function(
        &mut self,
        name: &str,
        fn_ty: TypeId,
        param_names: &[&str],
    ) -> FunctionId {
        if self.module.types.fn_sig(fn_ty).is_none() {
            let shown = self.type_name(fn_ty);
            self.record_codegen_error(format!("`{name}` declared with non-function type `{shown}`"));
        }
        self.module.add_function(name, fn_ty, param_names)
    }

    /// Existing function named `name`, or a fresh declaration.
    pub fn get_or_declare_function(&mut self, name: &str, fn_ty: TypeId) -> FunctionId {
        match self.module.function_named(name) {
            Some(id) => id,
            None => self.declare_function(name, fn_ty, &[]),
        }
    }

    pub fn get_function(&self, name: &str) -> Option<FunctionId> {
        self.module.function_named(name)
    }

    pub fn function_name(&self, function: FunctionId) -> &str {
        &self.module.function(function).name
    }

    /// Function-pointer value for `function`.
    pub fn function_value(&self, function: FunctionId) -> ValueId {
        self.module.function(function).value
    }

    /// The function type (not pointer) of `function`.
    pub fn function_type(&self, function: FunctionId) -> TypeId {
        self.module.function(function).ty
    }

    pub fn param(&self, function: FunctionId, index: usize) -> Option<ValueId> {
        self.module.function(function).params.get(index).copied()
    }

    pub fn params(&self, function: FunctionId) -> Vec<ValueId> {
        self.module.function(function).params.clone()
    }

    // -----------------------------------------------------------------------
    // Blocks and positioning
    // -----------------------------------------------------------------------

    /// Create a block and append it to the function's layout.
    pub fn append_block(&mut self, function: FunctionId, name: &str) -> BlockId {
        let bb = self.create_block(function, name);
        self.attach_block(function, bb);
        bb
    }

    /// Create a block that is not yet part of the layout.
    pub fn create_block(&mut self, function: FunctionId, name: &str) -> BlockId {
        let f = self.module.function_mut(function);
        let id = BlockId::from_index(f.blocks.len());
        let name = f.names.unique(name);
        f.blocks.push(Block {
            name,
            insts: Vec::new(),
            attached: false,
        });
        id
    }

    /// Append a detached block to the end of the function's layout.
    pub fn attach_block(&mut self, function: FunctionId, block: BlockId) {
        if block.index() >= self.module.function(function).blocks.len() {
            self.record_codegen_error(format!("attach of unknown block {}", block.raw()));
            return;
        }
        let f = self.module.function_mut(function);
        let b = &mut f.blocks[block.index()];
        if !b.attached {
            b.attached = true;
            f.layout.push(block);
        }
    }

    pub fn set_current_function(&mut self, function: FunctionId) {
        self.current_function = Some(function);
    }

    pub fn current_function(&self) -> Option<FunctionId> {
        self.current_function
    }

    pub fn position_at_end(&mut self, block: BlockId) {
        self.current_block = Some(block);
    }

    pub fn current_block(&self) -> Option<BlockId> {
        self.current_block
    }

    /// Clear the insertion point.
    pub fn clear_position(&mut self) {
        self.current_function = None;
        self.current_block = None;
    }

    pub fn block_terminated(&self, function: FunctionId, block: BlockId) -> bool {
        self.module.function(function).terminator(block).is_some()
    }

    pub fn current_block_terminated(&self) -> bool {
        match (self.current_function, self.current_block) {
            (Some(f), Some(b)) => self.block_terminated(f, b),
            _ => false,
        }
    }

    pub fn entry_block(&self, function: FunctionId) -> Option<BlockId> {
        self.module.function(function).entry_block()
    }

    // -----------------------------------------------------------------------
    // Insertion
    // -----------------------------------------------------------------------

    /// Placeholder returned after misuse.
    pub(crate) fn undef(&mut self, ty: TypeId) -> ValueId {
        self.module.add_value(ty, ValueKind::Undef, String::new())
    }

    /// Append `op` at the insertion point. Returns the result value when
    /// `result_ty` is not `void`.
    pub(crate) fn insert(&mut self, op: Op, result_ty: TypeId, name: &str) -> Option<ValueId> {
        let (Some(function), Some(block)) = (self.current_function, self.current_block) else {
            self.record_codegen_error(format!("{op:?} emitted without an insertion point"));
            return (result_ty != TypeId::VOID).then(|| self.undef(result_ty));
        };
        let at = self.module.function(function).block(block).insts.len();
        self.insert_at(function, block, at, op, result_ty, name)
    }

    /// Like [`insert`](Self::insert) for value-producing instructions.
    pub(crate) fn insert_value(&mut self, op: Op, result_ty: TypeId, name: &str) -> ValueId {
        match self.insert(op, result_ty, name) {
            Some(v) => v,
            None => self.undef(result_ty),
        }
    }

    /// Insert `op` at position `at` of `block`.
    pub(crate) fn insert_at(
        &mut self,
        function: FunctionId,
        block: BlockId,
        at: usize,
        op: Op,
        result_ty: TypeId,
        name: &str,
    ) -> Option<ValueId> {
        let inst = InstId::from_index(self.module.function(function).insts.len());
        let result = (result_ty != TypeId::VOID).then(|| {
            let local = self.module.function_mut(function).names.unique(name);
            self.module
                .add_value(result_ty, ValueKind::Inst { function, inst }, local)
        });
        let f = self.module.function_mut(function);
        f.insts.push(Instruction { op, result, block });
        let insts = &mut f.blocks[block.index()].insts;
        insts.insert(at.min(insts.len()), inst);
        result
    }
}
