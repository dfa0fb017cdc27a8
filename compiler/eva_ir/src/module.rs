//! Module, function, block and global containers.
//!
//! A [`Module`] owns every arena: types, values, functions and globals.
//! Functions own their blocks and instructions. Blocks are created either
//! attached (appended to the function's layout) or detached and attached
//! later, so a front end can create `else`/`merge` blocks up front but place
//! them after any blocks produced while lowering the `then` arm.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::inst::Instruction;
use crate::types::TypeTable;
use crate::value_id::{BlockId, FunctionId, GlobalId, InstId, TypeId, ValueId};

/// What a [`ValueId`] refers to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ValueKind {
    ConstInt(i64),
    Null,
    Undef,
    /// Address of a function; typed as a function pointer.
    Function(FunctionId),
    /// Address of a global variable.
    Global(GlobalId),
    /// `i8*` to the first byte of a byte-array global.
    StringPtr(GlobalId),
    Param { function: FunctionId, index: u32 },
    Inst { function: FunctionId, inst: InstId },
}

#[derive(Clone, Debug)]
pub struct ValueData {
    pub ty: TypeId,
    pub kind: ValueKind,
    /// Local name for parameters and instruction results; empty otherwise.
    pub name: String,
}

impl ValueData {
    /// The function a parameter or instruction result belongs to.
    pub fn owner(&self) -> Option<FunctionId> {
        match self.kind {
            ValueKind::Param { function, .. } | ValueKind::Inst { function, .. } => Some(function),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Linkage {
    External,
    Private,
}

/// Global initializers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Constant {
    Int(i64),
    /// Raw bytes of an `[N x i8]` array (terminator included).
    Bytes(Vec<u8>),
    Struct(Vec<Constant>),
    Function(FunctionId),
    Null,
}

#[derive(Clone, Debug)]
pub struct Global {
    pub name: String,
    pub value_ty: TypeId,
    pub init: Option<Constant>,
    pub constant: bool,
    pub linkage: Linkage,
    pub unnamed_addr: bool,
    /// Pointer value addressing this global.
    pub value: ValueId,
}

#[derive(Clone, Debug)]
pub struct Block {
    pub name: String,
    pub insts: Vec<InstId>,
    pub(crate) attached: bool,
}

impl Block {
    pub fn is_attached(&self) -> bool {
        self.attached
    }
}

/// Per-function namespace for local values and block labels.
#[derive(Clone, Debug, Default)]
pub(crate) struct LocalNames {
    used: FxHashSet<String>,
    counters: FxHashMap<String, u32>,
}

impl LocalNames {
    /// Reserve `base` (or `base1`, `base2`, ...). Empty bases become `tmp`.
    pub(crate) fn unique(&mut self, base: &str) -> String {
        let base = if base.is_empty() { "tmp" } else { base };
        if self.used.insert(base.to_string()) {
            return base.to_string();
        }
        let counter = self.counters.entry(base.to_string()).or_insert(0);
        loop {
            *counter += 1;
            let candidate = format!("{base}{counter}");
            if self.used.insert(candidate.clone()) {
                return candidate;
            }
        }
    }
}

#[derive(Clone, Debug)]
pub struct Function {
    pub name: String,
    /// Function type (not pointer).
    pub ty: TypeId,
    /// Function-pointer value addressing this function.
    pub value: ValueId,
    pub params: Vec<ValueId>,
    pub(crate) blocks: Vec<Block>,
    pub(crate) layout: Vec<BlockId>,
    pub(crate) insts: Vec<Instruction>,
    pub(crate) names: LocalNames,
}

impl Function {
    /// A function with no attached blocks is an external declaration.
    pub fn is_declaration(&self) -> bool {
        self.layout.is_empty()
    }

    pub fn entry_block(&self) -> Option<BlockId> {
        self.layout.first().copied()
    }

    pub fn block(&self, id: BlockId) -> &Block {
        &self.blocks[id.index()]
    }

    pub fn inst(&self, id: InstId) -> &Instruction {
        &self.insts[id.index()]
    }

    /// Attached blocks in layout order.
    pub fn blocks(&self) -> impl Iterator<Item = (BlockId, &Block)> {
        self.layout.iter().map(|&id| (id, &self.blocks[id.index()]))
    }

    pub fn block_count(&self) -> usize {
        self.layout.len()
    }

    /// The last instruction of `block` if it is a terminator.
    pub fn terminator(&self, block: BlockId) -> Option<&Instruction> {
        let last = self.block(block).insts.last()?;
        let inst = self.inst(*last);
        inst.op.is_terminator().then_some(inst)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Symbol {
    Function(FunctionId),
    Global(GlobalId),
}

/// A translation unit.
pub struct Module {
    pub name: String,
    pub source_filename: String,
    pub target_triple: Option<String>,
    pub types: TypeTable,
    values: Vec<ValueData>,
    functions: Vec<Function>,
    globals: Vec<Global>,
    symbols: FxHashMap<String, Symbol>,
}

impl Module {
    pub fn new(name: &str) -> Self {
        Module {
            name: name.to_string(),
            source_filename: name.to_string(),
            target_triple: None,
            types: TypeTable::new(),
            values: Vec::new(),
            functions: Vec::new(),
            globals: Vec::new(),
            symbols: FxHashMap::default(),
        }
    }

    pub fn value(&self, id: ValueId) -> &ValueData {
        &self.values[id.index()]
    }

    pub fn type_of(&self, id: ValueId) -> TypeId {
        self.values[id.index()].ty
    }

    pub fn function(&self, id: FunctionId) -> &Function {
        &self.functions[id.index()]
    }

    pub(crate) fn function_mut(&mut self, id: FunctionId) -> &mut Function {
        &mut self.functions[id.index()]
    }

    pub fn functions(&self) -> impl Iterator<Item = (FunctionId, &Function)> {
        self.functions
            .iter()
            .enumerate()
            .map(|(i, f)| (FunctionId::from_index(i), f))
    }

    pub fn function_named(&self, name: &str) -> Option<FunctionId> {
        match self.symbols.get(name) {
            Some(Symbol::Function(id)) => Some(*id),
            _ => None,
        }
    }

    pub fn global(&self, id: GlobalId) -> &Global {
        &self.globals[id.index()]
    }

    pub fn globals(&self) -> impl Iterator<Item = (GlobalId, &Global)> {
        self.globals
            .iter()
            .enumerate()
            .map(|(i, g)| (GlobalId::from_index(i), g))
    }

    pub fn global_named(&self, name: &str) -> Option<GlobalId> {
        match self.symbols.get(name) {
            Some(Symbol::Global(id)) => Some(*id),
            _ => None,
        }
    }

    pub(crate) fn add_value(&mut self, ty: TypeId, kind: ValueKind, name: String) -> ValueId {
        let id = ValueId::from_index(self.values.len());
        self.values.push(ValueData { ty, kind, name });
        id
    }

    /// Module symbols share one namespace; clashes get a `.N` suffix.
    fn unique_symbol(&self, base: &str) -> String {
        let mut name = base.to_string();
        let mut n = 0;
        while self.symbols.contains_key(&name) {
            n += 1;
            name = format!("{base}.{n}");
        }
        name
    }

    pub(crate) fn add_function(
        &mut self,
        name: &str,
        fn_ty: TypeId,
        param_names: &[&str],
    ) -> FunctionId {
        let id = FunctionId::from_index(self.functions.len());
        let name = self.unique_symbol(name);
        let fn_ptr_ty = self.types.pointer(fn_ty);
        let value = self.add_value(fn_ptr_ty, ValueKind::Function(id), String::new());

        let param_tys = self
            .types
            .fn_sig(fn_ty)
            .map(|sig| sig.params.clone())
            .unwrap_or_default();
        let mut names = LocalNames::default();
        let mut params = Vec::with_capacity(param_tys.len());
        for (index, ty) in param_tys.into_iter().enumerate() {
            let base = param_names.get(index).copied().unwrap_or("arg");
            let local = names.unique(base);
            let kind = ValueKind::Param {
                function: id,
                index: u32::try_from(index).unwrap_or(u32::MAX),
            };
            params.push(self.add_value(ty, kind, local));
        }

        self.symbols.insert(name.clone(), Symbol::Function(id));
        self.functions.push(Function {
            name,
            ty: fn_ty,
            value,
            params,
            blocks: Vec::new(),
            layout: Vec::new(),
            insts: Vec::new(),
            names,
        });
        id
    }

    pub(crate) fn add_global(
        &mut self,
        name: &str,
        value_ty: TypeId,
        init: Option<Constant>,
        constant: bool,
        linkage: Linkage,
    ) -> GlobalId {
        let id = GlobalId::from_index(self.globals.len());
        let name = self.unique_symbol(name);
        let ptr_ty = self.types.pointer(value_ty);
        let value = self.add_value(ptr_ty, ValueKind::Global(id), String::new());
        self.symbols.insert(name.clone(), Symbol::Global(id));
        self.globals.push(Global {
            name,
            value_ty,
            init,
            constant,
            linkage,
            unnamed_addr: linkage == Linkage::Private,
            value,
        });
        id
    }

    pub(crate) fn set_global_init(&mut self, id: GlobalId, init: Constant) {
        self.globals[id.index()].init = Some(init);
    }

    /// Render the module as LLVM assembly text.
    pub fn to_ir(&self) -> String {
        crate::printer::print_module(self)
    }

    /// Write [`Module::to_ir`] to `path`.
    pub fn write_to(&self, path: &std::path::Path) -> std::io::Result<()> {
        std::fs::write(path, self.to_ir())
    }
}
