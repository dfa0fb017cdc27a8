//! Whole-program compilation.
//!
//! `ModuleCompiler` sets up a fresh module (runtime declarations, the
//! `VERSION` global and an `i32 main()`), lowers the program into `main`,
//! returns `0` and verifies the result. An empty program still yields a
//! `main` that returns `0`. Each call owns its own builder,
//! class registry and scopes, so one compiler can be reused for any number
//! of independent programs.

use std::path::Path;

use eva_ir::exec::{self, ExecOutcome};
use eva_ir::{ExecError, IrBuilder, Module, TypeId};
use eva_syntax::Exp;
use tracing::{debug, instrument};

use crate::codegen::{declare_runtime, define_globals, ClassRegistry, ExprLowerer, Scope};
use crate::error::CompileError;
use crate::options::CompilerOptions;

// ---------------------------------------------------------------------------
// ModuleCompiler
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Default)]
pub struct ModuleCompiler {
    options: CompilerOptions,
}

impl ModuleCompiler {
    pub fn new(options: CompilerOptions) -> Self {
        ModuleCompiler { options }
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    /// Compile a program tree, normally the `(begin ...)` produced by
    /// [`eva_syntax::parse_program`].
    #[instrument(level = "debug", skip_all, fields(module = %self.options.module_name))]
    pub fn compile(&self, program: &Exp) -> Result<CompiledModule, CompileError> {
        let mut builder = IrBuilder::new(&self.options.module_name);
        if !self.options.target_triple.is_empty() {
            builder.set_target_triple(&self.options.target_triple);
        }

        let runtime = declare_runtime(&mut builder);
        let mut globals = Scope::global();
        define_globals(&mut builder, &mut globals);

        let main_ty = builder.fn_type(TypeId::I32, &[], false);
        let main = builder.declare_function("main", main_ty, &[]);
        let entry = builder.append_block(main, "entry");
        builder.set_current_function(main);
        builder.position_at_end(entry);

        let mut classes = ClassRegistry::new();
        let mut lowerer = ExprLowerer::new(&mut builder, &mut classes, runtime, globals, main);
        if is_empty_program(program) {
            debug!("empty program");
        } else {
            lowerer.lower(program)?;
        }
        drop(lowerer);

        let zero = builder.const_i32(0);
        builder.ret(zero);

        let module = builder.finish()?;
        module.verify()?;
        debug!(
            functions = module.functions().count(),
            classes = classes.len(),
            "module compiled"
        );
        Ok(CompiledModule { module })
    }

    /// Parse `source` as a program and compile it.
    pub fn compile_source(&self, source: &str) -> Result<CompiledModule, CompileError> {
        let program = eva_syntax::parse_program(source)?;
        self.compile(&program)
    }
}

/// `(begin)` with nothing inside, i.e. an empty source file.
fn is_empty_program(program: &Exp) -> bool {
    program.is_tagged("begin") && program.as_list().is_some_and(|items| items.len() == 1)
}

/// Compile `program` with `options`.
pub fn compile_program(
    program: &Exp,
    options: &CompilerOptions,
) -> Result<CompiledModule, CompileError> {
    ModuleCompiler::new(options.clone()).compile(program)
}

/// Parse and compile `source` with `options`.
pub fn compile_source(
    source: &str,
    options: &CompilerOptions,
) -> Result<CompiledModule, CompileError> {
    ModuleCompiler::new(options.clone()).compile_source(source)
}

// ---------------------------------------------------------------------------
// CompiledModule
// ---------------------------------------------------------------------------

/// A verified module.
pub struct CompiledModule {
    module: Module,
}

impl CompiledModule {
    pub fn module(&self) -> &Module {
        &self.module
    }

    /// LLVM assembly text.
    pub fn ir(&self) -> String {
        self.module.to_ir()
    }

    /// Write the IR text to `path`.
    pub fn write_to(&self, path: &Path) -> std::io::Result<()> {
        self.module.write_to(path)
    }

    /// Execute `main` in the reference interpreter.
    pub fn run(&self) -> Result<ExecOutcome, ExecError> {
        exec::run_main(&self.module)
    }
}
