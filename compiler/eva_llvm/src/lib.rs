//! Eva code generator.
//!
//! Lowers an [`Exp`](eva_syntax::Exp) program tree into a typed SSA
//! [`Module`](eva_ir::Module): one `main` function holding the top-level
//! program, one IR function per `def`, and one struct type plus vtable
//! constant per `class`.
//!
//! # Architecture
//!
//! ```text
//! ModuleCompiler (module.rs)
//!   ├── runtime_decl      printf, malloc, @VERSION
//!   └── ExprLowerer       one lower_* file per family of forms
//!         ├── Scope           lexical bindings (scope.rs)
//!         ├── type_resolver   `number` / `string` / class names
//!         ├── ClassRegistry   field and vtable layout (class_layout.rs)
//!         └── function_compiler  `def` and methods
//! ```
//!
//! # Debugging
//!
//! - `RUST_LOG=eva_llvm=debug`: one event per function, class and module.
//! - `RUST_LOG=eva_llvm=trace`: every lowered form.
//! - `EVA_LOG_TREE=1`: render spans as an indented tree.

#![allow(
    // IR indices are u32, Rust collections use usize
    clippy::cast_possible_truncation,
    // source integers are i64, Eva numbers are i32
    clippy::cast_possible_wrap,
)]

pub mod codegen;
mod error;
mod module;
mod options;

#[cfg(test)]
mod tests;

use std::sync::Once;

pub use codegen::class_layout::{ClassInfo, ClassRegistry, RESERVED_FIELDS_COUNT, VTABLE_INDEX};
pub use error::CompileError;
pub use module::{compile_program, compile_source, CompiledModule, ModuleCompiler};
pub use options::CompilerOptions;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing once per process.
///
/// Does nothing unless `RUST_LOG` is set. With `EVA_LOG_TREE=1` spans are
/// printed as a hierarchy instead of flat lines.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_err() {
            return;
        }
        let filter = EnvFilter::from_default_env();
        if std::env::var("EVA_LOG_TREE").is_ok_and(|v| v == "1") {
            tracing_subscriber::registry()
                .with(
                    tracing_tree::HierarchicalLayer::new(2)
                        .with_writer(std::io::stderr)
                        .with_targets(true),
                )
                .with(filter)
                .init();
        } else {
            tracing_subscriber::registry()
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(true)
                        .with_level(true),
                )
                .with(filter)
                .init();
        }
    });
}
