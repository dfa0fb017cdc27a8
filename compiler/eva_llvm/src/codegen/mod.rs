//! Expression-to-IR lowering.
//!
//! [`ExprLowerer`] walks an [`Exp`](eva_syntax::Exp) tree and emits
//! instructions through an [`IrBuilder`](eva_ir::IrBuilder). Scopes, class
//! layouts and the runtime declarations live in their own modules; each
//! family of forms is lowered in its own `lower_*` file.

pub mod class_layout;
pub mod expr_lowerer;
mod function_compiler;
mod lower_calls;
mod lower_control_flow;
mod lower_literals;
mod lower_objects;
mod lower_operators;
pub mod runtime_decl;
pub mod scope;
mod type_resolver;

pub use class_layout::{ClassInfo, ClassRegistry};
pub use expr_lowerer::ExprLowerer;
pub use runtime_decl::{declare_runtime, define_globals, RuntimeFunctions};
pub use scope::{Scope, ScopeBinding, ScopeKind};
