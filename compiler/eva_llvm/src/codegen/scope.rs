//! Lexical scopes.
//!
//! A `Scope` owns its bindings and its parent, forming a chain from the
//! innermost block out to the global scope. Lookups walk the chain. Once a
//! lookup has left a function's own scope, stack slots owned by other
//! functions are skipped: a nested `def` sees globals and functions of its
//! enclosing scopes, never their locals.

use eva_ir::{FunctionId, TypeId, ValueId};
use rustc_hash::FxHashMap;

use crate::error::CompileError;

// ---------------------------------------------------------------------------
// ScopeBinding
// ---------------------------------------------------------------------------

/// What a name is bound to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScopeBinding {
    /// A stack slot or global holding a value of type `ty`.
    Storage {
        /// Pointer to the slot.
        ptr: ValueId,
        /// Type of the stored value (needed for `load`).
        ty: TypeId,
        /// Function whose frame holds the slot; `None` for globals.
        owner: Option<FunctionId>,
    },
    /// A compiled function, used by name as a callee or value.
    Function(FunctionId),
}

impl ScopeBinding {
    fn is_local(self) -> bool {
        matches!(self, ScopeBinding::Storage { owner: Some(_), .. })
    }
}

// ---------------------------------------------------------------------------
// Scope
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ScopeKind {
    #[default]
    Global,
    /// `begin` blocks.
    Block,
    /// The parameter scope of a function body.
    Function,
}

#[derive(Debug, Default)]
pub struct Scope {
    bindings: FxHashMap<String, ScopeBinding>,
    parent: Option<Box<Scope>>,
    kind: ScopeKind,
}

impl Scope {
    /// The outermost scope.
    pub fn global() -> Self {
        Scope::default()
    }

    /// Open a scope nested in `parent`.
    pub fn child(parent: Scope, kind: ScopeKind) -> Self {
        Scope {
            bindings: FxHashMap::default(),
            parent: Some(Box::new(parent)),
            kind,
        }
    }

    /// Close this scope, dropping its bindings.
    pub fn into_parent(self) -> Option<Scope> {
        self.parent.map(|parent| *parent)
    }

    /// Bind `name` in this scope, shadowing any outer binding, and hand the
    /// binding back.
    pub fn define(&mut self, name: &str, binding: ScopeBinding) -> ScopeBinding {
        self.bindings.insert(name.to_string(), binding);
        binding
    }

    /// Resolve `name`, innermost scope first.
    pub fn resolve(&self, name: &str) -> Option<ScopeBinding> {
        let mut crossed_function = false;
        let mut scope = Some(self);
        while let Some(s) = scope {
            if let Some(&binding) = s.bindings.get(name) {
                if !(crossed_function && binding.is_local()) {
                    return Some(binding);
                }
            }
            crossed_function |= s.kind == ScopeKind::Function;
            scope = s.parent.as_deref();
        }
        None
    }

    /// Like [`Scope::resolve`], failing with `UnboundName`.
    pub fn lookup(&self, name: &str) -> Result<ScopeBinding, CompileError> {
        self.resolve(name).ok_or_else(|| CompileError::unbound(name))
    }
}
