//! Compilation errors.
//!
//! Every variant is fatal: lowering stops at the first one and no module is
//! produced.

use eva_ir::VerifyError;
use eva_syntax::ParseError;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CompileError {
    /// A symbol with no binding in any visible scope.
    #[error("Reference error: `{name}` is not defined")]
    UnboundName { name: String },

    /// A type annotation or class name that was never declared.
    #[error("unknown type `{name}`")]
    UnknownType { name: String },

    #[error("class `{class}`: {message}")]
    ClassError { class: String, message: String },

    /// A special form with the wrong arity or shape.
    #[error("malformed `{form}`: {message}")]
    MalformedForm { form: String, message: String },

    #[error("type mismatch in {context}: expected `{expected}`, found `{found}`")]
    TypeMismatch {
        context: String,
        expected: String,
        found: String,
    },

    #[error("syntax error: {0}")]
    Parse(#[from] ParseError),

    #[error("invalid IR: {0}")]
    Verify(#[from] VerifyError),
}

impl CompileError {
    pub(crate) fn malformed(form: &str, message: impl Into<String>) -> Self {
        CompileError::MalformedForm {
            form: form.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn class(class: &str, message: impl Into<String>) -> Self {
        CompileError::ClassError {
            class: class.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn unbound(name: &str) -> Self {
        CompileError::UnboundName {
            name: name.to_string(),
        }
    }
}
