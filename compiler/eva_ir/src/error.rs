//! Error types for verification and execution.

/// A structural or typing error in a module.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{location}: {message}")]
pub struct VerifyError {
    /// Where the problem was found, e.g. ``function `main` ``.
    pub location: String,
    pub message: String,
}

impl VerifyError {
    pub fn new(location: impl Into<String>, message: impl Into<String>) -> Self {
        VerifyError {
            location: location.into(),
            message: message.into(),
        }
    }
}

/// Runtime failure in the reference interpreter.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ExecError {
    #[error("no function named `{0}`")]
    UnknownFunction(String),

    #[error("call to external function `{0}` is not supported")]
    UnsupportedExtern(String),

    #[error("read of undefined value `{0}`")]
    UndefinedValue(String),

    #[error("null pointer dereference")]
    NullDereference,

    #[error("memory access out of bounds")]
    OutOfBounds,

    #[error("integer division by zero")]
    DivisionByZero,

    #[error("step limit of {0} instructions exceeded")]
    StepLimit(u64),

    #[error("call depth limit of {0} exceeded")]
    StackOverflow(usize),

    #[error("invalid printf format: {0}")]
    BadFormat(String),

    #[error("{0}")]
    Unsupported(String),
}
