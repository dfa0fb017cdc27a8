use std::path::PathBuf;

use eva_ir::ExecError;
use eva_llvm::CompileError;

/// Anything that stops the driver.
#[derive(Debug, thiserror::Error)]
pub enum EvacError {
    #[error("{0}")]
    Usage(String),

    #[error("cannot read `{}`: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error("cannot write `{}`: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("execution failed: {0}")]
    Exec(#[from] ExecError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
