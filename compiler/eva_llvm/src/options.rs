//! Compiler configuration.

use std::path::PathBuf;

/// Settings for one compilation run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompilerOptions {
    /// Name recorded as the module id and `source_filename`.
    pub module_name: String,
    pub target_triple: String,
    /// Where the IR text is written on success.
    pub output_path: PathBuf,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        CompilerOptions {
            module_name: "EvaLLVM".to_string(),
            target_triple: "x86_64-pc-linux-gnu".to_string(),
            output_path: PathBuf::from("./out.ll"),
        }
    }
}

impl CompilerOptions {
    #[must_use]
    pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = path.into();
        self
    }

    #[must_use]
    pub fn with_target_triple(mut self, triple: impl Into<String>) -> Self {
        self.target_triple = triple.into();
        self
    }
}
