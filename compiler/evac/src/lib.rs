//! Eva compiler driver.
//!
//! Reads a program from `-e` or `-f`, compiles it with [`eva_llvm`], prints
//! the IR and writes it to the output path. With `--run` the module is then
//! executed by the reference interpreter and its output echoed.
//!
//! Nothing is written when compilation fails.

mod args;
mod error;

use std::io::Write;

use eva_llvm::ModuleCompiler;
use tracing::{debug, info};

pub use args::{parse_args, Command, Invocation, Source, USAGE};
pub use error::EvacError;

/// Program text for `source`.
pub fn read_source(source: &Source) -> Result<String, EvacError> {
    match source {
        Source::Expression(text) => Ok(text.clone()),
        Source::File(path) => std::fs::read_to_string(path).map_err(|source| EvacError::Read {
            path: path.clone(),
            source,
        }),
    }
}

/// Compile the requested program, writing IR (and program output under
/// `--run`) to `out`.
pub fn execute(invocation: &Invocation, out: &mut impl Write) -> Result<(), EvacError> {
    let text = read_source(&invocation.source)?;
    let compiler = ModuleCompiler::new(invocation.options.clone());
    let module = compiler.compile_source(&text)?;

    let ir = module.ir();
    out.write_all(ir.as_bytes())?;

    let path = &invocation.options.output_path;
    module.write_to(path).map_err(|source| EvacError::Write {
        path: path.clone(),
        source,
    })?;
    info!(path = %path.display(), "wrote module");

    if invocation.run {
        let outcome = module.run()?;
        debug!(exit_code = outcome.exit_code, "program finished");
        out.write_all(outcome.stdout.as_bytes())?;
    }
    out.flush()?;
    Ok(())
}
