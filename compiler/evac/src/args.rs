//! Command-line parsing.
//!
//! Flags are scanned by hand, the way small compiler drivers usually do it:
//! `-e`/`-f`/`-o` take the next argument, `--target=` carries its value
//! inline.

use std::path::PathBuf;

use eva_llvm::CompilerOptions;

use crate::error::EvacError;

pub const USAGE: &str = "\
Usage: eva-llvm [options]

Options:
  -e, --expression <src>   Compile the given expression
  -f, --file <path>        Compile the given file
  -o <path>                Output file (default: ./out.ll)
  --target=<triple>        Target triple (default: x86_64-pc-linux-gnu)
  --run                    Execute the compiled module after writing it
  -h, --help               Print this help";

/// Where the program text comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Source {
    Expression(String),
    File(PathBuf),
}

/// A fully parsed compile request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Invocation {
    pub source: Source,
    pub options: CompilerOptions,
    /// Interpret `main` after the module is written.
    pub run: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Compile(Invocation),
    Help,
}

/// Parse the arguments after the program name.
pub fn parse_args<I>(args: I) -> Result<Command, EvacError>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let mut source = None;
    let mut options = CompilerOptions::default();
    let mut run = false;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(Command::Help),
            "-e" | "--expression" => {
                let text = value_of(&arg, args.next())?;
                set_source(&mut source, Source::Expression(text))?;
            }
            "-f" | "--file" => {
                let path = value_of(&arg, args.next())?;
                set_source(&mut source, Source::File(PathBuf::from(path)))?;
            }
            "-o" => options.output_path = PathBuf::from(value_of(&arg, args.next())?),
            "--run" => run = true,
            other => {
                if let Some(triple) = other.strip_prefix("--target=") {
                    options.target_triple = triple.to_string();
                } else {
                    return Err(EvacError::Usage(format!("unknown option `{other}`")));
                }
            }
        }
    }

    let Some(source) = source else {
        return Err(EvacError::Usage(
            "expected an expression (-e) or a file (-f)".to_string(),
        ));
    };
    Ok(Command::Compile(Invocation {
        source,
        options,
        run,
    }))
}

fn value_of(flag: &str, value: Option<String>) -> Result<String, EvacError> {
    value.ok_or_else(|| EvacError::Usage(format!("`{flag}` needs a value")))
}

fn set_source(slot: &mut Option<Source>, source: Source) -> Result<(), EvacError> {
    if slot.is_some() {
        return Err(EvacError::Usage(
            "only one of -e and -f may be given".to_string(),
        ));
    }
    *slot = Some(source);
    Ok(())
}
