//! Eva compiler CLI.

use evac::{execute, parse_args, Command, USAGE};

fn main() {
    eva_llvm::init_tracing();

    let command = match parse_args(std::env::args().skip(1)) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("error: {e}");
            eprintln!();
            eprintln!("{USAGE}");
            std::process::exit(1);
        }
    };

    match command {
        Command::Help => println!("{USAGE}"),
        Command::Compile(invocation) => {
            let stdout = std::io::stdout();
            if let Err(e) = execute(&invocation, &mut stdout.lock()) {
                eprintln!("Fatal error: {e}");
                std::process::exit(1);
            }
        }
    }
}
