//! taskrank CLI entry point

// CLI binary needs to output to stdout/stderr - this is intentional
#![allow(clippy::print_stdout, clippy::print_stderr)]

use taskrank::cli::{self, EXIT_OK, exit_code_for, render_error};
use taskrank::commands;
use taskrank::tracing;

fn main() {
    // NOTE: eprintln! is used because the tracing subscriber may be unusable during a panic
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Application panicked: {panic_info}");
        eprintln!("Internal error occurred. Run with RUST_LOG=debug for more information.");
    }));

    std::process::exit(run());
}

fn run() -> i32 {
    let cli = cli::parse();

    // Ignore error if tracing already initialized (e.g., in tests)
    let _ = tracing::init_tracing(cli.tracing_config());

    match commands::execute(&cli) {
        Ok(output) => {
            println!("{output}");
            EXIT_OK
        }
        Err(err) => {
            render_error(&err, cli.json);
            exit_code_for(&err)
        }
    }
}
