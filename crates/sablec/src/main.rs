//! The Sable compiler front-end CLI.
//!
//! Provides the `sablec` command:
//!
//! - `sablec check <file>` - load the module graph rooted at `<file>`,
//!   type-check it, and print diagnostics.
//!
//! Exit code 0 when the program checks cleanly, 1 on any diagnostic.

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};

use sable_common::fs::OsFs;
use sable_common::ops::OperatorTable;
use sable_typeck::diagnostics::render_diagnostic;
use sable_typeck::TypeChecker;

#[derive(Parser)]
#[command(name = "sablec", version, about = "The Sable compiler front end")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Type-check a Sable program rooted at the given file
    Check {
        /// Path to the main module
        file: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    match cli.command {
        Commands::Check { file } => {
            if !check(&file) {
                process::exit(1);
            }
        }
    }
}

/// Run the checker and print diagnostics. Returns whether the program
/// checked cleanly.
fn check(file: &Path) -> bool {
    // The operator table is built once here and threaded through the
    // whole pipeline; nothing downstream holds operator state.
    let operators = OperatorTable::default();
    let mut checker = TypeChecker::new(OsFs, operators);

    match checker.check(file) {
        Ok(()) => {
            println!("ok: {} module(s) checked", checker.modules().len());
            true
        }
        Err(failure) => {
            for error in &failure.errors {
                // Render a labeled report when the source is still
                // readable, otherwise fall back to the one-line form.
                match checker.read_source(&error.path) {
                    Some(source) => {
                        eprintln!("{}", error.path.display());
                        eprint!("{}", render_diagnostic(error, &source));
                    }
                    None => eprintln!("{error}"),
                }
            }
            eprintln!("error: {} problem(s) found", failure.errors.len());
            false
        }
    }
}
