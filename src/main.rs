//! envlock CLI entry point.
//!
//! Handles command-line parsing, error display, and command execution. All
//! real work lives in the library crate; this binary only wires the pieces
//! together and turns failures into user-friendly reports with a non-zero
//! exit status.

use anyhow::Result;
use clap::Parser;
use envlock::cli;
use envlock::core::user_friendly_error;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    match cli.execute().await {
        Ok(()) => Ok(()),
        Err(e) => {
            let error_ctx = user_friendly_error(e);
            error_ctx.display();
            std::process::exit(1);
        }
    }
}
