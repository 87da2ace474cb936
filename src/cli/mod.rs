//! Command-line interface for envlock.
//!
//! The CLI follows standard Unix conventions: short options use single
//! dashes, long options use double dashes, and global options apply to all
//! subcommands. Subcommands own their arguments and an async `execute`
//! method; this module only handles global flags (verbosity, progress
//! suppression, config path) and dispatch.

pub mod lock;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Top-level CLI: global flags plus the subcommand to run.
#[derive(Parser)]
#[command(
    name = "envlock",
    about = "Reproducible lock files for multi-platform environments",
    version,
    long_about = "envlock merges dependency declarations from one or more environment files, \
                  filters them by category, resolves each requested platform with external \
                  conda/pip solvers, and renders reproducible lock files."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Disable progress spinners (useful for CI logs).
    #[arg(long, global = true)]
    no_progress: bool,

    /// Path to a global config file (default: ~/.config/envlock/config.toml).
    #[arg(short, long, global = true, value_name = "PATH")]
    config: Option<String>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Merge environment files, resolve each platform, and write lock files.
    Lock(lock::LockCommand),
}

impl Cli {
    /// Apply global flags and dispatch to the subcommand.
    pub async fn execute(self) -> Result<()> {
        self.init_logging();

        if self.no_progress {
            crate::utils::progress::disable();
        }

        match self.command {
            Commands::Lock(cmd) => cmd.execute(self.config.as_deref()).await,
        }
    }

    /// Initialize tracing output to stderr.
    ///
    /// `RUST_LOG` wins when set; otherwise the verbosity flags pick the
    /// default filter.
    fn init_logging(&self) {
        let default_directive = if self.verbose {
            "envlock=debug"
        } else if self.quiet {
            "error"
        } else {
            "envlock=warn"
        };

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_directive));

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }
}
