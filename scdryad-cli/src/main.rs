//! scdryad CLI - boot SuperCollider dryad trees from the command line.

mod commands;
mod observability;

use anyhow::Result;
use clap::{Parser, Subcommand};
use observability::{TracingConfig, init_tracing};
use std::path::PathBuf;

/// scdryad - lifecycle trees for SuperCollider.
#[derive(Parser)]
#[command(name = "scdryad")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Boot an sclang interpreter and keep it running until Ctrl+C
    Boot {
        /// Do not forward interpreter output to the log
        #[arg(long)]
        no_debug: bool,

        /// Log each chunk of code sent to the interpreter
        #[arg(long)]
        echo: bool,

        /// Let sclang read this terminal's stdin
        #[arg(long, conflicts_with = "eval")]
        stdin: bool,

        /// Path to the sclang executable (overrides SCLANG_PATH)
        #[arg(long)]
        sclang: Option<PathBuf>,

        /// Code to interpret after boot (repeatable)
        #[arg(short, long)]
        eval: Vec<String>,
    },

    /// Show version information
    Version,
}

/// Filter used when neither `SCDRYAD_LOG_LEVEL` nor `RUST_LOG` is set.
///
/// Quiet mode still shows interpreter output and lifecycle info from the
/// scdryad crates.
fn default_filter(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn,scdryad_core=info,scdryad_nodes=info",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

fn setup_logging(verbosity: u8) -> Result<()> {
    init_tracing(&TracingConfig::from_env(default_filter(verbosity)))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;

    match cli.command {
        Commands::Boot {
            no_debug,
            echo,
            stdin,
            sclang,
            eval,
        } => {
            commands::boot::run(commands::boot::BootOptions {
                no_debug,
                echo,
                stdin,
                sclang,
                eval,
            })
            .await
        }
        Commands::Version => commands::version::run(),
    }
}
