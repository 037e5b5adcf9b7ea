//! Command-line argument definitions for steptrack.

use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};

/// Command-line interface for steptrack.
#[derive(Debug, Parser)]
#[command(name = "steptrack")]
#[command(
    author,
    version,
    about = "Replay test step scripts and check their step hierarchy"
)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file.
    #[arg(long, global = true)]
    pub config: Option<Utf8PathBuf>,

    /// Test name stamped onto every step.
    #[arg(long, global = true)]
    pub test_name: Option<String>,

    /// Synthesise a cause for unfinished steps instead of aborting.
    #[arg(long, global = true)]
    pub lenient: bool,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Replay a step script and check its open/close discipline.
    Check(CheckArgs),
}

/// Arguments for the `check` subcommand.
#[derive(Debug, Parser)]
pub struct CheckArgs {
    /// Path to the TOML step script.
    #[arg(required = true)]
    pub script: Utf8PathBuf,
}
