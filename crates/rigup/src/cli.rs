//! CLI argument parsing with clap. Defines the `Cli` struct and `Command` enum.

use clap::{ArgAction, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "rigup",
    version,
    about = "Bootstrap a new machine: install packages and generate shell config",
    disable_version_flag = true,
    after_help = "Examples:\n  rigup\n  rigup --dry-run\n  rigup update\n  rigup uninstall"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Preview actions without installing or writing real files
    #[arg(short = 'd', long, global = true)]
    pub dry_run: bool,

    /// Print version
    #[arg(short = 'v', long = "version", action = ArgAction::Version)]
    pub version: Option<bool>,

    /// Remove rigup and its configuration
    #[arg(short = 'u', long)]
    pub uninstall: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Update rigup to the latest release
    Update {
        /// Skip the confirmation prompt
        #[arg(long)]
        force: bool,
    },

    /// Remove rigup from this machine
    Uninstall,

    /// Print version
    Version,
}
