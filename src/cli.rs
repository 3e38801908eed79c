/// CLI argument definitions for the `tpulse` command.
///
/// Defines all subcommands, their arguments, and long help text
/// using the `clap` derive macros.
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

use crate::cli_help;
use crate::config::DEFAULT_CONFIG_FILE;

/// Top-level CLI parser with a single subcommand selector.
#[derive(Parser)]
#[command(name = "tpulse", version, about = "Weekly transit chat sync")]
pub struct Cli {
    /// Configuration file
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Debug-level logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sync last week's messages, aggregate them and publish the snapshot
    #[command(long_about = cli_help::SYNC)]
    Sync {
        /// Rebuild the week even if it was already synced
        #[arg(long)]
        force: bool,

        /// Aggregate and publish even if some channels failed
        #[arg(long)]
        allow_partial: bool,

        /// Read chats and print the summary without touching the store or snapshot
        #[arg(long)]
        dry_run: bool,

        /// Output the run summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the week a sync would target
    #[command(long_about = cli_help::WINDOW)]
    Window {
        /// Reference instant (RFC 3339, default: now)
        #[arg(long)]
        at: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Rewrite the dashboard snapshot from stored aggregates
    Snapshot {
        /// ISO week key such as 2024-W02 (default: last completed week)
        #[arg(long)]
        week: Option<String>,

        /// Snapshot path (default: snapshot_path from the config)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print a shell completion script
    Completions {
        shell: Shell,
    },
}
