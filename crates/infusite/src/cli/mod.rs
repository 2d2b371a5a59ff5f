//! Command-line interface for infusite.
//!
//! This module provides the CLI structure for the `infusite` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    ClearCommand, ConfigCommand, ExportCommand, HistoryCommand, LocationsCommand, LogCommand,
    StatsCommand, SuggestCommand,
};

/// infusite - Rotate your insulin pump catheter sites
///
/// Logs where each catheter was applied and suggests the next site, steering
/// away from recently used zones and sides.
#[derive(Debug, Parser)]
#[command(name = "infusite")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Suggest the next catheter site
    Suggest(SuggestCommand),

    /// Record a catheter application
    Log(LogCommand),

    /// List recorded applications, newest first
    History(HistoryCommand),

    /// Show usage per site and the average change interval
    Stats(StatsCommand),

    /// List the available sites
    Locations(LocationsCommand),

    /// Export the history for sharing
    Export(ExportCommand),

    /// Delete all recorded history
    Clear(ClearCommand),

    /// View or check configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        if self.quiet {
            crate::logging::Verbosity::Quiet
        } else {
            match self.verbose {
                0 => crate::logging::Verbosity::Normal,
                1 => crate::logging::Verbosity::Verbose,
                _ => crate::logging::Verbosity::Trace,
            }
        }
    }
}
