//! CLI command definitions.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Args, Subcommand};

/// Suggest command arguments.
#[derive(Debug, Args)]
pub struct SuggestCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Log command arguments.
#[derive(Debug, Args)]
pub struct LogCommand {
    /// Location id (see `infusite locations`); defaults to the suggestion
    pub location: Option<String>,

    /// Free-text note
    #[arg(short, long)]
    pub note: Option<String>,

    /// How long this catheter stayed in, in hours
    #[arg(short, long, value_name = "HOURS")]
    pub duration: Option<f64>,

    /// When the catheter was applied (RFC 3339, defaults to now)
    #[arg(long, value_name = "TIME")]
    pub at: Option<DateTime<Utc>>,
}

/// History command arguments.
#[derive(Debug, Args)]
pub struct HistoryCommand {
    /// Show at most N records
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Stats command arguments.
#[derive(Debug, Args)]
pub struct StatsCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Locations command arguments.
#[derive(Debug, Args)]
pub struct LocationsCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Export command arguments.
#[derive(Debug, Args)]
pub struct ExportCommand {
    /// Write to this file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Emit only the JSON snapshot, without the summary header
    #[arg(long)]
    pub raw: bool,
}

/// Clear command arguments.
#[derive(Debug, Args)]
pub struct ClearCommand {
    /// Confirm deletion of all history
    #[arg(short, long)]
    pub yes: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_command_debug() {
        let cmd = LogCommand {
            location: Some("leg_left".to_string()),
            note: None,
            duration: Some(72.0),
            at: None,
        };
        let debug_str = format!("{cmd:?}");
        assert!(debug_str.contains("leg_left"));
        assert!(debug_str.contains("72.0"));
    }

    #[test]
    fn test_config_command_debug() {
        let cmd = ConfigCommand::Show { json: false };
        assert!(format!("{cmd:?}").contains("Show"));
    }
}
