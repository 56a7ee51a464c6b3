//! Command implementations for the tv CLI.
//!
//! This module contains the actual command handlers that are invoked by the CLI.

pub mod completions;
pub mod config;
pub mod filter;
pub mod list;
pub mod positions;
pub mod reorder;

use std::env;
use std::path::PathBuf;

use taskview_core::store::{MemoryStore, SnapshotStore};

use crate::cli::Cli;
use self::config::Config;

/// Error type for command execution.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// Filter parsing or compile error.
    #[error("filter error: {0}")]
    Filter(#[from] taskview_core::filter::FilterError),

    /// Position error.
    #[error("position error: {0}")]
    Position(#[from] taskview_core::position::PositionError),

    /// View listing error.
    #[error("{0}")]
    View(#[from] taskview_core::ViewError),

    /// Snapshot file error.
    #[error("data error: {0}")]
    Snapshot(#[from] taskview_core::store::SnapshotStoreError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for command execution.
pub type Result<T> = std::result::Result<T, CommandError>;

/// Context for command execution, containing common dependencies.
pub struct CommandContext {
    /// Whether to output JSON.
    pub json_output: bool,
    /// Whether to use colors.
    pub use_colors: bool,
    /// Whether to be quiet (errors only).
    pub quiet: bool,
    /// Whether to be verbose.
    pub verbose: bool,
    /// Timezone for dates in filters; empty means UTC.
    pub timezone: String,
    /// Snapshot file override, if any.
    pub data_path: Option<PathBuf>,
    /// Include-nulls default from the config file.
    pub include_nulls: bool,
}

impl CommandContext {
    /// Creates a new command context from CLI arguments and the config file.
    ///
    /// Flags (and their environment variables) win over the config file.
    /// Colors are also disabled by the config file or `NO_COLOR`.
    pub fn new(cli: &Cli, config: &Config) -> Self {
        let use_colors = !cli.no_color
            && config.output.color.unwrap_or(true)
            && env::var_os("NO_COLOR").is_none();

        Self {
            json_output: cli.json,
            use_colors,
            quiet: cli.quiet,
            verbose: cli.verbose,
            timezone: cli
                .timezone
                .clone()
                .or_else(|| config.timezone.clone())
                .unwrap_or_default(),
            data_path: cli.data.clone().or_else(|| config.data_path.clone()),
            include_nulls: config.filter.include_nulls.unwrap_or(false),
        }
    }

    /// Returns the snapshot file this invocation works on.
    pub fn snapshot_store(&self) -> Result<SnapshotStore> {
        match &self.data_path {
            Some(path) => Ok(SnapshotStore::with_path(path)),
            None => Ok(SnapshotStore::new()?),
        }
    }

    /// Loads the snapshot into memory, starting empty if the file is missing.
    pub fn load_store(&self) -> Result<(SnapshotStore, MemoryStore)> {
        let file = self.snapshot_store()?;
        if self.verbose {
            eprintln!("Using data file {}", file.path().display());
        }
        let store = file.load_or_default()?;
        Ok((file, store))
    }
}
