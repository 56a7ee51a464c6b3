//! CLI argument parsing using clap derive macros.
//!
//! This module defines the command-line interface for the tv CLI.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// tv - inspect task view filters and maintain view positions
#[derive(Parser, Debug)]
#[command(name = "tv")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbose output (show debug information)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Force JSON output
    #[arg(long, global = true)]
    pub json: bool,

    /// Disable colors in output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Snapshot file to operate on (default: from config, then the cache directory)
    #[arg(long, global = true, env = "TV_DATA")]
    pub data: Option<PathBuf>,

    /// IANA timezone for dates in filters (default: from config, then UTC)
    #[arg(long, global = true, env = "TV_TIMEZONE")]
    pub timezone: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the tasks of a project view in position order
    #[command(alias = "l")]
    List {
        /// Project view ID
        view_id: i64,

        /// Filter expression applied on top of the view filter
        /// (e.g., "done = false && priority >= 3")
        #[arg(short, long)]
        filter: Option<String>,

        /// Also match tasks whose filtered fields are unset
        #[arg(long)]
        include_nulls: bool,
    },

    /// Move a task to an explicit position in a view
    #[command(alias = "mv")]
    Move {
        /// Task ID
        task_id: i64,

        /// Project view ID
        view_id: i64,

        /// New position
        position: f64,
    },

    /// Place a task between two neighbors in a view
    Place {
        /// Task ID
        task_id: i64,

        /// Project view ID
        view_id: i64,

        /// Task that should come right before it
        #[arg(long)]
        after: Option<i64>,

        /// Task that should come right after it
        #[arg(long)]
        before: Option<i64>,
    },

    /// Inspect filter expressions
    #[command(alias = "f")]
    Filter {
        #[command(subcommand)]
        command: FilterCommands,
    },

    /// Check and repair view positions
    #[command(alias = "pos")]
    Positions {
        #[command(subcommand)]
        command: PositionsCommands,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

/// SQL dialects for `filter sql`
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum DialectArg {
    #[default]
    Sqlite,
    Postgres,
    Mysql,
}

/// Shell types for completions
#[derive(ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    Powershell,
}

/// Filter subcommands
#[derive(Subcommand, Debug)]
pub enum FilterCommands {
    /// Parse a filter and print its normalized form
    Parse {
        /// Filter expression
        expression: String,
    },

    /// Compile a filter to a parameterized SQL condition
    Sql {
        /// Filter expression
        expression: String,

        /// Target SQL dialect
        #[arg(long, value_enum, default_value_t)]
        dialect: DialectArg,

        /// Also match rows whose filtered fields are unset
        #[arg(long)]
        include_nulls: bool,
    },
}

/// Positions subcommands
#[derive(Subcommand, Debug)]
pub enum PositionsCommands {
    /// Report tasks sharing a position
    Check {
        /// Only check this view
        view_id: Option<i64>,
    },

    /// Resolve duplicate positions in every view
    Repair {
        /// Report what would change without writing
        #[arg(long)]
        dry_run: bool,
    },

    /// Evenly respace every position of a view
    Recalc {
        /// Project view ID
        view_id: i64,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Write a default config file if none exists
    Init,

    /// Set a configuration value
    Set {
        /// Configuration key
        key: String,

        /// Configuration value
        value: String,
    },

    /// Print config file path
    Path,
}
