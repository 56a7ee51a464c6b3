//! Command dispatch module for routing CLI commands to their handlers.
//!
//! Commands are split by whether they touch the snapshot file, so that
//! config, completions and filter inspection work without any data.

use crate::cli::{Cli, Commands, ConfigCommands, FilterCommands, PositionsCommands, Shell};
use crate::commands::{self, CommandContext, CommandError, Result};

/// Trait for dispatchable commands.
pub trait Command {
    /// Execute the command.
    fn execute(&self, ctx: &CommandContext) -> Result<()>;
}

/// Commands that never read the snapshot file.
pub enum StatelessDispatch<'a> {
    Config(&'a Option<ConfigCommands>),
    Completions(&'a Shell),
    Filter(&'a FilterCommands),
    Help,
}

impl<'a> StatelessDispatch<'a> {
    /// Try to create a stateless dispatch from the CLI command.
    /// Returns None if the command needs the snapshot file.
    pub fn try_from_cli(cli: &'a Cli) -> Option<Self> {
        match &cli.command {
            Some(Commands::Config { command }) => Some(Self::Config(command)),
            Some(Commands::Completions { shell }) => Some(Self::Completions(shell)),
            Some(Commands::Filter { command }) => Some(Self::Filter(command)),
            None => Some(Self::Help),
            _ => None,
        }
    }
}

impl Command for StatelessDispatch<'_> {
    fn execute(&self, ctx: &CommandContext) -> Result<()> {
        match self {
            Self::Config(command) => dispatch_config(ctx, command),
            Self::Completions(shell) => {
                commands::completions::execute(shell).map_err(CommandError::Io)
            }
            Self::Filter(command) => dispatch_filter(ctx, command),
            Self::Help => {
                if !ctx.quiet {
                    println!("tv - task view filters and positions");
                    println!("Use --help for usage information");
                }
                Ok(())
            }
        }
    }
}

/// Dispatch config subcommands.
fn dispatch_config(ctx: &CommandContext, command: &Option<ConfigCommands>) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => commands::config::execute_show(ctx),
        Some(ConfigCommands::Init) => commands::config::execute_init(ctx),
        Some(ConfigCommands::Set { key, value }) => {
            let opts = commands::config::ConfigSetOptions {
                key: key.clone(),
                value: value.clone(),
            };
            commands::config::execute_set(ctx, &opts)
        }
        Some(ConfigCommands::Path) => commands::config::execute_path(ctx),
    }
}

/// Dispatch filter subcommands.
fn dispatch_filter(ctx: &CommandContext, command: &FilterCommands) -> Result<()> {
    match command {
        FilterCommands::Parse { expression } => commands::filter::execute_parse(ctx, expression),
        FilterCommands::Sql {
            expression,
            dialect,
            include_nulls,
        } => {
            let opts = commands::filter::FilterSqlOptions {
                expression: expression.clone(),
                dialect: *dialect,
                include_nulls: *include_nulls,
            };
            commands::filter::execute_sql(ctx, &opts)
        }
    }
}

/// Commands that read or write the snapshot file.
pub enum DataDispatch<'a> {
    List {
        view_id: i64,
        filter: &'a Option<String>,
        include_nulls: bool,
    },
    Move {
        task_id: i64,
        view_id: i64,
        position: f64,
    },
    Place {
        task_id: i64,
        view_id: i64,
        after: Option<i64>,
        before: Option<i64>,
    },
    Positions(&'a PositionsCommands),
}

impl<'a> DataDispatch<'a> {
    /// Create a data dispatch from the CLI command.
    /// Returns None for stateless commands.
    pub fn from_cli(cli: &'a Cli) -> Option<Self> {
        match &cli.command {
            Some(Commands::List {
                view_id,
                filter,
                include_nulls,
            }) => Some(Self::List {
                view_id: *view_id,
                filter,
                include_nulls: *include_nulls,
            }),
            Some(Commands::Move {
                task_id,
                view_id,
                position,
            }) => Some(Self::Move {
                task_id: *task_id,
                view_id: *view_id,
                position: *position,
            }),
            Some(Commands::Place {
                task_id,
                view_id,
                after,
                before,
            }) => Some(Self::Place {
                task_id: *task_id,
                view_id: *view_id,
                after: *after,
                before: *before,
            }),
            Some(Commands::Positions { command }) => Some(Self::Positions(command)),
            _ => None,
        }
    }
}

impl Command for DataDispatch<'_> {
    fn execute(&self, ctx: &CommandContext) -> Result<()> {
        match self {
            Self::List {
                view_id,
                filter,
                include_nulls,
            } => {
                let opts = commands::list::ListCommandOptions {
                    view_id: *view_id,
                    filter: (*filter).clone(),
                    include_nulls: *include_nulls,
                };
                commands::list::execute(ctx, &opts)
            }
            Self::Move {
                task_id,
                view_id,
                position,
            } => commands::reorder::execute_move(ctx, *task_id, *view_id, *position),
            Self::Place {
                task_id,
                view_id,
                after,
                before,
            } => {
                let opts = commands::reorder::PlaceOptions {
                    task_id: *task_id,
                    view_id: *view_id,
                    after: *after,
                    before: *before,
                };
                commands::reorder::execute_place(ctx, &opts)
            }
            Self::Positions(command) => match command {
                PositionsCommands::Check { view_id } => {
                    commands::positions::execute_check(ctx, *view_id)
                }
                PositionsCommands::Repair { dry_run } => {
                    commands::positions::execute_repair(ctx, *dry_run)
                }
                PositionsCommands::Recalc { view_id } => {
                    commands::positions::execute_recalc(ctx, *view_id)
                }
            },
        }
    }
}
