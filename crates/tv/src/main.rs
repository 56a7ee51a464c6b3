use clap::Parser;
use std::process::ExitCode;
use tracing::warn;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod dispatch;
mod output;

use cli::{Cli, Commands};
use commands::config::{load_config, Config};
use commands::{CommandContext, CommandError};
use dispatch::{Command, DataDispatch, StatelessDispatch};
use taskview_core::position::PositionError;
use taskview_core::store::StoreError;
use taskview_core::ViewError;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if cli.json {
                let error_json = serde_json::json!({
                    "error": {
                        "code": error_code(&e),
                        "message": e.to_string(),
                    }
                });
                eprintln!("{:#}", error_json);
            } else {
                eprintln!("Error: {e}");
            }
            error_exit_code(&e)
        }
    }
}

/// Initializes logging to stderr.
///
/// `RUST_LOG` wins; otherwise `warn`, or `debug` with `--verbose`.
fn init_logging(cli: &Cli) {
    let default = if cli.verbose { "debug" } else { "warn" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: &Cli) -> commands::Result<()> {
    // A broken config file must not lock the user out of `tv config`.
    let config = match load_config() {
        Ok(config) => config,
        Err(e) if matches!(cli.command, Some(Commands::Config { .. })) => {
            warn!("ignoring config file: {e}");
            Config::default()
        }
        Err(e) => return Err(e),
    };
    let ctx = CommandContext::new(cli, &config);

    if let Some(dispatch) = StatelessDispatch::try_from_cli(cli) {
        return dispatch.execute(&ctx);
    }

    match DataDispatch::from_cli(cli) {
        Some(dispatch) => dispatch.execute(&ctx),
        None => Err(CommandError::Config(format!(
            "unhandled command: {:?}",
            cli.command
        ))),
    }
}

/// Returns the error code string for JSON output.
fn error_code(e: &CommandError) -> &'static str {
    match e {
        CommandError::Filter(_) | CommandError::View(ViewError::Filter(_)) => "FILTER_ERROR",
        CommandError::Position(PositionError::Store(StoreError::NotFound { .. }))
        | CommandError::View(ViewError::Store(StoreError::NotFound { .. }))
        | CommandError::Position(PositionError::TaskNotInView { .. }) => "NOT_FOUND",
        CommandError::Position(_) | CommandError::View(_) => "POSITION_ERROR",
        CommandError::Snapshot(_) => "DATA_ERROR",
        CommandError::Config(_) => "CONFIG_ERROR",
        CommandError::Io(_) => "IO_ERROR",
        CommandError::Json(_) => "JSON_ERROR",
    }
}

/// Returns the process exit status for an error.
fn exit_status(e: &CommandError) -> u8 {
    match error_code(e) {
        "FILTER_ERROR" | "JSON_ERROR" => 1,
        "NOT_FOUND" | "POSITION_ERROR" => 2,
        "IO_ERROR" => 3,
        _ => 5,
    }
}

/// Returns the exit code for an error.
fn error_exit_code(e: &CommandError) -> ExitCode {
    ExitCode::from(exit_status(e))
}
