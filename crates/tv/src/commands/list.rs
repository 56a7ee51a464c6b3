//! List command implementation.
//!
//! Lists a project view from the snapshot file. Positions assigned to
//! tasks on first listing are saved back.

use taskview_core::{ListOptions, ViewLister};

use super::{CommandContext, Result};
use crate::output::{format_tasks_json, format_tasks_table};

/// Options for the list command.
#[derive(Debug)]
pub struct ListCommandOptions {
    /// Project view ID.
    pub view_id: i64,
    /// Filter expression on top of the view filter.
    pub filter: Option<String>,
    /// Also match tasks whose filtered fields are unset.
    pub include_nulls: bool,
}

/// Executes the list command.
///
/// # Errors
///
/// Returns an error if the view is unknown, a filter is invalid, or the
/// snapshot file cannot be read or written.
pub fn execute(ctx: &CommandContext, opts: &ListCommandOptions) -> Result<()> {
    let (file, store) = ctx.load_store()?;
    let before = store.positions();

    let mut lister = ViewLister::new(store);
    let options = ListOptions {
        filter: opts.filter.as_deref(),
        timezone: &ctx.timezone,
        include_nulls: opts.include_nulls || ctx.include_nulls,
    };
    let tasks = lister.list(opts.view_id, &options)?;

    let store = lister.into_store();
    if store.positions() != before {
        file.save(&store)?;
        if ctx.verbose {
            eprintln!("Saved new positions to {}", file.path().display());
        }
    }

    if ctx.json_output {
        println!("{}", format_tasks_json(opts.view_id, &tasks)?);
    } else if !ctx.quiet {
        print!("{}", format_tasks_table(&tasks, ctx.use_colors));
    }

    Ok(())
}
