//! Move and place command implementations.
//!
//! Both write a task's position in a view and save the snapshot file.
//! Collisions created by the write are resolved before saving.

use taskview_core::position::{PositionEntry, PositionService};

use super::{CommandContext, Result};
use crate::output::format_moved_task;

/// Options for the place command.
#[derive(Debug)]
pub struct PlaceOptions {
    /// Task to place.
    pub task_id: i64,
    /// Project view ID.
    pub view_id: i64,
    /// Task that should precede it.
    pub after: Option<i64>,
    /// Task that should follow it.
    pub before: Option<i64>,
}

/// Executes the move command.
///
/// # Errors
///
/// Returns an error if the snapshot cannot be read or written, or the
/// view needed a recalculation that failed.
pub fn execute_move(ctx: &CommandContext, task_id: i64, view_id: i64, position: f64) -> Result<()> {
    let (file, store) = ctx.load_store()?;
    let mut service = PositionService::new(store);

    let entry = service.move_task(task_id, view_id, position)?;
    file.save(service.store())?;

    report(ctx, &entry)
}

/// Executes the place command.
///
/// # Errors
///
/// Returns an error if a neighbor is not in the view, there is no room
/// between the neighbors even after recalculating, or the snapshot cannot
/// be read or written.
pub fn execute_place(ctx: &CommandContext, opts: &PlaceOptions) -> Result<()> {
    let (file, store) = ctx.load_store()?;
    let mut service = PositionService::new(store);

    let entry = service.place_between(opts.task_id, opts.view_id, opts.after, opts.before)?;
    file.save(service.store())?;

    report(ctx, &entry)
}

fn report(ctx: &CommandContext, entry: &PositionEntry) -> Result<()> {
    if ctx.json_output {
        println!("{}", serde_json::to_string_pretty(entry)?);
    } else if !ctx.quiet {
        println!("{}", format_moved_task(entry, ctx.use_colors));
    }
    Ok(())
}
