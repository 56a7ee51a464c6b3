//! Positions command implementations: check, repair and recalc.

use std::collections::BTreeMap;

use taskview_core::position::{duplicate_groups, PositionEntry, PositionService};
use taskview_core::store::MemoryStore;

use super::{CommandContext, Result};
use crate::output::{
    format_duplicates_json, format_duplicates_table, format_recalculated, format_repair_json,
    format_repair_table,
};

/// Returns the duplicate groups of each view, optionally of one view only.
fn duplicates(store: &MemoryStore, view_id: Option<i64>) -> Vec<Vec<PositionEntry>> {
    let mut by_view: BTreeMap<i64, Vec<PositionEntry>> = BTreeMap::new();
    for entry in store.positions() {
        if view_id.map_or(true, |id| entry.project_view_id == id) {
            by_view.entry(entry.project_view_id).or_default().push(entry);
        }
    }
    by_view
        .values()
        .flat_map(|entries| duplicate_groups(entries))
        .collect()
}

/// Executes the positions check command.
///
/// Reports every group of tasks sharing a position. Nothing is written.
pub fn execute_check(ctx: &CommandContext, view_id: Option<i64>) -> Result<()> {
    let (_, store) = ctx.load_store()?;
    let groups = duplicates(&store, view_id);

    if ctx.json_output {
        println!("{}", format_duplicates_json(&groups)?);
    } else if !ctx.quiet {
        print!("{}", format_duplicates_table(&groups, ctx.use_colors));
    }

    Ok(())
}

/// Executes the positions repair command.
///
/// Per-view failures are reported in the result rather than aborting the
/// sweep. With `dry_run` the snapshot file is not written.
pub fn execute_repair(ctx: &CommandContext, dry_run: bool) -> Result<()> {
    let (file, store) = ctx.load_store()?;
    let mut service = PositionService::new(store);

    let result = service.repair_all(dry_run)?;
    if !dry_run && result.views_repaired > 0 {
        file.save(service.store())?;
    }

    if ctx.json_output {
        println!("{}", format_repair_json(&result, dry_run)?);
    } else if !ctx.quiet {
        print!("{}", format_repair_table(&result, dry_run, ctx.use_colors));
    }

    Ok(())
}

/// Executes the positions recalc command.
pub fn execute_recalc(ctx: &CommandContext, view_id: i64) -> Result<()> {
    let (file, store) = ctx.load_store()?;
    let mut service = PositionService::new(store);

    let entries = service.recalculate(view_id)?;
    file.save(service.store())?;

    if ctx.json_output {
        let output = serde_json::json!({
            "view_id": view_id,
            "positions": entries,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if !ctx.quiet {
        println!("{}", format_recalculated(view_id, entries.len(), ctx.use_colors));
    }

    Ok(())
}
