//! Position maintenance output formatting.

use owo_colors::OwoColorize;
use serde::Serialize;
use taskview_core::position::{PositionEntry, RepairResult};

use super::helpers::{format_position, header};

/// JSON output structure for one duplicate group.
#[derive(Serialize)]
pub struct DuplicateOutput {
    pub view_id: i64,
    pub position: f64,
    pub task_ids: Vec<i64>,
}

/// JSON output structure for a repair run.
#[derive(Serialize)]
pub struct RepairOutput<'a> {
    pub dry_run: bool,
    #[serde(flatten)]
    pub result: &'a RepairResult,
}

fn duplicate_outputs(groups: &[Vec<PositionEntry>]) -> Vec<DuplicateOutput> {
    groups
        .iter()
        .filter_map(|group| {
            let first = group.first()?;
            Some(DuplicateOutput {
                view_id: first.project_view_id,
                position: first.position,
                task_ids: group.iter().map(|e| e.task_id).collect(),
            })
        })
        .collect()
}

/// Formats duplicate groups as JSON.
pub fn format_duplicates_json(groups: &[Vec<PositionEntry>]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&duplicate_outputs(groups))
}

/// Formats duplicate groups as a table.
pub fn format_duplicates_table(groups: &[Vec<PositionEntry>], use_colors: bool) -> String {
    if groups.is_empty() {
        let ok = "No duplicate positions found.";
        return if use_colors {
            format!("{}\n", ok.green())
        } else {
            format!("{ok}\n")
        };
    }

    let mut output = header(
        &format!("{:<8} {:<16} {}", "View", "Position", "Tasks"),
        use_colors,
    );
    for group in duplicate_outputs(groups) {
        let tasks: Vec<String> = group.task_ids.iter().map(|id| id.to_string()).collect();
        output.push_str(&format!(
            "{:<8} {:<16} {}\n",
            group.view_id,
            format_position(group.position),
            tasks.join(", ")
        ));
    }
    output
}

/// Formats a repair result as JSON.
pub fn format_repair_json(result: &RepairResult, dry_run: bool) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&RepairOutput { dry_run, result })
}

/// Formats a repair result as a summary.
pub fn format_repair_table(result: &RepairResult, dry_run: bool, use_colors: bool) -> String {
    let verb = if dry_run { "Would repair" } else { "Repaired" };
    let summary = format!(
        "{} {} of {} view(s), {} task(s) affected",
        verb, result.views_repaired, result.views_scanned, result.tasks_affected
    );

    let mut output = if use_colors && result.errors.is_empty() {
        format!("{}\n", summary.green())
    } else {
        format!("{summary}\n")
    };

    for error in &result.errors {
        let line = format!("view {}: {}", error.view_id, error.message);
        if use_colors {
            output.push_str(&format!("  {}\n", line.red()));
        } else {
            output.push_str(&format!("  {line}\n"));
        }
    }
    output
}

/// Formats the result of a recalculation.
pub fn format_recalculated(view_id: i64, count: usize, use_colors: bool) -> String {
    let line = format!("Recalculated {count} position(s) in view {view_id}");
    if use_colors {
        line.green().to_string()
    } else {
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskview_core::position::ViewRepairError;

    fn groups() -> Vec<Vec<PositionEntry>> {
        vec![vec![
            PositionEntry::new(1, 7, 1000.0),
            PositionEntry::new(2, 7, 1000.0),
        ]]
    }

    #[test]
    fn test_duplicates_table() {
        let table = format_duplicates_table(&groups(), false);
        assert!(table.contains("7        1000             1, 2\n"));
        assert_eq!(
            format_duplicates_table(&[], false),
            "No duplicate positions found.\n"
        );
    }

    #[test]
    fn test_duplicates_json() {
        let json = format_duplicates_json(&groups()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["view_id"], 7);
        assert_eq!(value[0]["task_ids"], serde_json::json!([1, 2]));
    }

    #[test]
    fn test_repair_table_dry_run_with_errors() {
        let result = RepairResult {
            views_scanned: 3,
            views_repaired: 1,
            tasks_affected: 2,
            errors: vec![ViewRepairError {
                view_id: 9,
                message: "store unavailable".to_string(),
            }],
        };
        let table = format_repair_table(&result, true, false);
        assert_eq!(
            table,
            "Would repair 1 of 3 view(s), 2 task(s) affected\n  view 9: store unavailable\n"
        );
    }

    #[test]
    fn test_repair_json_flattens_result() {
        let result = RepairResult {
            views_scanned: 2,
            views_repaired: 0,
            tasks_affected: 0,
            errors: Vec::new(),
        };
        let value: serde_json::Value =
            serde_json::from_str(&format_repair_json(&result, false).unwrap()).unwrap();
        assert_eq!(value["dry_run"], false);
        assert_eq!(value["views_scanned"], 2);
    }
}
