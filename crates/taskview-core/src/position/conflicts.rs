//! Detecting entries that share a position.
//!
//! Detection uses exact floating-point equality. Spacing tolerances only
//! apply when new positions are computed.

use super::PositionEntry;

/// Returns the entries whose position is exactly `position`.
pub fn find_conflicts(entries: &[PositionEntry], position: f64) -> Vec<PositionEntry> {
    entries
        .iter()
        .filter(|entry| entry.position == position)
        .copied()
        .collect()
}

/// Groups entries that share a position with at least one other entry.
///
/// Groups are ordered by position and each group by task id.
pub fn duplicate_groups(entries: &[PositionEntry]) -> Vec<Vec<PositionEntry>> {
    let mut sorted = entries.to_vec();
    sorted.sort_by(|a, b| {
        a.position
            .total_cmp(&b.position)
            .then(a.task_id.cmp(&b.task_id))
    });

    let mut groups: Vec<Vec<PositionEntry>> = Vec::new();
    let mut current: Vec<PositionEntry> = Vec::new();
    for entry in sorted {
        match current.last() {
            Some(last) if last.position == entry.position => current.push(entry),
            _ => {
                if current.len() > 1 {
                    groups.push(std::mem::take(&mut current));
                }
                current.clear();
                current.push(entry);
            }
        }
    }
    if current.len() > 1 {
        groups.push(current);
    }
    groups
}
