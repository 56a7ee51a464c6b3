//! Spreading a cluster of colliding entries between its neighbors.

use std::collections::HashSet;

use super::error::{PositionError, PositionResult};
use super::{PositionEntry, MAX_POSITION, MIN_POSITION_SPACING};

/// Computes new positions for a cluster of conflicting entries.
///
/// The cluster is ordered by task id and spread evenly over the open
/// interval between the nearest entries of the view that lie strictly
/// below and strictly above it. Without a lower neighbor the interval
/// starts at `0.0`; without an upper one it ends at `MAX_POSITION`.
///
/// `entries` is the whole view; `conflicts` is the cluster. Returns the
/// cluster with its new positions, or an empty list when there is nothing
/// to resolve.
///
/// # Errors
///
/// Returns `PositionError::NeedsFullRecalculation` when the interval is too
/// narrow to give every entry `MIN_POSITION_SPACING`, or when floating-point
/// rounding would produce positions that are not strictly increasing.
pub fn spread_conflicts(
    view_id: i64,
    entries: &[PositionEntry],
    conflicts: &[PositionEntry],
) -> PositionResult<Vec<PositionEntry>> {
    if conflicts.len() < 2 {
        return Ok(Vec::new());
    }

    let mut cluster = conflicts.to_vec();
    cluster.sort_by_key(|entry| entry.task_id);

    let cluster_ids: HashSet<i64> = cluster.iter().map(|entry| entry.task_id).collect();
    let cluster_low = cluster
        .iter()
        .map(|entry| entry.position)
        .fold(f64::INFINITY, f64::min);
    let cluster_high = cluster
        .iter()
        .map(|entry| entry.position)
        .fold(f64::NEG_INFINITY, f64::max);

    let outside = entries
        .iter()
        .filter(|entry| !cluster_ids.contains(&entry.task_id))
        .map(|entry| entry.position);
    let lower = outside
        .clone()
        .filter(|&p| p < cluster_low)
        .fold(None, |best: Option<f64>, p| Some(best.map_or(p, |b| b.max(p))))
        .unwrap_or(0.0);
    let upper = outside
        .filter(|&p| p > cluster_high)
        .fold(None, |best: Option<f64>, p| Some(best.map_or(p, |b| b.min(p))))
        .unwrap_or(MAX_POSITION);

    let count = cluster.len() as f64;
    let width = upper - lower;
    // Negated so that NaN widths also fall through to a recalculation.
    if !(width / count >= MIN_POSITION_SPACING) {
        return Err(PositionError::NeedsFullRecalculation { view_id });
    }

    let step = width / (count + 1.0);
    let mut previous = lower;
    for (i, entry) in cluster.iter_mut().enumerate() {
        let position = lower + step * (i as f64 + 1.0);
        if position <= previous || position >= upper {
            return Err(PositionError::NeedsFullRecalculation { view_id });
        }
        entry.position = position;
        previous = position;
    }

    Ok(cluster)
}
