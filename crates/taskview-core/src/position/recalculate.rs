//! Evenly re-spacing every entry of a view.

use super::error::{PositionError, PositionResult};
use super::{PositionEntry, MAX_POSITION};

/// Reassigns positions across the full range, keeping the current order.
///
/// Entries are ordered by (position, task id) and entry `i` of `n` gets
/// `MAX_POSITION / n * (i + 1)`.
///
/// # Errors
///
/// Returns `PositionError::RecalculationFailed` if the result is not
/// strictly increasing, which cannot happen for realistic view sizes.
pub fn recalculated_positions(
    view_id: i64,
    entries: &[PositionEntry],
) -> PositionResult<Vec<PositionEntry>> {
    let mut ordered = entries.to_vec();
    ordered.sort_by(|a, b| {
        a.position
            .total_cmp(&b.position)
            .then(a.task_id.cmp(&b.task_id))
    });

    let step = MAX_POSITION / ordered.len().max(1) as f64;
    for (i, entry) in ordered.iter_mut().enumerate() {
        entry.position = step * (i as f64 + 1.0);
    }

    if ordered.windows(2).any(|w| w[0].position >= w[1].position) {
        return Err(PositionError::RecalculationFailed { view_id });
    }
    Ok(ordered)
}
