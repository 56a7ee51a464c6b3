//! Initial positions and positions between neighbors.

use super::error::{PositionError, PositionResult};
use super::{APPEND_STEP, MAX_POSITION, MIN_POSITION_SPACING};

/// Returns the position a task gets when none was given.
///
/// An explicit position of `0.0` means "unset" and is replaced by
/// `id * 1000`, which keeps new tasks in creation order.
///
/// ```
/// use taskview_core::position::default_position;
///
/// assert_eq!(default_position(7, 0.0), 7000.0);
/// assert_eq!(default_position(7, 42.5), 42.5);
/// ```
pub fn default_position(id: i64, explicit: f64) -> f64 {
    if explicit == 0.0 {
        id as f64 * 1000.0
    } else {
        explicit
    }
}

/// Computes a position strictly between two neighbors.
///
/// - both neighbors: their midpoint
/// - only an upper neighbor: half of it
/// - only a lower neighbor: `lower + APPEND_STEP`
/// - no neighbors: the middle of the range
///
/// # Errors
///
/// Returns `PositionError::InsufficientSpacing` when the result would sit
/// closer than `MIN_POSITION_SPACING` to a neighbor, which includes
/// neighbors given in the wrong order.
pub fn position_between(lower: Option<f64>, upper: Option<f64>) -> PositionResult<f64> {
    let position = match (lower, upper) {
        (Some(lo), Some(hi)) => lo + (hi - lo) / 2.0,
        (None, Some(hi)) => hi / 2.0,
        (Some(lo), None) => lo + APPEND_STEP,
        (None, None) => MAX_POSITION / 2.0,
    };

    let clear_of_lower = lower.map_or(true, |lo| position - lo >= MIN_POSITION_SPACING);
    let clear_of_upper = upper.map_or(true, |hi| hi - position >= MIN_POSITION_SPACING);
    if clear_of_lower && clear_of_upper {
        Ok(position)
    } else {
        Err(PositionError::InsufficientSpacing { lower, upper })
    }
}
