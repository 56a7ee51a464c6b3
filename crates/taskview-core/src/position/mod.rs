//! Fractional task positions within project views.
//!
//! Every task in a view carries a floating-point position; listing a view
//! sorts by it. New tasks and moves pick a value between two neighbors so
//! no other row has to change. When concurrent writers land on the same
//! value, the collision is detected after the fact and the colliding rows
//! are spread out again, falling back to re-spacing the whole view when the
//! gap is exhausted.
//!
//! # Example
//!
//! ```
//! use taskview_core::position::PositionService;
//! use taskview_core::store::MemoryStore;
//!
//! let mut service = PositionService::new(MemoryStore::new());
//! service.move_task(1, 10, 5000.0).unwrap();
//! service.move_task(2, 10, 5000.0).unwrap();
//!
//! let entries = service.ordered_entries(10).unwrap();
//! assert_eq!(entries.len(), 2);
//! assert!(entries[0].position < entries[1].position);
//! ```

mod allocator;
mod conflicts;
mod error;
mod recalculate;
mod repair;
mod resolver;
mod service;

use serde::{Deserialize, Serialize};

pub use allocator::{default_position, position_between};
pub use conflicts::{duplicate_groups, find_conflicts};
pub use error::{PositionError, PositionResult};
pub use recalculate::recalculated_positions;
pub use repair::{RepairResult, ViewRepairError};
pub use resolver::spread_conflicts;
pub use service::PositionService;

/// Upper end of the position range (2^32).
pub const MAX_POSITION: f64 = 4_294_967_296.0;

/// Smallest gap allowed between two computed positions.
pub const MIN_POSITION_SPACING: f64 = 1e-9;

/// Gap left after the last task when appending (`MAX_POSITION / 2^16`).
pub const APPEND_STEP: f64 = MAX_POSITION / 65_536.0;

/// A task's position within one project view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionEntry {
    /// The task id.
    pub task_id: i64,
    /// The project view id (the ordering scope).
    pub project_view_id: i64,
    /// The sort key; `0.0` means "unset".
    pub position: f64,
}

impl PositionEntry {
    /// Creates an entry.
    pub fn new(task_id: i64, project_view_id: i64, position: f64) -> Self {
        Self {
            task_id,
            project_view_id,
            position,
        }
    }

    /// Returns true if the entry still holds the unset sentinel.
    pub fn is_unset(&self) -> bool {
        self.position == 0.0
    }
}
