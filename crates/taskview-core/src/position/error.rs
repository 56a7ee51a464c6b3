//! Error types for the position subsystem.

use thiserror::Error;

use crate::store::StoreError;

/// A specialized Result type for position operations.
pub type PositionResult<T> = Result<T, PositionError>;

/// Errors that can occur while allocating or repairing positions.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PositionError {
    /// No position fits between the neighbors with enough spacing.
    #[error("no room for a position between {} and {}", fmt_bound(.lower), fmt_bound(.upper))]
    InsufficientSpacing {
        /// The lower neighbor, if any.
        lower: Option<f64>,
        /// The upper neighbor, if any.
        upper: Option<f64>,
    },

    /// Conflicts cannot be spread out locally; the whole view must be
    /// recalculated.
    #[error("positions in view {view_id} need a full recalculation")]
    NeedsFullRecalculation {
        /// The project view id.
        view_id: i64,
    },

    /// A recalculation produced positions that are not strictly increasing.
    #[error("recalculated positions in view {view_id} are not strictly increasing")]
    RecalculationFailed {
        /// The project view id.
        view_id: i64,
    },

    /// A referenced task has no position in the view.
    #[error("task {task_id} has no position in view {view_id}")]
    TaskNotInView {
        /// The task id.
        task_id: i64,
        /// The project view id.
        view_id: i64,
    },

    /// The storage backend failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

fn fmt_bound(bound: &Option<f64>) -> String {
    match bound {
        Some(value) => value.to_string(),
        None => "the edge".to_string(),
    }
}
