//! Storage collaborators for the filter and position subsystems.
//!
//! The core never talks to a database directly. It is handed an
//! implementation of [`PositionStore`] (and [`TaskStore`] for view
//! listing) at construction time.

mod memory;
mod snapshot;

use thiserror::Error;

use crate::filter::Condition;
use crate::model::{ProjectView, Task};
use crate::position::PositionEntry;

pub use memory::MemoryStore;
pub use snapshot::{Snapshot, SnapshotStore, SnapshotStoreError};

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors reported by a storage backend.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// A position row for this task and view already exists.
    ///
    /// Raised by [`PositionStore::insert_position`] when another writer
    /// created the row first.
    #[error("position for task {task_id} in view {view_id} already exists")]
    UniqueViolation {
        /// The task id.
        task_id: i64,
        /// The project view id.
        view_id: i64,
    },

    /// The requested record does not exist.
    #[error("{what} not found")]
    NotFound {
        /// Description of the missing record.
        what: String,
    },

    /// Any other backend failure.
    #[error("storage error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Creates a not-found error.
    pub fn not_found(what: impl Into<String>) -> Self {
        StoreError::NotFound { what: what.into() }
    }
}

/// Persistence for task positions.
///
/// Positions are unique per `(task_id, project_view_id)`.
pub trait PositionStore {
    /// Loads all entries of a view, in no particular order.
    fn load_positions(&self, view_id: i64) -> StoreResult<Vec<PositionEntry>>;

    /// Inserts or updates a batch of entries of one view.
    fn save_positions(&mut self, view_id: i64, entries: &[PositionEntry]) -> StoreResult<()>;

    /// Inserts a new entry.
    ///
    /// Fails with [`StoreError::UniqueViolation`] if the row already exists.
    fn insert_position(&mut self, entry: PositionEntry) -> StoreResult<()>;

    /// Updates an existing entry.
    ///
    /// Fails with [`StoreError::NotFound`] if the row does not exist.
    fn update_position(&mut self, entry: PositionEntry) -> StoreResult<()>;

    /// Returns the id of every view that has positions or exists.
    fn view_ids(&self) -> StoreResult<Vec<i64>>;

    /// Deletes all entries of a task, returning how many were removed.
    fn delete_task_positions(&mut self, task_id: i64) -> StoreResult<usize>;

    /// Deletes all entries of a view, returning how many were removed.
    fn delete_view_positions(&mut self, view_id: i64) -> StoreResult<usize>;
}

/// Read access to tasks and views.
pub trait TaskStore {
    /// Loads a project view.
    fn load_view(&self, view_id: i64) -> StoreResult<ProjectView>;

    /// Loads every task matching the condition, or every task for `None`.
    fn load_tasks_matching(&self, condition: Option<&Condition>) -> StoreResult<Vec<Task>>;
}
