//! In-memory tables implementing both store traits.

use std::collections::{BTreeMap, BTreeSet};

use tracing::trace;

use super::{PositionStore, StoreError, StoreResult, TaskStore};
use crate::filter::Condition;
use crate::model::{ProjectView, Task};
use crate::position::PositionEntry;

/// In-memory task, view and position tables.
///
/// Used directly by tests and as the working set of a [`SnapshotStore`].
///
/// [`SnapshotStore`]: super::SnapshotStore
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tasks: BTreeMap<i64, Task>,
    views: BTreeMap<i64, ProjectView>,
    /// Keyed by `(view_id, task_id)`.
    positions: BTreeMap<(i64, i64), f64>,
    /// Rows another writer will create just before our next insert.
    racing_writes: Vec<PositionEntry>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a task.
    pub fn insert_task(&mut self, task: Task) {
        self.tasks.insert(task.id, task);
    }

    /// Adds or replaces a view.
    pub fn insert_view(&mut self, view: ProjectView) {
        self.views.insert(view.id, view);
    }

    /// Removes a task record. Its positions are left alone.
    pub fn remove_task(&mut self, task_id: i64) -> Option<Task> {
        self.tasks.remove(&task_id)
    }

    /// Removes a view record. Its positions are left alone.
    pub fn remove_view(&mut self, view_id: i64) -> Option<ProjectView> {
        self.views.remove(&view_id)
    }

    /// Returns all tasks ordered by id.
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    /// Returns all views ordered by id.
    pub fn views(&self) -> impl Iterator<Item = &ProjectView> {
        self.views.values()
    }

    /// Returns every position entry, ordered by view and task.
    pub fn positions(&self) -> Vec<PositionEntry> {
        self.positions
            .iter()
            .map(|(&(view_id, task_id), &position)| PositionEntry::new(task_id, view_id, position))
            .collect()
    }

    /// Returns the stored position of a task in a view.
    pub fn position_of(&self, task_id: i64, view_id: i64) -> Option<f64> {
        self.positions.get(&(view_id, task_id)).copied()
    }

    /// Writes a position row directly, bypassing uniqueness checks.
    pub fn put_position(&mut self, entry: PositionEntry) {
        self.positions
            .insert((entry.project_view_id, entry.task_id), entry.position);
    }

    /// Simulates a concurrent writer.
    ///
    /// The next [`insert_position`](PositionStore::insert_position) for the
    /// same task and view finds `entry` already written and fails with
    /// [`StoreError::UniqueViolation`].
    pub fn simulate_concurrent_insert(&mut self, entry: PositionEntry) {
        self.racing_writes.push(entry);
    }
}

impl PositionStore for MemoryStore {
    fn load_positions(&self, view_id: i64) -> StoreResult<Vec<PositionEntry>> {
        Ok(self
            .positions
            .range((view_id, i64::MIN)..=(view_id, i64::MAX))
            .map(|(&(view_id, task_id), &position)| PositionEntry::new(task_id, view_id, position))
            .collect())
    }

    fn save_positions(&mut self, view_id: i64, entries: &[PositionEntry]) -> StoreResult<()> {
        for entry in entries {
            if entry.project_view_id != view_id {
                return Err(StoreError::Backend(format!(
                    "entry for task {} belongs to view {}, not {}",
                    entry.task_id, entry.project_view_id, view_id
                )));
            }
        }
        for entry in entries {
            trace!(
                task_id = entry.task_id,
                view_id,
                position = entry.position,
                "save position"
            );
            self.put_position(*entry);
        }
        Ok(())
    }

    fn insert_position(&mut self, entry: PositionEntry) -> StoreResult<()> {
        let key = (entry.project_view_id, entry.task_id);
        if let Some(i) = self
            .racing_writes
            .iter()
            .position(|r| (r.project_view_id, r.task_id) == key)
        {
            let racing = self.racing_writes.remove(i);
            self.put_position(racing);
        }

        if self.positions.contains_key(&key) {
            return Err(StoreError::UniqueViolation {
                task_id: entry.task_id,
                view_id: entry.project_view_id,
            });
        }
        self.put_position(entry);
        Ok(())
    }

    fn update_position(&mut self, entry: PositionEntry) -> StoreResult<()> {
        match self
            .positions
            .get_mut(&(entry.project_view_id, entry.task_id))
        {
            Some(position) => {
                *position = entry.position;
                Ok(())
            }
            None => Err(StoreError::not_found(format!(
                "position of task {} in view {}",
                entry.task_id, entry.project_view_id
            ))),
        }
    }

    fn view_ids(&self) -> StoreResult<Vec<i64>> {
        let ids: BTreeSet<i64> = self
            .positions
            .keys()
            .map(|&(view_id, _)| view_id)
            .chain(self.views.keys().copied())
            .collect();
        Ok(ids.into_iter().collect())
    }

    fn delete_task_positions(&mut self, task_id: i64) -> StoreResult<usize> {
        let before = self.positions.len();
        self.positions.retain(|&(_, t), _| t != task_id);
        Ok(before - self.positions.len())
    }

    fn delete_view_positions(&mut self, view_id: i64) -> StoreResult<usize> {
        let before = self.positions.len();
        self.positions.retain(|&(v, _), _| v != view_id);
        Ok(before - self.positions.len())
    }
}

impl TaskStore for MemoryStore {
    fn load_view(&self, view_id: i64) -> StoreResult<ProjectView> {
        self.views
            .get(&view_id)
            .cloned()
            .ok_or_else(|| StoreError::not_found(format!("view {}", view_id)))
    }

    fn load_tasks_matching(&self, condition: Option<&Condition>) -> StoreResult<Vec<Task>> {
        Ok(self
            .tasks
            .values()
            .filter(|task| condition.map_or(true, |c| c.matches(*task)))
            .cloned()
            .collect())
    }
}
