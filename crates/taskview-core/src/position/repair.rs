//! Sweeping every view for duplicate positions.

use serde::Serialize;
use tracing::{info, warn};

use super::conflicts::duplicate_groups;
use super::error::{PositionError, PositionResult};
use super::service::PositionService;
use crate::store::PositionStore;

/// Outcome of a repair sweep.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RepairResult {
    /// Views looked at.
    pub views_scanned: usize,
    /// Views that had (or, in a dry run, would have had) duplicates fixed.
    pub views_repaired: usize,
    /// Entries that shared a position with another entry.
    pub tasks_affected: usize,
    /// Views that could not be repaired.
    pub errors: Vec<ViewRepairError>,
}

/// A failure to repair one view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewRepairError {
    /// The project view id.
    pub view_id: i64,
    /// What went wrong.
    pub message: String,
}

impl<S: PositionStore> PositionService<S> {
    /// Finds and fixes duplicate positions in every view.
    ///
    /// With `dry_run` nothing is written; the counts are the same a real run
    /// would report. A failing view is recorded in
    /// [`RepairResult::errors`] and the sweep moves on.
    ///
    /// # Errors
    ///
    /// Fails only when the list of views cannot be loaded.
    pub fn repair_all(&mut self, dry_run: bool) -> PositionResult<RepairResult> {
        let mut result = RepairResult::default();

        for view_id in self.store().view_ids()? {
            result.views_scanned += 1;
            match self.repair_view(view_id, dry_run) {
                Ok(0) => {}
                Ok(affected) => {
                    result.views_repaired += 1;
                    result.tasks_affected += affected;
                }
                Err(e) => {
                    warn!(view_id, error = %e, "failed to repair view");
                    result.errors.push(ViewRepairError {
                        view_id,
                        message: e.to_string(),
                    });
                }
            }
        }

        info!(
            dry_run,
            views_scanned = result.views_scanned,
            views_repaired = result.views_repaired,
            tasks_affected = result.tasks_affected,
            errors = result.errors.len(),
            "position repair finished"
        );
        Ok(result)
    }

    /// Fixes duplicate positions in one view.
    ///
    /// Each duplicate group is spread between its neighbors. The first time
    /// a group has no room the whole view is recalculated, which also fixes
    /// the remaining groups.
    ///
    /// Returns the number of entries that were in duplicate groups.
    ///
    /// # Errors
    ///
    /// Propagates store failures and `RecalculationFailed`.
    pub fn repair_view(&mut self, view_id: i64, dry_run: bool) -> PositionResult<usize> {
        let entries = self.store().load_positions(view_id)?;
        let groups = duplicate_groups(&entries);
        let affected: usize = groups.iter().map(Vec::len).sum();

        if groups.is_empty() || dry_run {
            return Ok(affected);
        }

        for group in &groups {
            match self.resolve_conflicts(view_id, group) {
                Ok(()) => {}
                Err(PositionError::NeedsFullRecalculation { .. }) => {
                    warn!(view_id, "duplicate group has no room, recalculating view");
                    self.recalculate(view_id)?;
                    break;
                }
                Err(e) => return Err(e),
            }
        }

        info!(view_id, tasks = affected, groups = groups.len(), "repaired view");
        Ok(affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::PositionEntry;
    use crate::store::{MemoryStore, StoreError, StoreResult};

    fn store_with(entries: &[(i64, i64, f64)]) -> MemoryStore {
        let mut store = MemoryStore::new();
        for &(task_id, view_id, position) in entries {
            store.put_position(PositionEntry::new(task_id, view_id, position));
        }
        store
    }

    #[test]
    fn test_repair_counts_and_fixes() {
        let store = store_with(&[
            (1, 1, 10.0),
            (2, 1, 10.0),
            (3, 1, 20.0),
            (1, 2, 5.0),
            (2, 2, 6.0),
            (1, 3, 7.0),
            (2, 3, 7.0),
            (3, 3, 7.0),
        ]);
        let mut service = PositionService::new(store);
        let result = service.repair_all(false).unwrap();
        assert_eq!(
            result,
            RepairResult {
                views_scanned: 3,
                views_repaired: 2,
                tasks_affected: 5,
                errors: vec![],
            }
        );

        let again = service.repair_all(false).unwrap();
        assert_eq!(again.tasks_affected, 0);
        assert_eq!(again.views_repaired, 0);
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let store = store_with(&[(1, 1, 10.0), (2, 1, 10.0)]);
        let before = store.positions();
        let mut service = PositionService::new(store);

        let dry = service.repair_all(true).unwrap();
        assert_eq!(service.store().positions(), before);

        let real = service.repair_all(false).unwrap();
        assert_eq!(dry.tasks_affected, real.tasks_affected);
        assert_eq!(dry.views_repaired, real.views_repaired);
        assert_ne!(service.store().positions(), before);
    }

    /// A store whose saves fail for one view.
    struct FailingView {
        inner: MemoryStore,
        broken_view: i64,
    }

    impl PositionStore for FailingView {
        fn load_positions(&self, view_id: i64) -> StoreResult<Vec<PositionEntry>> {
            self.inner.load_positions(view_id)
        }

        fn save_positions(&mut self, view_id: i64, entries: &[PositionEntry]) -> StoreResult<()> {
            if view_id == self.broken_view {
                return Err(StoreError::Backend("read-only".to_string()));
            }
            self.inner.save_positions(view_id, entries)
        }

        fn insert_position(&mut self, entry: PositionEntry) -> StoreResult<()> {
            self.inner.insert_position(entry)
        }

        fn update_position(&mut self, entry: PositionEntry) -> StoreResult<()> {
            self.inner.update_position(entry)
        }

        fn view_ids(&self) -> StoreResult<Vec<i64>> {
            self.inner.view_ids()
        }

        fn delete_task_positions(&mut self, task_id: i64) -> StoreResult<usize> {
            self.inner.delete_task_positions(task_id)
        }

        fn delete_view_positions(&mut self, view_id: i64) -> StoreResult<usize> {
            self.inner.delete_view_positions(view_id)
        }
    }

    #[test]
    fn test_failing_view_is_recorded_and_sweep_continues() {
        let inner = store_with(&[(1, 1, 10.0), (2, 1, 10.0), (1, 2, 3.0), (2, 2, 3.0)]);
        let mut service = PositionService::new(FailingView {
            inner,
            broken_view: 1,
        });
        let result = service.repair_all(false).unwrap();
        assert_eq!(result.views_scanned, 2);
        assert_eq!(result.views_repaired, 1);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].view_id, 1);
        assert_eq!(result.errors[0].message, "storage error: read-only");
    }

    #[test]
    fn test_exhausted_group_recalculates_once() {
        let tight = 1.0 + crate::position::MIN_POSITION_SPACING / 2.0;
        let store = store_with(&[
            (1, 1, 1.0),
            (2, 1, tight),
            (3, 1, tight),
            (4, 1, 1.0 + crate::position::MIN_POSITION_SPACING),
            (5, 1, 50.0),
            (6, 1, 50.0),
        ]);
        let mut service = PositionService::new(store);
        let result = service.repair_all(false).unwrap();
        assert_eq!(result.tasks_affected, 4);
        assert!(result.errors.is_empty());
        assert!(duplicate_groups(&service.store().positions()).is_empty());
    }
}
