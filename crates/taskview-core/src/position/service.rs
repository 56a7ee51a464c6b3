//! Position operations backed by a store.

use std::collections::{BTreeSet, HashMap};

use tracing::{debug, info, warn};

use super::allocator::{default_position, position_between};
use super::conflicts::find_conflicts;
use super::error::{PositionError, PositionResult};
use super::recalculate::recalculated_positions;
use super::resolver::spread_conflicts;
use super::PositionEntry;
use crate::store::{PositionStore, StoreError};

/// Allocates, moves and repairs task positions.
///
/// The service does not lock anything. It runs inside whatever transaction
/// the caller holds and repairs collisions after writing.
#[derive(Debug, Clone)]
pub struct PositionService<S> {
    store: S,
}

impl<S: PositionStore> PositionService<S> {
    /// Creates a service over a store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns the underlying store mutably.
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Consumes the service, returning the store.
    pub fn into_store(self) -> S {
        self.store
    }

    /// Loads a view's entries ordered by (position, task id).
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn ordered_entries(&self, view_id: i64) -> PositionResult<Vec<PositionEntry>> {
        let mut entries = self.store.load_positions(view_id)?;
        entries.sort_by(|a, b| {
            a.position
                .total_cmp(&b.position)
                .then(a.task_id.cmp(&b.task_id))
        });
        Ok(entries)
    }

    /// Returns every entry of the view sitting exactly at `position`.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn detect_conflicts(
        &self,
        view_id: i64,
        position: f64,
    ) -> PositionResult<Vec<PositionEntry>> {
        let entries = self.store.load_positions(view_id)?;
        Ok(find_conflicts(&entries, position))
    }

    /// Spreads a cluster of colliding entries between its neighbors.
    ///
    /// Fewer than two conflicts is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `PositionError::NeedsFullRecalculation` without writing
    /// anything when there is not enough room; propagates store failures.
    pub fn resolve_conflicts(
        &mut self,
        view_id: i64,
        conflicts: &[PositionEntry],
    ) -> PositionResult<()> {
        if conflicts.len() < 2 {
            return Ok(());
        }
        let entries = self.store.load_positions(view_id)?;
        let spread = spread_conflicts(view_id, &entries, conflicts)?;
        self.store.save_positions(view_id, &spread)?;
        debug!(view_id, resolved = spread.len(), "resolved position conflicts");
        Ok(())
    }

    /// Re-spaces every entry of the view evenly over the full range.
    ///
    /// # Errors
    ///
    /// Returns `PositionError::RecalculationFailed` if the new positions
    /// are not strictly increasing; propagates store failures.
    pub fn recalculate(&mut self, view_id: i64) -> PositionResult<Vec<PositionEntry>> {
        let entries = self.store.load_positions(view_id)?;
        let updated = recalculated_positions(view_id, &entries)?;
        self.store.save_positions(view_id, &updated)?;
        info!(view_id, entries = updated.len(), "recalculated positions");
        Ok(updated)
    }

    /// Sets a task's position in a view, creating the entry if needed.
    ///
    /// A position of `0.0` is the unset marker and is replaced by the task's
    /// default position before writing.
    ///
    /// If another writer creates the entry between our existence check and
    /// our insert, the insert's unique violation is turned into an update.
    /// Collisions at the new position are resolved afterwards, with at most
    /// one full recalculation of the view.
    ///
    /// Returns the task's entry as stored after conflict resolution.
    ///
    /// # Errors
    ///
    /// Propagates store failures and `RecalculationFailed`.
    pub fn move_task(
        &mut self,
        task_id: i64,
        view_id: i64,
        position: f64,
    ) -> PositionResult<PositionEntry> {
        let position = default_position(task_id, position);
        let entry = PositionEntry::new(task_id, view_id, position);
        let exists = self
            .store
            .load_positions(view_id)?
            .iter()
            .any(|e| e.task_id == task_id);

        if exists {
            self.store.update_position(entry)?;
        } else {
            match self.store.insert_position(entry) {
                Ok(()) => {}
                Err(StoreError::UniqueViolation { .. }) => {
                    warn!(task_id, view_id, "position row created concurrently, updating");
                    self.store.update_position(entry)?;
                }
                Err(e) => return Err(e.into()),
            }
        }
        debug!(task_id, view_id, position, "moved task");

        self.settle(view_id, position)?;
        let position = self.lookup(task_id, view_id)?;
        Ok(PositionEntry::new(task_id, view_id, position))
    }

    /// Moves a task between two neighboring tasks of the view.
    ///
    /// `after` is the task that should precede it and `before` the task
    /// that should follow it; either may be `None` at the edges. If the gap
    /// is too small the view is recalculated once and the placement retried.
    ///
    /// # Errors
    ///
    /// Returns `PositionError::TaskNotInView` for an unknown neighbor and
    /// `PositionError::InsufficientSpacing` if there is still no room after
    /// recalculating. Neighbors in the wrong order fail the same way
    /// without writing anything.
    pub fn place_between(
        &mut self,
        task_id: i64,
        view_id: i64,
        after: Option<i64>,
        before: Option<i64>,
    ) -> PositionResult<PositionEntry> {
        let mut recalculated = false;
        loop {
            let lower = after
                .map(|id| self.lookup(id, view_id))
                .transpose()?;
            let upper = before
                .map(|id| self.lookup(id, view_id))
                .transpose()?;

            if let (Some(lo), Some(hi)) = (lower, upper) {
                if lo >= hi {
                    return Err(PositionError::InsufficientSpacing { lower, upper });
                }
            }

            match position_between(lower, upper) {
                Ok(position) => return self.move_task(task_id, view_id, position),
                Err(PositionError::InsufficientSpacing { .. }) if !recalculated => {
                    warn!(view_id, ?lower, ?upper, "neighbors too close, recalculating view");
                    self.recalculate(view_id)?;
                    recalculated = true;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Gives every listed task without a usable position its default one.
    ///
    /// Tasks without an entry, or still at the `0.0` sentinel, get
    /// `default_position(id, 0.0)`. Returns all entries of the view ordered
    /// by (position, task id).
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn ensure_positions(
        &mut self,
        view_id: i64,
        task_ids: &[i64],
    ) -> PositionResult<Vec<PositionEntry>> {
        let existing: HashMap<i64, f64> = self
            .store
            .load_positions(view_id)?
            .into_iter()
            .map(|e| (e.task_id, e.position))
            .collect();

        let missing: Vec<PositionEntry> = task_ids
            .iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .filter(|id| existing.get(*id).map_or(true, |&p| p == 0.0))
            .map(|&id| PositionEntry::new(id, view_id, default_position(id, 0.0)))
            .collect();

        if !missing.is_empty() {
            self.store.save_positions(view_id, &missing)?;
            debug!(view_id, assigned = missing.len(), "assigned default positions");
            for entry in &missing {
                self.settle(view_id, entry.position)?;
            }
        }

        self.ordered_entries(view_id)
    }

    /// Deletes a task's entries in every view.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn remove_task(&mut self, task_id: i64) -> PositionResult<usize> {
        let removed = self.store.delete_task_positions(task_id)?;
        info!(task_id, removed, "removed task positions");
        Ok(removed)
    }

    /// Deletes every entry of a view.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn remove_view(&mut self, view_id: i64) -> PositionResult<usize> {
        let removed = self.store.delete_view_positions(view_id)?;
        info!(view_id, removed, "removed view positions");
        Ok(removed)
    }

    /// Resolves any collision at `position`, recalculating once if needed.
    fn settle(&mut self, view_id: i64, position: f64) -> PositionResult<()> {
        let conflicts = self.detect_conflicts(view_id, position)?;
        match self.resolve_conflicts(view_id, &conflicts) {
            Err(PositionError::NeedsFullRecalculation { .. }) => {
                warn!(view_id, position, "no room to resolve conflicts, recalculating view");
                self.recalculate(view_id).map(|_| ())
            }
            other => other,
        }
    }

    fn lookup(&self, task_id: i64, view_id: i64) -> PositionResult<f64> {
        self.store
            .load_positions(view_id)?
            .iter()
            .find(|e| e.task_id == task_id)
            .map(|e| e.position)
            .ok_or(PositionError::TaskNotInView { task_id, view_id })
    }
}
