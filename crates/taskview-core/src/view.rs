//! Listing the tasks of a project view.

use std::collections::HashMap;

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::filter::{compile, Column, Comparator, Condition, FilterError, FilterParser, Scalar};
use crate::model::Task;
use crate::position::{PositionError, PositionService};
use crate::store::{PositionStore, StoreError, TaskStore};

/// Errors that can occur while listing a view.
#[derive(Debug, Error)]
pub enum ViewError {
    /// The view filter or request filter is invalid.
    #[error(transparent)]
    Filter(#[from] FilterError),

    /// Positions could not be assigned.
    #[error(transparent)]
    Position(#[from] PositionError),

    /// The store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A listed task with its position in the view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListedTask {
    /// The task.
    #[serde(flatten)]
    pub task: Task,
    /// Its position in the listed view.
    pub position: f64,
}

/// Options for a single listing.
#[derive(Debug, Clone, Default)]
pub struct ListOptions<'a> {
    /// Filter from the request, applied on top of the view's own filter.
    pub filter: Option<&'a str>,
    /// IANA timezone for dates in filters; empty means UTC.
    pub timezone: &'a str,
    /// Also match tasks whose filtered fields are unset.
    pub include_nulls: bool,
}

/// Lists project views: filters the project's tasks and orders them by
/// their view positions, assigning positions to tasks that have none.
#[derive(Debug)]
pub struct ViewLister<S> {
    positions: PositionService<S>,
}

impl<S: TaskStore + PositionStore> ViewLister<S> {
    /// Creates a lister over a store.
    pub fn new(store: S) -> Self {
        Self {
            positions: PositionService::new(store),
        }
    }

    /// Returns the position service.
    pub fn positions(&mut self) -> &mut PositionService<S> {
        &mut self.positions
    }

    /// Consumes the lister, returning the store.
    pub fn into_store(self) -> S {
        self.positions.into_store()
    }

    /// Builds the condition for a view listing without running it.
    ///
    /// # Errors
    ///
    /// Returns `ViewError::Store` for an unknown view and
    /// `ViewError::Filter` for an invalid filter.
    pub fn condition(&self, view_id: i64, options: &ListOptions<'_>) -> Result<Condition, ViewError> {
        let view = self.positions.store().load_view(view_id)?;

        let mut condition = Condition::Compare {
            column: Column::Task("project_id"),
            op: Comparator::Equals,
            value: Scalar::Int(view.project_id),
        };

        let filters = [view.filter.as_deref(), options.filter];
        for filter in filters.into_iter().flatten() {
            if filter.trim().is_empty() {
                continue;
            }
            let nodes = FilterParser::parse(filter, options.timezone)?;
            if let Some(compiled) = compile(&nodes, options.include_nulls)? {
                condition = condition.and(compiled);
            }
        }
        Ok(condition)
    }

    /// Lists a view's tasks in position order.
    ///
    /// The view's stored filter and the request filter are both applied.
    /// Tasks without a position in the view get their default position,
    /// which is persisted. Ties are broken by task id.
    ///
    /// # Errors
    ///
    /// Returns `ViewError` when the view is unknown, a filter is invalid,
    /// or positions cannot be stored.
    pub fn list(
        &mut self,
        view_id: i64,
        options: &ListOptions<'_>,
    ) -> Result<Vec<ListedTask>, ViewError> {
        let condition = self.condition(view_id, options)?;
        let tasks = self
            .positions
            .store()
            .load_tasks_matching(Some(&condition))?;

        let ids: Vec<i64> = tasks.iter().map(|t| t.id).collect();
        let positions: HashMap<i64, f64> = self
            .positions
            .ensure_positions(view_id, &ids)?
            .into_iter()
            .map(|e| (e.task_id, e.position))
            .collect();

        let mut listed: Vec<ListedTask> = tasks
            .into_iter()
            .map(|task| {
                let position = positions.get(&task.id).copied().unwrap_or(0.0);
                ListedTask { task, position }
            })
            .collect();
        listed.sort_by(|a, b| {
            a.position
                .total_cmp(&b.position)
                .then(a.task.id.cmp(&b.task.id))
        });

        debug!(view_id, tasks = listed.len(), "listed view");
        Ok(listed)
    }
}
