//! Output formatting utilities for the tv CLI.
//!
//! This module provides functions for formatting data as tables or JSON.
//! It is organized into submodules by entity type:
//!
//! - [`tasks`] - Listed view tasks and single position writes
//! - [`filters`] - Parsed filter nodes and rendered SQL
//! - [`positions`] - Duplicate reports, repair and recalculation results
//! - [`helpers`] - Common formatting utilities (truncation, priority, dates)

mod filters;
pub mod helpers;
mod positions;
mod tasks;

// Tasks
pub use tasks::{format_moved_task, format_tasks_json, format_tasks_table};

// Filters
pub use filters::{
    format_filter_nodes_json, format_filter_nodes_table, format_sql_json, format_sql_table,
};

// Positions
pub use positions::{
    format_duplicates_json, format_duplicates_table, format_recalculated, format_repair_json,
    format_repair_table,
};
