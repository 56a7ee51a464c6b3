//! Filter expressions and fractional ordering for task views.
//!
//! This crate holds the core of a "list tasks for a view" backend:
//!
//! - [`filter`]: a small query language (`done = false && priority >= 3`)
//!   parsed into filter nodes and compiled into a [`filter::Condition`]
//!   that renders to SQL or evaluates in memory.
//! - [`position`]: fractional positions that keep tasks ordered within a
//!   view, with conflict detection, resolution and repair.
//! - [`store`]: the storage traits both subsystems are given, plus an
//!   in-memory implementation and a JSON snapshot file.
//! - [`view`]: the listing pipeline tying them together.

pub mod filter;
pub mod model;
pub mod position;
pub mod store;
pub mod view;

pub use model::{ProjectView, Task};
pub use view::{ListOptions, ListedTask, ViewError, ViewLister};
