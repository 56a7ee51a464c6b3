//! Task filter expressions.
//!
//! Filters are small boolean queries over task fields, stored verbatim on
//! saved filters and project views and compiled on every listing.
//!
//! # Syntax
//!
//! ## Clauses
//! - `field comparator value`, e.g. `priority >= 3` or `title like milk`
//! - comparators: `=`, `!=`, `>`, `>=`, `<`, `<=`, `like`, `in`, `not in`
//!
//! ## Values
//! - `true` / `false`
//! - integers and decimals
//! - dates: `2024-05-01`, `2024-05-01 14:00`, RFC 3339
//! - relative dates: `now`, `now+7d`, `now-1w/d` (units `s m h d w M y`)
//! - text, quoted (`'a b'`, `"it's"`) or bare (`buy milk`)
//! - lists after `in` / `not in`: `1,2,3`, `(1, 2)`, `'a, b'`
//!
//! ## Boolean Operators
//! - `&&` - AND
//! - `||` - OR
//! - `()` - Grouping
//!
//! There is no precedence between `&&` and `||`: clauses combine strictly
//! left to right, and parentheses are the only way to group.
//!
//! # Example
//!
//! ```
//! use taskview_core::filter::{compile, Dialect, FilterParser};
//!
//! let nodes = FilterParser::parse("done = false && (priority = 4 || labels in 1,2)", "UTC").unwrap();
//! let condition = compile(&nodes, false).unwrap().expect("non-empty filter");
//!
//! let fragment = condition.to_sql(Dialect::Sqlite);
//! assert_eq!(
//!     fragment.sql,
//!     "done = ? AND (priority = ? OR id IN (SELECT task_id FROM label_tasks WHERE label_id IN (?, ?)))"
//! );
//! ```

mod ast;
mod compiler;
mod condition;
mod error;
mod fields;
mod lexer;
mod parser;
mod value;

pub use ast::{display_nodes, Comparator, Concatenator, FilterNode, FilterValue, Scalar};
pub use compiler::compile;
pub use condition::{Condition, Dialect, Filterable, SqlFragment};
pub use error::{FilterError, FilterResult};
pub use fields::{resolve_field, Column, FieldDef, FieldKind, FIELDS};
pub use parser::FilterParser;
pub use value::parse_timezone;

#[cfg(test)]
mod tests;
