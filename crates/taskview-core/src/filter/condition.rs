//! Relational conditions produced by the filter compiler.
//!
//! A [`Condition`] can be rendered to parameterized SQL for a storage
//! backend, or evaluated directly against an in-memory record.

use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use super::ast::{Comparator, Scalar};
use super::fields::Column;

/// SQL flavor used when rendering a condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    /// SQLite: `?` placeholders.
    #[default]
    Sqlite,
    /// PostgreSQL: `$n` placeholders and `ILIKE`.
    Postgres,
    /// MySQL: `?` placeholders.
    Mysql,
}

impl Dialect {
    /// Earliest timestamp the backend stores reliably.
    fn floor_year(&self) -> i32 {
        match self {
            Dialect::Mysql => 1000,
            Dialect::Sqlite | Dialect::Postgres => 1,
        }
    }

    fn like_keyword(&self) -> &'static str {
        match self {
            Dialect::Postgres => "ILIKE",
            Dialect::Sqlite | Dialect::Mysql => "LIKE",
        }
    }
}

/// Rendered SQL with positional parameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SqlFragment {
    /// The `WHERE` clause body.
    pub sql: String,
    /// Parameters in placeholder order.
    pub params: Vec<Scalar>,
}

/// Escape character used in rendered `LIKE` patterns.
const LIKE_ESCAPE: char = '!';

/// A compiled filter condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// `column <op> value` for one of `=`, `!=`, `>`, `>=`, `<`, `<=`.
    Compare {
        /// The compared column.
        column: Column,
        /// The comparison operator.
        op: Comparator,
        /// The right-hand value.
        value: Scalar,
    },
    /// Case-insensitive substring match.
    Like {
        /// The matched column.
        column: Column,
        /// The substring to look for, unescaped.
        needle: String,
    },
    /// Set membership.
    In {
        /// The tested column.
        column: Column,
        /// The set members.
        values: Vec<Scalar>,
        /// True for `NOT IN`.
        negated: bool,
    },
    /// `column IS NULL`.
    IsNull {
        /// The tested column.
        column: Column,
    },
    /// Task id membership in a related table.
    ///
    /// Without an inner condition this tests whether the task has any
    /// related row at all.
    Related {
        /// The related table.
        table: &'static str,
        /// Condition on the related row.
        inner: Option<Box<Condition>>,
        /// True for `NOT IN`.
        negated: bool,
    },
    /// All conditions hold.
    And(Vec<Condition>),
    /// At least one condition holds.
    Or(Vec<Condition>),
}

impl Condition {
    /// Combines two conditions conjunctively.
    pub fn and(self, other: Condition) -> Condition {
        match self {
            Condition::And(mut items) => {
                items.push(other);
                Condition::And(items)
            }
            first => Condition::And(vec![first, other]),
        }
    }

    /// Combines two conditions disjunctively.
    pub fn or(self, other: Condition) -> Condition {
        match self {
            Condition::Or(mut items) => {
                items.push(other);
                Condition::Or(items)
            }
            first => Condition::Or(vec![first, other]),
        }
    }

    /// Renders the condition as a parameterized SQL `WHERE` body.
    ///
    /// # Example
    ///
    /// ```
    /// use taskview_core::filter::{compile, Dialect, FilterParser};
    ///
    /// let nodes = FilterParser::parse("done = false && priority >= 3", "").unwrap();
    /// let condition = compile(&nodes, false).unwrap().unwrap();
    /// let fragment = condition.to_sql(Dialect::Postgres);
    /// assert_eq!(fragment.sql, "done = $1 AND priority >= $2");
    /// ```
    pub fn to_sql(&self, dialect: Dialect) -> SqlFragment {
        let mut writer = SqlWriter {
            dialect,
            params: Vec::new(),
        };
        let sql = writer.render(self);
        SqlFragment {
            sql,
            params: writer.params,
        }
    }

    /// Evaluates the condition against a record.
    ///
    /// Follows SQL null semantics: any comparison against a missing value
    /// is false, so only `IsNull` matches it.
    pub fn matches<R: Filterable + ?Sized>(&self, record: &R) -> bool {
        match self {
            Condition::And(items) => items.iter().all(|c| c.matches(record)),
            Condition::Or(items) => items.iter().any(|c| c.matches(record)),
            Condition::Related {
                table,
                inner,
                negated,
            } => {
                let rows = record.related_values(table);
                let hit = match inner {
                    Some(inner) => rows.iter().any(|v| inner.test_value(Some(v))),
                    None => !rows.is_empty(),
                };
                hit != *negated
            }
            Condition::Compare { column, .. }
            | Condition::Like { column, .. }
            | Condition::In { column, .. }
            | Condition::IsNull { column } => match column {
                Column::Task(name) => self.test_value(record.task_value(name).as_ref()),
                Column::Related { table, .. } => record
                    .related_values(table)
                    .iter()
                    .any(|v| self.test_value(Some(v))),
            },
        }
    }

    /// Tests a single column value against a leaf condition.
    fn test_value(&self, value: Option<&Scalar>) -> bool {
        match self {
            Condition::IsNull { .. } => value.is_none(),
            Condition::Compare { op, value: rhs, .. } => {
                let Some(lhs) = value else { return false };
                let Some(ordering) = compare_scalars(lhs, rhs) else {
                    return false;
                };
                match op {
                    Comparator::Equals => ordering == Ordering::Equal,
                    Comparator::NotEquals => ordering != Ordering::Equal,
                    Comparator::Greater => ordering == Ordering::Greater,
                    Comparator::GreaterEquals => ordering != Ordering::Less,
                    Comparator::Less => ordering == Ordering::Less,
                    Comparator::LessEquals => ordering != Ordering::Greater,
                    Comparator::Like | Comparator::In | Comparator::NotIn => false,
                }
            }
            Condition::Like { needle, .. } => match value {
                Some(Scalar::Text(text)) => text.to_lowercase().contains(&needle.to_lowercase()),
                _ => false,
            },
            Condition::In {
                values, negated, ..
            } => {
                let Some(lhs) = value else { return false };
                let found = values
                    .iter()
                    .any(|v| compare_scalars(lhs, v) == Some(Ordering::Equal));
                found != *negated
            }
            Condition::And(items) => items.iter().all(|c| c.test_value(value)),
            Condition::Or(items) => items.iter().any(|c| c.test_value(value)),
            Condition::Related { .. } => false,
        }
    }
}

/// Orders two scalars of compatible types.
fn compare_scalars(lhs: &Scalar, rhs: &Scalar) -> Option<Ordering> {
    match (lhs, rhs) {
        (Scalar::Int(a), Scalar::Int(b)) => Some(a.cmp(b)),
        (Scalar::Bool(a), Scalar::Bool(b)) => Some(a.cmp(b)),
        (Scalar::Time(a), Scalar::Time(b)) => Some(a.cmp(b)),
        (Scalar::Text(a), Scalar::Text(b)) => Some(a.cmp(b)),
        (a, b) => a.as_f64()?.partial_cmp(&b.as_f64()?),
    }
}

/// A record that conditions can be evaluated against.
pub trait Filterable {
    /// Returns the value of a task column, or `None` when it is NULL.
    fn task_value(&self, column: &str) -> Option<Scalar>;

    /// Returns the values of the task's rows in a related table.
    fn related_values(&self, table: &str) -> Vec<Scalar>;
}

struct SqlWriter {
    dialect: Dialect,
    params: Vec<Scalar>,
}

impl SqlWriter {
    fn bind(&mut self, value: &Scalar) -> String {
        let value = match value {
            Scalar::Time(t) => Scalar::Time(clamp_time(*t, self.dialect.floor_year())),
            other => other.clone(),
        };
        self.params.push(value);
        match self.dialect {
            Dialect::Postgres => format!("${}", self.params.len()),
            Dialect::Sqlite | Dialect::Mysql => "?".to_string(),
        }
    }

    fn render(&mut self, condition: &Condition) -> String {
        match condition {
            Condition::Compare { column, op, value } => {
                let placeholder = self.bind(value);
                format!("{} {} {}", column_name(column), op.as_str(), placeholder)
            }
            Condition::Like { column, needle } => {
                let pattern = Scalar::Text(format!("%{}%", escape_like(needle)));
                let placeholder = self.bind(&pattern);
                format!(
                    "{} {} {} ESCAPE '{}'",
                    column_name(column),
                    self.dialect.like_keyword(),
                    placeholder,
                    LIKE_ESCAPE
                )
            }
            Condition::In {
                column,
                values,
                negated,
            } => {
                let placeholders: Vec<String> = values.iter().map(|v| self.bind(v)).collect();
                format!(
                    "{} {}IN ({})",
                    column_name(column),
                    if *negated { "NOT " } else { "" },
                    placeholders.join(", ")
                )
            }
            Condition::IsNull { column } => format!("{} IS NULL", column_name(column)),
            Condition::Related {
                table,
                inner,
                negated,
            } => {
                let not = if *negated { "NOT " } else { "" };
                match inner {
                    Some(inner) => {
                        let inner_sql = self.render(inner);
                        format!("id {not}IN (SELECT task_id FROM {table} WHERE {inner_sql})")
                    }
                    None => format!("id {not}IN (SELECT task_id FROM {table})"),
                }
            }
            Condition::And(items) => self.render_joined(items, " AND "),
            Condition::Or(items) => self.render_joined(items, " OR "),
        }
    }

    fn render_joined(&mut self, items: &[Condition], separator: &str) -> String {
        let parts: Vec<String> = items
            .iter()
            .map(|item| match item {
                Condition::And(_) | Condition::Or(_) => format!("({})", self.render(item)),
                _ => self.render(item),
            })
            .collect();
        parts.join(separator)
    }
}

fn column_name(column: &Column) -> &'static str {
    match column {
        Column::Task(name) => name,
        Column::Related { column, .. } => column,
    }
}

fn escape_like(needle: &str) -> String {
    let mut out = String::with_capacity(needle.len());
    for c in needle.chars() {
        if c == '%' || c == '_' || c == LIKE_ESCAPE {
            out.push(LIKE_ESCAPE);
        }
        out.push(c);
    }
    out
}

/// Raises a timestamp to January 1st of `floor_year` if it is earlier.
fn clamp_time(time: DateTime<Utc>, floor_year: i32) -> DateTime<Utc> {
    let floor = NaiveDate::from_ymd_opt(floor_year, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|n| n.and_utc());
    match floor {
        Some(floor) if time < floor => floor,
        _ => time,
    }
}
