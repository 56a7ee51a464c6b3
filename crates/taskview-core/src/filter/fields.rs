//! The fixed table of filterable task fields.
//!
//! Field names and their aliases are part of the persisted filter grammar:
//! saved filters and views store the raw filter string, so an alias must
//! never silently change meaning.

use strsim::levenshtein;

use super::error::{FilterError, FilterResult};

/// Maximum Levenshtein distance for a "did you mean" suggestion.
const MAX_SUGGESTION_DISTANCE: usize = 3;

/// The value type stored in a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Boolean flag.
    Bool,
    /// 64-bit integer (ids, priorities, durations).
    Int,
    /// Floating point number.
    Float,
    /// Point in time.
    Time,
    /// Free text.
    Text,
}

impl FieldKind {
    /// Returns a lowercase name for error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Bool => "bool",
            FieldKind::Int => "integer",
            FieldKind::Float => "number",
            FieldKind::Time => "date",
            FieldKind::Text => "text",
        }
    }
}

/// Where a field lives relationally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    /// A column on the tasks table.
    Task(&'static str),
    /// A column on a table related to tasks through `task_id`.
    ///
    /// A task matches when any related row matches.
    Related {
        /// The related table.
        table: &'static str,
        /// The compared column on that table.
        column: &'static str,
    },
}

/// Definition of a filterable field.
#[derive(Debug, PartialEq, Eq)]
pub struct FieldDef {
    /// Canonical field name (also the task column name for task fields).
    pub name: &'static str,
    /// Accepted alternative spellings.
    pub aliases: &'static [&'static str],
    /// Relational location.
    pub column: Column,
    /// Value type.
    pub kind: FieldKind,
}

impl FieldDef {
    /// Returns true for numeric task columns.
    ///
    /// Numeric columns use `0` as their "unset" value, so include-nulls mode
    /// also matches rows holding `0`.
    pub fn is_numeric(&self) -> bool {
        matches!(self.column, Column::Task(_))
            && matches!(self.kind, FieldKind::Int | FieldKind::Float)
    }

    /// Returns true if the field lives on a related table.
    pub fn is_related(&self) -> bool {
        matches!(self.column, Column::Related { .. })
    }
}

/// All filterable fields.
pub static FIELDS: &[FieldDef] = &[
    FieldDef {
        name: "id",
        aliases: &[],
        column: Column::Task("id"),
        kind: FieldKind::Int,
    },
    FieldDef {
        name: "title",
        aliases: &[],
        column: Column::Task("title"),
        kind: FieldKind::Text,
    },
    FieldDef {
        name: "description",
        aliases: &[],
        column: Column::Task("description"),
        kind: FieldKind::Text,
    },
    FieldDef {
        name: "done",
        aliases: &[],
        column: Column::Task("done"),
        kind: FieldKind::Bool,
    },
    FieldDef {
        name: "done_at",
        aliases: &["doneAt"],
        column: Column::Task("done_at"),
        kind: FieldKind::Time,
    },
    FieldDef {
        name: "due_date",
        aliases: &["dueDate", "due"],
        column: Column::Task("due_date"),
        kind: FieldKind::Time,
    },
    FieldDef {
        name: "start_date",
        aliases: &["startDate"],
        column: Column::Task("start_date"),
        kind: FieldKind::Time,
    },
    FieldDef {
        name: "end_date",
        aliases: &["endDate"],
        column: Column::Task("end_date"),
        kind: FieldKind::Time,
    },
    FieldDef {
        name: "priority",
        aliases: &[],
        column: Column::Task("priority"),
        kind: FieldKind::Int,
    },
    FieldDef {
        name: "percent_done",
        aliases: &["percentDone"],
        column: Column::Task("percent_done"),
        kind: FieldKind::Float,
    },
    FieldDef {
        name: "project_id",
        aliases: &["project", "projects", "projectId"],
        column: Column::Task("project_id"),
        kind: FieldKind::Int,
    },
    FieldDef {
        name: "bucket_id",
        aliases: &["bucket", "buckets", "bucketId"],
        column: Column::Task("bucket_id"),
        kind: FieldKind::Int,
    },
    FieldDef {
        name: "repeat_after",
        aliases: &["repeatAfter"],
        column: Column::Task("repeat_after"),
        kind: FieldKind::Int,
    },
    FieldDef {
        name: "created",
        aliases: &[],
        column: Column::Task("created"),
        kind: FieldKind::Time,
    },
    FieldDef {
        name: "updated",
        aliases: &[],
        column: Column::Task("updated"),
        kind: FieldKind::Time,
    },
    FieldDef {
        name: "assignees",
        aliases: &["assignee"],
        column: Column::Related {
            table: "task_assignees",
            column: "username",
        },
        kind: FieldKind::Text,
    },
    FieldDef {
        name: "labels",
        aliases: &["label"],
        column: Column::Related {
            table: "label_tasks",
            column: "label_id",
        },
        kind: FieldKind::Int,
    },
    FieldDef {
        name: "reminders",
        aliases: &["reminder"],
        column: Column::Related {
            table: "task_reminders",
            column: "reminder",
        },
        kind: FieldKind::Time,
    },
];

/// Normalizes a field spelling: lowercase, underscores removed.
///
/// This makes `due_date`, `dueDate` and `duedate` the same field.
fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Resolves a field name or alias to its definition.
///
/// # Errors
///
/// Returns `FilterError::InvalidFilterField` if the name is unknown, with a
/// suggestion when a known spelling is close.
pub fn resolve_field(name: &str) -> FilterResult<&'static FieldDef> {
    let wanted = normalize(name);
    FIELDS
        .iter()
        .find(|def| {
            normalize(def.name) == wanted || def.aliases.iter().any(|a| normalize(a) == wanted)
        })
        .ok_or_else(|| FilterError::unknown_field(name, suggest_field(name)))
}

/// Finds the closest known field spelling.
fn suggest_field(name: &str) -> Option<String> {
    let query = name.to_lowercase();
    let (best, distance) = FIELDS
        .iter()
        .flat_map(|def| std::iter::once(def.name).chain(def.aliases.iter().copied()))
        .map(|candidate| (candidate, levenshtein(&query, &candidate.to_lowercase())))
        .min_by_key(|(_, d)| *d)?;

    if distance > 0 && distance <= MAX_SUGGESTION_DISTANCE {
        Some(best.to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_canonical_names() {
        for def in FIELDS {
            assert_eq!(resolve_field(def.name).unwrap().name, def.name);
        }
    }

    #[test]
    fn test_resolve_project_aliases() {
        for alias in ["project", "projects", "project_id", "projectId", "PROJECT"] {
            assert_eq!(resolve_field(alias).unwrap().name, "project_id", "{alias}");
        }
    }

    #[test]
    fn test_resolve_camel_case_dates() {
        assert_eq!(resolve_field("dueDate").unwrap().name, "due_date");
        assert_eq!(resolve_field("due").unwrap().name, "due_date");
        assert_eq!(resolve_field("startDate").unwrap().name, "start_date");
        assert_eq!(resolve_field("doneAt").unwrap().name, "done_at");
    }

    #[test]
    fn test_resolve_singular_related() {
        assert_eq!(resolve_field("label").unwrap().name, "labels");
        assert_eq!(resolve_field("assignee").unwrap().name, "assignees");
        assert_eq!(resolve_field("reminder").unwrap().name, "reminders");
    }

    #[test]
    fn test_unknown_field_with_suggestion() {
        let err = resolve_field("priorty").unwrap_err();
        assert_eq!(
            err,
            FilterError::InvalidFilterField {
                field: "priorty".to_string(),
                suggestion: Some("priority".to_string()),
            }
        );
    }

    #[test]
    fn test_unknown_field_without_suggestion() {
        let err = resolve_field("xyzzyplugh").unwrap_err();
        assert!(matches!(
            err,
            FilterError::InvalidFilterField {
                suggestion: None,
                ..
            }
        ));
    }

    #[test]
    fn test_numeric_flags() {
        assert!(resolve_field("priority").unwrap().is_numeric());
        assert!(resolve_field("project").unwrap().is_numeric());
        assert!(resolve_field("percent_done").unwrap().is_numeric());
        assert!(!resolve_field("title").unwrap().is_numeric());
        assert!(!resolve_field("due_date").unwrap().is_numeric());
        // Related integer columns have no zero sentinel.
        assert!(!resolve_field("labels").unwrap().is_numeric());
    }
}
