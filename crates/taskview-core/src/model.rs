//! Task and view records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::filter::{Filterable, Scalar};

/// A task as seen by filters and views.
///
/// Missing dates are `None`. `project_id`, `bucket_id`, `priority` and
/// `repeat_after` use `0` for "unset".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Task id.
    pub id: i64,
    /// Task title.
    pub title: String,
    /// Task description.
    #[serde(default)]
    pub description: String,
    /// Whether the task is done.
    #[serde(default)]
    pub done: bool,
    /// When the task was marked done.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub done_at: Option<DateTime<Utc>>,
    /// Due date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    /// Start date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    /// End date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    /// Priority, `0` when unset.
    #[serde(default)]
    pub priority: i64,
    /// Completion between 0 and 1.
    #[serde(default)]
    pub percent_done: f64,
    /// Owning project.
    #[serde(default)]
    pub project_id: i64,
    /// Kanban bucket.
    #[serde(default)]
    pub bucket_id: i64,
    /// Repeat interval in seconds.
    #[serde(default)]
    pub repeat_after: i64,
    /// Creation time.
    #[serde(default)]
    pub created: DateTime<Utc>,
    /// Last update time.
    #[serde(default)]
    pub updated: DateTime<Utc>,
    /// Usernames of assignees.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub assignees: Vec<String>,
    /// Label ids.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<i64>,
    /// Reminder times.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reminders: Vec<DateTime<Utc>>,
}

impl Task {
    /// Creates a task with an id, a title and a project.
    pub fn new(id: i64, title: impl Into<String>, project_id: i64) -> Self {
        Self {
            id,
            title: title.into(),
            project_id,
            ..Self::default()
        }
    }
}

impl Filterable for Task {
    fn task_value(&self, column: &str) -> Option<Scalar> {
        match column {
            "id" => Some(Scalar::Int(self.id)),
            "title" => Some(Scalar::Text(self.title.clone())),
            "description" => Some(Scalar::Text(self.description.clone())),
            "done" => Some(Scalar::Bool(self.done)),
            "done_at" => self.done_at.map(Scalar::Time),
            "due_date" => self.due_date.map(Scalar::Time),
            "start_date" => self.start_date.map(Scalar::Time),
            "end_date" => self.end_date.map(Scalar::Time),
            "priority" => Some(Scalar::Int(self.priority)),
            "percent_done" => Some(Scalar::Float(self.percent_done)),
            "project_id" => Some(Scalar::Int(self.project_id)),
            "bucket_id" => Some(Scalar::Int(self.bucket_id)),
            "repeat_after" => Some(Scalar::Int(self.repeat_after)),
            "created" => Some(Scalar::Time(self.created)),
            "updated" => Some(Scalar::Time(self.updated)),
            _ => None,
        }
    }

    fn related_values(&self, table: &str) -> Vec<Scalar> {
        match table {
            "task_assignees" => self.assignees.iter().cloned().map(Scalar::Text).collect(),
            "label_tasks" => self.labels.iter().copied().map(Scalar::Int).collect(),
            "task_reminders" => self.reminders.iter().copied().map(Scalar::Time).collect(),
            _ => Vec::new(),
        }
    }
}

/// A view onto a project's tasks, with its own ordering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectView {
    /// View id; also the ordering scope for positions.
    pub id: i64,
    /// Project the view belongs to.
    pub project_id: i64,
    /// Display title.
    pub title: String,
    /// Filter applied to every listing of this view.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{compile, FilterParser};

    fn matches(task: &Task, filter: &str, include_nulls: bool) -> bool {
        let nodes = FilterParser::parse(filter, "UTC").unwrap();
        compile(&nodes, include_nulls)
            .unwrap()
            .map_or(true, |c| c.matches(task))
    }

    #[test]
    fn test_task_field_values() {
        let mut task = Task::new(3, "Buy milk", 7);
        task.priority = 2;
        task.labels = vec![1, 4];
        task.assignees = vec!["alice".to_string()];

        assert!(matches(&task, "project = 7 && priority >= 2", false));
        assert!(matches(&task, "labels in 4, 9", false));
        assert!(matches(&task, "assignee = alice", false));
        assert!(!matches(&task, "assignees != alice", false));
        assert!(matches(&task, "title like MILK", false));
    }

    #[test]
    fn test_missing_due_date_only_matches_with_nulls() {
        let task = Task::new(1, "No date", 1);
        assert!(!matches(&task, "due_date < now", false));
        assert!(matches(&task, "due_date < now", true));
    }

    #[test]
    fn test_unset_bucket_matches_with_nulls() {
        let task = Task::new(1, "Loose", 1);
        assert!(!matches(&task, "bucket = 5", false));
        assert!(matches(&task, "bucket = 5", true));
    }

    #[test]
    fn test_deserialize_minimal_task() {
        let task: Task = serde_json::from_str(r#"{"id": 9, "title": "x"}"#).unwrap();
        assert_eq!(task.id, 9);
        assert!(task.due_date.is_none());
        assert!(task.labels.is_empty());
    }
}
