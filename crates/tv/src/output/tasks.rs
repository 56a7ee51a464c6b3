//! Task output formatting.

use chrono::{DateTime, Utc};
use owo_colors::OwoColorize;
use serde::Serialize;
use taskview_core::position::PositionEntry;
use taskview_core::ListedTask;

use super::helpers::{format_due, format_position, format_priority, header, truncate_str};

/// JSON output structure for list command.
#[derive(Serialize)]
pub struct ListOutput<'a> {
    pub view_id: i64,
    pub tasks: Vec<TaskOutput<'a>>,
}

/// JSON output structure for a single listed task.
#[derive(Serialize)]
pub struct TaskOutput<'a> {
    pub id: i64,
    pub title: &'a str,
    pub done: bool,
    pub priority: i64,
    pub due_date: Option<DateTime<Utc>>,
    pub project_id: i64,
    pub labels: &'a [i64],
    pub position: f64,
}

/// Formats listed tasks as JSON.
pub fn format_tasks_json(view_id: i64, tasks: &[ListedTask]) -> Result<String, serde_json::Error> {
    let tasks = tasks
        .iter()
        .map(|listed| TaskOutput {
            id: listed.task.id,
            title: &listed.task.title,
            done: listed.task.done,
            priority: listed.task.priority,
            due_date: listed.task.due_date,
            project_id: listed.task.project_id,
            labels: &listed.task.labels,
            position: listed.position,
        })
        .collect();

    serde_json::to_string_pretty(&ListOutput { view_id, tasks })
}

/// Formats listed tasks as a table in view order.
pub fn format_tasks_table(tasks: &[ListedTask], use_colors: bool) -> String {
    if tasks.is_empty() {
        return "No tasks found.\n".to_string();
    }

    let mut output = header(
        &format!(
            "{:<8} {:<14} {:<4} {:<12} {}",
            "ID", "Position", "Pri", "Due", "Title"
        ),
        use_colors,
    );

    for listed in tasks {
        let task = &listed.task;
        let title = truncate_str(&task.title, 60);
        let title = if task.done && use_colors {
            title.strikethrough().dimmed().to_string()
        } else if task.done {
            format!("[x] {title}")
        } else {
            title
        };

        output.push_str(&format!(
            "{:<8} {:<14} {} {} {}\n",
            task.id,
            format_position(listed.position),
            format_priority(task.priority, 4, use_colors),
            format_due(task.due_date, 12, use_colors),
            title
        ));
    }

    output
}

/// Formats the result of a move or place.
pub fn format_moved_task(entry: &PositionEntry, use_colors: bool) -> String {
    let position = format_position(entry.position);
    let position = if use_colors {
        position.green().to_string()
    } else {
        position
    };
    format!(
        "Task {} is at position {} in view {}",
        entry.task_id, position, entry.project_view_id
    )
}
