//! Common helper functions for output formatting.

use chrono::{DateTime, Local, Utc};
use owo_colors::OwoColorize;

/// Truncates a string to a maximum number of characters.
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() > max_len {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    } else {
        s.to_string()
    }
}

/// Formats a priority padded to `width`, highest priorities in warm colors.
pub fn format_priority(priority: i64, width: usize, use_colors: bool) -> String {
    let label = if priority > 0 {
        format!("{:<width$}", priority)
    } else {
        format!("{:<width$}", "-")
    };

    if use_colors {
        match priority {
            p if p >= 4 => label.red().to_string(),
            3 => label.yellow().to_string(),
            2 => label.blue().to_string(),
            _ => label.dimmed().to_string(),
        }
    } else {
        label
    }
}

/// Formats a due date relative to today, padded to `width`.
pub fn format_due(due: Option<DateTime<Utc>>, width: usize, use_colors: bool) -> String {
    let Some(due) = due else {
        return format!("{:<width$}", "");
    };

    let date = due.with_timezone(&Local).date_naive();
    let today = Local::now().date_naive();
    let tomorrow = today + chrono::Duration::days(1);

    let display = if date == today {
        "Today".to_string()
    } else if date == tomorrow {
        "Tomorrow".to_string()
    } else if date < today {
        let days = (today - date).num_days();
        if days == 1 {
            "1 day ago".to_string()
        } else {
            format!("{days} days ago")
        }
    } else {
        date.format("%b %d").to_string()
    };
    let display = format!("{:<width$}", display);

    if use_colors {
        if date < today {
            display.red().to_string()
        } else if date == today {
            display.yellow().to_string()
        } else {
            display
        }
    } else {
        display
    }
}

/// Formats a position compactly: integers without a fraction, others
/// with up to nine decimals.
pub fn format_position(position: f64) -> String {
    if position.fract() == 0.0 && position.abs() < 1e15 {
        format!("{:.0}", position)
    } else {
        let s = format!("{:.9}", position);
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

/// Formats a section header.
pub fn header(text: &str, use_colors: bool) -> String {
    if use_colors {
        format!("{}\n", text.dimmed())
    } else {
        format!("{text}\n")
    }
}
