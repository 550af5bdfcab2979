//! Terminal rendering helpers shared by the commands.

use chrono::NaiveDate;
use colored::{ColoredString, Colorize};
use tracker_core::models::{Priority, TaskStatus};

pub const RULE_WIDTH: usize = 50;
pub const PROGRESS_CELLS: usize = 20;

pub fn rule(width: usize) -> String {
    "=".repeat(width)
}

pub fn success(message: impl std::fmt::Display) {
    println!("{}", format!("✓ {message}").green());
}

pub fn failure(message: impl std::fmt::Display) {
    eprintln!("{}", format!("✗ {message}").red());
}

pub fn warning(message: impl std::fmt::Display) {
    println!("{}", format!("⚠ {message}").yellow());
}

pub fn status_colored(status: TaskStatus) -> ColoredString {
    paint_status(status, status.as_str())
}

/// Colors `text` the way `status` is shown everywhere else.
pub fn paint_status(status: TaskStatus, text: &str) -> ColoredString {
    match status {
        TaskStatus::Pending => text.yellow(),
        TaskStatus::InProgress => text.blue(),
        TaskStatus::Completed => text.green(),
        TaskStatus::Blocked => text.red(),
    }
}

pub fn priority_colored(priority: Priority) -> ColoredString {
    let label = priority.as_str().to_uppercase();
    match priority {
        Priority::High => label.red(),
        Priority::Medium => label.yellow(),
        Priority::Low => label.cyan(),
    }
}

/// Greedy word wrap. The first line starts with `first`, continuation lines
/// with `rest`; `width` counts the indent.
pub fn wrap(text: &str, width: usize, first: &str, rest: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut line = first.to_string();
    let mut line_len = first.chars().count();
    let mut empty = true;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        if !empty && line_len + 1 + word_len > width {
            lines.push(std::mem::replace(&mut line, rest.to_string()));
            line_len = rest.chars().count();
            empty = true;
        }
        if !empty {
            line.push(' ');
            line_len += 1;
        }
        line.push_str(word);
        line_len += word_len;
        empty = false;
    }
    if !empty {
        lines.push(line);
    }
    lines.join("\n")
}

/// Days until `due` relative to `today`, with the listing's highlighting.
pub fn due_countdown(due: NaiveDate, today: NaiveDate) -> ColoredString {
    let days = (due - today).num_days();
    match days {
        d if d < 0 => format!("OVERDUE by {} days", -d).red(),
        0 => "TODAY".yellow(),
        d if d <= 7 => format!("{d} days left").yellow(),
        d => format!("{d} days left").normal(),
    }
}

/// `[████░░…] 40.0% (4/10)` style bar.
pub fn progress_bar(completed: i64, total: i64) -> String {
    let ratio = if total > 0 {
        completed as f64 / total as f64
    } else {
        0.0
    };
    let filled = ((ratio * PROGRESS_CELLS as f64) as usize).min(PROGRESS_CELLS);
    format!(
        "[{}{}] {:.1}% ({completed}/{total})",
        "█".repeat(filled),
        "░".repeat(PROGRESS_CELLS - filled),
        ratio * 100.0
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn wraps_with_indents() {
        let text = "alpha beta gamma delta";
        assert_eq!(
            wrap(text, 14, "    ", "    "),
            "    alpha beta\n    gamma\n    delta"
        );
        assert_eq!(wrap("", 10, "> ", "  "), "");
    }

    #[test]
    fn long_word_gets_its_own_line() {
        assert_eq!(
            wrap("a incomprehensibilities b", 8, "", ""),
            "a\nincomprehensibilities\nb"
        );
    }

    #[test]
    fn countdown_labels() {
        let today = date(2024, 5, 10);
        colored::control::set_override(false);
        assert_eq!(
            due_countdown(date(2024, 5, 7), today).to_string(),
            "OVERDUE by 3 days"
        );
        assert_eq!(due_countdown(today, today).to_string(), "TODAY");
        assert_eq!(
            due_countdown(date(2024, 5, 12), today).to_string(),
            "2 days left"
        );
        assert_eq!(
            due_countdown(date(2024, 6, 10), today).to_string(),
            "31 days left"
        );
    }

    #[test]
    fn progress_bar_fills_proportionally() {
        assert_eq!(
            progress_bar(1, 4),
            format!("[{}{}] 25.0% (1/4)", "█".repeat(5), "░".repeat(15))
        );
        assert_eq!(
            progress_bar(0, 0),
            format!("[{}] 0.0% (0/0)", "░".repeat(20))
        );
        assert!(progress_bar(3, 3).starts_with(&format!("[{}]", "█".repeat(20))));
    }
}
