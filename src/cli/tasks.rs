use std::str::FromStr;

use chrono::Local;
use colored::Colorize;
use tracker_core::models::{parse_due_date, CreateTaskInput, Priority, TaskFilter, TaskStatus};

use super::output::{self, due_countdown, priority_colored, rule, status_colored, wrap};
use super::App;

pub fn add_task(
    app: &App,
    project_ref: &str,
    title: String,
    description: Option<String>,
    priority: &str,
    due: Option<&str>,
) -> anyhow::Result<()> {
    // Validate everything before touching the store.
    let priority = Priority::from_str(priority)?;
    let due_date = due.map(parse_due_date).transpose()?;
    let project = app.db.resolve_project(project_ref)?;

    let task = app.db.create_task(
        project.id,
        CreateTaskInput {
            title,
            description,
            priority,
            due_date,
            ai: None,
        },
    )?;

    output::success(format!(
        "Added task '{}' to {} (ID: {})",
        task.title, project.name, task.id
    ));
    println!("  Priority: {}", priority_colored(task.priority));
    if let Some(due) = task.due_date {
        println!("  Due: {due}");
    }
    Ok(())
}

pub fn list_tasks(
    app: &App,
    project_ref: Option<&str>,
    status: Option<&str>,
) -> anyhow::Result<()> {
    let status = status.map(TaskStatus::from_str).transpose()?;
    let project_id = project_ref
        .map(|r| app.db.resolve_project(r))
        .transpose()?
        .map(|p| p.id);

    let tasks = app.db.list_tasks(&TaskFilter { project_id, status })?;
    if tasks.is_empty() {
        println!("{}", "No tasks found".yellow());
        return Ok(());
    }

    println!("{}", "📋 Tasks Overview".blue());
    println!("{}", rule(60));
    let today = Local::now().date_naive();

    for entry in tasks {
        let task = &entry.task;
        println!(
            "{} {} {} ({})",
            format!("[{}]", task.id).cyan(),
            task.priority.symbol(),
            task.title,
            status_colored(task.status)
        );
        println!("    📁 Project: {}", entry.project_name);
        if let Some(desc) = &task.description {
            println!("{}", wrap(desc, 70, "    📄 ", "       "));
        }
        if let Some(due) = task.due_date {
            println!("    📅 Due: {due} ({})", due_countdown(due, today));
        }
        println!();
    }
    Ok(())
}

pub fn set_status(app: &App, task_ref: &str, status: &str) -> anyhow::Result<()> {
    let task = app.db.resolve_task(task_ref)?;
    let change = app.db.set_task_status(task.id, status)?;
    println!(
        "{} {}",
        format!("✓ Updated '{}' to", change.title).green(),
        status_colored(change.current)
    );
    Ok(())
}
