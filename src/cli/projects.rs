use std::path::{Path, PathBuf};
use std::str::FromStr;

use colored::Colorize;
use tracker_core::git::Git;
use tracker_core::models::{short_hash, CreateProjectInput, StatusCount, TaskStatus};

use super::output::{self, progress_bar, rule, wrap, RULE_WIDTH};
use super::App;

/// Paths are stored absolute so the hook can match Git's toplevel.
pub(super) fn normalize_path(path: &Path) -> String {
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| path.to_path_buf())
        .to_string_lossy()
        .into_owned()
}

pub fn add_project(
    app: &App,
    name: String,
    path: Option<PathBuf>,
    description: Option<String>,
) -> anyhow::Result<()> {
    let path = path.as_deref().map(normalize_path);
    let project = app.db.create_project(CreateProjectInput {
        name,
        path: path.clone(),
        description,
    })?;
    output::success(format!("Added project '{}' (ID: {})", project.name, project.id));

    if let Some(dir) = path.as_deref().map(Path::new).filter(|p| p.exists()) {
        if let Some(info) = Git::default().info(dir) {
            println!(
                "{}",
                format!("  Git: {} ({})", info.branch, info.commit).cyan()
            );
        }
    }
    Ok(())
}

pub fn list_projects(app: &App, status: Option<&str>) -> anyhow::Result<()> {
    let summaries = app.db.list_projects(status)?;
    if summaries.is_empty() {
        println!("{}", "No projects found".yellow());
        return Ok(());
    }

    println!("{}", "📁 Projects Overview".blue());
    println!("{}", rule(RULE_WIDTH));
    let git = Git::default();

    for summary in summaries {
        let p = &summary.project;
        let status = if p.is_active() {
            format!("({})", p.status).green()
        } else {
            format!("({})", p.status).yellow()
        };
        println!("{} {} {}", format!("[{}]", p.id).cyan(), p.name, status);
        if let Some(desc) = &p.description {
            println!("{}", wrap(desc, 60, "    ", "    "));
        }
        if let Some(path) = &p.path {
            println!("{}", format!("    📂 {path}").blue());
        }
        println!(
            "    📊 Tasks: {}/{} completed",
            summary.completed_tasks, summary.total_tasks
        );
        if let Some(info) = p
            .path
            .as_deref()
            .map(Path::new)
            .filter(|dir| dir.exists())
            .and_then(|dir| git.info(dir))
        {
            let dirty = if info.has_changes() {
                " (uncommitted changes)"
            } else {
                ""
            };
            println!(
                "{}",
                format!("    🌿 Git: {} ({}){dirty}", info.branch, info.commit).purple()
            );
        }
        println!();
    }
    Ok(())
}

fn print_status_line(count: &StatusCount, suffix: &str) {
    let line = match TaskStatus::from_str(&count.status) {
        Ok(status) => {
            let text = format!("{}: {}{suffix}", status.label(), count.count);
            output::paint_status(status, &text)
        }
        Err(_) => format!("{}: {}{suffix}", count.status, count.count).normal(),
    };
    println!("  {line}");
}

pub fn project_status(app: &App, reference: &str) -> anyhow::Result<()> {
    let project = app.db.resolve_project(reference)?;

    println!(
        "{}",
        format!("📁 {} - Detailed Status", project.name).blue()
    );
    println!("{}", rule(RULE_WIDTH));
    if let Some(desc) = &project.description {
        println!("📄 Description: {desc}");
    }
    if let Some(path) = &project.path {
        println!("📂 Path: {path}");
        if let Some(info) = Git::default().info(Path::new(path)) {
            println!("🌿 Git Branch: {}", info.branch);
            println!("📝 Latest Commit: {}", info.commit);
            if info.has_changes() {
                println!("{}", "⚠ Uncommitted changes present".yellow());
            } else {
                println!("{}", "✓ Working directory clean".green());
            }
        }
    }

    let counts = app.db.task_status_counts(Some(project.id))?;
    let total: i64 = counts.iter().map(|c| c.count).sum();
    if total == 0 {
        println!("\n{}", "No tasks found for this project".yellow());
        return Ok(());
    }

    println!("\n📊 Task Statistics (Total: {total})");
    for count in &counts {
        let pct = count.count as f64 / total as f64 * 100.0;
        print_status_line(count, &format!(" ({pct:.1}%)"));
    }
    Ok(())
}

pub fn overall_status(app: &App) -> anyhow::Result<()> {
    let stats = app.db.overall_stats()?;

    println!("{}", "📊 Overall Status".blue());
    println!("{}", rule(40));
    println!(
        "📁 Projects: {} active / {} total",
        stats.active_projects, stats.total_projects
    );

    let total = stats.total_tasks();
    if total == 0 {
        println!("📋 No tasks found");
        return Ok(());
    }
    println!("📋 Tasks: {total} total");
    println!(
        "   Progress: {}",
        progress_bar(stats.count_for(TaskStatus::Completed), total)
    );
    for count in stats.task_counts.iter().filter(|c| c.count > 0) {
        print_status_line(count, "");
    }
    Ok(())
}

pub fn activity(app: &App, reference: &str, limit: usize) -> anyhow::Result<()> {
    let project = app.db.resolve_project(reference)?;
    let records = app.db.recent_activity(project.id, limit)?;
    if records.is_empty() {
        println!(
            "{}",
            format!("No Git activity recorded for '{}'", project.name).yellow()
        );
        return Ok(());
    }

    println!(
        "{}",
        format!("🌿 Recent activity for {}", project.name).blue()
    );
    println!("{}", rule(RULE_WIDTH));
    for record in records {
        let task = record
            .task_id
            .map(|id| format!(" [task {id}]"))
            .unwrap_or_default();
        println!(
            "{} {} {}{}  {}",
            record.timestamp.format("%Y-%m-%d %H:%M"),
            short_hash(&record.commit_hash).cyan(),
            record.branch_name.purple(),
            task,
            record.message
        );
    }
    Ok(())
}
