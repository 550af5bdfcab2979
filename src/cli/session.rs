//! Development sessions: project overview plus optional system tuning.
//!
//! Performance scripts are user-provided and optional; every failure to
//! find or run them is reported as a warning.

use std::path::Path;
use std::process::Command;
use std::time::Duration;

use clap::Subcommand;
use colored::Colorize;
use tracker_core::git::Git;
use tracker_core::models::TaskStatus;
use tracker_core::process::run_bounded;
use tracker_core::project_kind::ProjectKind;

use super::output::{self, rule, RULE_WIDTH};
use super::projects::overall_status;
use super::App;

const CPU_SCRIPT: &str = "gaming-performance.sh";
const GPU_SCRIPT: &str = "nvidia-gaming-performance.sh";
const GOVERNOR_PATH: &str = "/sys/devices/system/cpu/cpu0/cpufreq/scaling_governor";

#[derive(Subcommand)]
pub enum SessionCommand {
    /// Start a development session
    Start {
        /// Project ID or name
        project: String,
        /// Task to mark in progress
        #[arg(short, long)]
        task: Option<String>,
    },
    /// End the session and restore balanced performance
    End,
    /// Show governor and overall statistics
    Status,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PerfMode {
    Performance,
    Balanced,
}

impl PerfMode {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Performance => "performance",
            Self::Balanced => "balanced",
        }
    }
}

/// Runner for the performance scripts on `PATH`.
#[derive(Debug, Clone)]
struct PerfScripts {
    timeout: Duration,
}

impl Default for PerfScripts {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
        }
    }
}

impl PerfScripts {
    /// Returns whether the script ran and exited cleanly.
    fn run(&self, script: &str, mode: PerfMode) -> bool {
        let mut cmd = Command::new(script);
        cmd.arg(mode.as_str());
        match run_bounded(cmd, self.timeout) {
            Ok(out) if out.success() => true,
            Ok(out) => {
                tracing::warn!(
                    script,
                    code = ?out.code,
                    stderr = %out.stderr.trim(),
                    "performance script failed"
                );
                false
            }
            Err(e) => {
                tracing::warn!(script, error = %e, "performance script unavailable");
                false
            }
        }
    }
}

fn read_governor() -> Option<String> {
    std::fs::read_to_string(GOVERNOR_PATH)
        .ok()
        .map(|s| s.trim().to_string())
}

pub fn run(app: &App, command: SessionCommand) -> anyhow::Result<()> {
    match command {
        SessionCommand::Start { project, task } => start(app, &project, task.as_deref()),
        SessionCommand::End => {
            end();
            Ok(())
        }
        SessionCommand::Status => status(app),
    }
}

fn optimize(kind: ProjectKind, scripts: &PerfScripts) {
    println!("{}", "🚀 Optimizing system for development...".blue());

    match read_governor() {
        Some(governor) if governor == PerfMode::Performance.as_str() => {
            println!(
                "{}",
                "   ✓ CPU Governor: Already in performance mode".green()
            );
        }
        Some(governor) => {
            println!("   CPU Governor: {governor} -> performance");
            if !scripts.run(CPU_SCRIPT, PerfMode::Performance) {
                output::warning(format!("{CPU_SCRIPT} not available"));
            }
        }
        None => output::warning("Could not check CPU governor"),
    }

    if kind.is_node() {
        println!("   Enabling NVIDIA performance for development workload...");
        if !scripts.run(GPU_SCRIPT, PerfMode::Performance) {
            output::warning("NVIDIA performance script not available");
        }
    }
}

fn start(app: &App, project_ref: &str, task_ref: Option<&str>) -> anyhow::Result<()> {
    let project = app.db.resolve_project(project_ref)?;

    println!("{}", "🛠️  Starting Development Session".purple());
    println!("{}", rule(RULE_WIDTH));
    println!("📁 Project: {} (ID: {})", project.name, project.id);

    let mut kind = ProjectKind::General;
    if let Some(path) = project.path.as_deref() {
        println!("📂 Path: {path}");
        let root = Path::new(path);
        if root.exists() {
            kind = ProjectKind::detect(root);
            println!("🔧 Type: {kind}");
            optimize(kind, &PerfScripts::default());

            match Git::default().info(root) {
                Some(info) => {
                    println!("🌿 Git: {}", info.branch);
                    if info.has_changes() {
                        println!(
                            "{}",
                            format!("   ⚠ {} uncommitted changes", info.changes).yellow()
                        );
                    } else {
                        println!("{}", "   ✓ Working directory clean".green());
                    }
                }
                None => output::warning("Not a Git repository or error accessing Git"),
            }
        }
    }

    let tasks = app.db.active_tasks(project.id)?;
    if tasks.is_empty() {
        println!(
            "\n{}",
            format!(
                "💡 No active tasks. Add some with: pt add {} \"Task title\"",
                project.id
            )
            .cyan()
        );
    } else {
        println!("\n📋 Active Tasks ({}):", tasks.len());
        for task in &tasks {
            let line = format!(
                "   [{}] {} {} {}",
                task.id,
                task.status.symbol(),
                task.priority.symbol(),
                task.title
            );
            if task.status == TaskStatus::InProgress {
                println!("{}", line.blue());
            } else {
                println!("{}", line.yellow());
            }
        }
    }

    if let Some(reference) = task_ref {
        match app
            .db
            .resolve_task(reference)
            .and_then(|task| app.db.apply_status(task.id, TaskStatus::InProgress))
        {
            Ok(change) => output::success(format!("Marked task {} as in progress", change.task_id)),
            Err(e) => output::failure(format!("Could not start task {reference}: {e}")),
        }
    }

    println!("\n{}", "💡 Development Session Tips:".cyan());
    println!("   • Use Git commit messages with task references (pt:123 completed)");
    println!("   • Monitor system performance with your custom scripts");
    println!("   • Run pt status to track progress");
    for tip in kind.session_tips() {
        println!("   • {tip}");
    }
    Ok(())
}

fn end() {
    println!("{}", "🛑 Ending Development Session".blue());
    let scripts = PerfScripts::default();
    let cpu = scripts.run(CPU_SCRIPT, PerfMode::Balanced);
    let gpu = scripts.run(GPU_SCRIPT, PerfMode::Balanced);
    if cpu || gpu {
        output::success("System performance restored to balanced mode");
    } else {
        output::warning("Could not restore balanced performance settings");
    }
}

fn status(app: &App) -> anyhow::Result<()> {
    println!("{}", "🛠️  Development Session Status".purple());
    println!("{}", rule(RULE_WIDTH));
    match read_governor() {
        Some(governor) => println!("⚙️  CPU Governor: {governor}"),
        None => output::warning("Could not check CPU governor"),
    }
    println!();
    overall_status(app)
}
