//! Command-line surface of `pt`.

mod ai;
mod enhance;
mod hook;
pub mod output;
mod projects;
mod session;
mod tasks;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracker_core::Database;

use crate::config::resolve_data_dir;

#[derive(Parser)]
#[command(name = "pt")]
#[command(about = "Project Tracker - CLI project and task management")]
pub struct Cli {
    /// Directory holding the database and configuration
    #[arg(long, env = "PT_DATA_DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Add a new project
    AddProject {
        /// Project name
        name: String,
        /// Project path
        #[arg(short, long)]
        path: Option<PathBuf>,
        /// Project description
        #[arg(short, long)]
        description: Option<String>,
    },
    /// List all projects
    Projects {
        /// Filter by status
        #[arg(short, long)]
        status: Option<String>,
    },
    /// Add a new task
    Add {
        /// Project ID or name
        project: String,
        /// Task title
        title: String,
        /// Task description
        #[arg(short, long)]
        description: Option<String>,
        /// low, medium or high
        #[arg(short, long, default_value = "medium")]
        priority: String,
        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<String>,
    },
    /// List tasks
    List {
        /// Filter by project ID or name
        #[arg(short, long)]
        project: Option<String>,
        /// Filter by status
        #[arg(short, long)]
        status: Option<String>,
    },
    /// Mark task as completed
    Complete { task: String },
    /// Mark task as in progress
    Start { task: String },
    /// Mark task as blocked
    Block { task: String },
    /// Show project status, or overall statistics without a project
    Status { project: Option<String> },
    /// Show recent Git activity for a project
    Activity {
        project: String,
        #[arg(short = 'n', long, default_value_t = 10)]
        limit: usize,
    },
    /// Post-commit hook entry point (run by Git)
    Hook,
    /// Install the post-commit hook for one project or every project with a path
    SetupGit { project: Option<String> },
    /// Generate CLAUDE.md for a project
    Enhance {
        project: Option<String>,
        /// Generate for every project with an existing path
        #[arg(long, conflicts_with = "project")]
        all: bool,
        /// Keep the previous file as CLAUDE.md.backup
        #[arg(long)]
        backup: bool,
    },
    /// AI-assisted planning
    Ai {
        #[command(subcommand)]
        command: ai::AiCommand,
    },
    /// Development session helpers
    Session {
        #[command(subcommand)]
        command: session::SessionCommand,
    },
}

/// Handles shared by every command.
pub struct App {
    pub db: Database,
    pub data_dir: PathBuf,
}

impl App {
    pub fn open(data_dir: PathBuf) -> anyhow::Result<Self> {
        let db = Database::open_in(&data_dir)?;
        db.migrate()?;
        Ok(Self { db, data_dir })
    }
}

/// Execute `cli`. `env_api_key` is the AI key taken from the environment, used
/// only when the saved configuration has none.
pub async fn run(cli: Cli, env_api_key: Option<String>) -> anyhow::Result<()> {
    // The hook must never fail a commit, so it locates and opens the store
    // itself.
    if let Command::Hook = cli.command {
        hook::run_hook(resolve_data_dir(cli.data_dir));
        return Ok(());
    }

    let app = App::open(resolve_data_dir(cli.data_dir)?)?;

    match cli.command {
        Command::AddProject {
            name,
            path,
            description,
        } => projects::add_project(&app, name, path, description),
        Command::Projects { status } => projects::list_projects(&app, status.as_deref()),
        Command::Add {
            project,
            title,
            description,
            priority,
            due,
        } => tasks::add_task(
            &app,
            &project,
            title,
            description,
            &priority,
            due.as_deref(),
        ),
        Command::List { project, status } => {
            tasks::list_tasks(&app, project.as_deref(), status.as_deref())
        }
        Command::Complete { task } => tasks::set_status(&app, &task, "completed"),
        Command::Start { task } => tasks::set_status(&app, &task, "in_progress"),
        Command::Block { task } => tasks::set_status(&app, &task, "blocked"),
        Command::Status {
            project: Some(project),
        } => projects::project_status(&app, &project),
        Command::Status { project: None } => projects::overall_status(&app),
        Command::Activity { project, limit } => projects::activity(&app, &project, limit),
        Command::Hook => Ok(()),
        Command::SetupGit { project } => hook::setup_git(&app, project.as_deref()),
        Command::Enhance {
            project,
            all,
            backup,
        } => enhance::run(&app, project.as_deref(), all, backup),
        Command::Ai { command } => ai::run(&app, command, env_api_key).await,
        Command::Session { command } => session::run(&app, command),
    }
}
