//! Post-commit hook entry point and hook installation.

use std::path::{Path, PathBuf};

use anyhow::Context;
use colored::Colorize;
use tracker_core::commit::DirectiveOutcome;
use tracker_core::db::DB_FILE_NAME;
use tracker_core::git::Git;
use tracker_core::models::Project;
use tracker_core::Database;

use super::output;
use super::projects::normalize_path;
use super::App;

const HOOK_NAME: &str = "post-commit";

/// Run from Git after each commit. Never fails: anything unexpected is
/// logged and the commit proceeds untouched.
pub fn run_hook(data_dir: anyhow::Result<PathBuf>) {
    let data_dir = match data_dir {
        Ok(dir) => dir,
        Err(e) => {
            tracing::warn!(error = %e, "hook could not locate data directory");
            return;
        }
    };
    let cwd = match std::env::current_dir() {
        Ok(dir) => dir,
        Err(e) => {
            tracing::warn!(error = %e, "hook could not read working directory");
            return;
        }
    };
    match handle_commit(&data_dir, &cwd) {
        Ok(Some((project, outcomes))) => print_outcomes(&project, &outcomes),
        Ok(None) => {}
        Err(e) => tracing::warn!(error = %e, "commit hook skipped"),
    }
}

/// Apply the HEAD commit of the repository containing `dir`. `None` when the
/// repository is not tracked or the message references no tasks.
fn handle_commit(
    data_dir: &Path,
    dir: &Path,
) -> anyhow::Result<Option<(Project, Vec<DirectiveOutcome>)>> {
    let git = Git::default();
    let Ok(toplevel) = git.toplevel(dir) else {
        return Ok(None);
    };
    // Don't create a store just because a hook fired.
    if !data_dir.join(DB_FILE_NAME).exists() {
        return Ok(None);
    }
    let db = Database::open_in(data_dir)?;
    db.migrate()?;

    let Some(project) = db.project_by_path(&normalize_path(&toplevel))? else {
        tracing::debug!(repo = %toplevel.display(), "repository is not tracked");
        return Ok(None);
    };
    let commit = git.commit_info(&toplevel)?;
    let outcomes = db.apply_commit(project.id, &commit);
    if outcomes.is_empty() {
        return Ok(None);
    }
    Ok(Some((project, outcomes)))
}

fn print_outcomes(project: &Project, outcomes: &[DirectiveOutcome]) {
    println!(
        "🔗 Project Tracker: Processing {} task update(s) for '{}'",
        outcomes.len(),
        project.name
    );
    for outcome in outcomes {
        match &outcome.result {
            Ok(applied) => {
                let note = if applied.superseded { " (superseded)" } else { "" };
                println!(
                    "   {}",
                    format!(
                        "✓ Updated task '{}' -> {}{note}",
                        applied.title, outcome.directive.action
                    )
                    .green()
                );
            }
            Err(e) => println!("   {}", format!("✗ {e}").red()),
        }
    }
}

fn hook_script(exe: &Path, data_dir: &Path) -> String {
    format!(
        "#!/bin/sh\n# Project Tracker Git Integration\n\"{}\" --data-dir \"{}\" hook\n",
        exe.display(),
        data_dir.display()
    )
}

/// Write an executable post-commit hook into `repo`.
pub(crate) fn install_hook(repo: &Path, exe: &Path, data_dir: &Path) -> anyhow::Result<PathBuf> {
    let hooks_dir = repo.join(".git").join("hooks");
    if !hooks_dir.is_dir() {
        anyhow::bail!("{} - Not a Git repository", repo.display());
    }
    let hook = hooks_dir.join(HOOK_NAME);
    std::fs::write(&hook, hook_script(exe, data_dir))
        .with_context(|| format!("{} - Failed to install hook", repo.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&hook, std::fs::Permissions::from_mode(0o755))?;
    }
    Ok(hook)
}

pub fn setup_git(app: &App, project_ref: Option<&str>) -> anyhow::Result<()> {
    let exe = std::env::current_exe().context("locating the pt executable")?;

    if let Some(reference) = project_ref {
        let project = app.db.resolve_project(reference)?;
        let Some(path) = &project.path else {
            anyhow::bail!("Project '{}' has no path configured", project.name);
        };
        println!("Setting up Git hooks for '{}'...", project.name);
        install_hook(Path::new(path), &exe, &app.data_dir)?;
        output::success(format!("{path} - Git hook installed"));
        print_usage();
        return Ok(());
    }

    let projects = app.db.projects_with_paths()?;
    if projects.is_empty() {
        anyhow::bail!("No projects with paths found");
    }
    println!("Setting up Git hooks for {} project(s)...", projects.len());

    let mut installed = 0;
    for project in &projects {
        let Some(path) = project.path.as_deref() else {
            continue;
        };
        if !Path::new(path).exists() {
            output::failure(format!("{} - Path '{path}' does not exist", project.name));
            continue;
        }
        match install_hook(Path::new(path), &exe, &app.data_dir) {
            Ok(_) => {
                installed += 1;
                output::success(format!("{path} - Git hook installed"));
            }
            Err(e) => output::failure(format!("{e:#}")),
        }
    }

    println!();
    output::success(format!(
        "Successfully set up Git hooks for {installed}/{} projects",
        projects.len()
    ));
    if installed > 0 {
        print_usage();
    }
    Ok(())
}

fn print_usage() {
    println!("\n💡 Git Integration Usage:");
    println!("   In commit messages, use:");
    println!("   • 'pt:123 completed' - mark task 123 as completed");
    println!("   • 'pt:123 progress' - mark task 123 as in progress");
    println!("   • 'pt:123 blocked' - mark task 123 as blocked");
    println!("   • 'pt:123' - log activity for task 123");
}
