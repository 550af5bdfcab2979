use std::path::{Path, PathBuf};

use tracker_core::models::Project;
use tracker_core::project_kind::ProjectKind;
use tracker_core::template::{load_template, render_agent_doc, write_agent_doc};

use super::output;
use super::App;

pub fn run(app: &App, project_ref: Option<&str>, all: bool, backup: bool) -> anyhow::Result<()> {
    let template = load_template(&app.data_dir)?;

    if all {
        let projects = app.db.projects_with_paths()?;
        let mut written = 0;
        for project in &projects {
            match generate(app, &template, project, backup) {
                Ok(path) => {
                    written += 1;
                    output::success(format!("{} - wrote {}", project.name, path.display()));
                }
                Err(e) => output::failure(format!("{} - {e:#}", project.name)),
            }
        }
        println!();
        output::success(format!(
            "Generated CLAUDE.md for {written}/{} projects",
            projects.len()
        ));
        return Ok(());
    }

    let Some(reference) = project_ref else {
        anyhow::bail!("Specify a project or use --all");
    };
    let project = app.db.resolve_project(reference)?;
    let path = generate(app, &template, &project, backup)?;
    output::success(format!("Wrote {}", path.display()));
    Ok(())
}

fn generate(app: &App, template: &str, project: &Project, backup: bool) -> anyhow::Result<PathBuf> {
    let Some(root) = project.path.as_deref().map(Path::new) else {
        anyhow::bail!("Project '{}' has no path configured", project.name);
    };
    if !root.is_dir() {
        anyhow::bail!("Path '{}' does not exist", root.display());
    }

    let tasks = app.db.active_tasks(project.id)?;
    let doc = render_agent_doc(template, project, ProjectKind::detect(root), &tasks);
    Ok(write_agent_doc(root, &doc, backup)?)
}
