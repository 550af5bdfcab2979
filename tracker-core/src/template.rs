//! Agent guidance document (`CLAUDE.md`) generation.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::models::{Project, Task};
use crate::project_kind::ProjectKind;

pub const AGENT_DOC_FILE: &str = "CLAUDE.md";
pub const BACKUP_SUFFIX: &str = ".backup";

/// User override looked up in the data directory.
pub const TEMPLATE_FILE_NAME: &str = "claude-template.md";

pub const DEFAULT_TEMPLATE: &str = include_str!("../templates/claude.md");

/// Projects carry no priority of their own.
const PROJECT_PRIORITY: &str = "Medium";

/// The user's template from `data_dir`, or the built-in one.
pub fn load_template(data_dir: &Path) -> Result<String> {
    let path = data_dir.join(TEMPLATE_FILE_NAME);
    if path.is_file() {
        tracing::debug!(path = %path.display(), "using custom agent doc template");
        return Ok(std::fs::read_to_string(path)?);
    }
    Ok(DEFAULT_TEMPLATE.to_string())
}

/// Markdown bullet list of active tasks.
pub fn active_tasks_markdown(tasks: &[Task]) -> String {
    if tasks.is_empty() {
        return "No active tasks".to_string();
    }
    let mut out = String::new();
    for (i, task) in tasks.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let _ = write!(
            out,
            "- {} **[{}]** {} {}",
            task.status.symbol(),
            task.id,
            task.priority.symbol(),
            task.title
        );
        if let Some(desc) = task.description.as_deref().filter(|d| !d.is_empty()) {
            let _ = write!(out, "\n  - {desc}");
        }
    }
    out
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Substitute every placeholder in `template` for `project`.
pub fn render_agent_doc(
    template: &str,
    project: &Project,
    kind: ProjectKind,
    active_tasks: &[Task],
) -> String {
    let id = project.id;
    let stack = kind.tech_stack();
    let replacements = [
        ("[PROJECT_ID]", id.to_string()),
        ("[PROJECT_STATUS]", capitalize(&project.status)),
        ("[PROJECT_PRIORITY]", PROJECT_PRIORITY.to_string()),
        (
            "[ACTIVE_TASKS_PLACEHOLDER]",
            active_tasks_markdown(active_tasks),
        ),
        ("[TECH_STACK_DESCRIPTION]", stack.to_string()),
        ("[PROJECT_COMMANDS]", kind.commands().to_string()),
        ("[AGENT_TYPE]", kind.agent_type().to_string()),
        ("[AGENT_CAPABILITIES]", kind.capabilities().to_string()),
        (
            "[DEVELOPMENT_WORKFLOW]",
            format!(
                "Standard {stack} development workflow with Git integration and project \
                 tracking."
            ),
        ),
        (
            "[PERFORMANCE_NOTES]",
            format!(
                "Project is tracked via pt:{id}. Use Git commit messages with task \
                 references for automatic updates."
            ),
        ),
        (
            "[FILE_STRUCTURE_OVERVIEW]",
            format!("Standard {stack} project structure. See README.md for details."),
        ),
        (
            "[TESTING_APPROACH]",
            format!(
                "Follow {stack} testing best practices. Run tests before marking tasks \
                 as completed."
            ),
        ),
        (
            "[DEPLOYMENT_INFO]",
            "See project documentation for deployment procedures.".to_string(),
        ),
        (
            "[CUSTOM_GUIDELINES]",
            format!(
                "- This project is tracked with pt:{id}\n\
                 - Use task references in Git commits\n\
                 - Update project tracker when completing milestones"
            ),
        ),
    ];

    let mut doc = template.to_string();
    for (placeholder, value) in &replacements {
        doc = doc.replace(placeholder, value);
    }
    doc
}

/// Write `content` to `<root>/CLAUDE.md`, moving any existing file aside first
/// when `backup` is set.
pub fn write_agent_doc(root: &Path, content: &str, backup: bool) -> Result<PathBuf> {
    let target = root.join(AGENT_DOC_FILE);
    if backup && target.exists() {
        let moved = root.join(format!("{AGENT_DOC_FILE}{BACKUP_SUFFIX}"));
        std::fs::rename(&target, &moved)?;
        tracing::info!(backup = %moved.display(), "backed up existing agent doc");
    }
    std::fs::write(&target, content)?;
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::*;

    fn project_with_tasks() -> (Database, Project) {
        let db = Database::open_memory().unwrap();
        db.migrate().unwrap();
        let project = db
            .create_project(CreateProjectInput {
                name: "site".into(),
                ..Default::default()
            })
            .unwrap();
        let t = db
            .create_task(
                project.id,
                CreateTaskInput {
                    title: "ship nav".into(),
                    description: Some("top bar".into()),
                    priority: Priority::High,
                    ..Default::default()
                },
            )
            .unwrap();
        db.apply_status(t.id, TaskStatus::InProgress).unwrap();
        (db, project)
    }

    #[test]
    fn default_template_has_no_leftover_placeholders() {
        let (db, project) = project_with_tasks();
        let tasks = db.active_tasks(project.id).unwrap();
        let doc = render_agent_doc(DEFAULT_TEMPLATE, &project, ProjectKind::Rust, &tasks);

        let leftovers = [
            "[PROJECT_ID]",
            "[AGENT_TYPE]",
            "[CUSTOM_GUIDELINES]",
            "PLACEHOLDER",
        ];
        for placeholder in leftovers {
            assert!(!doc.contains(placeholder), "{placeholder} left in output");
        }
        assert!(doc.contains("- 🔄 **[1]** 🔥 ship nav\n  - top bar"));
        assert!(doc.contains("cargo build, cargo test, cargo run"));
        assert!(doc.contains("**Status**: Active"));
    }

    #[test]
    fn empty_task_list_is_reported() {
        assert_eq!(active_tasks_markdown(&[]), "No active tasks");
    }

    #[test]
    fn custom_template_overrides_builtin() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(load_template(dir.path()).unwrap(), DEFAULT_TEMPLATE);

        let custom = dir.path().join(TEMPLATE_FILE_NAME);
        std::fs::write(custom, "id=[PROJECT_ID]").unwrap();
        let (_, project) = project_with_tasks();
        let template = load_template(dir.path()).unwrap();
        assert_eq!(
            render_agent_doc(&template, &project, ProjectKind::General, &[]),
            format!("id={}", project.id)
        );
    }

    #[test]
    fn backup_moves_existing_doc_aside() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(AGENT_DOC_FILE), "old").unwrap();

        write_agent_doc(dir.path(), "new", true).unwrap();
        assert_eq!(
            std::fs::read_to_string(dir.path().join("CLAUDE.md.backup")).unwrap(),
            "old"
        );
        assert_eq!(
            std::fs::read_to_string(dir.path().join(AGENT_DOC_FILE)).unwrap(),
            "new"
        );

        write_agent_doc(dir.path(), "newer", false).unwrap();
        assert_eq!(
            std::fs::read_to_string(dir.path().join("CLAUDE.md.backup")).unwrap(),
            "old"
        );
    }
}
