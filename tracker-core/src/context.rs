//! Project context assembled for the AI collaborator.

use std::fmt::Write as _;
use std::path::Path;

use serde::Serialize;
use walkdir::{DirEntry, WalkDir};

use crate::db::Database;
use crate::error::{Result, TrackerError};
use crate::models::{ActivityRecord, Project, Task};

/// Directories never worth listing.
const SKIPPED_DIRS: &[&str] = &[
    "node_modules",
    "target",
    "venv",
    "__pycache__",
    "dist",
    "build",
];

#[derive(Debug, Clone)]
pub struct ContextBuilder {
    pub completed_limit: usize,
    pub activity_limit: usize,
    /// Cap on listed files; zero disables the file listing.
    pub max_files: usize,
    pub extensions: Vec<String>,
}

impl Default for ContextBuilder {
    fn default() -> Self {
        Self {
            completed_limit: 5,
            activity_limit: 10,
            max_files: 20,
            extensions: ["py", "js", "ts", "md", "rs"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectContext {
    pub project: Project,
    pub active_tasks: Vec<Task>,
    pub recently_completed: Vec<Task>,
    pub recent_activity: Vec<ActivityRecord>,
    /// Paths relative to the project root.
    pub files: Vec<String>,
}

impl ContextBuilder {
    pub fn without_files(mut self) -> Self {
        self.max_files = 0;
        self
    }

    pub fn build(&self, db: &Database, project_id: i64) -> Result<ProjectContext> {
        let project = db
            .get_project(project_id)?
            .ok_or_else(|| TrackerError::project_not_found(project_id.to_string()))?;

        let files = match project.path.as_deref().map(Path::new) {
            Some(root) if self.max_files > 0 && root.is_dir() => self.list_files(root),
            _ => Vec::new(),
        };

        Ok(ProjectContext {
            active_tasks: db.active_tasks(project_id)?,
            recently_completed: db.recently_completed(project_id, self.completed_limit)?,
            recent_activity: db.recent_activity(project_id, self.activity_limit)?,
            files,
            project,
        })
    }

    fn list_files(&self, root: &Path) -> Vec<String> {
        WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_skipped_dir(e))
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| {
                e.path()
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| self.extensions.iter().any(|x| x == ext))
            })
            .take(self.max_files)
            .filter_map(|e| {
                e.path()
                    .strip_prefix(root)
                    .ok()
                    .map(|rel| rel.to_string_lossy().into_owned())
            })
            .collect()
    }
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    let name = entry.file_name().to_string_lossy();
    entry.file_type().is_dir() && (name.starts_with('.') || SKIPPED_DIRS.contains(&name.as_ref()))
}

impl ProjectContext {
    /// Plain-text rendering embedded in AI prompts.
    pub fn render(&self) -> String {
        let p = &self.project;
        let mut out = String::new();
        let _ = writeln!(out, "Project: {}", p.name);
        let _ = writeln!(
            out,
            "Description: {}",
            p.description.as_deref().unwrap_or("No description")
        );
        let _ = writeln!(
            out,
            "Path: {}",
            p.path.as_deref().unwrap_or("No path specified")
        );
        let _ = writeln!(out, "Status: {}", p.status);
        out.push('\n');

        if !self.active_tasks.is_empty() {
            out.push_str("Active Tasks:\n");
            for task in &self.active_tasks {
                let _ = writeln!(
                    out,
                    "- [{}] {} (Priority: {}, Status: {})",
                    task.id, task.title, task.priority, task.status
                );
                if let Some(desc) = &task.description {
                    let _ = writeln!(out, "  Description: {desc}");
                }
            }
            out.push('\n');
        }

        if !self.recently_completed.is_empty() {
            out.push_str("Recently Completed Tasks:\n");
            for task in &self.recently_completed {
                let _ = writeln!(out, "- [{}] {}", task.id, task.title);
            }
            out.push('\n');
        }

        if !self.recent_activity.is_empty() {
            out.push_str("Recent Git Activity:\n");
            for record in &self.recent_activity {
                let _ = writeln!(
                    out,
                    "- {} on {}: {}",
                    record.commit_hash, record.branch_name, record.message
                );
            }
            out.push('\n');
        }

        if !self.files.is_empty() {
            out.push_str("Key Files:\n");
            for file in &self.files {
                let _ = writeln!(out, "- {file}");
            }
            out.push('\n');
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::*;

    fn setup(path: Option<String>) -> (Database, Project) {
        let db = Database::open_memory().unwrap();
        db.migrate().unwrap();
        let project = db
            .create_project(CreateProjectInput {
                name: "tracker".into(),
                path,
                description: Some("CLI tracker".into()),
            })
            .unwrap();
        (db, project)
    }

    fn task(db: &Database, project: &Project, title: &str, priority: Priority) -> Task {
        db.create_task(
            project.id,
            CreateTaskInput {
                title: title.into(),
                priority,
                ..Default::default()
            },
        )
        .unwrap()
    }

    #[test]
    fn renders_sections_in_order() {
        let (db, project) = setup(None);
        task(&db, &project, "low one", Priority::Low);
        task(&db, &project, "high one", Priority::High);
        let done = task(&db, &project, "shipped", Priority::Medium);
        db.apply_status(done.id, TaskStatus::Completed).unwrap();
        db.append_activity(NewActivityRecord {
            project_id: project.id,
            task_id: Some(done.id),
            commit_hash: "abcdef0123456789".into(),
            branch_name: "main".into(),
            message: "pt:3 done".into(),
        })
        .unwrap();

        let ctx = ContextBuilder::default().build(&db, project.id).unwrap();
        let text = ctx.render();

        assert!(text.starts_with("Project: tracker\nDescription: CLI tracker\n"));
        assert!(text.contains("Path: No path specified"));
        let high = text.find("high one").unwrap();
        let low = text.find("low one").unwrap();
        assert!(high < low);
        assert!(text.contains("Recently Completed Tasks:\n- [3] shipped"));
        assert!(text.contains("- abcdef01 on main: pt:3 done"));
        assert!(!text.contains("Key Files:"));
    }

    #[test]
    fn limits_completed_and_activity() {
        let (db, project) = setup(None);
        for i in 0..7 {
            let t = task(&db, &project, &format!("t{i}"), Priority::Medium);
            db.apply_status(t.id, TaskStatus::Completed).unwrap();
        }
        for i in 0..12 {
            db.append_activity(NewActivityRecord {
                project_id: project.id,
                task_id: None,
                commit_hash: format!("{i:08}"),
                branch_name: "main".into(),
                message: format!("commit {i}"),
            })
            .unwrap();
        }

        let ctx = ContextBuilder::default().build(&db, project.id).unwrap();
        assert_eq!(ctx.recently_completed.len(), 5);
        assert_eq!(ctx.recent_activity.len(), 10);
        assert_eq!(ctx.recent_activity[0].message, "commit 11");
    }

    #[test]
    fn lists_capped_source_files_and_skips_hidden_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("src")).unwrap();
        std::fs::create_dir_all(root.join(".git")).unwrap();
        std::fs::create_dir_all(root.join("node_modules/pkg")).unwrap();
        std::fs::write(root.join("README.md"), "").unwrap();
        std::fs::write(root.join("src/main.rs"), "").unwrap();
        std::fs::write(root.join("src/data.bin"), "").unwrap();
        std::fs::write(root.join(".git/config.md"), "").unwrap();
        std::fs::write(root.join("node_modules/pkg/index.js"), "").unwrap();

        let (db, project) = setup(Some(root.to_string_lossy().into_owned()));
        let ctx = ContextBuilder::default().build(&db, project.id).unwrap();
        assert_eq!(
            ctx.files,
            vec!["README.md".to_string(), "src/main.rs".to_string()]
        );

        let capped = ContextBuilder {
            max_files: 1,
            ..Default::default()
        }
        .build(&db, project.id)
        .unwrap();
        assert_eq!(capped.files.len(), 1);

        let none = ContextBuilder::default()
            .without_files()
            .build(&db, project.id)
            .unwrap();
        assert!(none.files.is_empty());
    }
}
