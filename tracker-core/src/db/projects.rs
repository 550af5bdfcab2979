use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};

use super::{format_datetime, now, parse_datetime, Database};
use crate::error::{Result, TrackerError};
use crate::models::*;

const PROJECT_COLUMNS: &str = "id, name, path, description, status, created_at, updated_at";

impl Database {
    // ============================================================
    // Project operations
    // ============================================================

    /// Insert a project. A taken name fails with `DuplicateName` and writes nothing.
    pub fn create_project(&self, input: CreateProjectInput) -> Result<Project> {
        let now = now();
        let stamp = format_datetime(&now);

        let inserted = self.write(|tx| {
            tx.execute(
                "INSERT INTO projects (name, path, description, status, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                params![
                    &input.name,
                    &input.path,
                    &input.description,
                    DEFAULT_PROJECT_STATUS,
                    &stamp
                ],
            )?;
            Ok(tx.last_insert_rowid())
        });

        let id = match inserted {
            Ok(id) => id,
            Err(TrackerError::Database(rusqlite::Error::SqliteFailure(e, _)))
                if e.code == ErrorCode::ConstraintViolation =>
            {
                return Err(TrackerError::DuplicateName(input.name));
            }
            Err(e) => return Err(e),
        };

        tracing::info!(project_id = id, name = %input.name, "created project");

        Ok(Project {
            id,
            name: input.name,
            path: input.path,
            description: input.description,
            status: DEFAULT_PROJECT_STATUS.to_string(),
            created_at: now,
            updated_at: now,
        })
    }

    pub fn get_project(&self, id: i64) -> Result<Option<Project>> {
        self.read(|conn| get_project_in(conn, id))
    }

    /// Projects whose name contains `fragment` (case-sensitive), lowest id first.
    pub fn find_projects_by_name(&self, fragment: &str) -> Result<Vec<Project>> {
        self.read(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {PROJECT_COLUMNS} FROM projects WHERE instr(name, ?1) > 0 ORDER BY id"
            ))?;
            let projects = stmt
                .query_map([fragment], project_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(projects)
        })
    }

    /// The project whose recorded path equals `path` exactly.
    pub fn project_by_path(&self, path: &str) -> Result<Option<Project>> {
        self.read(|conn| {
            let project = conn
                .query_row(
                    &format!(
                        "SELECT {PROJECT_COLUMNS} FROM projects WHERE path = ?1 ORDER BY id LIMIT 1"
                    ),
                    [path],
                    project_from_row,
                )
                .optional()?;
            Ok(project)
        })
    }

    pub fn projects_with_paths(&self) -> Result<Vec<Project>> {
        self.read(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {PROJECT_COLUMNS} FROM projects WHERE path IS NOT NULL ORDER BY id"
            ))?;
            let projects = stmt
                .query_map([], project_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(projects)
        })
    }

    /// Projects with task counts, most recently touched first.
    pub fn list_projects(&self, status: Option<&str>) -> Result<Vec<ProjectSummary>> {
        self.read(|conn| {
            let mut stmt = conn.prepare(
                "SELECT p.id, p.name, p.path, p.description, p.status, p.created_at, p.updated_at,
                        COUNT(t.id),
                        COALESCE(SUM(CASE WHEN t.status = 'completed' THEN 1 ELSE 0 END), 0)
                 FROM projects p
                 LEFT JOIN tasks t ON t.project_id = p.id
                 WHERE ?1 IS NULL OR p.status = ?1
                 GROUP BY p.id
                 ORDER BY p.updated_at DESC, p.id DESC",
            )?;
            let summaries = stmt
                .query_map([status], |row| {
                    Ok(ProjectSummary {
                        project: project_from_row(row)?,
                        total_tasks: row.get(7)?,
                        completed_tasks: row.get(8)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(summaries)
        })
    }

    /// Task counts per stored status, optionally scoped to one project.
    pub fn task_status_counts(&self, project_id: Option<i64>) -> Result<Vec<StatusCount>> {
        self.read(|conn| {
            let mut stmt = conn.prepare(
                "SELECT status, COUNT(*) FROM tasks
                 WHERE ?1 IS NULL OR project_id = ?1
                 GROUP BY status
                 ORDER BY CASE status
                     WHEN 'pending' THEN 0 WHEN 'in_progress' THEN 1
                     WHEN 'completed' THEN 2 WHEN 'blocked' THEN 3 ELSE 4 END",
            )?;
            let counts = stmt
                .query_map([project_id], |row| {
                    Ok(StatusCount {
                        status: row.get(0)?,
                        count: row.get(1)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(counts)
        })
    }

    pub fn overall_stats(&self) -> Result<OverallStats> {
        let (active_projects, total_projects) = self.read(|conn| {
            let counts = conn.query_row(
                "SELECT COALESCE(SUM(CASE WHEN status = ?1 THEN 1 ELSE 0 END), 0), COUNT(*)
                 FROM projects",
                [DEFAULT_PROJECT_STATUS],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?;
            Ok(counts)
        })?;

        Ok(OverallStats {
            active_projects,
            total_projects,
            task_counts: self.task_status_counts(None)?,
        })
    }
}

pub(super) fn get_project_in(conn: &Connection, id: i64) -> Result<Option<Project>> {
    let project = conn
        .query_row(
            &format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = ?1"),
            [id],
            project_from_row,
        )
        .optional()?;
    Ok(project)
}

/// Bump a project's `updated_at`. Returns false when the project is missing.
pub(crate) fn touch_project(conn: &Connection, id: i64, stamp: &str) -> Result<bool> {
    let rows = conn.execute(
        "UPDATE projects SET updated_at = ?1 WHERE id = ?2",
        params![stamp, id],
    )?;
    Ok(rows > 0)
}

fn project_from_row(row: &Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get(0)?,
        name: row.get(1)?,
        path: row.get(2)?,
        description: row.get(3)?,
        status: row.get(4)?,
        created_at: parse_datetime(row.get(5)?),
        updated_at: parse_datetime(row.get(6)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db() -> Database {
        let db = Database::open_memory().unwrap();
        db.migrate().unwrap();
        db
    }

    fn project(name: &str) -> CreateProjectInput {
        CreateProjectInput {
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn duplicate_name_is_rejected_without_partial_write() {
        let db = db();
        db.create_project(project("tracker")).unwrap();

        let err = db.create_project(CreateProjectInput {
            name: "tracker".into(),
            path: Some("/tmp/other".into()),
            description: Some("second".into()),
        });
        assert!(matches!(err, Err(TrackerError::DuplicateName(n)) if n == "tracker"));

        let matches = db.find_projects_by_name("tracker").unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].path, None);
    }

    #[test]
    fn names_are_case_sensitive_keys() {
        let db = db();
        db.create_project(project("Tracker")).unwrap();
        db.create_project(project("tracker")).unwrap();
        assert_eq!(db.find_projects_by_name("Track").unwrap().len(), 1);
    }

    #[test]
    fn new_projects_default_to_active() {
        let db = db();
        let created = db.create_project(project("site")).unwrap();
        let loaded = db.get_project(created.id).unwrap().unwrap();
        assert_eq!(loaded, created);
        assert!(loaded.is_active());
    }

    #[test]
    fn project_by_path_is_exact() {
        let db = db();
        db.create_project(CreateProjectInput {
            name: "api".into(),
            path: Some("/home/dev/api".into()),
            description: None,
        })
        .unwrap();

        assert!(db.project_by_path("/home/dev/api").unwrap().is_some());
        assert!(db.project_by_path("/home/dev/api/src").unwrap().is_none());
        assert!(db.project_by_path("/home/dev").unwrap().is_none());
    }

    #[test]
    fn list_projects_counts_tasks_and_filters_status() {
        let db = db();
        let p = db.create_project(project("alpha")).unwrap();
        db.create_project(project("beta")).unwrap();
        let t = db
            .create_task(
                p.id,
                CreateTaskInput {
                    title: "one".into(),
                    ..Default::default()
                },
            )
            .unwrap();
        db.create_task(
            p.id,
            CreateTaskInput {
                title: "two".into(),
                ..Default::default()
            },
        )
        .unwrap();
        db.apply_status(t.id, TaskStatus::Completed).unwrap();

        let all = db.list_projects(None).unwrap();
        assert_eq!(all.len(), 2);
        let alpha = all.iter().find(|s| s.project.name == "alpha").unwrap();
        assert_eq!((alpha.total_tasks, alpha.completed_tasks), (2, 1));

        assert_eq!(db.list_projects(Some("archived")).unwrap().len(), 0);
        assert_eq!(db.list_projects(Some("active")).unwrap().len(), 2);
    }

    #[test]
    fn overall_stats_totals() {
        let db = db();
        let p = db.create_project(project("alpha")).unwrap();
        for title in ["a", "b", "c"] {
            db.create_task(
                p.id,
                CreateTaskInput {
                    title: title.into(),
                    ..Default::default()
                },
            )
            .unwrap();
        }
        let stats = db.overall_stats().unwrap();
        assert_eq!(stats.active_projects, 1);
        assert_eq!(stats.total_projects, 1);
        assert_eq!(stats.total_tasks(), 3);
        assert_eq!(stats.count_for(TaskStatus::Pending), 3);
        assert_eq!(stats.count_for(TaskStatus::Completed), 0);
    }
}
