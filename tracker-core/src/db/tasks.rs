use std::str::FromStr;

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::projects::{get_project_in, touch_project};
use super::Database;
use super::{conversion_error, format_date, format_datetime, now, parse_date, parse_datetime};
use crate::error::{Result, TrackerError};
use crate::models::*;

pub(crate) const TASK_COLUMNS: &str = "t.id, t.project_id, t.title, t.description, t.status, \
     t.priority, t.due_date, t.created_at, t.updated_at, t.ai_generated, t.ai_estimate_hours, \
     t.ai_complexity";

/// Listing order: priority high→low, due date ascending with undated last,
/// newest first among the rest.
const LISTING_ORDER: &str = "ORDER BY CASE t.priority
         WHEN 'high' THEN 0 WHEN 'medium' THEN 1 WHEN 'low' THEN 2 ELSE 3 END,
     t.due_date IS NULL, t.due_date ASC,
     t.created_at DESC, t.id DESC";

impl Database {
    // ============================================================
    // Task operations
    // ============================================================

    /// Create a task and touch its project in one transaction.
    pub fn create_task(&self, project_id: i64, input: CreateTaskInput) -> Result<Task> {
        let task = self.write(|tx| {
            if get_project_in(tx, project_id)?.is_none() {
                return Err(TrackerError::project_not_found(project_id.to_string()));
            }
            insert_task(tx, project_id, &input)
        })?;
        tracing::info!(task_id = task.id, project_id, "created task");
        Ok(task)
    }

    pub fn get_task(&self, id: i64) -> Result<Option<Task>> {
        self.read(|conn| get_task_in(conn, id))
    }

    /// Tasks whose title contains `fragment` (case-sensitive), lowest id first.
    pub fn find_tasks_by_title(&self, fragment: &str) -> Result<Vec<Task>> {
        self.read(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {TASK_COLUMNS} FROM tasks t WHERE instr(t.title, ?1) > 0 ORDER BY t.id"
            ))?;
            let tasks = stmt
                .query_map([fragment], task_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(tasks)
        })
    }

    pub fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<TaskWithProject>> {
        self.read(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {TASK_COLUMNS}, p.name
                 FROM tasks t
                 JOIN projects p ON t.project_id = p.id
                 WHERE (?1 IS NULL OR t.project_id = ?1)
                   AND (?2 IS NULL OR t.status = ?2)
                 {LISTING_ORDER}"
            ))?;
            let tasks = stmt
                .query_map(
                    params![filter.project_id, filter.status.map(|s| s.as_str())],
                    |row| {
                        Ok(TaskWithProject {
                            task: task_from_row(row)?,
                            project_name: row.get(12)?,
                        })
                    },
                )?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(tasks)
        })
    }

    /// Non-completed tasks of a project, high priority first, then by id.
    pub fn active_tasks(&self, project_id: i64) -> Result<Vec<Task>> {
        self.read(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {TASK_COLUMNS} FROM tasks t
                 WHERE t.project_id = ?1 AND t.status != 'completed'
                 ORDER BY CASE t.priority
                     WHEN 'high' THEN 0 WHEN 'medium' THEN 1 WHEN 'low' THEN 2 ELSE 3 END,
                 t.id ASC"
            ))?;
            let tasks = stmt
                .query_map([project_id], task_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(tasks)
        })
    }

    /// Most recently completed tasks of a project.
    pub fn recently_completed(&self, project_id: i64, limit: usize) -> Result<Vec<Task>> {
        self.read(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {TASK_COLUMNS} FROM tasks t
                 WHERE t.project_id = ?1 AND t.status = 'completed'
                 ORDER BY t.updated_at DESC, t.id DESC
                 LIMIT ?2"
            ))?;
            let tasks = stmt
                .query_map(params![project_id, limit as i64], task_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(tasks)
        })
    }
}

/// Insert a task row and touch the owning project. Caller owns the transaction
/// and has already checked the project exists.
pub(crate) fn insert_task(
    conn: &Connection,
    project_id: i64,
    input: &CreateTaskInput,
) -> Result<Task> {
    let now = now();
    let stamp = format_datetime(&now);
    let ai = input.ai.clone();
    let ai_generated = ai.is_some();
    let (estimate, complexity) = ai
        .map(|meta| (meta.estimate_hours, meta.complexity))
        .unwrap_or((None, None));

    conn.execute(
        "INSERT INTO tasks (project_id, title, description, status, priority, due_date,
                            created_at, updated_at, ai_generated, ai_estimate_hours, ai_complexity)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7, ?8, ?9, ?10)",
        params![
            project_id,
            &input.title,
            &input.description,
            TaskStatus::Pending.as_str(),
            input.priority.as_str(),
            input.due_date.as_ref().map(format_date),
            &stamp,
            ai_generated,
            estimate,
            &complexity,
        ],
    )?;
    let id = conn.last_insert_rowid();
    touch_project(conn, project_id, &stamp)?;

    Ok(Task {
        id,
        project_id,
        title: input.title.clone(),
        description: input.description.clone(),
        status: TaskStatus::Pending,
        priority: input.priority,
        due_date: input.due_date,
        created_at: now,
        updated_at: now,
        ai_generated,
        ai_estimate_hours: estimate,
        ai_complexity: complexity,
    })
}

pub(crate) fn get_task_in(conn: &Connection, id: i64) -> Result<Option<Task>> {
    let task = conn
        .query_row(
            &format!("SELECT {TASK_COLUMNS} FROM tasks t WHERE t.id = ?1"),
            [id],
            task_from_row,
        )
        .optional()?;
    Ok(task)
}

pub(crate) fn task_from_row(row: &Row<'_>) -> rusqlite::Result<Task> {
    let status: String = row.get(4)?;
    let priority: String = row.get(5)?;
    Ok(Task {
        id: row.get(0)?,
        project_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        status: TaskStatus::from_str(&status).map_err(|e| conversion_error(4, e))?,
        priority: Priority::from_str(&priority).map_err(|e| conversion_error(5, e))?,
        due_date: parse_date(row.get(6)?),
        created_at: parse_datetime(row.get(7)?),
        updated_at: parse_datetime(row.get(8)?),
        ai_generated: row.get(9)?,
        ai_estimate_hours: row.get(10)?,
        ai_complexity: row.get(11)?,
    })
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn db_with_project() -> (Database, Project) {
        let db = Database::open_memory().unwrap();
        db.migrate().unwrap();
        let project = db
            .create_project(CreateProjectInput {
                name: "tracker".into(),
                ..Default::default()
            })
            .unwrap();
        (db, project)
    }

    fn input(title: &str, priority: Priority, due: Option<(i32, u32, u32)>) -> CreateTaskInput {
        CreateTaskInput {
            title: title.into(),
            priority,
            due_date: due.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d)),
            ..Default::default()
        }
    }

    #[test]
    fn task_requires_existing_project() {
        let (db, _) = db_with_project();
        let err = db.create_task(404, input("orphan", Priority::Medium, None));
        assert!(matches!(err, Err(TrackerError::NotFound { .. })));
        assert!(db.find_tasks_by_title("orphan").unwrap().is_empty());
    }

    #[test]
    fn create_task_touches_project() {
        let (db, project) = db_with_project();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let task = db
            .create_task(project.id, input("write docs", Priority::High, None))
            .unwrap();

        let reloaded = db.get_project(project.id).unwrap().unwrap();
        assert!(reloaded.updated_at > project.updated_at);
        assert_eq!(reloaded.updated_at, task.created_at);
        assert_eq!(db.get_task(task.id).unwrap().unwrap(), task);
    }

    #[test]
    fn defaults_are_pending_medium_and_not_ai() {
        let (db, project) = db_with_project();
        let task = db
            .create_task(
                project.id,
                CreateTaskInput {
                    title: "plain".into(),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.priority, Priority::Medium);
        assert!(!task.ai_generated);
        assert_eq!(task.ai_estimate_hours, None);
    }

    #[test]
    fn listing_orders_priority_then_due_date_then_newest() {
        let (db, project) = db_with_project();
        for (title, priority, due) in [
            ("low undated", Priority::Low, None),
            ("high june", Priority::High, Some((2024, 6, 1))),
            ("medium jan", Priority::Medium, Some((2024, 1, 1))),
            ("high undated", Priority::High, None),
            ("high jan", Priority::High, Some((2024, 1, 1))),
            ("medium undated old", Priority::Medium, None),
        ] {
            db.create_task(project.id, input(title, priority, due))
                .unwrap();
        }
        std::thread::sleep(std::time::Duration::from_millis(2));
        let newest = input("medium undated new", Priority::Medium, None);
        db.create_task(project.id, newest).unwrap();

        let titles: Vec<String> = db
            .list_tasks(&TaskFilter::default())
            .unwrap()
            .into_iter()
            .map(|t| t.task.title)
            .collect();
        assert_eq!(
            titles,
            vec![
                "high jan",
                "high june",
                "high undated",
                "medium jan",
                "medium undated new",
                "medium undated old",
                "low undated",
            ]
        );
    }

    #[test]
    fn list_filters_by_project_and_status() {
        let (db, project) = db_with_project();
        let other = db
            .create_project(CreateProjectInput {
                name: "other".into(),
                ..Default::default()
            })
            .unwrap();
        let a = db
            .create_task(project.id, input("a", Priority::Medium, None))
            .unwrap();
        db.create_task(project.id, input("b", Priority::Medium, None))
            .unwrap();
        db.create_task(other.id, input("c", Priority::Medium, None))
            .unwrap();
        db.apply_status(a.id, TaskStatus::Blocked).unwrap();

        let scoped = db
            .list_tasks(&TaskFilter {
                project_id: Some(project.id),
                status: None,
            })
            .unwrap();
        assert_eq!(scoped.len(), 2);
        assert!(scoped.iter().all(|t| t.project_name == "tracker"));

        let blocked = db
            .list_tasks(&TaskFilter {
                project_id: None,
                status: Some(TaskStatus::Blocked),
            })
            .unwrap();
        assert_eq!(blocked.len(), 1);
        assert_eq!(blocked[0].task.id, a.id);
    }

    #[test]
    fn active_and_recently_completed() {
        let (db, project) = db_with_project();
        let low = db
            .create_task(project.id, input("low", Priority::Low, None))
            .unwrap();
        let high = db
            .create_task(project.id, input("high", Priority::High, None))
            .unwrap();
        let done = db
            .create_task(project.id, input("done", Priority::High, None))
            .unwrap();
        db.apply_status(done.id, TaskStatus::Completed).unwrap();

        let active: Vec<i64> = db
            .active_tasks(project.id)
            .unwrap()
            .iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(active, vec![high.id, low.id]);

        let completed = db.recently_completed(project.id, 5).unwrap();
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].id, done.id);
    }
}
