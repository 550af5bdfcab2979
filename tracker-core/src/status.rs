//! Task status transitions.
//!
//! Any closed status may follow any other; the engine validates the value,
//! then writes the task and its project's `updated_at` in one transaction.
//! Re-applying the current status still bumps both timestamps.

use std::str::FromStr;

use rusqlite::{params, Connection};

use crate::db::projects::touch_project;
use crate::db::tasks::get_task_in;
use crate::db::{format_datetime, now, Database};
use crate::error::{Result, TrackerError};
use crate::models::{StatusChange, TaskStatus};

impl Database {
    /// Validate `new_status` text and apply it. Invalid text writes nothing.
    pub fn set_task_status(&self, task_id: i64, new_status: &str) -> Result<StatusChange> {
        let status = TaskStatus::from_str(new_status)?;
        self.apply_status(task_id, status)
    }

    pub fn apply_status(&self, task_id: i64, status: TaskStatus) -> Result<StatusChange> {
        let change = self.write(|tx| apply_status_in(tx, task_id, status))?;
        tracing::info!(
            task_id,
            from = %change.previous,
            to = %change.current,
            "task status updated"
        );
        Ok(change)
    }
}

pub(crate) fn apply_status_in(
    conn: &Connection,
    task_id: i64,
    status: TaskStatus,
) -> Result<StatusChange> {
    let task = get_task_in(conn, task_id)?
        .ok_or_else(|| TrackerError::task_not_found(task_id.to_string()))?;
    let stamp = format_datetime(&now());

    conn.execute(
        "UPDATE tasks SET status = ?1, updated_at = ?2 WHERE id = ?3",
        params![status.as_str(), &stamp, task_id],
    )?;
    if !touch_project(conn, task.project_id, &stamp)? {
        return Err(TrackerError::project_not_found(task.project_id.to_string()));
    }

    Ok(StatusChange {
        task_id,
        project_id: task.project_id,
        title: task.title,
        previous: task.status,
        current: status,
    })
}

#[cfg(test)]
mod tests {
    use std::thread::sleep;
    use std::time::Duration;

    use super::*;
    use crate::models::{CreateProjectInput, CreateTaskInput, Project, Task};

    fn setup() -> (Database, Project, Task) {
        let db = Database::open_memory().unwrap();
        db.migrate().unwrap();
        let project = db
            .create_project(CreateProjectInput {
                name: "tracker".into(),
                ..Default::default()
            })
            .unwrap();
        let task = db
            .create_task(
                project.id,
                CreateTaskInput {
                    title: "ship it".into(),
                    ..Default::default()
                },
            )
            .unwrap();
        (db, project, task)
    }

    #[test]
    fn every_status_updates_task_and_project_together() {
        let (db, project, task) = setup();
        let mut last = db.get_project(project.id).unwrap().unwrap().updated_at;

        for status in TaskStatus::ALL {
            sleep(Duration::from_millis(2));
            let change = db.set_task_status(task.id, status.as_str()).unwrap();
            assert_eq!(change.current, status);
            assert_eq!(change.title, "ship it");

            let t = db.get_task(task.id).unwrap().unwrap();
            let p = db.get_project(project.id).unwrap().unwrap();
            assert_eq!(t.status, status);
            assert_eq!(t.updated_at, p.updated_at);
            assert!(p.updated_at > last);
            last = p.updated_at;
        }
    }

    #[test]
    fn invalid_status_writes_nothing() {
        let (db, project, task) = setup();
        let before_task = db.get_task(task.id).unwrap().unwrap();
        let before_project = db.get_project(project.id).unwrap().unwrap();

        sleep(Duration::from_millis(2));
        let err = db.set_task_status(task.id, "done").unwrap_err();
        assert!(matches!(err, TrackerError::InvalidStatus(s) if s == "done"));

        assert_eq!(db.get_task(task.id).unwrap().unwrap(), before_task);
        assert_eq!(db.get_project(project.id).unwrap().unwrap(), before_project);
    }

    #[test]
    fn returns_previous_status() {
        let (db, _, task) = setup();
        let first = db.apply_status(task.id, TaskStatus::InProgress).unwrap();
        assert_eq!(first.previous, TaskStatus::Pending);
        let second = db.apply_status(task.id, TaskStatus::Blocked).unwrap();
        assert_eq!(second.previous, TaskStatus::InProgress);
    }

    #[test]
    fn same_status_is_rewritten() {
        let (db, _, task) = setup();
        db.apply_status(task.id, TaskStatus::Completed).unwrap();
        let before = db.get_task(task.id).unwrap().unwrap().updated_at;
        sleep(Duration::from_millis(2));
        let change = db.apply_status(task.id, TaskStatus::Completed).unwrap();
        assert_eq!(change.previous, change.current);
        assert!(db.get_task(task.id).unwrap().unwrap().updated_at > before);
    }

    #[test]
    fn unknown_task_is_not_found() {
        let (db, _, _) = setup();
        assert!(matches!(
            db.apply_status(404, TaskStatus::Completed),
            Err(TrackerError::NotFound { .. })
        ));
    }
}
