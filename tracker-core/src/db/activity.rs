use rusqlite::{params, Connection, Row};

use super::{format_datetime, now, parse_datetime, Database};
use crate::error::Result;
use crate::models::*;

const ACTIVITY_COLUMNS: &str =
    "id, project_id, task_id, commit_hash, branch_name, message, timestamp";

impl Database {
    // ============================================================
    // Activity log
    // ============================================================

    pub fn append_activity(&self, record: NewActivityRecord) -> Result<ActivityRecord> {
        self.write(|tx| append_activity_in(tx, &record))
    }

    /// Newest activity for a project.
    pub fn recent_activity(&self, project_id: i64, limit: usize) -> Result<Vec<ActivityRecord>> {
        self.read(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {ACTIVITY_COLUMNS} FROM activity_records
                 WHERE project_id = ?1
                 ORDER BY timestamp DESC, id DESC
                 LIMIT ?2"
            ))?;
            let records = stmt
                .query_map(params![project_id, limit as i64], activity_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(records)
        })
    }

    /// Every record referencing a task, oldest first.
    pub fn activity_for_task(&self, task_id: i64) -> Result<Vec<ActivityRecord>> {
        self.read(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {ACTIVITY_COLUMNS} FROM activity_records WHERE task_id = ?1 ORDER BY id"
            ))?;
            let records = stmt
                .query_map([task_id], activity_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(records)
        })
    }
}

/// Append one immutable record. The commit hash is stored in short form.
pub(crate) fn append_activity_in(
    conn: &Connection,
    record: &NewActivityRecord,
) -> Result<ActivityRecord> {
    let now = now();
    let hash = short_hash(&record.commit_hash).to_string();

    conn.execute(
        "INSERT INTO activity_records (project_id, task_id, commit_hash, branch_name, message, timestamp)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            record.project_id,
            record.task_id,
            &hash,
            &record.branch_name,
            &record.message,
            format_datetime(&now),
        ],
    )?;

    Ok(ActivityRecord {
        id: conn.last_insert_rowid(),
        project_id: record.project_id,
        task_id: record.task_id,
        commit_hash: hash,
        branch_name: record.branch_name.clone(),
        message: record.message.clone(),
        timestamp: now,
    })
}

fn activity_from_row(row: &Row<'_>) -> rusqlite::Result<ActivityRecord> {
    Ok(ActivityRecord {
        id: row.get(0)?,
        project_id: row.get(1)?,
        task_id: row.get(2)?,
        commit_hash: row.get(3)?,
        branch_name: row.get(4)?,
        message: row.get(5)?,
        timestamp: parse_datetime(row.get(6)?),
    })
}
