use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Length of the abbreviated commit hash stored with each record.
pub const SHORT_HASH_LEN: usize = 8;

/// Append-only audit row linking a commit to a project and optionally a task.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActivityRecord {
    pub id: i64,
    pub project_id: i64,
    pub task_id: Option<i64>,
    pub commit_hash: String,
    pub branch_name: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewActivityRecord {
    pub project_id: i64,
    pub task_id: Option<i64>,
    pub commit_hash: String,
    pub branch_name: String,
    pub message: String,
}

/// Truncate a full commit hash to its short form.
pub fn short_hash(hash: &str) -> &str {
    match hash.char_indices().nth(SHORT_HASH_LEN) {
        Some((idx, _)) => &hash[..idx],
        None => hash,
    }
}
