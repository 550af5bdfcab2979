pub(crate) mod activity;
mod ai;
pub(crate) mod projects;
mod schema;
pub(crate) mod tasks;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, SubsecRound, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, Transaction, TransactionBehavior};

use crate::error::{Result, TrackerError};

pub use schema::SCHEMA;

/// File name of the store inside the data directory.
pub const DB_FILE_NAME: &str = "tracker.db";

/// How long a writer waits for another invocation's lock before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Entity store for projects, tasks, and activity records.
///
/// Each CLI or hook invocation opens its own handle; concurrent invocations
/// are serialized by SQLite's locking, and every multi-row write runs in a
/// single `IMMEDIATE` transaction.
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open(path: PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(&path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        tracing::debug!(path = %path.display(), "opened tracker database");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open the store in the per-user data directory.
    pub fn open_default() -> Result<Self> {
        Self::open(default_data_dir()?.join(DB_FILE_NAME))
    }

    /// Open the store inside an explicit data directory.
    pub fn open_in(data_dir: &Path) -> Result<Self> {
        Self::open(data_dir.join(DB_FILE_NAME))
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn migrate(&self) -> Result<()> {
        let conn = self.conn();
        schema::run_migrations(&conn)
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` inside one write transaction, committing only on success.
    pub(crate) fn write<T>(&self, f: impl FnOnce(&Transaction<'_>) -> Result<T>) -> Result<T> {
        let mut conn = self.conn();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }

    /// Run `f` against the connection without opening a transaction.
    pub(crate) fn read<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let conn = self.conn();
        f(&conn)
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            conn: self.conn.clone(),
        }
    }
}

/// Per-user data directory (`~/.local/share/project-tracker` on Linux).
pub fn default_data_dir() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("", "", "project-tracker").ok_or_else(|| {
        TrackerError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "could not determine data directory",
        ))
    })?;
    Ok(dirs.data_dir().to_path_buf())
}

/// Current time truncated to what the store keeps.
pub(crate) fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

pub(crate) fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a stored timestamp. Accepts SQLite's `CURRENT_TIMESTAMP` layout as
/// well as RFC 3339 so databases written by older tools still load.
pub(crate) fn parse_datetime(s: String) -> DateTime<Utc> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(&s) {
        return dt.with_timezone(&Utc);
    }
    NaiveDateTime::parse_from_str(&s, "%Y-%m-%d %H:%M:%S")
        .map(|naive| naive.and_utc())
        .unwrap_or_default()
}

pub(crate) fn format_date(date: &NaiveDate) -> String {
    date.format(crate::models::DUE_DATE_FORMAT).to_string()
}

pub(crate) fn parse_date(s: Option<String>) -> Option<NaiveDate> {
    s.and_then(|s| NaiveDate::parse_from_str(&s, crate::models::DUE_DATE_FORMAT).ok())
}

/// Convert a domain parse failure inside a row mapper into a rusqlite error.
pub(crate) fn conversion_error(
    column: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(err))
}
