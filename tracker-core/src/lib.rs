//! Core library for the project tracker.
//!
//! This crate owns the entity store, reference resolution, the status engine,
//! commit message interpretation and context assembly, independent of the
//! command-line front end and of any AI transport.
//!
//! # Usage
//!
//! ```no_run
//! use tracker_core::commit::CommitInfo;
//! use tracker_core::db::Database;
//!
//! let db = Database::open_default()?;
//! db.migrate()?;
//!
//! let project = db.resolve_project("tracker")?;
//! let outcomes = db.apply_commit(
//!     project.id,
//!     &CommitInfo {
//!         hash: "0123456789abcdef".into(),
//!         subject: "pt:42 completed".into(),
//!         branch: "main".into(),
//!     },
//! );
//! # let _ = outcomes;
//! # Ok::<(), tracker_core::TrackerError>(())
//! ```

pub mod ai;
pub mod commit;
pub mod context;
pub mod db;
pub mod error;
pub mod git;
pub mod models;
pub mod process;
pub mod project_kind;
pub mod resolve;
pub mod status;
pub mod template;

// Re-export commonly used types at crate root
pub use db::Database;
pub use error::{Result, TrackerError};
