//! Error taxonomy for the tracker core.

use thiserror::Error;

/// Which kind of entity a failed lookup was for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Project,
    Task,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Project => write!(f, "Project"),
            Self::Task => write!(f, "Task"),
        }
    }
}

#[derive(Debug, Error)]
pub enum TrackerError {
    /// Unique-name constraint violated on project insert.
    #[error("Project '{0}' already exists")]
    DuplicateName(String),

    #[error("{kind} '{reference}' not found")]
    NotFound { kind: EntityKind, reference: String },

    #[error("Invalid status '{0}'. Use: pending, in_progress, completed, blocked")]
    InvalidStatus(String),

    #[error("Invalid priority '{0}'. Use: low, medium, high")]
    InvalidPriority(String),

    #[error("Invalid date '{0}'. Use YYYY-MM-DD")]
    InvalidDate(String),

    /// A commit directive referenced a task outside the committing project.
    #[error("Task {task_id} not found in this project")]
    TaskNotInProject { task_id: i64, project_id: i64 },

    /// A subprocess (git, performance script) failed. Always soft.
    #[error("{tool} failed: {message}")]
    ExternalTool { tool: String, message: String },

    #[error("AI response was not a valid task: {0}")]
    MalformedAiResponse(String),

    #[error(transparent)]
    Database(#[from] rusqlite::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl TrackerError {
    pub fn project_not_found(reference: impl Into<String>) -> Self {
        Self::NotFound {
            kind: EntityKind::Project,
            reference: reference.into(),
        }
    }

    pub fn task_not_found(reference: impl Into<String>) -> Self {
        Self::NotFound {
            kind: EntityKind::Task,
            reference: reference.into(),
        }
    }

    pub fn external(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ExternalTool {
            tool: tool.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TrackerError>;
