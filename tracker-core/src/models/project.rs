use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status assigned to new projects. Project status is open-ended text.
pub const DEFAULT_PROJECT_STATUS: &str = "active";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub path: Option<String>,
    pub description: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    pub fn is_active(&self) -> bool {
        self.status == DEFAULT_PROJECT_STATUS
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateProjectInput {
    pub name: String,
    pub path: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectSummary {
    #[serde(flatten)]
    pub project: Project,
    pub total_tasks: i64,
    pub completed_tasks: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OverallStats {
    pub active_projects: i64,
    pub total_projects: i64,
    pub task_counts: Vec<StatusCount>,
}

impl OverallStats {
    pub fn total_tasks(&self) -> i64 {
        self.task_counts.iter().map(|c| c.count).sum()
    }

    pub fn count_for(&self, status: super::TaskStatus) -> i64 {
        self.task_counts
            .iter()
            .find(|c| c.status == status.as_str())
            .map(|c| c.count)
            .unwrap_or(0)
    }
}

/// Tasks grouped by their stored status text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusCount {
    pub status: String,
    pub count: i64,
}
