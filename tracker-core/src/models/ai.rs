use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who authored a stored conversation turn.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConversationRole {
    User,
    Assistant,
}

impl ConversationRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub id: i64,
    pub project_id: i64,
    pub conversation_id: String,
    pub role: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiInsight {
    pub id: i64,
    pub project_id: i64,
    pub task_id: Option<i64>,
    pub insight_type: String,
    pub content: String,
    pub confidence: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAiInsight {
    pub project_id: i64,
    pub task_id: Option<i64>,
    pub insight_type: String,
    pub content: String,
    pub confidence: Option<f64>,
}
