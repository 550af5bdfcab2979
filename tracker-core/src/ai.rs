//! Prompts for the AI collaborator and parsing of its task proposals.
//!
//! The HTTP client lives in the binary; everything here is pure so it can be
//! exercised without a network.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::context::ProjectContext;
use crate::error::{Result, TrackerError};
use crate::models::{AiTaskMetadata, CreateTaskInput, Priority, Task};

/// Insight type recorded for task analyses.
pub const ANALYSIS_INSIGHT: &str = "analysis";

pub fn chat_prompt(context: &ProjectContext, message: &str) -> String {
    format!(
        "You are an AI assistant for the Project Tracker tool. You help developers manage their projects and code.

Current Project Context:
{}
Instructions:
- Provide helpful, specific advice based on the project context
- When suggesting tasks, be specific and actionable
- Consider the existing codebase and project structure
- If asked to create tasks, format them clearly
- Be concise but thorough
- Reference existing tasks and files when relevant

User's question: {message}",
        context.render()
    )
}

pub fn task_creation_prompt(context: &ProjectContext, request: &str) -> String {
    format!(
        r#"Based on the following project context, analyze this task request and break it down into a structured task.

Project Context:
{}
Task Request: {request}

Please respond with a JSON object containing:
- "title": A concise, clear task title
- "description": Detailed description of what needs to be done
- "priority": "high", "medium", or "low" based on the request
- "estimated_hours": Rough estimate of hours needed
- "complexity": "simple", "moderate", or "complex"
- "subtasks": Array of smaller subtasks if this is complex (optional)
- "dependencies": Any dependencies on existing tasks (reference task IDs if relevant)

Only respond with the JSON object, no other text."#,
        context.render()
    )
}

pub fn analysis_prompt(context: &ProjectContext, task: &Task) -> String {
    format!(
        "Analyze this task within the project context and provide insights.

Project Context:
{}
Task Details:
- ID: {}
- Title: {}
- Description: {}
- Status: {}
- Priority: {}

Please provide:
1. Implementation approach recommendations
2. Potential challenges or blockers
3. Required technologies/tools
4. Testing strategy
5. Time estimate refinement
6. Dependencies with other tasks

Keep the response practical and actionable.",
        context.render(),
        task.id,
        task.title,
        task.description.as_deref().unwrap_or("None"),
        task.status,
        task.priority,
    )
}

/// Hours come back as a number most of the time, occasionally as text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
enum Hours {
    Number(f64),
    Text(String),
}

impl Hours {
    fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
        }
    }
}

/// Structured task returned by the model for a natural-language request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskProposal {
    pub title: String,
    pub description: String,
    pub priority: String,
    #[serde(default)]
    estimated_hours: Option<Hours>,
    #[serde(default)]
    pub complexity: Option<String>,
    #[serde(default)]
    pub subtasks: Vec<String>,
    #[serde(default)]
    pub dependencies: Vec<serde_json::Value>,
}

impl TaskProposal {
    pub fn estimated_hours(&self) -> Option<f64> {
        self.estimated_hours.as_ref().and_then(Hours::as_f64)
    }

    pub fn priority(&self) -> Result<Priority> {
        Priority::from_str(&self.priority.to_lowercase()).map_err(|_| {
            TrackerError::MalformedAiResponse(format!("invalid priority '{}'", self.priority))
        })
    }

    /// Insert input for the main task.
    pub fn main_task(&self) -> Result<CreateTaskInput> {
        Ok(CreateTaskInput {
            title: self.title.clone(),
            description: Some(self.description.clone()),
            priority: self.priority()?,
            due_date: None,
            ai: Some(AiTaskMetadata {
                estimate_hours: self.estimated_hours(),
                complexity: self.complexity.clone(),
            }),
        })
    }

    /// Insert inputs for the subtasks, once the main task has an id.
    pub fn subtasks_for(&self, main: &Task) -> Vec<CreateTaskInput> {
        self.subtasks
            .iter()
            .enumerate()
            .map(|(i, subtask)| CreateTaskInput {
                title: format!("{} - {subtask}", main.title),
                description: Some(format!(
                    "Subtask {} of main task [{}]: {subtask}",
                    i + 1,
                    main.id
                )),
                priority: Priority::Medium,
                due_date: None,
                ai: Some(AiTaskMetadata::default()),
            })
            .collect()
    }
}

/// Parse a proposal from model output, tolerating a surrounding code fence.
pub fn parse_task_proposal(text: &str) -> Result<TaskProposal> {
    let body = strip_code_fence(text);
    let proposal: TaskProposal = serde_json::from_str(body)
        .map_err(|e| TrackerError::MalformedAiResponse(format!("not a task object: {e}")))?;
    if proposal.title.trim().is_empty() {
        return Err(TrackerError::MalformedAiResponse("empty title".into()));
    }
    proposal.priority()?;
    Ok(proposal)
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (`json`) on the opening fence line.
    let rest = rest.split_once('\n').map_or("", |(_, body)| body);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
