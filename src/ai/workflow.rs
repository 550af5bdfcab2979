//! Chat, task creation and task analysis on top of an [`AiCollaborator`].
//!
//! Each workflow resolves its references and gathers context before talking
//! to the model, and only writes once a usable reply has come back.

use tracker_core::ai::{self, ANALYSIS_INSIGHT};
use tracker_core::context::ContextBuilder;
use tracker_core::models::{AiInsight, ConversationRole, NewAiInsight, Project, Task};
use tracker_core::{Database, Result, TrackerError};

use super::AiCollaborator;

#[derive(Debug, Clone)]
pub struct ChatReply {
    pub conversation_id: String,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct CreatedTasks {
    pub project: Project,
    pub main: Task,
    pub subtasks: Vec<Task>,
    pub estimated_hours: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct Analysis {
    pub task: Task,
    pub insight: AiInsight,
}

pub fn new_conversation_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Ask a question about a project and record both turns.
pub async fn chat(
    db: &Database,
    model: &dyn AiCollaborator,
    project_ref: &str,
    message: &str,
    conversation_id: Option<String>,
) -> Result<ChatReply> {
    let project = db.resolve_project(project_ref)?;
    let context = ContextBuilder::default().build(db, project.id)?;
    let text = model.generate(&ai::chat_prompt(&context, message)).await?;

    let conversation_id = conversation_id.unwrap_or_else(new_conversation_id);
    for (role, content) in [
        (ConversationRole::User, message),
        (ConversationRole::Assistant, text.as_str()),
    ] {
        db.store_conversation_turn(project.id, &conversation_id, role, content)?;
    }

    Ok(ChatReply {
        conversation_id,
        text,
    })
}

/// Turn a natural-language request into a task plus subtasks.
pub async fn create_task(
    db: &Database,
    model: &dyn AiCollaborator,
    project_ref: &str,
    request: &str,
) -> Result<CreatedTasks> {
    let project = db.resolve_project(project_ref)?;
    let context = ContextBuilder::default().build(db, project.id)?;
    let prompt = ai::task_creation_prompt(&context, request);
    let reply = model.generate(&prompt).await?;

    let proposal = ai::parse_task_proposal(&reply)?;
    let main_task = proposal.main_task()?;
    let (main, subtasks) =
        db.create_task_with_subtasks(project.id, main_task, |main| proposal.subtasks_for(main))?;
    tracing::info!(
        task_id = main.id,
        subtasks = subtasks.len(),
        "created AI task"
    );

    Ok(CreatedTasks {
        project,
        main,
        subtasks,
        estimated_hours: proposal.estimated_hours(),
    })
}

/// Analyze one task and store the result as an insight.
pub async fn analyze_task(
    db: &Database,
    model: &dyn AiCollaborator,
    task_id: i64,
) -> Result<Analysis> {
    let task = db
        .get_task(task_id)?
        .ok_or_else(|| TrackerError::task_not_found(task_id.to_string()))?;
    let context = ContextBuilder::default().build(db, task.project_id)?;
    let text = model.generate(&ai::analysis_prompt(&context, &task)).await?;

    let insight = db.add_insight(NewAiInsight {
        project_id: task.project_id,
        task_id: Some(task.id),
        insight_type: ANALYSIS_INSIGHT.to_string(),
        content: text,
        confidence: None,
    })?;

    Ok(Analysis { task, insight })
}
