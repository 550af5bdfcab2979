use rusqlite::params;

use super::projects::get_project_in;
use super::tasks::insert_task;
use super::{format_datetime, now, parse_datetime, Database};
use crate::error::{Result, TrackerError};
use crate::models::*;

impl Database {
    // ============================================================
    // AI collaborator records
    // ============================================================

    /// Insert a main task plus its subtasks in one transaction.
    pub fn create_task_with_subtasks(
        &self,
        project_id: i64,
        main: CreateTaskInput,
        subtasks: impl Fn(&Task) -> Vec<CreateTaskInput>,
    ) -> Result<(Task, Vec<Task>)> {
        self.write(|tx| {
            if get_project_in(tx, project_id)?.is_none() {
                return Err(TrackerError::project_not_found(project_id.to_string()));
            }
            let task = insert_task(tx, project_id, &main)?;
            let children = subtasks(&task)
                .iter()
                .map(|input| insert_task(tx, project_id, input))
                .collect::<Result<Vec<_>>>()?;
            Ok((task, children))
        })
    }

    pub fn store_conversation_turn(
        &self,
        project_id: i64,
        conversation_id: &str,
        role: ConversationRole,
        content: &str,
    ) -> Result<()> {
        self.write(|tx| {
            tx.execute(
                "INSERT INTO ai_conversations (project_id, conversation_id, role, content, timestamp)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    project_id,
                    conversation_id,
                    role.as_str(),
                    content,
                    format_datetime(&now())
                ],
            )?;
            Ok(())
        })
    }

    pub fn conversation(
        &self,
        project_id: i64,
        conversation_id: &str,
    ) -> Result<Vec<ConversationTurn>> {
        self.read(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, project_id, conversation_id, role, content, timestamp
                 FROM ai_conversations
                 WHERE project_id = ?1 AND conversation_id = ?2
                 ORDER BY id",
            )?;
            let turns = stmt
                .query_map(params![project_id, conversation_id], |row| {
                    Ok(ConversationTurn {
                        id: row.get(0)?,
                        project_id: row.get(1)?,
                        conversation_id: row.get(2)?,
                        role: row.get(3)?,
                        content: row.get(4)?,
                        timestamp: parse_datetime(row.get(5)?),
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(turns)
        })
    }

    pub fn add_insight(&self, insight: NewAiInsight) -> Result<AiInsight> {
        let now = now();
        let id = self.write(|tx| {
            tx.execute(
                "INSERT INTO ai_insights (project_id, task_id, insight_type, content, confidence, timestamp)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    insight.project_id,
                    insight.task_id,
                    &insight.insight_type,
                    &insight.content,
                    insight.confidence,
                    format_datetime(&now)
                ],
            )?;
            Ok(tx.last_insert_rowid())
        })?;

        Ok(AiInsight {
            id,
            project_id: insight.project_id,
            task_id: insight.task_id,
            insight_type: insight.insight_type,
            content: insight.content,
            confidence: insight.confidence,
            timestamp: now,
        })
    }

    pub fn insights_for_task(&self, task_id: i64) -> Result<Vec<AiInsight>> {
        self.read(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, project_id, task_id, insight_type, content, confidence, timestamp
                 FROM ai_insights WHERE task_id = ?1 ORDER BY id",
            )?;
            let insights = stmt
                .query_map([task_id], |row| {
                    Ok(AiInsight {
                        id: row.get(0)?,
                        project_id: row.get(1)?,
                        task_id: row.get(2)?,
                        insight_type: row.get(3)?,
                        content: row.get(4)?,
                        confidence: row.get(5)?,
                        timestamp: parse_datetime(row.get(6)?),
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(insights)
        })
    }
}
