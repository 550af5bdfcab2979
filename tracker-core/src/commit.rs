//! Commit message interpreter.
//!
//! Commit subjects carry task directives such as `pt:42 done` or
//! `pt:7 working`. [`parse`] extracts them; [`Database::apply_commit`] logs
//! one activity record per directive and applies the status changes.
//!
//! Patterns are tried in a fixed order (completed, in progress, blocked,
//! bare reference) and each pattern contributes at most its first match with
//! a usable id, so
//! a message can yield several directives for the same task. When that
//! happens only the first status-changing directive for a task mutates it;
//! later ones are still logged but demoted to plain activity.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::db::activity::append_activity_in;
use crate::db::tasks::get_task_in;
use crate::db::Database;
use crate::error::{Result, TrackerError};
use crate::models::{NewActivityRecord, StatusChange, TaskStatus};
use crate::status::apply_status_in;

const COMPLETED_WORDS: &str = "complete(?:d)?|done|finish(?:ed)?";
const PROGRESS_WORDS: &str = "progress|working|start(?:ed)?";
const BLOCKED_WORDS: &str = "block(?:ed)?";

static COMPLETED: LazyLock<Regex> = LazyLock::new(|| keyed(COMPLETED_WORDS));
static IN_PROGRESS: LazyLock<Regex> = LazyLock::new(|| keyed(PROGRESS_WORDS));
static BLOCKED: LazyLock<Regex> = LazyLock::new(|| keyed(BLOCKED_WORDS));

static TASK_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"pt:([0-9]+)").expect("invalid task reference regex"));

static KEYWORD_FOLLOWS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"^\s+(?:{COMPLETED_WORDS}|{PROGRESS_WORDS}|{BLOCKED_WORDS})"
    ))
    .expect("invalid keyword regex")
});

fn keyed(words: &str) -> Regex {
    Regex::new(&format!(r"pt:([0-9]+)\s+(?:{words})")).expect("invalid directive regex")
}

/// What a directive asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Completed,
    InProgress,
    Blocked,
    /// Log-only reference.
    Activity,
}

impl Action {
    pub fn status(&self) -> Option<TaskStatus> {
        match self {
            Self::Completed => Some(TaskStatus::Completed),
            Self::InProgress => Some(TaskStatus::InProgress),
            Self::Blocked => Some(TaskStatus::Blocked),
            Self::Activity => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::InProgress => "in_progress",
            Self::Blocked => "blocked",
            Self::Activity => "activity",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Directive {
    pub task_id: i64,
    pub action: Action,
}

impl Directive {
    pub fn new(task_id: i64, action: Action) -> Self {
        Self { task_id, action }
    }
}

/// Id captured by a directive pattern; `None` when it overflows an `i64`.
fn task_id(caps: &regex::Captures<'_>) -> Option<i64> {
    let id = caps[1].parse().ok();
    if id.is_none() {
        tracing::debug!(reference = &caps[0], "ignoring out-of-range task id");
    }
    id
}

/// Extract directives from a commit message, in pattern priority order.
pub fn parse(message: &str) -> Vec<Directive> {
    let lowered = message.to_lowercase();
    let mut directives = Vec::new();

    for (pattern, action) in [
        (&*COMPLETED, Action::Completed),
        (&*IN_PROGRESS, Action::InProgress),
        (&*BLOCKED, Action::Blocked),
    ] {
        if let Some(task_id) = pattern.captures_iter(&lowered).find_map(|c| task_id(&c)) {
            directives.push(Directive::new(task_id, action));
        }
    }

    let bare = TASK_REF.captures_iter(&lowered).find_map(|caps| {
        let end = caps.get(0).map(|m| m.end()).unwrap_or_default();
        if KEYWORD_FOLLOWS.is_match(&lowered[end..]) {
            return None;
        }
        task_id(&caps)
    });
    if let Some(task_id) = bare {
        directives.push(Directive::new(task_id, Action::Activity));
    }

    directives
}

/// The commit being interpreted.
#[derive(Debug, Clone, Serialize)]
pub struct CommitInfo {
    /// Full or short hash; stored truncated.
    pub hash: String,
    /// Raw subject line, stored as-is.
    pub subject: String,
    pub branch: String,
}

/// What happened for one successfully applied directive.
#[derive(Debug, Clone, Serialize)]
pub struct AppliedDirective {
    pub title: String,
    pub activity_id: i64,
    pub change: Option<StatusChange>,
    /// An earlier directive in the same message already set this task's status.
    pub superseded: bool,
}

#[derive(Debug)]
pub struct DirectiveOutcome {
    pub directive: Directive,
    pub result: Result<AppliedDirective>,
}

impl DirectiveOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

impl Database {
    /// Parse `commit.subject` and apply each directive against `project_id`.
    ///
    /// Directives are independent: each runs in its own transaction and a
    /// failure is reported in its outcome without stopping the rest.
    pub fn apply_commit(&self, project_id: i64, commit: &CommitInfo) -> Vec<DirectiveOutcome> {
        let mut status_set: HashSet<i64> = HashSet::new();

        parse(&commit.subject)
            .into_iter()
            .map(|directive| {
                let superseded =
                    directive.action.status().is_some() && status_set.contains(&directive.task_id);
                let result = self.apply_directive(project_id, commit, directive, superseded);
                if result.is_ok() && directive.action.status().is_some() {
                    status_set.insert(directive.task_id);
                }
                if let Err(e) = &result {
                    tracing::warn!(task_id = directive.task_id, error = %e, "directive failed");
                }
                DirectiveOutcome { directive, result }
            })
            .collect()
    }

    fn apply_directive(
        &self,
        project_id: i64,
        commit: &CommitInfo,
        directive: Directive,
        superseded: bool,
    ) -> Result<AppliedDirective> {
        self.write(|tx| {
            let task = get_task_in(tx, directive.task_id)?
                .filter(|t| t.project_id == project_id)
                .ok_or(TrackerError::TaskNotInProject {
                    task_id: directive.task_id,
                    project_id,
                })?;

            let record = append_activity_in(
                tx,
                &NewActivityRecord {
                    project_id,
                    task_id: Some(task.id),
                    commit_hash: commit.hash.clone(),
                    branch_name: commit.branch.clone(),
                    message: commit.subject.clone(),
                },
            )?;

            let change = match directive.action.status() {
                Some(status) if !superseded => Some(apply_status_in(tx, task.id, status)?),
                _ => None,
            };

            Ok(AppliedDirective {
                title: task.title,
                activity_id: record.id,
                change,
                superseded,
            })
        })
    }
}
