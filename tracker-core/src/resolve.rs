//! Reference resolution: map a user-typed string to exactly one entity.
//!
//! A reference that parses as an integer is looked up by exact id and never
//! falls back to a name search. Anything else is a case-sensitive substring
//! match on the name (projects) or title (tasks); when several rows match,
//! the lowest id wins. A blank reference matches nothing.

use crate::db::Database;
use crate::error::{Result, TrackerError};
use crate::models::{Project, Task};

/// How a reference string is interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference<'a> {
    Id(i64),
    Name(&'a str),
}

impl<'a> Reference<'a> {
    pub fn parse(raw: &'a str) -> Self {
        let trimmed = raw.trim();
        match trimmed.parse::<i64>() {
            Ok(id) => Self::Id(id),
            Err(_) => Self::Name(trimmed),
        }
    }
}

impl Database {
    pub fn resolve_project(&self, reference: &str) -> Result<Project> {
        let found = match Reference::parse(reference) {
            Reference::Id(id) => self.get_project(id)?,
            Reference::Name("") => None,
            Reference::Name(fragment) => {
                first_match(self.find_projects_by_name(fragment)?, reference)
            }
        };
        found.ok_or_else(|| TrackerError::project_not_found(reference))
    }

    pub fn resolve_task(&self, reference: &str) -> Result<Task> {
        let found = match Reference::parse(reference) {
            Reference::Id(id) => self.get_task(id)?,
            Reference::Name("") => None,
            Reference::Name(fragment) => {
                first_match(self.find_tasks_by_title(fragment)?, reference)
            }
        };
        found.ok_or_else(|| TrackerError::task_not_found(reference))
    }
}

fn first_match<T>(candidates: Vec<T>, reference: &str) -> Option<T> {
    if candidates.len() > 1 {
        tracing::debug!(
            reference,
            matches = candidates.len(),
            "ambiguous reference, using lowest id"
        );
    }
    candidates.into_iter().next()
}
