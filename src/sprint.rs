//! Sprints: named, time-boxed groupings of tasks.
//!
//! A sprint refers to its tasks by id and each task carries a weak
//! `sprint_id` back-reference. Neither side owns the other.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::db::Database;
use crate::error::{Error, Result};
use crate::ids::SPRINT_PREFIX;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sprint {
    pub id: String,
    pub name: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    #[serde(default)]
    pub goals: Vec<String>,
    #[serde(default)]
    pub task_ids: Vec<String>,
    pub created_at_utc: i64,
}

impl Sprint {
    /// Length of the sprint in days, both ends inclusive.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    pub fn contains_date(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }
}

impl Database {
    /// Create a sprint. Fails with `InvalidRange` when `end` precedes `start`.
    pub fn create_sprint(
        &mut self,
        name: &str,
        start: NaiveDate,
        end: NaiveDate,
        goals: Vec<String>,
    ) -> Result<&Sprint> {
        if end < start {
            return Err(Error::InvalidRange { start, end });
        }
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidArgument("sprint name must not be empty".into()));
        }
        let sprint = Sprint {
            id: self.ids.next_id(SPRINT_PREFIX),
            name: name.to_string(),
            start,
            end,
            goals: goals
                .into_iter()
                .map(|g| g.trim().to_string())
                .filter(|g| !g.is_empty())
                .collect(),
            task_ids: Vec::new(),
            created_at_utc: Utc::now().timestamp(),
        };
        debug!(id = %sprint.id, name = %sprint.name, %start, %end, "sprint created");
        self.sprints.push(sprint);
        Ok(&self.sprints[self.sprints.len() - 1])
    }

    pub fn get_sprint(&self, id: &str) -> Result<&Sprint> {
        self.sprints
            .iter()
            .find(|s| s.id == id)
            .ok_or_else(|| Error::sprint_not_found(id))
    }

    /// Put a task into a sprint. Adding the same pair twice is a no-op; moving
    /// a task drops it from the sprint it was in before.
    pub fn add_task_to_sprint(&mut self, task_id: &str, sprint_id: &str) -> Result<()> {
        self.get(task_id)?;
        let target = self
            .sprints
            .iter()
            .position(|s| s.id == sprint_id)
            .ok_or_else(|| Error::sprint_not_found(sprint_id))?;

        for (i, sprint) in self.sprints.iter_mut().enumerate() {
            if i != target {
                sprint.task_ids.retain(|t| t != task_id);
            }
        }
        let sprint = &mut self.sprints[target];
        if !sprint.task_ids.iter().any(|t| t == task_id) {
            sprint.task_ids.push(task_id.to_string());
        }

        let task = self.get_mut(task_id)?;
        task.sprint_id = Some(sprint_id.to_string());
        task.updated_at_utc = Utc::now().timestamp();
        debug!(task = %task_id, sprint = %sprint_id, "task added to sprint");
        Ok(())
    }
}

/// Resolve a sprint by full id, case-insensitive name, or unique id prefix.
pub fn resolve_sprint_identifier(identifier: &str, db: &Database) -> Result<String> {
    let identifier = identifier.trim();
    if identifier.is_empty() {
        return Err(Error::InvalidArgument("sprint identifier must not be empty".into()));
    }
    if db.get_sprint(identifier).is_ok() {
        return Ok(identifier.to_string());
    }
    let wanted = identifier.to_lowercase();
    let by_name: Vec<&Sprint> = db.sprints().iter().filter(|s| s.name.to_lowercase() == wanted).collect();
    let matches = if by_name.is_empty() {
        db.sprints().iter().filter(|s| s.id.starts_with(identifier)).collect()
    } else {
        by_name
    };
    match matches.as_slice() {
        [] => Err(Error::sprint_not_found(identifier)),
        [one] => Ok(one.id.clone()),
        _ => Err(Error::InvalidArgument(format!(
            "'{identifier}' matches several sprints: {}",
            matches.iter().map(|s| s.id.as_str()).collect::<Vec<_>>().join(", ")
        ))),
    }
}
