//! Task data structures.
//!
//! `Task` is the stored record, `NewTask` is what callers (and the classifier)
//! hand to the store, and `TaskPatch` describes a shallow-merge update.

use serde::{Deserialize, Serialize};

use crate::fields::*;

/// Estimated hours given to a task when nobody says otherwise.
pub const DEFAULT_ESTIMATE_HOURS: f64 = 4.0;

/// A unit of suggested work with its classification, timing and sprint link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub task_type: TaskType,
    pub area: Area,
    pub priority: Priority,
    pub status: Status,
    #[serde(default)]
    pub source: String,
    pub created_at_utc: i64,
    pub updated_at_utc: i64,
    pub estimated_hours: f64,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub progress: u8,
    #[serde(default)]
    pub time_spent: f64,
    #[serde(default)]
    pub time_remaining: f64,
    #[serde(default)]
    pub sprint_id: Option<String>,
}

impl Task {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// Caller-supplied fields for a task that does not exist yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub task_type: TaskType,
    pub area: Area,
    pub priority: Priority,
    pub status: Status,
    pub source: String,
    pub estimated_hours: f64,
    pub tags: Vec<String>,
    pub dependencies: Vec<String>,
}

impl NewTask {
    pub fn new(title: impl Into<String>) -> Self {
        NewTask {
            title: title.into(),
            description: String::new(),
            task_type: TaskType::Feature,
            area: Area::Backend,
            priority: Priority::Medium,
            status: Status::Backlog,
            source: String::new(),
            estimated_hours: DEFAULT_ESTIMATE_HOURS,
            tags: Vec::new(),
            dependencies: Vec::new(),
        }
    }
}

/// Shallow-merge update. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub task_type: Option<TaskType>,
    pub area: Option<Area>,
    pub priority: Option<Priority>,
    pub status: Option<Status>,
    pub estimated_hours: Option<f64>,
    pub progress: Option<u8>,
    pub time_remaining: Option<f64>,
    pub add_tags: Vec<String>,
    pub remove_tags: Vec<String>,
    pub add_dependencies: Vec<String>,
    pub remove_dependencies: Vec<String>,
}

impl TaskPatch {
    pub fn status(status: Status) -> Self {
        TaskPatch { status: Some(status), ..TaskPatch::default() }
    }

    pub fn is_empty(&self) -> bool {
        *self == TaskPatch::default()
    }
}

/// One entry in the activity log written by time tracking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeEntry {
    pub task_id: String,
    pub hours: f64,
    pub note: String,
    pub logged_at_utc: i64,
}
