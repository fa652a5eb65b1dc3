//! Enumerations and field types for research tasks.
//!
//! Every vocabulary here is closed: values are parsed at the boundary (CLI
//! arguments, JSON files, classifier rules) and unknown strings are rejected
//! instead of being stored as free text. JSON goes through `FromStr`, so a
//! hand-edited "In Progress" still loads as `in-progress`.

use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// What kind of work a task represents.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "kebab-case", try_from = "String")]
pub enum TaskType {
    Feature,
    Bugfix,
    Optimization,
    Testing,
    Documentation,
    Refactoring,
    Integration,
    Deployment,
}

/// Part of the application a task touches.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "kebab-case", try_from = "String")]
pub enum Area {
    Frontend,
    Backend,
    Integration,
    Testing,
    Deployment,
}

/// Task importance. Declaration order is significance order, critical first.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "kebab-case", try_from = "String")]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
}

/// Workflow status. Any status may follow any other.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "kebab-case", try_from = "String")]
pub enum Status {
    Backlog,
    InProgress,
    Review,
    Done,
}

/// Available sorting options for task lists.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SortKey {
    Created,
    Priority,
    Estimate,
}

impl TaskType {
    pub const ALL: [TaskType; 8] = [
        TaskType::Feature,
        TaskType::Bugfix,
        TaskType::Optimization,
        TaskType::Testing,
        TaskType::Documentation,
        TaskType::Refactoring,
        TaskType::Integration,
        TaskType::Deployment,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TaskType::Feature => "feature",
            TaskType::Bugfix => "bugfix",
            TaskType::Optimization => "optimization",
            TaskType::Testing => "testing",
            TaskType::Documentation => "documentation",
            TaskType::Refactoring => "refactoring",
            TaskType::Integration => "integration",
            TaskType::Deployment => "deployment",
        }
    }
}

impl Area {
    pub const ALL: [Area; 5] = [
        Area::Frontend,
        Area::Backend,
        Area::Integration,
        Area::Testing,
        Area::Deployment,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Area::Frontend => "frontend",
            Area::Backend => "backend",
            Area::Integration => "integration",
            Area::Testing => "testing",
            Area::Deployment => "deployment",
        }
    }
}

impl Priority {
    pub const ALL: [Priority; 4] = [Priority::Critical, Priority::High, Priority::Medium, Priority::Low];

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Critical => "critical",
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

impl Status {
    pub const ALL: [Status; 4] = [Status::Backlog, Status::InProgress, Status::Review, Status::Done];

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Backlog => "backlog",
            Status::InProgress => "in-progress",
            Status::Review => "review",
            Status::Done => "done",
        }
    }
}

/// Shared case-insensitive lookup over a vocabulary's canonical names.
fn parse_vocab<T: Copy>(all: &[T], name: fn(T) -> &'static str, field: &str, s: &str) -> Result<T, Error> {
    let wanted = s.trim().to_lowercase().replace(['_', ' '], "-");
    all.iter()
        .copied()
        .find(|v| name(*v) == wanted)
        .ok_or_else(|| {
            let allowed: Vec<&str> = all.iter().map(|v| name(*v)).collect();
            Error::InvalidArgument(format!("unknown {field} '{s}' (expected one of: {})", allowed.join(", ")))
        })
}

macro_rules! vocab_impls {
    ($ty:ty, $field:literal) => {
        impl FromStr for $ty {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                parse_vocab(&<$ty>::ALL, <$ty>::as_str, $field, s)
            }
        }

        impl TryFrom<String> for $ty {
            type Error = Error;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                s.parse()
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

vocab_impls!(TaskType, "task type");
vocab_impls!(Area, "area");
vocab_impls!(Priority, "priority");
vocab_impls!(Status, "status");
