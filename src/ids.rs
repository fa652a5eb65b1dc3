//! Identifier generation for tasks and sprints.

use uuid::Uuid;

pub const TASK_PREFIX: &str = "task";
pub const SPRINT_PREFIX: &str = "sprint";

/// Source of fresh record identifiers.
pub trait IdGenerator: Send {
    fn next_id(&mut self, prefix: &str) -> String;
}

/// Random UUIDv4 identifiers, e.g. `task-3f2a…`.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidIds;

impl IdGenerator for UuidIds {
    fn next_id(&mut self, prefix: &str) -> String {
        format!("{prefix}-{}", Uuid::new_v4().simple())
    }
}

/// Deterministic counter identifiers: `task-1`, `sprint-2`, ...
///
/// The counter is shared across prefixes.
#[derive(Debug, Default, Clone)]
pub struct SequentialIds {
    next: u64,
}

impl SequentialIds {
    pub fn new() -> Self {
        SequentialIds::default()
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next += 1;
        format!("{prefix}-{}", self.next)
    }
}
