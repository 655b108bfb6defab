use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type TaskId = u64;

/// Queue selector for a scheduled task.
///
/// `High` tasks land in the round-robin queue and run one after another.
/// Everything else lands in the first-come-first-served queue and runs on the
/// bounded worker pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    High,
    #[default]
    Low,
}

impl Priority {
    /// Map a numeric priority level as typed by the user: `1` is high, any
    /// other level is low.
    pub fn from_level(level: i64) -> Self {
        if level == 1 {
            Priority::High
        } else {
            Priority::Low
        }
    }

    pub fn level(self) -> u8 {
        match self {
            Priority::High => 1,
            Priority::Low => 2,
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Priority::High => write!(f, "high"),
            Priority::Low => write!(f, "low"),
        }
    }
}

/// Outcome of running one task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    Completed,
    Failed,
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskStatus::Completed => write!(f, "completed"),
            TaskStatus::Failed => write!(f, "failed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub command: String,
    pub priority: Priority,
    pub created_at: DateTime<Utc>,
}

impl Task {
    pub fn new(id: TaskId, command: impl Into<String>, priority: Priority) -> Self {
        Self {
            id,
            command: command.into(),
            priority,
            created_at: Utc::now(),
        }
    }
}
