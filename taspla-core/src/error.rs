//! Errors raised by engine operations.

use thiserror::Error;

use crate::task::TaskStatus;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Invalid task data: {0}")]
    InvalidTaskData(String),

    #[error("Invalid state transition for task {id}: {from:?} -> {to:?}")]
    InvalidTransition {
        id: String,
        from: TaskStatus,
        to: TaskStatus,
    },

    #[error("Duplicate task id: {0}")]
    DuplicateTaskId(String),

    #[error("Invalid due date '{0}' (expected YYYY-MM-DD, YYYY-MM-DD HH:MM or RFC3339)")]
    InvalidDueDate(String),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),
}

pub type Result<T> = std::result::Result<T, TaskError>;
