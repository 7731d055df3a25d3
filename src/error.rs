use thiserror::Error;

use crate::workorder::Task;

/// Typed failure surface of the core.
///
/// Nothing here is retried internally; every variant is propagated to the
/// caller as-is. `Conflict` is the caller's cue to reload state and retry.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: u64 },

    #[error("not permitted: {action}")]
    Permission { action: String },

    #[error("{} offene Pflichtaufgaben", .blocking.len())]
    IncompleteTasks { blocking: Vec<Task> },

    #[error("conflict: {0}")]
    Conflict(String),
}

impl CoreError {
    pub fn validation(msg: impl Into<String>) -> Self {
        CoreError::Validation(msg.into())
    }

    pub fn permission(action: impl Into<String>) -> Self {
        CoreError::Permission {
            action: action.into(),
        }
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        CoreError::Conflict(msg.into())
    }
}
