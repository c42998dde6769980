//! Persistence Error Types
//!
//! Failures reported by a [`TreePersistence`](super::TreePersistence)
//! implementation. They never abort the optimistic update; the dispatcher
//! broadcasts them and applies its rollback policy.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    /// Backend could not be reached
    #[error("Persistence backend unavailable: {0}")]
    Unavailable(String),

    /// Backend refused the write
    #[error("Persistence rejected {operation}: {reason}")]
    Rejected { operation: String, reason: String },

    /// Stored data changed underneath the write
    #[error("Persistence conflict: {context}")]
    Conflict { context: String },
}

impl PersistenceError {
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    pub fn rejected(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Rejected {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    pub fn conflict(context: impl Into<String>) -> Self {
        Self::Conflict {
            context: context.into(),
        }
    }
}
