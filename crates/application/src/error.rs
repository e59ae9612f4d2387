//! Command execution error taxonomy.

use thiserror::Error;

use ordering_core::{DomainError, RequestId};

use crate::ports::{PublishError, StoreError};

/// Failure of a command handler.
///
/// - Domain and authorization failures are deterministic and must not be
///   retried.
/// - Concurrency conflicts are transient: reload and retry.
/// - `DuplicateRequest` surfaces a commit-time dedup hit; the identified
///   dispatch layer folds it into a success.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Missing or anonymous buyer identity on order creation.
    #[error("buyer identity is missing")]
    Unauthorized,

    #[error("optimistic concurrency conflict: {0}")]
    Concurrency(String),

    #[error("request {0} was already recorded")]
    DuplicateRequest(RequestId),

    #[error("store failure: {0}")]
    Store(String),

    /// Publication failed after a successful commit; the events are
    /// persisted and a retry may duplicate delivery (at-least-once).
    #[error("integration event publication failed: {0}")]
    Publish(String),
}

impl CommandError {
    /// Whether the caller may retry (after reloading, where applicable).
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            CommandError::Concurrency(_)
                | CommandError::Store(_)
                | CommandError::Publish(_)
                | CommandError::Domain(DomainError::Conflict(_))
        )
    }
}

impl From<StoreError> for CommandError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Concurrency(msg) => CommandError::Concurrency(msg),
            StoreError::DuplicateRequest(id) => CommandError::DuplicateRequest(id),
            StoreError::Backend(msg) => CommandError::Store(msg),
        }
    }
}

impl From<PublishError> for CommandError {
    fn from(value: PublishError) -> Self {
        CommandError::Publish(value.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_conflicts_and_infrastructure_failures_are_transient() {
        assert!(CommandError::Concurrency("stale".into()).is_transient());
        assert!(CommandError::Publish("bus down".into()).is_transient());
        assert!(!CommandError::Unauthorized.is_transient());
        assert!(!CommandError::Domain(DomainError::validation("bad units")).is_transient());
        assert!(!CommandError::DuplicateRequest(RequestId::new()).is_transient());
    }
}
