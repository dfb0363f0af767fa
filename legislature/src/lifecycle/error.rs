//! Lifecycle error types

use thiserror::Error;

use crate::proposal::{ProposalId, ProposalStatus};
use crate::store::StoreError;

/// Result type alias for lifecycle operations
pub type LifecycleResult<T> = Result<T, LifecycleError>;

#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error("Bill #{0} not found")]
    NotFound(ProposalId),

    #[error("Bill #{id} is {status}; cannot {action}")]
    InvalidTransition {
        id: ProposalId,
        status: ProposalStatus,
        action: &'static str,
    },

    #[error("Invalid submission: {0}")]
    InvalidSubmission(String),

    #[error("Storage error: {0}")]
    Storage(StoreError),
}

impl From<StoreError> for LifecycleError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => Self::NotFound(id),
            other => Self::Storage(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_not_found_maps_to_not_found() {
        let err: LifecycleError = StoreError::NotFound(7).into();
        assert!(matches!(err, LifecycleError::NotFound(7)));
        assert_eq!(err.to_string(), "Bill #7 not found");
    }

    #[test]
    fn test_other_store_errors_are_storage() {
        let err: LifecycleError = StoreError::LockPoisoned.into();
        assert!(matches!(err, LifecycleError::Storage(_)));
    }

    #[test]
    fn test_invalid_transition_message() {
        let err = LifecycleError::InvalidTransition {
            id: 3,
            status: ProposalStatus::Passed,
            action: "veto",
        };
        assert_eq!(err.to_string(), "Bill #3 is passed; cannot veto");
    }
}
