use thiserror::Error;

use crate::domain::queue::QueueStatus;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid queue transition from {from:?} to {to:?}")]
    InvalidQueueTransition { from: QueueStatus, to: QueueStatus },
    #[error("domain invariant violation: {0}")]
    InvariantViolation(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("persistence failure: {0}")]
    Persistence(String),
    #[error("upstream failure: {0}")]
    Upstream(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
}

impl ApplicationError {
    /// Applicant-safe description, free of internals. Applicants are told
    /// either "confirmed" or "not confirmed, book manually" -- never a stack
    /// of transport details.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Domain(_) => "The request could not be processed.",
            Self::Persistence(_) => "The waiting list is temporarily unavailable. Please retry shortly.",
            Self::Upstream(_) => {
                "The booking site did not respond. Your place in the queue is unchanged."
            }
            Self::Configuration(_) => "An unexpected internal error occurred.",
        }
    }
}
