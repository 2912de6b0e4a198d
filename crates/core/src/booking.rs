//! Trait seams between the acquisition engine and the upstream scheduler.
//!
//! The engine is agnostic to how a booking attempt is carried out; the
//! wired [`BookingStrategy`] is selected by configuration. The direct-HTTP
//! implementation lives in the upstream client crate.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::errors::ApplicationError;
use crate::payload::BookingRequest;

/// Failure classes of the upstream scheduler, as seen by the core.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum UpstreamError {
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("request timed out after {0}ms")]
    Timeout(u64),
    #[error("upstream returned status {0}")]
    Status(u16),
    #[error("upstream response could not be decoded: {0}")]
    Decode(String),
}

impl From<UpstreamError> for ApplicationError {
    fn from(value: UpstreamError) -> Self {
        ApplicationError::Upstream(value.to_string())
    }
}

/// Outcome of a single booking attempt. Anything that is not `Confirmed`
/// is treated identically by the engine: not confirmed, move on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AttemptOutcome {
    Confirmed { confirmation_id: String },
    Rejected { reason: String },
    TransportError { message: String },
}

impl AttemptOutcome {
    pub fn confirmation_id(&self) -> Option<&str> {
        match self {
            Self::Confirmed { confirmation_id } if !confirmation_id.is_empty() => {
                Some(confirmation_id)
            }
            _ => None,
        }
    }
}

/// Read side of the scheduler: which dates currently have open capacity.
#[async_trait]
pub trait AvailabilitySource: Send + Sync {
    async fn open_dates(&self) -> Result<Vec<NaiveDate>, UpstreamError>;
}

/// Read side of the scheduler: which times are actually free on one date.
/// Only consulted as a fallback after the blind fan-out misses.
#[async_trait]
pub trait SlotDirectory: Send + Sync {
    async fn open_times(&self, date: NaiveDate) -> Result<Vec<NaiveTime>, UpstreamError>;
}

/// One way of converting a candidate slot into a booking attempt.
#[async_trait]
pub trait BookingStrategy: Send + Sync {
    async fn attempt(&self, request: &BookingRequest) -> AttemptOutcome;
}

/// Which [`BookingStrategy`] implementation the process wires in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Http,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Http => "http",
        }
    }
}

impl std::str::FromStr for StrategyKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "http" => Ok(Self::Http),
            other => Err(format!("unsupported booking strategy `{other}` (expected http)")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::AttemptOutcome;

    #[test]
    fn empty_confirmation_identifier_is_not_a_win() {
        let outcome = AttemptOutcome::Confirmed { confirmation_id: String::new() };
        assert_eq!(outcome.confirmation_id(), None);

        let outcome = AttemptOutcome::Confirmed { confirmation_id: "CONF123".to_string() };
        assert_eq!(outcome.confirmation_id(), Some("CONF123"));
    }

    #[test]
    fn rejections_and_transport_errors_carry_no_confirmation() {
        assert_eq!(
            AttemptOutcome::Rejected { reason: "slot taken".to_string() }.confirmation_id(),
            None
        );
        assert_eq!(
            AttemptOutcome::TransportError { message: "connect refused".to_string() }
                .confirmation_id(),
            None
        );
    }
}
