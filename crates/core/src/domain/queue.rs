use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::applicant::ApplicantId;
use crate::errors::DomainError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueStatus {
    Waiting,
    Processing,
    Booked,
    Abandoned,
}

impl QueueStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::Processing => "processing",
            Self::Booked => "booked",
            Self::Abandoned => "abandoned",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "waiting" => Some(Self::Waiting),
            "processing" => Some(Self::Processing),
            "booked" => Some(Self::Booked),
            "abandoned" => Some(Self::Abandoned),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Booked | Self::Abandoned)
    }

    /// Whether a transition is permitted by the queue lifecycle.
    ///
    /// States move forward only, with one rollback edge: `Processing` may
    /// return to `Waiting` when a cycle ends without a booking so the
    /// applicant keeps their place in line.
    pub fn can_transition_to(&self, to: QueueStatus) -> bool {
        matches!(
            (self, to),
            (Self::Waiting, Self::Processing)
                | (Self::Processing, Self::Booked)
                | (Self::Processing, Self::Abandoned)
                | (Self::Processing, Self::Waiting)
                | (Self::Waiting, Self::Abandoned)
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueEntry {
    pub applicant_id: ApplicantId,
    pub status: QueueStatus,
    pub enqueued_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl QueueEntry {
    pub fn new(applicant_id: ApplicantId, enqueued_at: DateTime<Utc>) -> Self {
        Self { applicant_id, status: QueueStatus::Waiting, enqueued_at, updated_at: enqueued_at }
    }

    pub fn transition(&mut self, to: QueueStatus, at: DateTime<Utc>) -> Result<(), DomainError> {
        if !self.status.can_transition_to(to) {
            return Err(DomainError::InvalidQueueTransition { from: self.status, to });
        }
        self.status = to;
        self.updated_at = at;
        Ok(())
    }
}

/// Where an applicant stands relative to the queue.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueuePosition {
    /// 1-based place among waiting entries.
    Waiting(u32),
    /// Currently inside an acquisition cycle.
    Processing,
    /// Terminal: a reservation exists.
    Booked,
    /// Terminal: removed without a reservation.
    Abandoned,
    /// Never enqueued or already deleted.
    Absent,
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::{QueueEntry, QueueStatus};
    use crate::domain::applicant::ApplicantId;

    #[test]
    fn status_round_trips_through_str() {
        for status in [
            QueueStatus::Waiting,
            QueueStatus::Processing,
            QueueStatus::Booked,
            QueueStatus::Abandoned,
        ] {
            assert_eq!(QueueStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(QueueStatus::parse("pending"), None);
    }

    #[test]
    fn lifecycle_moves_forward_only() {
        assert!(QueueStatus::Waiting.can_transition_to(QueueStatus::Processing));
        assert!(QueueStatus::Processing.can_transition_to(QueueStatus::Booked));
        assert!(QueueStatus::Processing.can_transition_to(QueueStatus::Waiting));
        assert!(!QueueStatus::Booked.can_transition_to(QueueStatus::Waiting));
        assert!(!QueueStatus::Booked.can_transition_to(QueueStatus::Processing));
        assert!(!QueueStatus::Abandoned.can_transition_to(QueueStatus::Waiting));
        assert!(!QueueStatus::Waiting.can_transition_to(QueueStatus::Booked));
    }

    #[test]
    fn entry_transition_rejects_illegal_edges() {
        let now = Utc::now();
        let mut entry = QueueEntry::new(ApplicantId("U-1".to_string()), now);

        entry.transition(QueueStatus::Processing, now).expect("waiting -> processing");
        entry.transition(QueueStatus::Booked, now).expect("processing -> booked");

        let err = entry.transition(QueueStatus::Waiting, now);
        assert!(err.is_err(), "booked is terminal");
    }
}
