use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::applicant::ApplicantId;

/// Signal that at least one date has open capacity upstream. Ephemeral;
/// produced by the poller, consumed once by the acquisition engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AvailabilityEvent {
    pub dates: Vec<NaiveDate>,
    pub detected_at: DateTime<Utc>,
}

impl AvailabilityEvent {
    pub fn first_date(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }
}

/// One guessed {date, time} pair the engine is willing to attempt, absent
/// certainty it is actually free.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Candidate {
    pub date: NaiveDate,
    pub time: NaiveTime,
}

impl Candidate {
    /// Start marker in the upstream wire format, e.g. `2025-12-18T09:45`.
    pub fn start_marker(&self) -> String {
        format!("{}T{}", self.date.format("%Y-%m-%d"), self.time.format("%H:%M"))
    }
}

impl std::fmt::Display for Candidate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.start_marker())
    }
}

/// Terminal record of a won race. Written once, never mutated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: String,
    pub applicant_id: ApplicantId,
    pub confirmation_id: String,
    pub slot_date: NaiveDate,
    pub slot_time: NaiveTime,
    pub confirmed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveTime};

    use super::Candidate;

    #[test]
    fn start_marker_matches_upstream_wire_format() {
        let candidate = Candidate {
            date: NaiveDate::from_ymd_opt(2025, 12, 18).expect("valid date"),
            time: NaiveTime::from_hms_opt(9, 45, 0).expect("valid time"),
        };
        assert_eq!(candidate.start_marker(), "2025-12-18T09:45");
    }
}
