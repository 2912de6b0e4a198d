//! Candidate slot catalog.
//!
//! The upstream scheduler never announces which times inside a released
//! date are bookable, so the engine guesses: every slot boundary across
//! the service's operating hours is a candidate. Release priority is
//! empirical -- mid-morning slots appear first -- so candidates are ordered
//! by distance from a configured priority center rather than chronologically.

use chrono::{Duration, NaiveDate, NaiveTime};

use crate::domain::slot::Candidate;
use crate::errors::DomainError;

/// Pre-computed, priority-ordered list of candidate times for one
/// service/branch pair. Built once at engine construction and reused for
/// every availability event; only the date varies at send time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CandidateCatalog {
    times: Vec<NaiveTime>,
}

impl CandidateCatalog {
    pub fn build(
        day_opens: NaiveTime,
        day_closes: NaiveTime,
        granularity_minutes: u32,
        priority_center: NaiveTime,
    ) -> Result<Self, DomainError> {
        if granularity_minutes == 0 {
            return Err(DomainError::InvariantViolation(
                "catalog granularity must be at least one minute".to_string(),
            ));
        }
        if day_opens >= day_closes {
            return Err(DomainError::InvariantViolation(format!(
                "operating hours are empty: opens {day_opens}, closes {day_closes}"
            )));
        }

        let step = Duration::minutes(i64::from(granularity_minutes));
        let mut times = Vec::new();
        let mut cursor = day_opens;
        while cursor < day_closes {
            times.push(cursor);
            let (next, wrapped) = cursor.overflowing_add_signed(step);
            if wrapped != 0 {
                break;
            }
            cursor = next;
        }

        // Stable order: closest to the priority center first, earlier time
        // breaking ties. Deterministic for identical inputs.
        times.sort_by_key(|time| (distance_minutes(*time, priority_center), *time));

        Ok(Self { times })
    }

    pub fn times(&self) -> &[NaiveTime] {
        &self.times
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn candidates_for(&self, date: NaiveDate) -> Vec<Candidate> {
        self.times.iter().map(|time| Candidate { date, time: *time }).collect()
    }
}

fn distance_minutes(a: NaiveTime, b: NaiveTime) -> i64 {
    (a - b).num_minutes().abs()
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveTime};

    use super::CandidateCatalog;

    fn t(text: &str) -> NaiveTime {
        NaiveTime::parse_from_str(text, "%H:%M").expect("valid time literal")
    }

    fn default_catalog() -> CandidateCatalog {
        CandidateCatalog::build(t("08:00"), t("14:00"), 5, t("10:00")).expect("valid catalog")
    }

    #[test]
    fn six_operating_hours_at_five_minutes_yield_72_candidates() {
        assert_eq!(default_catalog().len(), 72);
    }

    #[test]
    fn generation_is_deterministic_for_identical_inputs() {
        let date = NaiveDate::from_ymd_opt(2025, 12, 18).expect("valid date");
        let first = default_catalog().candidates_for(date);
        let second = default_catalog().candidates_for(date);
        assert_eq!(first, second);
    }

    #[test]
    fn priority_center_is_probed_first_with_earlier_tiebreak() {
        let times = default_catalog().times().to_vec();
        assert_eq!(times[0], t("10:00"));
        assert_eq!(times[1], t("09:55"));
        assert_eq!(times[2], t("10:05"));
        assert_eq!(times[3], t("09:50"));
        // Boundary slots are probed last.
        assert_eq!(*times.last().expect("non-empty"), t("08:00"));
    }

    #[test]
    fn every_slot_boundary_appears_exactly_once() {
        let mut times = default_catalog().times().to_vec();
        times.sort();
        times.dedup();
        assert_eq!(times.len(), 72);
        assert_eq!(times[0], t("08:00"));
        assert_eq!(times[71], t("13:55"));
    }

    #[test]
    fn empty_operating_hours_are_rejected() {
        assert!(CandidateCatalog::build(t("14:00"), t("08:00"), 5, t("10:00")).is_err());
        assert!(CandidateCatalog::build(t("08:00"), t("14:00"), 0, t("10:00")).is_err());
    }
}
