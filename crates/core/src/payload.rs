//! Appointment request templating.
//!
//! Under time pressure every millisecond between detection and the first
//! POST matters, so the request body is rendered once per applicant and
//! cached; at send time only the `start` field is substituted. The template
//! itself is shared read-only across the fan-out -- each attempt derives its
//! own copy and never mutates the original.

use serde_json::{json, Value};

use crate::domain::applicant::Profile;
use crate::domain::slot::Candidate;

/// Fixed service/branch coordinates of the upstream scheduler.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceTarget {
    pub service_id: String,
    pub branch_id: String,
    pub slot_length: u32,
}

/// Pre-rendered appointment body for one applicant, complete except for the
/// `start` marker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppointmentTemplate {
    base: Value,
}

impl AppointmentTemplate {
    pub fn new(target: &ServiceTarget, profile: &Profile) -> Self {
        Self {
            base: json!({
                "services": [{ "publicId": target.service_id }],
                "branch": { "publicId": target.branch_id },
                "customer": {
                    "firstName": profile.given_name,
                    "lastName": profile.family_name,
                    "email": profile.email,
                    "phone": profile.phone,
                    "identificationNumber": profile.document,
                },
                "customSlotLength": target.slot_length,
            }),
        }
    }

    /// Derive a complete request for one candidate slot.
    pub fn render(&self, candidate: Candidate) -> BookingRequest {
        let mut body = self.base.clone();
        body["start"] = Value::String(candidate.start_marker());
        BookingRequest { candidate, body }
    }
}

/// One booking attempt: the guessed slot plus its ready-to-send JSON body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BookingRequest {
    pub candidate: Candidate,
    pub body: Value,
}
