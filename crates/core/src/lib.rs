pub mod booking;
pub mod catalog;
pub mod config;
pub mod domain;
pub mod errors;
pub mod payload;
pub mod schedule;

pub use booking::{
    AttemptOutcome, AvailabilitySource, BookingStrategy, SlotDirectory, StrategyKind,
    UpstreamError,
};
pub use catalog::CandidateCatalog;
pub use domain::applicant::{ApplicantId, Profile};
pub use domain::queue::{QueueEntry, QueuePosition, QueueStatus};
pub use domain::slot::{AvailabilityEvent, Candidate, Reservation};
pub use errors::{ApplicationError, DomainError};
pub use payload::{AppointmentTemplate, BookingRequest, ServiceTarget};
pub use schedule::{PollBand, PollSchedule};

pub use chrono;
