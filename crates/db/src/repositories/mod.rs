use async_trait::async_trait;
use thiserror::Error;

use slotrace_core::domain::applicant::{ApplicantId, Profile};
use slotrace_core::domain::queue::{QueueEntry, QueuePosition};
use slotrace_core::domain::slot::Reservation;

pub mod memory;
pub mod profile;
pub mod queue;
pub mod reservation;

pub use memory::{InMemoryProfileStore, InMemoryQueueStore, InMemoryReservationStore};
pub use profile::SqlProfileStore;
pub use queue::SqlQueueStore;
pub use reservation::SqlReservationStore;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

/// FIFO admission list with persisted position.
///
/// `dequeue_head` and `mark_booked` are compare-and-swap operations: they
/// must stay atomic under concurrent callers even though only one
/// acquisition cycle runs per process, because nothing structurally
/// prevents a second process instance from sharing the database.
#[async_trait]
pub trait QueueStore: Send + Sync {
    /// Add an applicant to the back of the queue. Re-enqueueing an existing
    /// applicant is a no-op that reports their current position.
    async fn enqueue(&self, applicant_id: &ApplicantId) -> Result<QueuePosition, RepositoryError>;

    /// Atomically claim the head of the queue for an acquisition cycle
    /// (`waiting` -> `processing`). Empty queue yields `None`.
    async fn dequeue_head(&self) -> Result<Option<ApplicantId>, RepositoryError>;

    /// Atomically commit a win (`processing` -> `booked`). Returns whether
    /// this call performed the transition; `false` means another result
    /// already closed the gate.
    async fn mark_booked(&self, applicant_id: &ApplicantId) -> Result<bool, RepositoryError>;

    /// Roll a cycle back (`processing` -> `waiting`); the applicant keeps
    /// their original enqueue timestamp and therefore their place in line.
    async fn return_to_waiting(&self, applicant_id: &ApplicantId)
        -> Result<bool, RepositoryError>;

    /// Terminal removal without a booking (`waiting`/`processing` ->
    /// `abandoned`).
    async fn mark_abandoned(&self, applicant_id: &ApplicantId) -> Result<bool, RepositoryError>;

    /// Drop the entry entirely (user-initiated cancel).
    async fn remove(&self, applicant_id: &ApplicantId) -> Result<bool, RepositoryError>;

    async fn position(&self, applicant_id: &ApplicantId)
        -> Result<QueuePosition, RepositoryError>;

    async fn entry(&self, applicant_id: &ApplicantId)
        -> Result<Option<QueueEntry>, RepositoryError>;

    /// Waiting entries in FIFO order.
    async fn waiting(&self) -> Result<Vec<QueueEntry>, RepositoryError>;

    /// Number of waiting entries.
    async fn depth(&self) -> Result<u64, RepositoryError>;
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn upsert(
        &self,
        applicant_id: &ApplicantId,
        profile: &Profile,
    ) -> Result<(), RepositoryError>;

    async fn get(&self, applicant_id: &ApplicantId) -> Result<Option<Profile>, RepositoryError>;
}

#[async_trait]
pub trait ReservationStore: Send + Sync {
    async fn insert(&self, reservation: &Reservation) -> Result<(), RepositoryError>;

    async fn find_for_applicant(
        &self,
        applicant_id: &ApplicantId,
    ) -> Result<Vec<Reservation>, RepositoryError>;
}
