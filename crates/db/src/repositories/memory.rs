//! In-memory store implementations for tests and dry runs. Same contracts
//! as the SQL stores, including the compare-and-swap semantics of
//! `dequeue_head` and `mark_booked`.

use std::collections::HashMap;
use std::sync::Mutex;

use slotrace_core::chrono::Utc;
use slotrace_core::domain::applicant::{ApplicantId, Profile};
use slotrace_core::domain::queue::{QueueEntry, QueuePosition, QueueStatus};
use slotrace_core::domain::slot::Reservation;

use super::{ProfileStore, QueueStore, RepositoryError, ReservationStore};

#[derive(Default)]
pub struct InMemoryQueueStore {
    state: Mutex<QueueState>,
}

#[derive(Default)]
struct QueueState {
    // Entries keep insertion order; seq breaks enqueued_at ties the way
    // rowid does in the SQL store.
    entries: Vec<(u64, QueueEntry)>,
    next_seq: u64,
}

impl InMemoryQueueStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait::async_trait]
impl QueueStore for InMemoryQueueStore {
    async fn enqueue(&self, applicant_id: &ApplicantId) -> Result<QueuePosition, RepositoryError> {
        let mut state = self.lock();

        if state.entries.iter().all(|(_, entry)| entry.applicant_id != *applicant_id) {
            let seq = state.next_seq;
            state.next_seq += 1;
            state.entries.push((seq, QueueEntry::new(applicant_id.clone(), Utc::now())));
        }

        Ok(position_of(&state, applicant_id))
    }

    async fn dequeue_head(&self) -> Result<Option<ApplicantId>, RepositoryError> {
        let mut state = self.lock();

        let head = state
            .entries
            .iter_mut()
            .filter(|(_, entry)| entry.status == QueueStatus::Waiting)
            .min_by_key(|(seq, entry)| (entry.enqueued_at, *seq));

        Ok(head.and_then(|(_, entry)| {
            entry
                .transition(QueueStatus::Processing, Utc::now())
                .ok()
                .map(|()| entry.applicant_id.clone())
        }))
    }

    async fn mark_booked(&self, applicant_id: &ApplicantId) -> Result<bool, RepositoryError> {
        Ok(swap_status(&mut self.lock(), applicant_id, &[QueueStatus::Processing], QueueStatus::Booked))
    }

    async fn return_to_waiting(
        &self,
        applicant_id: &ApplicantId,
    ) -> Result<bool, RepositoryError> {
        Ok(swap_status(
            &mut self.lock(),
            applicant_id,
            &[QueueStatus::Processing],
            QueueStatus::Waiting,
        ))
    }

    async fn mark_abandoned(&self, applicant_id: &ApplicantId) -> Result<bool, RepositoryError> {
        Ok(swap_status(
            &mut self.lock(),
            applicant_id,
            &[QueueStatus::Waiting, QueueStatus::Processing],
            QueueStatus::Abandoned,
        ))
    }

    async fn remove(&self, applicant_id: &ApplicantId) -> Result<bool, RepositoryError> {
        let mut state = self.lock();
        let before = state.entries.len();
        state.entries.retain(|(_, entry)| entry.applicant_id != *applicant_id);
        Ok(state.entries.len() < before)
    }

    async fn position(
        &self,
        applicant_id: &ApplicantId,
    ) -> Result<QueuePosition, RepositoryError> {
        Ok(position_of(&self.lock(), applicant_id))
    }

    async fn entry(
        &self,
        applicant_id: &ApplicantId,
    ) -> Result<Option<QueueEntry>, RepositoryError> {
        Ok(self
            .lock()
            .entries
            .iter()
            .find(|(_, entry)| entry.applicant_id == *applicant_id)
            .map(|(_, entry)| entry.clone()))
    }

    async fn waiting(&self) -> Result<Vec<QueueEntry>, RepositoryError> {
        let state = self.lock();
        let mut waiting: Vec<_> = state
            .entries
            .iter()
            .filter(|(_, entry)| entry.status == QueueStatus::Waiting)
            .map(|(seq, entry)| (*seq, entry.clone()))
            .collect();
        waiting.sort_by_key(|(seq, entry)| (entry.enqueued_at, *seq));
        Ok(waiting.into_iter().map(|(_, entry)| entry).collect())
    }

    async fn depth(&self) -> Result<u64, RepositoryError> {
        Ok(self
            .lock()
            .entries
            .iter()
            .filter(|(_, entry)| entry.status == QueueStatus::Waiting)
            .count() as u64)
    }
}

fn swap_status(
    state: &mut QueueState,
    applicant_id: &ApplicantId,
    from: &[QueueStatus],
    to: QueueStatus,
) -> bool {
    let Some((_, entry)) = state
        .entries
        .iter_mut()
        .find(|(_, entry)| entry.applicant_id == *applicant_id && from.contains(&entry.status))
    else {
        return false;
    };
    entry.transition(to, Utc::now()).is_ok()
}

fn position_of(state: &QueueState, applicant_id: &ApplicantId) -> QueuePosition {
    let Some((seq, entry)) =
        state.entries.iter().find(|(_, entry)| entry.applicant_id == *applicant_id)
    else {
        return QueuePosition::Absent;
    };

    match entry.status {
        QueueStatus::Waiting => {
            let rank = state
                .entries
                .iter()
                .filter(|(other_seq, other)| {
                    other.status == QueueStatus::Waiting
                        && (other.enqueued_at, *other_seq) <= (entry.enqueued_at, *seq)
                })
                .count() as u32;
            QueuePosition::Waiting(rank)
        }
        QueueStatus::Processing => QueuePosition::Processing,
        QueueStatus::Booked => QueuePosition::Booked,
        QueueStatus::Abandoned => QueuePosition::Abandoned,
    }
}

#[derive(Default)]
pub struct InMemoryProfileStore {
    profiles: Mutex<HashMap<String, Profile>>,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn upsert(
        &self,
        applicant_id: &ApplicantId,
        profile: &Profile,
    ) -> Result<(), RepositoryError> {
        self.profiles
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(applicant_id.0.clone(), profile.clone());
        Ok(())
    }

    async fn get(&self, applicant_id: &ApplicantId) -> Result<Option<Profile>, RepositoryError> {
        Ok(self
            .profiles
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(&applicant_id.0)
            .cloned())
    }
}

#[derive(Default)]
pub struct InMemoryReservationStore {
    reservations: Mutex<Vec<Reservation>>,
}

impl InMemoryReservationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> Vec<Reservation> {
        self.reservations.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).clone()
    }
}

#[async_trait::async_trait]
impl ReservationStore for InMemoryReservationStore {
    async fn insert(&self, reservation: &Reservation) -> Result<(), RepositoryError> {
        let mut reservations =
            self.reservations.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if reservations.iter().any(|existing| existing.id == reservation.id) {
            return Err(RepositoryError::Decode(format!(
                "duplicate reservation id `{}`",
                reservation.id
            )));
        }
        reservations.push(reservation.clone());
        Ok(())
    }

    async fn find_for_applicant(
        &self,
        applicant_id: &ApplicantId,
    ) -> Result<Vec<Reservation>, RepositoryError> {
        Ok(self
            .reservations
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .filter(|reservation| reservation.applicant_id == *applicant_id)
            .cloned()
            .collect())
    }
}
