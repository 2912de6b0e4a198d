use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime, Utc};
use tokio::task::JoinSet;
use tracing::{error, info, warn};
use uuid::Uuid;

use slotrace_core::booking::{AttemptOutcome, BookingStrategy, SlotDirectory};
use slotrace_core::catalog::CandidateCatalog;
use slotrace_core::domain::applicant::{ApplicantId, Profile};
use slotrace_core::domain::slot::{AvailabilityEvent, Candidate, Reservation};
use slotrace_core::errors::ApplicationError;
use slotrace_core::payload::{AppointmentTemplate, ServiceTarget};
use slotrace_db::repositories::{ProfileStore, QueueStore, ReservationStore};
use slotrace_notify::Notifier;

use crate::poller::AvailabilityHandler;

/// Result of one acquisition cycle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Confirmed { confirmation_id: String, date: NaiveDate, time: NaiveTime },
    NoSlot,
    NoApplicant,
    Error(String),
}

#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Per-candidate budget; a request still in flight past this deadline
    /// counts as not confirmed.
    pub attempt_timeout: Duration,
    /// Operator channel for empty-queue alerts, reconciliation flags, and
    /// heartbeats.
    pub operator_chat_id: Option<String>,
    /// Public booking page offered to applicants who must book manually.
    pub booking_page_url: Option<String>,
}

/// Converts one availability event into at most one confirmed reservation
/// for the head of the queue.
///
/// The engine is the only writer of queue state during a cycle and leaves
/// no entry in `processing` when it returns: every exit path lands the
/// dequeued applicant in `booked`, back in `waiting`, or `abandoned`.
pub struct AcquisitionEngine {
    queue: Arc<dyn QueueStore>,
    profiles: Arc<dyn ProfileStore>,
    reservations: Arc<dyn ReservationStore>,
    strategy: Arc<dyn BookingStrategy>,
    directory: Arc<dyn SlotDirectory>,
    notifier: Arc<dyn Notifier>,
    catalog: CandidateCatalog,
    target: ServiceTarget,
    config: EngineConfig,
    // One applicant is in flight at a time, so a single slot suffices.
    template_cache: Mutex<Option<(ApplicantId, Arc<AppointmentTemplate>)>>,
}

impl AcquisitionEngine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        queue: Arc<dyn QueueStore>,
        profiles: Arc<dyn ProfileStore>,
        reservations: Arc<dyn ReservationStore>,
        strategy: Arc<dyn BookingStrategy>,
        directory: Arc<dyn SlotDirectory>,
        notifier: Arc<dyn Notifier>,
        catalog: CandidateCatalog,
        target: ServiceTarget,
        config: EngineConfig,
    ) -> Self {
        Self {
            queue,
            profiles,
            reservations,
            strategy,
            directory,
            notifier,
            catalog,
            target,
            config,
            template_cache: Mutex::new(None),
        }
    }

    /// Run one acquisition cycle. Never panics and never propagates: every
    /// failure folds into an [`Outcome`].
    pub async fn acquire(&self, event: &AvailabilityEvent) -> Outcome {
        match self.run_cycle(event).await {
            Ok(outcome) => outcome,
            Err(application_error) => {
                error!(
                    event_name = "engine.cycle.error",
                    error = %application_error,
                    "acquisition cycle failed"
                );
                Outcome::Error(application_error.to_string())
            }
        }
    }

    async fn run_cycle(&self, event: &AvailabilityEvent) -> Result<Outcome, ApplicationError> {
        let Some(date) = event.first_date() else {
            return Ok(Outcome::NoSlot);
        };

        let Some(applicant_id) = self.queue.dequeue_head().await.map_err(persistence)? else {
            warn!(
                event_name = "engine.queue.empty",
                date = %date,
                "availability detected but the queue is empty"
            );
            self.alert_operator(&format!(
                "Availability detected for {date} but nobody is waiting in the queue."
            ))
            .await;
            return Ok(Outcome::NoApplicant);
        };

        info!(
            event_name = "engine.cycle.start",
            applicant_id = %applicant_id,
            date = %date,
            "acquisition cycle started"
        );

        let result = self.run_for_applicant(&applicant_id, date).await;
        if result.is_err() {
            // Never leave the entry stuck in `processing`.
            if let Err(rollback_error) = self.queue.return_to_waiting(&applicant_id).await {
                error!(
                    event_name = "engine.rollback.failed",
                    applicant_id = %applicant_id,
                    error = %rollback_error,
                    "could not return applicant to the queue after a failed cycle"
                );
            }
        }
        result
    }

    async fn run_for_applicant(
        &self,
        applicant_id: &ApplicantId,
        date: NaiveDate,
    ) -> Result<Outcome, ApplicationError> {
        let Some(profile) = self.profiles.get(applicant_id).await.map_err(persistence)? else {
            error!(
                event_name = "engine.profile.missing",
                applicant_id = %applicant_id,
                "dequeued applicant has no profile; abandoning entry"
            );
            self.queue.mark_abandoned(applicant_id).await.map_err(persistence)?;
            self.alert_operator(&format!(
                "Applicant {applicant_id} reached the head of the queue without a profile \
                 and was abandoned."
            ))
            .await;
            return Ok(Outcome::Error(format!("no profile registered for {applicant_id}")));
        };

        let template = self.template_for(applicant_id, &profile);
        let candidates = self.catalog.candidates_for(date);

        let mut winner = self.race(&template, &candidates).await;
        if winner.is_none() {
            winner = self.fallback(&template, date).await;
        }

        match winner {
            Some((candidate, confirmation_id)) => {
                self.commit_win(applicant_id, &profile, candidate, confirmation_id).await
            }
            None => {
                self.queue.return_to_waiting(applicant_id).await.map_err(persistence)?;
                info!(
                    event_name = "engine.cycle.no_slot",
                    applicant_id = %applicant_id,
                    date = %date,
                    "no slot secured; applicant returned to the queue head"
                );
                self.send(&applicant_id.0, &manual_fallback_text(&profile, &self.config)).await;
                Ok(Outcome::NoSlot)
            }
        }
    }

    /// Blind fan-out: one attempt per candidate, all concurrent, first
    /// confirmation wins by completion order. Losers are not cancelled;
    /// their results are drained and discarded so a late duplicate
    /// confirmation can be flagged instead of silently lost.
    async fn race(
        &self,
        template: &AppointmentTemplate,
        candidates: &[Candidate],
    ) -> Option<(Candidate, String)> {
        let mut attempts = JoinSet::new();
        for candidate in candidates {
            let request = template.render(*candidate);
            let strategy = self.strategy.clone();
            let timeout = self.config.attempt_timeout;
            attempts.spawn(async move {
                let candidate = request.candidate;
                let outcome = match tokio::time::timeout(timeout, strategy.attempt(&request)).await
                {
                    Ok(outcome) => outcome,
                    Err(_) => AttemptOutcome::TransportError {
                        message: format!("attempt timed out after {}ms", timeout.as_millis()),
                    },
                };
                (candidate, outcome)
            });
        }

        let mut winner: Option<(Candidate, String)> = None;
        while let Some(joined) = attempts.join_next().await {
            // A panicked attempt counts as not confirmed.
            let Ok((candidate, outcome)) = joined else {
                continue;
            };
            let Some(confirmation_id) = outcome.confirmation_id() else {
                continue;
            };

            if winner.is_none() {
                info!(
                    event_name = "engine.race.won",
                    candidate = %candidate,
                    confirmation_id,
                    "first positive confirmation"
                );
                winner = Some((candidate, confirmation_id.to_string()));
            } else {
                warn!(
                    event_name = "engine.race.duplicate_confirmation",
                    candidate = %candidate,
                    confirmation_id,
                    "second positive confirmation in one cycle; flagging for reconciliation"
                );
                self.alert_operator(&format!(
                    "Duplicate confirmation {confirmation_id} for {candidate} was discarded; \
                     the upstream may hold a second real booking that needs manual cancellation."
                ))
                .await;
            }
        }

        winner
    }

    /// Ask the upstream which times are actually free and make exactly one
    /// attempt against the first reported slot.
    async fn fallback(
        &self,
        template: &AppointmentTemplate,
        date: NaiveDate,
    ) -> Option<(Candidate, String)> {
        let times = match self.directory.open_times(date).await {
            Ok(times) => times,
            Err(upstream_error) => {
                warn!(
                    event_name = "engine.fallback.read_failed",
                    date = %date,
                    error = %upstream_error,
                    "could not list open times"
                );
                return None;
            }
        };

        let first = *times.first()?;
        let candidate = Candidate { date, time: first };
        let request = template.render(candidate);

        let outcome =
            match tokio::time::timeout(self.config.attempt_timeout, self.strategy.attempt(&request))
                .await
            {
                Ok(outcome) => outcome,
                Err(_) => return None,
            };

        outcome.confirmation_id().map(|confirmation_id| {
            info!(
                event_name = "engine.fallback.won",
                candidate = %candidate,
                confirmation_id,
                "fallback attempt confirmed"
            );
            (candidate, confirmation_id.to_string())
        })
    }

    async fn commit_win(
        &self,
        applicant_id: &ApplicantId,
        profile: &Profile,
        candidate: Candidate,
        confirmation_id: String,
    ) -> Result<Outcome, ApplicationError> {
        // Compare-and-swap gate: only the first committer may book. A lost
        // swap means another cycle (or process) already owns this entry.
        let booked = self.queue.mark_booked(applicant_id).await.map_err(persistence)?;
        if !booked {
            warn!(
                event_name = "engine.commit.gate_closed",
                applicant_id = %applicant_id,
                confirmation_id,
                "booking gate already closed; confirmation discarded"
            );
            self.alert_operator(&format!(
                "Confirmation {confirmation_id} for {applicant_id} arrived after their entry \
                 left `processing`; check the upstream for a duplicate booking."
            ))
            .await;
            return Ok(Outcome::Error("booking gate already closed".to_string()));
        }

        let reservation = Reservation {
            id: format!("RES-{}", Uuid::new_v4().simple()),
            applicant_id: applicant_id.clone(),
            confirmation_id: confirmation_id.clone(),
            slot_date: candidate.date,
            slot_time: candidate.time,
            confirmed_at: Utc::now(),
        };
        self.reservations.insert(&reservation).await.map_err(persistence)?;

        info!(
            event_name = "engine.cycle.confirmed",
            applicant_id = %applicant_id,
            candidate = %candidate,
            confirmation_id,
            "reservation confirmed"
        );
        self.send(&applicant_id.0, &confirmation_text(profile, &reservation)).await;

        Ok(Outcome::Confirmed {
            confirmation_id,
            date: candidate.date,
            time: candidate.time,
        })
    }

    fn template_for(&self, applicant_id: &ApplicantId, profile: &Profile) -> Arc<AppointmentTemplate> {
        let mut cache = self.template_cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some((cached_id, template)) = cache.as_ref() {
            if cached_id == applicant_id {
                return template.clone();
            }
        }
        let template = Arc::new(AppointmentTemplate::new(&self.target, profile));
        *cache = Some((applicant_id.clone(), template.clone()));
        template
    }

    async fn alert_operator(&self, text: &str) {
        if let Some(operator) = &self.config.operator_chat_id {
            self.send(operator, text).await;
        }
    }

    async fn send(&self, recipient: &str, text: &str) {
        if let Err(notify_error) = self.notifier.notify(recipient, text).await {
            warn!(
                event_name = "engine.notify.failed",
                recipient,
                error = %notify_error,
                "notification failed"
            );
        }
    }
}

#[async_trait]
impl AvailabilityHandler for AcquisitionEngine {
    async fn on_availability(&self, event: AvailabilityEvent) {
        let _outcome = self.acquire(&event).await;
    }
}

fn persistence(repository_error: slotrace_db::RepositoryError) -> ApplicationError {
    ApplicationError::Persistence(repository_error.to_string())
}

fn confirmation_text(profile: &Profile, reservation: &Reservation) -> String {
    format!(
        "Appointment confirmed for {}.\n\
         Date: {}\n\
         Time: {}\n\
         Confirmation number: {}",
        profile.full_name(),
        reservation.slot_date.format("%Y-%m-%d"),
        reservation.slot_time.format("%H:%M"),
        reservation.confirmation_id,
    )
}

fn manual_fallback_text(profile: &Profile, config: &EngineConfig) -> String {
    let mut text = format!(
        "A slot opened but could not be secured automatically. \
         You are still at the head of the queue.\n\n\
         Your registered data for a manual attempt:\n\
         Name: {}\n\
         Document: {}\n\
         Email: {}\n\
         Phone: {}",
        profile.full_name(),
        profile.document,
        profile.email,
        profile.phone,
    );
    if let Some(url) = &config.booking_page_url {
        text.push_str(&format!("\n\nBooking page: {url}"));
    }
    text
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use chrono::{NaiveDate, NaiveTime, Utc};

    use slotrace_core::booking::{
        AttemptOutcome, BookingStrategy, SlotDirectory, UpstreamError,
    };
    use slotrace_core::catalog::CandidateCatalog;
    use slotrace_core::domain::applicant::{ApplicantId, Profile};
    use slotrace_core::domain::queue::QueuePosition;
    use slotrace_core::domain::slot::AvailabilityEvent;
    use slotrace_core::payload::{BookingRequest, ServiceTarget};
    use slotrace_db::repositories::{
        InMemoryProfileStore, InMemoryQueueStore, InMemoryReservationStore, ProfileStore,
        QueueStore,
    };
    use slotrace_notify::RecordingNotifier;

    use super::{AcquisitionEngine, EngineConfig, Outcome};

    fn t(text: &str) -> NaiveTime {
        NaiveTime::parse_from_str(text, "%H:%M").expect("valid time literal")
    }

    fn d(text: &str) -> NaiveDate {
        NaiveDate::parse_from_str(text, "%Y-%m-%d").expect("valid date literal")
    }

    fn applicant(id: &str) -> ApplicantId {
        ApplicantId(id.to_string())
    }

    fn profile(name: &str) -> Profile {
        Profile {
            given_name: name.to_string(),
            family_name: "Tester".to_string(),
            document: "X1234567L".to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            phone: "+34600111222".to_string(),
        }
    }

    fn event(date: &str) -> AvailabilityEvent {
        AvailabilityEvent { dates: vec![d(date)], detected_at: Utc::now() }
    }

    /// Strategy double: confirms requests whose `start` is in the allow
    /// list, rejects everything else, and counts attempts.
    struct ScriptedStrategy {
        confirm_starts: Vec<(String, String)>,
        attempts: AtomicUsize,
    }

    impl ScriptedStrategy {
        fn rejecting_all() -> Self {
            Self { confirm_starts: Vec::new(), attempts: AtomicUsize::new(0) }
        }

        fn confirming(starts: &[(&str, &str)]) -> Self {
            Self {
                confirm_starts: starts
                    .iter()
                    .map(|(start, id)| (start.to_string(), id.to_string()))
                    .collect(),
                attempts: AtomicUsize::new(0),
            }
        }

        fn attempts(&self) -> usize {
            self.attempts.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl BookingStrategy for ScriptedStrategy {
        async fn attempt(&self, request: &BookingRequest) -> AttemptOutcome {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            let start = request.candidate.start_marker();
            match self.confirm_starts.iter().find(|(s, _)| *s == start) {
                Some((_, id)) => AttemptOutcome::Confirmed { confirmation_id: id.clone() },
                None => AttemptOutcome::Rejected { reason: "upstream status 404".to_string() },
            }
        }
    }

    struct ScriptedDirectory {
        times: Result<Vec<NaiveTime>, UpstreamError>,
        reads: AtomicUsize,
    }

    impl ScriptedDirectory {
        fn with_times(times: Vec<NaiveTime>) -> Self {
            Self { times: Ok(times), reads: AtomicUsize::new(0) }
        }

        fn empty() -> Self {
            Self::with_times(Vec::new())
        }

        fn reads(&self) -> usize {
            self.reads.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SlotDirectory for ScriptedDirectory {
        async fn open_times(&self, _date: NaiveDate) -> Result<Vec<NaiveTime>, UpstreamError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.times.clone()
        }
    }

    struct Fixture {
        queue: Arc<InMemoryQueueStore>,
        profiles: Arc<InMemoryProfileStore>,
        reservations: Arc<InMemoryReservationStore>,
        strategy: Arc<ScriptedStrategy>,
        directory: Arc<ScriptedDirectory>,
        notifier: Arc<RecordingNotifier>,
        engine: AcquisitionEngine,
    }

    fn fixture(strategy: ScriptedStrategy, directory: ScriptedDirectory) -> Fixture {
        let queue = Arc::new(InMemoryQueueStore::new());
        let profiles = Arc::new(InMemoryProfileStore::new());
        let reservations = Arc::new(InMemoryReservationStore::new());
        let strategy = Arc::new(strategy);
        let directory = Arc::new(directory);
        let notifier = Arc::new(RecordingNotifier::new());

        let catalog = CandidateCatalog::build(t("08:00"), t("14:00"), 5, t("10:00"))
            .expect("valid catalog");
        let target = ServiceTarget {
            service_id: "svc-1".to_string(),
            branch_id: "branch-1".to_string(),
            slot_length: 10,
        };
        let config = EngineConfig {
            attempt_timeout: Duration::from_millis(500),
            operator_chat_id: Some("operator".to_string()),
            booking_page_url: Some("https://booking.example.test/".to_string()),
        };

        let engine = AcquisitionEngine::new(
            queue.clone(),
            profiles.clone(),
            reservations.clone(),
            strategy.clone(),
            directory.clone(),
            notifier.clone(),
            catalog,
            target,
            config,
        );

        Fixture { queue, profiles, reservations, strategy, directory, notifier, engine }
    }

    async fn register(fixture: &Fixture, id: &str) {
        fixture
            .profiles
            .upsert(&applicant(id), &profile(id))
            .await
            .expect("profile upsert");
        fixture.queue.enqueue(&applicant(id)).await.expect("enqueue");
    }

    #[tokio::test]
    async fn single_confirmation_books_the_head_and_keeps_the_next_in_line() {
        let fixture = fixture(
            ScriptedStrategy::confirming(&[("2025-12-18T09:45", "CONF123")]),
            ScriptedDirectory::empty(),
        );
        register(&fixture, "A").await;
        register(&fixture, "B").await;

        let outcome = fixture.engine.acquire(&event("2025-12-18")).await;

        assert_eq!(
            outcome,
            Outcome::Confirmed {
                confirmation_id: "CONF123".to_string(),
                date: d("2025-12-18"),
                time: t("09:45"),
            }
        );
        assert_eq!(
            fixture.queue.position(&applicant("A")).await.expect("position"),
            QueuePosition::Booked
        );
        assert_eq!(
            fixture.queue.position(&applicant("B")).await.expect("position"),
            QueuePosition::Waiting(1),
            "the next applicant must be head of queue for the next event"
        );

        let reservations = fixture.reservations.all();
        assert_eq!(reservations.len(), 1);
        assert_eq!(reservations[0].confirmation_id, "CONF123");
        assert_eq!(reservations[0].applicant_id, applicant("A"));

        // 72 blind attempts, no fallback read.
        assert_eq!(fixture.strategy.attempts(), 72);
        assert_eq!(fixture.directory.reads(), 0);

        let messages = fixture.notifier.messages();
        assert!(messages
            .iter()
            .any(|(recipient, text)| recipient == "A" && text.contains("CONF123")));
    }

    #[tokio::test]
    async fn empty_queue_aborts_without_issuing_attempts() {
        let fixture =
            fixture(ScriptedStrategy::rejecting_all(), ScriptedDirectory::empty());

        let outcome = fixture.engine.acquire(&event("2025-12-19")).await;

        assert_eq!(outcome, Outcome::NoApplicant);
        assert_eq!(fixture.strategy.attempts(), 0);
        assert_eq!(fixture.directory.reads(), 0);

        let messages = fixture.notifier.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].0, "operator");
        assert!(messages[0].1.contains("queue is empty"));
    }

    #[tokio::test]
    async fn all_attempts_failing_with_empty_fallback_returns_the_applicant_to_waiting() {
        let fixture =
            fixture(ScriptedStrategy::rejecting_all(), ScriptedDirectory::empty());
        register(&fixture, "A").await;

        let outcome = fixture.engine.acquire(&event("2025-12-18")).await;

        assert_eq!(outcome, Outcome::NoSlot);
        assert_eq!(fixture.strategy.attempts(), 72);
        assert_eq!(fixture.directory.reads(), 1);
        assert!(fixture.reservations.all().is_empty());

        // Chosen no-slot policy: back to waiting, same place in line.
        assert_eq!(
            fixture.queue.position(&applicant("A")).await.expect("position"),
            QueuePosition::Waiting(1)
        );

        // The applicant gets their data for a manual attempt.
        let messages = fixture.notifier.messages();
        let manual = messages
            .iter()
            .find(|(recipient, _)| recipient == "A")
            .expect("manual-fallback notification");
        assert!(manual.1.contains("X1234567L"));
        assert!(manual.1.contains("https://booking.example.test/"));
    }

    #[tokio::test]
    async fn fallback_books_a_directory_slot_when_every_guess_misses() {
        // 14:30 is outside the catalog's operating hours, so only the
        // fallback attempt can hit it.
        let fixture = fixture(
            ScriptedStrategy::confirming(&[("2025-12-18T14:30", "CONF987")]),
            ScriptedDirectory::with_times(vec![t("14:30"), t("15:00")]),
        );
        register(&fixture, "A").await;

        let outcome = fixture.engine.acquire(&event("2025-12-18")).await;

        assert_eq!(
            outcome,
            Outcome::Confirmed {
                confirmation_id: "CONF987".to_string(),
                date: d("2025-12-18"),
                time: t("14:30"),
            }
        );
        // 72 blind attempts plus exactly one fallback attempt.
        assert_eq!(fixture.strategy.attempts(), 73);
        assert_eq!(fixture.directory.reads(), 1);
    }

    #[tokio::test]
    async fn duplicate_confirmations_yield_exactly_one_reservation() {
        let fixture = fixture(
            ScriptedStrategy::confirming(&[
                ("2025-12-18T10:00", "CONF-A"),
                ("2025-12-18T09:55", "CONF-B"),
            ]),
            ScriptedDirectory::empty(),
        );
        register(&fixture, "A").await;

        let outcome = fixture.engine.acquire(&event("2025-12-18")).await;

        assert!(matches!(outcome, Outcome::Confirmed { .. }));
        assert_eq!(fixture.reservations.all().len(), 1, "at most one reservation per cycle");
        assert_eq!(
            fixture.queue.position(&applicant("A")).await.expect("position"),
            QueuePosition::Booked
        );

        // The losing confirmation is flagged for manual reconciliation.
        let messages = fixture.notifier.messages();
        assert!(messages
            .iter()
            .any(|(recipient, text)| recipient == "operator"
                && text.contains("Duplicate confirmation")));
    }

    #[tokio::test]
    async fn missing_profile_abandons_the_entry_and_alerts_the_operator() {
        let fixture =
            fixture(ScriptedStrategy::rejecting_all(), ScriptedDirectory::empty());
        // Enqueued but never registered a profile.
        fixture.queue.enqueue(&applicant("A")).await.expect("enqueue");

        let outcome = fixture.engine.acquire(&event("2025-12-18")).await;

        assert!(matches!(outcome, Outcome::Error(_)));
        assert_eq!(fixture.strategy.attempts(), 0);
        assert_eq!(
            fixture.queue.position(&applicant("A")).await.expect("position"),
            QueuePosition::Abandoned
        );

        let messages = fixture.notifier.messages();
        assert!(messages
            .iter()
            .any(|(recipient, text)| recipient == "operator" && text.contains("without a profile")));
    }

    #[tokio::test]
    async fn dequeued_entry_is_never_left_in_processing() {
        let fixture =
            fixture(ScriptedStrategy::rejecting_all(), ScriptedDirectory::empty());
        register(&fixture, "A").await;

        fixture.engine.acquire(&event("2025-12-18")).await;

        let entry = fixture
            .queue
            .entry(&applicant("A"))
            .await
            .expect("entry query")
            .expect("entry exists");
        assert_ne!(
            entry.status,
            slotrace_core::domain::queue::QueueStatus::Processing,
            "cycle must not end with an ambiguous status"
        );
    }
}
