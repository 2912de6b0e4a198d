use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use slotrace_core::booking::AvailabilitySource;
use slotrace_core::domain::slot::AvailabilityEvent;
use slotrace_core::schedule::PollSchedule;

/// Receives availability the instant it is detected. The poller awaits the
/// handler to completion before it sleeps again, so two consecutive
/// detections can never race each other into the queue.
#[async_trait]
pub trait AvailabilityHandler: Send + Sync {
    async fn on_availability(&self, event: AvailabilityEvent);
}

/// Loop counters, exposed for the status endpoint and the daily heartbeat.
/// Diagnostic only; counters restart with the process.
#[derive(Default)]
pub struct PollerStats {
    checks: AtomicU64,
    failures: AtomicU64,
    detections: AtomicU64,
    last_check: Mutex<Option<DateTime<Utc>>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub checks: u64,
    pub failures: u64,
    pub detections: u64,
    pub last_check: Option<DateTime<Utc>>,
}

impl PollerStats {
    fn record_check(&self, failed: bool) {
        self.checks.fetch_add(1, Ordering::Relaxed);
        if failed {
            self.failures.fetch_add(1, Ordering::Relaxed);
        }
        *self.last_check.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) =
            Some(Utc::now());
    }

    fn record_detection(&self) {
        self.detections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            checks: self.checks.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            detections: self.detections.load(Ordering::Relaxed),
            last_check: *self
                .last_check
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner()),
        }
    }
}

/// Long-lived loop that watches the upstream scheduler for open dates.
///
/// Individual check failures never terminate the loop; only the shutdown
/// signal does. Poll iterations are strictly sequential: iteration N+1 does
/// not begin until iteration N, including any triggered acquisition cycle,
/// has completed.
pub struct AvailabilityPoller {
    source: Arc<dyn AvailabilitySource>,
    handler: Arc<dyn AvailabilityHandler>,
    schedule: PollSchedule,
    stats: Arc<PollerStats>,
}

impl AvailabilityPoller {
    pub fn new(
        source: Arc<dyn AvailabilitySource>,
        handler: Arc<dyn AvailabilityHandler>,
        schedule: PollSchedule,
    ) -> Self {
        Self { source, handler, schedule, stats: Arc::new(PollerStats::default()) }
    }

    pub fn stats(&self) -> Arc<PollerStats> {
        self.stats.clone()
    }

    /// One read of the upstream open-dates listing. Failures are folded
    /// into "no availability" so the loop survives them.
    pub async fn check_availability(&self) -> Vec<chrono::NaiveDate> {
        match self.source.open_dates().await {
            Ok(dates) => {
                self.stats.record_check(false);
                let snapshot = self.stats.snapshot();
                if dates.is_empty() && snapshot.checks % 100 == 0 {
                    debug!(
                        event_name = "poller.check.progress",
                        checks = snapshot.checks,
                        failures = snapshot.failures,
                        "no availability"
                    );
                }
                dates
            }
            Err(upstream_error) => {
                self.stats.record_check(true);
                error!(
                    event_name = "poller.check.failed",
                    error = %upstream_error,
                    "availability check failed; loop continues"
                );
                Vec::new()
            }
        }
    }

    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(event_name = "poller.started", "availability poller started");
        let mut current_band = None;

        loop {
            if *shutdown.borrow() {
                break;
            }

            let band = self.schedule.band_at(Local::now().time());
            if current_band != Some(band) {
                info!(
                    event_name = "poller.band.changed",
                    band = band.label(),
                    interval_ms = self.schedule.interval_at(Local::now().time()).as_millis() as u64,
                    "poll band changed"
                );
                current_band = Some(band);
            }

            let dates = self.check_availability().await;
            if !dates.is_empty() {
                self.stats.record_detection();
                warn!(
                    event_name = "poller.availability.detected",
                    dates = ?dates,
                    "availability detected"
                );
                let event = AvailabilityEvent { dates, detected_at: Utc::now() };
                // Synchronous hand-off: the acquisition cycle owns the loop
                // until it returns.
                self.handler.on_availability(event).await;
            }

            let interval = self.schedule.interval_at(Local::now().time());
            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!(event_name = "poller.stopped", "availability poller stopped");
    }
}
