use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local, NaiveTime};
use tokio::sync::watch;
use tracing::{info, warn};

use slotrace_notify::Notifier;

use crate::poller::PollerStats;

const RETRY_DELAY: Duration = Duration::from_secs(3_600);

/// Once a day, tell the operator channel the monitor is still alive and how
/// hard it has been working. Silence is the only failure mode a 24/7
/// watcher cannot report itself, so the heartbeat is the operator's proof
/// of life.
pub struct DailyHeartbeat {
    notifier: Arc<dyn Notifier>,
    operator_chat_id: Option<String>,
    hour: u8,
    stats: Arc<PollerStats>,
}

impl DailyHeartbeat {
    pub fn new(
        notifier: Arc<dyn Notifier>,
        operator_chat_id: Option<String>,
        hour: u8,
        stats: Arc<PollerStats>,
    ) -> Self {
        Self { notifier, operator_chat_id, hour, stats }
    }

    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let Some(operator) = self.operator_chat_id.clone() else {
            // Nobody to notify; nothing to do.
            return;
        };

        loop {
            let delay = next_delay(Local::now(), self.hour).unwrap_or(RETRY_DELAY);
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        return;
                    }
                    continue;
                }
            }

            let snapshot = self.stats.snapshot();
            let text = format!(
                "Daily heartbeat: monitor alive.\n\
                 Checks: {}\n\
                 Failures: {}\n\
                 Detections: {}",
                snapshot.checks, snapshot.failures, snapshot.detections,
            );

            match self.notifier.notify(&operator, &text).await {
                Ok(()) => info!(event_name = "heartbeat.sent", "daily heartbeat sent"),
                Err(notify_error) => {
                    warn!(
                        event_name = "heartbeat.failed",
                        error = %notify_error,
                        "daily heartbeat failed; retrying on the next tick"
                    );
                    tokio::select! {
                        _ = tokio::time::sleep(RETRY_DELAY) => {}
                        _ = shutdown.changed() => {
                            if *shutdown.borrow() {
                                return;
                            }
                        }
                    }
                }
            }
        }
    }
}

/// Time until the next daily occurrence of `hour:00` local time.
fn next_delay(now: DateTime<Local>, hour: u8) -> Option<Duration> {
    let target_time = NaiveTime::from_hms_opt(u32::from(hour), 0, 0)?;
    let mut target = now.date_naive().and_time(target_time);
    if now.naive_local() >= target {
        target = target.checked_add_signed(chrono::Duration::days(1))?;
    }

    let delay = target - now.naive_local();
    delay.to_std().ok()
}
