//! Adaptive poll interval policy.
//!
//! The upstream releases capacity inside a known daily window, so the
//! poller runs a small set of named time-of-day bands: a high-frequency
//! band across the release window, a pre-window ramp in the minutes before
//! it opens, and a low-frequency default for the rest of the day. Band
//! selection is a pure function of wall-clock time and is re-evaluated on
//! every loop iteration.

use std::time::Duration;

use chrono::NaiveTime;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PollBand {
    Release,
    PreWindow,
    Default,
}

impl PollBand {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Release => "release-window",
            Self::PreWindow => "pre-window",
            Self::Default => "default",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PollSchedule {
    window_start: NaiveTime,
    window_end: NaiveTime,
    prewindow_start: NaiveTime,
    release_interval: Duration,
    prewindow_interval: Duration,
    default_interval: Duration,
}

impl PollSchedule {
    pub fn new(
        window_start: NaiveTime,
        window_end: NaiveTime,
        prewindow_lead_minutes: u32,
        release_interval: Duration,
        prewindow_interval: Duration,
        default_interval: Duration,
    ) -> Self {
        let lead = chrono::Duration::minutes(i64::from(prewindow_lead_minutes));
        let prewindow_start = window_start.overflowing_sub_signed(lead).0;
        Self {
            window_start,
            window_end,
            prewindow_start,
            release_interval,
            prewindow_interval,
            default_interval,
        }
    }

    pub fn band_at(&self, time: NaiveTime) -> PollBand {
        if self.window_start <= time && time < self.window_end {
            return PollBand::Release;
        }
        if self.in_prewindow(time) {
            return PollBand::PreWindow;
        }
        PollBand::Default
    }

    /// Pure: identical inputs always yield identical intervals.
    pub fn interval_at(&self, time: NaiveTime) -> Duration {
        match self.band_at(time) {
            PollBand::Release => self.release_interval,
            PollBand::PreWindow => self.prewindow_interval,
            PollBand::Default => self.default_interval,
        }
    }

    fn in_prewindow(&self, time: NaiveTime) -> bool {
        if self.prewindow_start <= self.window_start {
            self.prewindow_start <= time && time < self.window_start
        } else {
            // Lead crosses midnight.
            time >= self.prewindow_start || time < self.window_start
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::NaiveTime;

    use super::{PollBand, PollSchedule};

    fn t(text: &str) -> NaiveTime {
        NaiveTime::parse_from_str(text, "%H:%M").expect("valid time literal")
    }

    fn schedule() -> PollSchedule {
        PollSchedule::new(
            t("12:00"),
            t("14:00"),
            5,
            Duration::from_millis(300),
            Duration::from_millis(1_000),
            Duration::from_secs(30),
        )
    }

    #[test]
    fn bands_cover_the_day_as_configured() {
        let schedule = schedule();
        assert_eq!(schedule.band_at(t("03:00")), PollBand::Default);
        assert_eq!(schedule.band_at(t("11:54")), PollBand::Default);
        assert_eq!(schedule.band_at(t("11:55")), PollBand::PreWindow);
        assert_eq!(schedule.band_at(t("11:59")), PollBand::PreWindow);
        assert_eq!(schedule.band_at(t("12:00")), PollBand::Release);
        assert_eq!(schedule.band_at(t("13:59")), PollBand::Release);
        assert_eq!(schedule.band_at(t("14:00")), PollBand::Default);
    }

    #[test]
    fn interval_selection_is_pure() {
        let schedule = schedule();
        let sample = t("12:30");
        assert_eq!(schedule.interval_at(sample), schedule.interval_at(sample));
        assert_eq!(schedule.interval_at(sample), Duration::from_millis(300));
        assert_eq!(schedule.interval_at(t("11:57")), Duration::from_millis(1_000));
        assert_eq!(schedule.interval_at(t("09:00")), Duration::from_secs(30));
    }

    #[test]
    fn prewindow_lead_may_cross_midnight() {
        let schedule = PollSchedule::new(
            t("00:02"),
            t("02:00"),
            5,
            Duration::from_millis(300),
            Duration::from_millis(1_000),
            Duration::from_secs(30),
        );
        assert_eq!(schedule.band_at(t("23:58")), PollBand::PreWindow);
        assert_eq!(schedule.band_at(t("00:01")), PollBand::PreWindow);
        assert_eq!(schedule.band_at(t("00:02")), PollBand::Release);
        assert_eq!(schedule.band_at(t("12:00")), PollBand::Default);
    }
}
