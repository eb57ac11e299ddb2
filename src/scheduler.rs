//! Continuous mode: when to run alert cycles and weather reports.
//!
//! Two cadences are checked on every poll tick:
//!
//! - [`IntervalCadence`]: alert cycles, every `alert_interval_seconds`
//! - [`WallClockCadence`]: weather reports, at fixed local hours
//!
//! Each cadence keeps its own record of when it last fired, so one never
//! delays the other.

use std::collections::BTreeSet;
use std::time::Duration;

use chrono::{DateTime, FixedOffset, NaiveDate, Timelike, Utc};
use tokio::sync::watch;
use tracing::{debug, info};

use crate::config::Settings;
use crate::pipeline::{CycleOutcome, Monitor};

/// Seconds since the Unix epoch, with millisecond precision.
pub fn unix_seconds(time: DateTime<Utc>) -> f64 {
    time.timestamp_millis() as f64 / 1000.0
}

/// The current time in Unix seconds.
pub fn unix_now() -> f64 {
    unix_seconds(Utc::now())
}

/// Fires when at least `interval` has passed since it last fired.
#[derive(Debug, Clone)]
pub struct IntervalCadence {
    interval: Duration,
    last_fired: Option<DateTime<Utc>>,
}

impl IntervalCadence {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_fired: None,
        }
    }

    /// Due on first use, once `interval` has elapsed, or if the clock moved
    /// backwards past the last firing.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        match self.last_fired {
            None => true,
            Some(last) => match (now - last).to_std() {
                Ok(elapsed) => elapsed >= self.interval,
                Err(_) => true,
            },
        }
    }

    pub fn mark_fired(&mut self, now: DateTime<Utc>) {
        self.last_fired = Some(now);
    }
}

/// Fires once during each configured hour of the day, in a fixed UTC offset.
#[derive(Debug, Clone)]
pub struct WallClockCadence {
    hours: BTreeSet<u32>,
    offset: FixedOffset,
    last_slot: Option<(NaiveDate, u32)>,
}

impl WallClockCadence {
    pub fn new(hours: impl IntoIterator<Item = u32>, offset: FixedOffset) -> Self {
        Self {
            hours: hours.into_iter().collect(),
            offset,
            last_slot: None,
        }
    }

    pub fn hours(&self) -> impl Iterator<Item = u32> + '_ {
        self.hours.iter().copied()
    }

    fn slot(&self, now: DateTime<Utc>) -> (NaiveDate, u32) {
        let local = now.with_timezone(&self.offset);
        (local.date_naive(), local.hour())
    }

    /// Due when the local hour is a configured one and this hour slot has
    /// not fired yet.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        let slot = self.slot(now);
        self.hours.contains(&slot.1) && self.last_slot != Some(slot)
    }

    pub fn mark_fired(&mut self, now: DateTime<Utc>) {
        self.last_slot = Some(self.slot(now));
    }
}

/// What a tick ran, if anything.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Tick {
    pub alert: Option<CycleOutcome>,
    pub report: Option<CycleOutcome>,
}

/// Drives a [`Monitor`] until told to stop.
#[derive(Debug)]
pub struct Scheduler {
    monitor: Monitor,
    poll_interval: Duration,
    alerts: IntervalCadence,
    reports: Option<WallClockCadence>,
}

impl Scheduler {
    pub fn new(
        monitor: Monitor,
        poll_interval: Duration,
        alerts: IntervalCadence,
        reports: Option<WallClockCadence>,
    ) -> Self {
        Self {
            monitor,
            poll_interval,
            alerts,
            reports,
        }
    }

    /// Build the cadences from `settings`. Reports are scheduled only when
    /// the monitor has regions to report on and report hours are set.
    pub fn from_settings(monitor: Monitor, settings: &Settings) -> Self {
        let reports = (monitor.has_reporter() && !settings.report_hours.is_empty()).then(|| {
            WallClockCadence::new(settings.report_hours.iter().copied(), settings.utc_offset())
        });

        Self::new(
            monitor,
            settings.poll_interval(),
            IntervalCadence::new(settings.alert_interval()),
            reports,
        )
    }

    pub fn monitor(&self) -> &Monitor {
        &self.monitor
    }

    /// Run whatever is due at `now`.
    pub async fn tick(&mut self, now: DateTime<Utc>) -> Tick {
        let mut tick = Tick::default();

        if self.alerts.is_due(now) {
            debug!("alert cadence fired");
            tick.alert = Some(self.monitor.run_cycle(unix_seconds(now)).await);
            self.alerts.mark_fired(now);
        }

        if let Some(reports) = self.reports.as_mut() {
            if reports.is_due(now) {
                info!("report cadence fired");
                tick.report = Some(self.monitor.run_report().await);
                reports.mark_fired(now);
            }
        }

        tick
    }

    /// Tick every poll interval until `shutdown` turns true.
    ///
    /// The flag is only looked at between ticks, so a cycle that has started
    /// always finishes, including its state write.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!(
            poll_seconds = self.poll_interval.as_secs(),
            reports = self.reports.is_some(),
            "scheduler started"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            self.tick(Utc::now()).await;

            tokio::select! {
                _ = tokio::time::sleep(self.poll_interval) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        info!("scheduler stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    use crate::test_support::{hot_processes, FixedReports, RecordingNotifier};
    use hostwatch_adapters::weather::parse_weather_reply;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    fn beijing() -> FixedOffset {
        FixedOffset::east_opt(8 * 3600).unwrap()
    }

    #[test]
    fn test_unix_seconds() {
        assert_eq!(unix_seconds(at(2023, 11, 14, 22, 13, 20)), 1_700_000_000.0);
        let t = at(2023, 11, 14, 22, 13, 20) + chrono::Duration::milliseconds(250);
        assert_eq!(unix_seconds(t), 1_700_000_000.25);
    }

    #[test]
    fn test_interval_cadence() {
        let mut cadence = IntervalCadence::new(Duration::from_secs(3600));
        let start = at(2024, 3, 1, 10, 0, 0);
        assert!(cadence.is_due(start));

        cadence.mark_fired(start);
        assert!(!cadence.is_due(start));
        assert!(!cadence.is_due(start + chrono::Duration::seconds(3599)));
        assert!(cadence.is_due(start + chrono::Duration::seconds(3600)));
    }

    #[test]
    fn test_interval_cadence_clock_backwards() {
        let mut cadence = IntervalCadence::new(Duration::from_secs(3600));
        let start = at(2024, 3, 1, 10, 0, 0);
        cadence.mark_fired(start);
        assert!(cadence.is_due(start - chrono::Duration::seconds(1)));
    }

    #[test]
    fn test_wall_clock_cadence_local_hours() {
        let mut cadence = WallClockCadence::new([6, 12, 18], beijing());

        // 22:00 UTC is 06:00 the next day at +8
        let morning = at(2024, 1, 1, 22, 0, 30);
        assert!(cadence.is_due(morning));
        cadence.mark_fired(morning);

        // same slot
        assert!(!cadence.is_due(at(2024, 1, 1, 22, 1, 30)));
        assert!(!cadence.is_due(at(2024, 1, 1, 22, 59, 59)));
        // 07:00 local is not a report hour
        assert!(!cadence.is_due(at(2024, 1, 1, 23, 0, 0)));
        // 12:00 local
        assert!(cadence.is_due(at(2024, 1, 2, 4, 0, 0)));
        // 06:00 local the following day
        assert!(cadence.is_due(at(2024, 1, 2, 22, 0, 0)));
    }

    #[test]
    fn test_wall_clock_adjacent_hours() {
        let mut cadence = WallClockCadence::new([6, 7], FixedOffset::east_opt(0).unwrap());
        let six = at(2024, 1, 1, 6, 59, 0);
        cadence.mark_fired(six);
        assert!(cadence.is_due(at(2024, 1, 1, 7, 0, 10)));
        assert_eq!(cadence.hours().collect::<Vec<_>>(), vec![6, 7]);
    }

    fn report_monitor(notifier: &RecordingNotifier) -> Monitor {
        Monitor::builder(notifier.clone())
            .sampler(hot_processes())
            .reporter(FixedReports(vec![(
                "Chengdu".to_string(),
                Some(parse_weather_reply("Chengdu", "+18°C,72%,↓7km/h,Light rain").unwrap()),
            )]))
            .build()
    }

    #[tokio::test]
    async fn tick_runs_each_cadence_independently() {
        let notifier = RecordingNotifier::default();
        let mut scheduler = Scheduler::new(
            report_monitor(&notifier),
            Duration::from_secs(60),
            IntervalCadence::new(Duration::from_secs(3600)),
            Some(WallClockCadence::new([6], beijing())),
        );

        // 05:59 local: alert only
        let tick = scheduler.tick(at(2024, 1, 1, 21, 59, 0)).await;
        assert_eq!(tick.alert, Some(CycleOutcome::Delivered));
        assert_eq!(tick.report, None);

        // 06:00 local: report only, alert cadence not yet due
        let tick = scheduler.tick(at(2024, 1, 1, 22, 0, 0)).await;
        assert_eq!(tick.alert, None);
        assert_eq!(tick.report, Some(CycleOutcome::Delivered));

        // 06:01 local: nothing
        assert_eq!(scheduler.tick(at(2024, 1, 1, 22, 1, 0)).await, Tick::default());

        let sent = notifier.sent();
        assert_eq!(sent.len(), 2);
        assert!(sent[0].body.starts_with("Memory usage alert:"));
        assert!(sent[1].body.starts_with("Region: Chengdu"));
    }

    #[tokio::test]
    async fn alert_cadence_respects_cooldown() {
        let notifier = RecordingNotifier::default();
        let mut scheduler = Scheduler::new(
            report_monitor(&notifier),
            Duration::from_secs(60),
            IntervalCadence::new(Duration::from_secs(600)),
            None,
        );

        let start = at(2024, 1, 1, 0, 0, 0);
        let first = scheduler.tick(start).await;
        assert_eq!(first.alert, Some(CycleOutcome::Delivered));

        // cadence due again after 600s but the 1200s cooldown still holds
        let second = scheduler.tick(start + chrono::Duration::seconds(600)).await;
        assert!(matches!(second.alert, Some(CycleOutcome::Suppressed { .. })));

        let third = scheduler.tick(start + chrono::Duration::seconds(1800)).await;
        assert_eq!(third.alert, Some(CycleOutcome::Delivered));
        assert_eq!(notifier.sent().len(), 2);
    }

    #[test]
    fn from_settings_skips_reports_without_regions() {
        let notifier = RecordingNotifier::default();
        let settings = Settings::default();

        let scheduler = Scheduler::from_settings(Monitor::builder(notifier.clone()).build(), &settings);
        assert!(scheduler.reports.is_none());
        assert_eq!(scheduler.poll_interval, Duration::from_secs(60));

        let scheduler = Scheduler::from_settings(report_monitor(&notifier), &settings);
        let hours: Vec<u32> = scheduler.reports.as_ref().unwrap().hours().collect();
        assert_eq!(hours, vec![6, 12, 18]);
    }

    #[tokio::test]
    async fn run_stops_when_already_shut_down() {
        let notifier = RecordingNotifier::default();
        let scheduler = Scheduler::new(
            report_monitor(&notifier),
            Duration::from_secs(60),
            IntervalCadence::new(Duration::from_secs(3600)),
            None,
        );

        let (tx, rx) = watch::channel(true);
        scheduler.run(rx).await;
        drop(tx);
        assert!(notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn run_finishes_cycle_then_stops() {
        let notifier = RecordingNotifier::default();
        let scheduler = Scheduler::new(
            report_monitor(&notifier),
            Duration::from_secs(3600),
            IntervalCadence::new(Duration::from_secs(3600)),
            None,
        );

        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(scheduler.run(rx));

        // first tick runs immediately; wait for its delivery
        for _ in 0..200 {
            if !notifier.sent().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        tx.send(true).unwrap();

        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(notifier.sent().len(), 1);
    }
}
