//! One alert cycle, end to end.
//!
//! [`Monitor`] owns every component a cycle needs and runs them in order:
//! sample, evaluate, aggregate, rate-limit, deliver, persist. It holds no
//! state of its own between cycles; the last-sent timestamp lives in the
//! [`StateStore`].

use anyhow::{Context, Result};
use hostwatch_adapters::process::ProcessTable;
use hostwatch_adapters::weather::WeatherClient;
use hostwatch_adapters::webhook::{Notifier, WebhookNotifier};
use hostwatch_types::{MetricKind, Notification, Sample};
use tracing::{debug, error, info, warn};

use crate::config::{DeliveryPolicy, Settings};
use crate::data::{aggregate, evaluate_all, Thresholds};
use crate::source::{ProcessSampler, ReportSource, Sampler, WeatherSampler};
use crate::state::{FileStateStore, MemoryStateStore, RateLimitState, RateLimiter, StateStore};

/// What a cycle ended up doing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CycleOutcome {
    /// Nothing crossed a threshold; no delivery was attempted.
    Quiet,
    /// Alerts were found but the cooldown has `remaining` seconds left.
    Suppressed { remaining: f64 },
    /// The notification was delivered.
    Delivered,
    /// Delivery failed. `persisted` tells whether the attempt was still
    /// recorded in the state store.
    DeliveryFailed { persisted: bool },
}

/// Runs alert cycles and weather reports.
///
/// # Example
///
/// ```no_run
/// use hostwatch::{Monitor, Settings};
///
/// # tokio_test::block_on(async {
/// let mut settings = Settings::default();
/// settings.webhook_url = "https://api.day.app/yourkey/".to_string();
///
/// let monitor = Monitor::from_settings(&settings)?;
/// let outcome = monitor.run_cycle(hostwatch::unix_now()).await;
/// println!("{:?}", outcome);
/// # Ok::<_, anyhow::Error>(())
/// # });
/// ```
#[derive(Debug)]
pub struct Monitor {
    samplers: Vec<Box<dyn Sampler>>,
    reporter: Option<Box<dyn ReportSource>>,
    thresholds: Thresholds,
    limiter: RateLimiter,
    store: Box<dyn StateStore>,
    notifier: Box<dyn Notifier>,
    title: String,
    report_title: String,
    policy: DeliveryPolicy,
}

impl Monitor {
    /// Create a builder. The notifier is the only required component.
    pub fn builder(notifier: impl Notifier + 'static) -> MonitorBuilder {
        MonitorBuilder::new(Box::new(notifier))
    }

    /// Wire up the production components described by `settings`,
    /// delivering to `webhook_url`.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let notifier = WebhookNotifier::builder(settings.webhook_url.clone())
            .timeout(settings.http_timeout())
            .build()
            .context("failed to build webhook notifier")?;

        Self::with_notifier(settings, notifier)
    }

    /// Like [`Monitor::from_settings`] but delivering through `notifier`.
    ///
    /// Memory and CPU are always sampled. Weather is sampled for alerts only
    /// when a weather threshold is set and regions are configured; reports
    /// are available whenever regions are configured.
    pub fn with_notifier(settings: &Settings, notifier: impl Notifier + 'static) -> Result<Self> {
        let table = ProcessTable::builder()
            .program(settings.ps_program.clone())
            .timeout(settings.command_timeout())
            .build();

        let mut builder = Monitor::builder(notifier)
            .sampler(ProcessSampler::new(table.clone(), MetricKind::MemoryPct))
            .sampler(ProcessSampler::new(table, MetricKind::CpuPct))
            .thresholds(settings.thresholds())
            .limiter(RateLimiter::new(settings.cooldown()))
            .store(FileStateStore::new(&settings.state_file))
            .title(settings.title.clone())
            .report_title(settings.report_title.clone())
            .delivery_policy(settings.delivery_policy);

        let regions = settings.unique_regions();
        if !regions.is_empty() {
            let client = WeatherClient::builder()
                .endpoint(settings.weather_endpoint.clone())
                .timeout(settings.http_timeout())
                .build()
                .context("failed to build weather client")?;
            let weather = WeatherSampler::new(client, regions);

            if settings.has_weather_thresholds() {
                builder = builder.sampler(weather.clone());
            }
            builder = builder.reporter(weather);
        }

        Ok(builder.build())
    }

    pub fn samplers(&self) -> impl Iterator<Item = &dyn Sampler> {
        self.samplers.iter().map(|s| s.as_ref())
    }

    pub fn has_reporter(&self) -> bool {
        self.reporter.is_some()
    }

    pub fn delivery_policy(&self) -> DeliveryPolicy {
        self.policy
    }

    /// Run one alert cycle at `now` (Unix seconds).
    ///
    /// A sampler that fails is logged and contributes nothing; the other
    /// samplers still run. Delivery and state errors are logged and reflected
    /// in the outcome, never returned.
    pub async fn run_cycle(&self, now: f64) -> CycleOutcome {
        let samples = self.collect().await;
        let batches = evaluate_all(&samples, &self.thresholds);

        let Some(notification) = aggregate(&self.title, &batches) else {
            debug!(samples = samples.len(), "no thresholds exceeded");
            return CycleOutcome::Quiet;
        };

        let state = RateLimitState::load(self.store.as_ref());
        if let Some(remaining) = self.limiter.remaining(now, &state) {
            info!(
                remaining_seconds = remaining.round() as i64,
                "alert suppressed by cooldown"
            );
            return CycleOutcome::Suppressed { remaining };
        }

        let lines: usize = batches.iter().map(|b| b.len()).sum();
        match self.notifier.deliver(&notification).await {
            Ok(()) => {
                info!(
                    notifier = self.notifier.description(),
                    lines,
                    "alert delivered"
                );
                self.persist(now);
                CycleOutcome::Delivered
            }
            Err(e) => {
                error!(
                    notifier = self.notifier.description(),
                    error = %e,
                    "alert delivery failed"
                );
                let persisted = match self.policy {
                    DeliveryPolicy::AlwaysPersist => self.persist(now),
                    DeliveryPolicy::OnSuccess => false,
                };
                CycleOutcome::DeliveryFailed { persisted }
            }
        }
    }

    /// Send one weather report covering every configured region.
    ///
    /// Reports are not rate limited and do not touch the state store.
    /// Regions that fail are left out; if all of them fail nothing is sent.
    pub async fn run_report(&self) -> CycleOutcome {
        let Some(reporter) = &self.reporter else {
            debug!("no regions configured, skipping weather report");
            return CycleOutcome::Quiet;
        };

        let sections: Vec<String> = reporter
            .reports()
            .await
            .into_iter()
            .filter_map(|(_, report)| report.map(|r| r.render()))
            .collect();

        if sections.is_empty() {
            warn!("no weather available for any region, skipping report");
            return CycleOutcome::Quiet;
        }

        let notification = Notification::new(self.report_title.clone(), sections.join("\n\n"));
        match self.notifier.deliver(&notification).await {
            Ok(()) => {
                info!(regions = sections.len(), "weather report delivered");
                CycleOutcome::Delivered
            }
            Err(e) => {
                error!(error = %e, "weather report delivery failed");
                CycleOutcome::DeliveryFailed { persisted: false }
            }
        }
    }

    async fn collect(&self) -> Vec<Sample> {
        let mut samples = Vec::new();
        for sampler in &self.samplers {
            match sampler.sample().await {
                Ok(batch) => {
                    debug!(
                        source = sampler.description(),
                        count = batch.len(),
                        "sampled"
                    );
                    samples.extend(batch);
                }
                Err(e) => {
                    warn!(source = sampler.description(), error = %e, "sampler failed, skipping");
                }
            }
        }
        samples
    }

    fn persist(&self, now: f64) -> bool {
        match self.limiter.record_send(now).save(self.store.as_ref()) {
            Ok(()) => true,
            Err(e) => {
                error!(store = self.store.description(), error = %e, "failed to persist rate-limit state");
                false
            }
        }
    }
}

/// Builder for [`Monitor`].
#[derive(Debug)]
pub struct MonitorBuilder {
    samplers: Vec<Box<dyn Sampler>>,
    reporter: Option<Box<dyn ReportSource>>,
    thresholds: Option<Thresholds>,
    limiter: Option<RateLimiter>,
    store: Option<Box<dyn StateStore>>,
    notifier: Box<dyn Notifier>,
    title: Option<String>,
    report_title: Option<String>,
    policy: DeliveryPolicy,
}

impl MonitorBuilder {
    fn new(notifier: Box<dyn Notifier>) -> Self {
        Self {
            samplers: Vec::new(),
            reporter: None,
            thresholds: None,
            limiter: None,
            store: None,
            notifier,
            title: None,
            report_title: None,
            policy: DeliveryPolicy::default(),
        }
    }

    /// Add a sampler. Samplers run in the order they were added.
    pub fn sampler(mut self, sampler: impl Sampler + 'static) -> Self {
        self.samplers.push(Box::new(sampler));
        self
    }

    /// Set the source of weather reports.
    pub fn reporter(mut self, reporter: impl ReportSource + 'static) -> Self {
        self.reporter = Some(Box::new(reporter));
        self
    }

    /// Set the thresholds (default: memory and CPU at 30%).
    pub fn thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = Some(thresholds);
        self
    }

    /// Set the rate limiter (default: 1200 second cooldown).
    pub fn limiter(mut self, limiter: RateLimiter) -> Self {
        self.limiter = Some(limiter);
        self
    }

    /// Set the state store (default: in memory).
    pub fn store(mut self, store: impl StateStore + 'static) -> Self {
        self.store = Some(Box::new(store));
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn report_title(mut self, title: impl Into<String>) -> Self {
        self.report_title = Some(title.into());
        self
    }

    pub fn delivery_policy(mut self, policy: DeliveryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn build(self) -> Monitor {
        let defaults = Settings::default();
        Monitor {
            samplers: self.samplers,
            reporter: self.reporter,
            thresholds: self.thresholds.unwrap_or_default(),
            limiter: self
                .limiter
                .unwrap_or_else(|| RateLimiter::new(defaults.cooldown())),
            store: self
                .store
                .unwrap_or_else(|| Box::new(MemoryStateStore::new())),
            notifier: self.notifier,
            title: self.title.unwrap_or(defaults.title),
            report_title: self.report_title.unwrap_or(defaults.report_title),
            policy: self.policy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use hostwatch_adapters::weather::parse_weather_reply;

    use crate::test_support::{
        hot_processes, BrokenSampler, FixedReports, FixedSampler, RecordingNotifier, SharedStore,
    };

    const NOW: f64 = 1_700_000_000.0;

    fn monitor(notifier: &RecordingNotifier, store: &SharedStore) -> MonitorBuilder {
        Monitor::builder(notifier.clone())
            .sampler(hot_processes())
            .store(store.clone())
            .title("P8 test server")
    }

    #[tokio::test]
    async fn delivers_single_alert_line() {
        let notifier = RecordingNotifier::default();
        let store = SharedStore::default();
        let monitor = monitor(&notifier, &store).build();

        assert_eq!(monitor.run_cycle(NOW).await, CycleOutcome::Delivered);

        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].title, "P8 test server");
        assert_eq!(
            sent[0].body,
            "Memory usage alert:\nProcess: x (PID: 1) memory usage: 45.2%\n"
        );
        assert_eq!(store.get_timestamp().unwrap(), Some(NOW));
    }

    #[tokio::test]
    async fn two_cycles_within_cooldown_deliver_once() {
        let notifier = RecordingNotifier::default();
        let store = SharedStore::default();
        let monitor = monitor(&notifier, &store).build();

        assert_eq!(monitor.run_cycle(NOW).await, CycleOutcome::Delivered);
        let second = monitor.run_cycle(NOW + 600.0).await;
        assert_eq!(second, CycleOutcome::Suppressed { remaining: 600.0 });

        assert_eq!(notifier.sent().len(), 1);
        assert_eq!(store.get_timestamp().unwrap(), Some(NOW));
    }

    #[tokio::test]
    async fn cooldown_boundaries() {
        let notifier = RecordingNotifier::default();
        let store = SharedStore::default();
        let monitor = monitor(&notifier, &store)
            .limiter(RateLimiter::new(Duration::from_secs(1200)))
            .build();

        store.set_timestamp(NOW - 1000.0).unwrap();
        assert!(matches!(
            monitor.run_cycle(NOW).await,
            CycleOutcome::Suppressed { .. }
        ));
        assert!(notifier.sent().is_empty());

        store.set_timestamp(NOW - 1300.0).unwrap();
        assert_eq!(monitor.run_cycle(NOW).await, CycleOutcome::Delivered);
        assert_eq!(store.get_timestamp().unwrap(), Some(NOW));
    }

    #[tokio::test]
    async fn quiet_cycle_does_not_deliver_or_touch_state() {
        let notifier = RecordingNotifier::default();
        let store = SharedStore::default();
        let monitor = Monitor::builder(notifier.clone())
            .sampler(FixedSampler(vec![Sample::new(
                "7",
                "idle",
                30.0,
                MetricKind::CpuPct,
            )]))
            .store(store.clone())
            .build();

        assert_eq!(monitor.run_cycle(NOW).await, CycleOutcome::Quiet);
        assert!(notifier.sent().is_empty());
        assert_eq!(store.get_timestamp().unwrap(), None);
    }

    #[tokio::test]
    async fn failing_sampler_is_skipped() {
        let notifier = RecordingNotifier::default();
        let store = SharedStore::default();
        let monitor = Monitor::builder(notifier.clone())
            .sampler(BrokenSampler)
            .sampler(hot_processes())
            .store(store.clone())
            .build();

        assert_eq!(monitor.run_cycle(NOW).await, CycleOutcome::Delivered);
        assert_eq!(notifier.sent().len(), 1);
    }

    #[tokio::test]
    async fn failed_delivery_always_persist() {
        let notifier = RecordingNotifier::failing();
        let store = SharedStore::default();
        let monitor = monitor(&notifier, &store).build();
        assert_eq!(monitor.delivery_policy(), DeliveryPolicy::AlwaysPersist);

        assert_eq!(
            monitor.run_cycle(NOW).await,
            CycleOutcome::DeliveryFailed { persisted: true }
        );
        assert_eq!(store.get_timestamp().unwrap(), Some(NOW));

        // the failed attempt still starts the cooldown
        assert!(matches!(
            monitor.run_cycle(NOW + 60.0).await,
            CycleOutcome::Suppressed { .. }
        ));
        assert_eq!(notifier.sent().len(), 1);
    }

    #[tokio::test]
    async fn failed_delivery_on_success_retries() {
        let notifier = RecordingNotifier::failing();
        let store = SharedStore::default();
        let monitor = monitor(&notifier, &store)
            .delivery_policy(DeliveryPolicy::OnSuccess)
            .build();

        assert_eq!(
            monitor.run_cycle(NOW).await,
            CycleOutcome::DeliveryFailed { persisted: false }
        );
        assert_eq!(store.get_timestamp().unwrap(), None);

        assert_eq!(
            monitor.run_cycle(NOW + 60.0).await,
            CycleOutcome::DeliveryFailed { persisted: false }
        );
        assert_eq!(notifier.sent().len(), 2);
    }

    #[tokio::test]
    async fn batches_follow_sampler_order() {
        let notifier = RecordingNotifier::default();
        let monitor = Monitor::builder(notifier.clone())
            .sampler(FixedSampler(vec![Sample::new(
                "9",
                "java",
                80.0,
                MetricKind::CpuPct,
            )]))
            .sampler(hot_processes())
            .build();

        monitor.run_cycle(NOW).await;
        let body = &notifier.sent()[0].body;
        let cpu = body.find("CPU usage alert:").unwrap();
        let memory = body.find("Memory usage alert:").unwrap();
        assert!(cpu < memory);
    }

    #[tokio::test]
    async fn report_joins_regions_and_skips_failures() {
        let notifier = RecordingNotifier::default();
        let store = SharedStore::default();
        let monitor = Monitor::builder(notifier.clone())
            .reporter(FixedReports(vec![
                (
                    "Chengdu".to_string(),
                    Some(parse_weather_reply("Chengdu", "+18°C,72%,↓7km/h,Light rain,0.4mm").unwrap()),
                ),
                ("Atlantis".to_string(), None),
                (
                    "Lhasa".to_string(),
                    Some(parse_weather_reply("Lhasa", "+5°C,20%,→12km/h,Sunny").unwrap()),
                ),
            ]))
            .store(store.clone())
            .report_title("Morning weather")
            .build();

        assert_eq!(monitor.run_report().await, CycleOutcome::Delivered);

        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].title, "Morning weather");
        let sections: Vec<&str> = sent[0].body.split("\n\n").collect();
        assert_eq!(sections.len(), 2);
        assert!(sections[0].starts_with("Region: Chengdu"));
        assert!(sections[1].starts_with("Region: Lhasa"));
        assert_eq!(store.get_timestamp().unwrap(), None);
    }

    #[tokio::test]
    async fn report_without_regions_is_quiet() {
        let notifier = RecordingNotifier::default();
        let monitor = Monitor::builder(notifier.clone()).build();
        assert!(!monitor.has_reporter());
        assert_eq!(monitor.run_report().await, CycleOutcome::Quiet);

        let monitor = Monitor::builder(notifier.clone())
            .reporter(FixedReports(vec![("Atlantis".to_string(), None)]))
            .build();
        assert_eq!(monitor.run_report().await, CycleOutcome::Quiet);
        assert!(notifier.sent().is_empty());
    }

    #[test]
    fn from_settings_wires_samplers() {
        let mut settings = Settings {
            webhook_url: "https://api.day.app/key/".to_string(),
            ..Settings::default()
        };
        let monitor = Monitor::from_settings(&settings).unwrap();
        assert_eq!(monitor.samplers().count(), 2);
        assert!(!monitor.has_reporter());

        settings.regions = vec!["Chengdu".to_string()];
        let monitor = Monitor::from_settings(&settings).unwrap();
        assert_eq!(monitor.samplers().count(), 2);
        assert!(monitor.has_reporter());

        settings.threshold_temperature = Some(35.0);
        let monitor = Monitor::from_settings(&settings).unwrap();
        let descriptions: Vec<&str> = monitor.samplers().map(|s| s.description()).collect();
        assert_eq!(descriptions.len(), 3);
        assert!(descriptions[2].starts_with("weather:"));
    }

    #[tokio::test]
    async fn with_notifier_uses_given_notifier() {
        let notifier = RecordingNotifier::default();
        let monitor = Monitor::with_notifier(&Settings::default(), notifier.clone()).unwrap();
        assert_eq!(monitor.samplers().count(), 2);
        assert_eq!(monitor.run_report().await, CycleOutcome::Quiet);
        assert!(notifier.sent().is_empty());
    }

    #[test]
    fn from_settings_rejects_empty_webhook() {
        assert!(Monitor::from_settings(&Settings::default()).is_err());
    }
}
