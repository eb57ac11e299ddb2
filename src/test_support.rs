//! In-process stand-ins for samplers, notifiers and stores.

use std::sync::Arc;

use async_trait::async_trait;
use hostwatch_adapters::weather::WeatherReport;
use hostwatch_adapters::webhook::Notifier;
use hostwatch_adapters::AdapterError;
use hostwatch_types::{MetricKind, Notification, Sample};
use parking_lot::Mutex;

use crate::source::{ReportSource, Sampler};
use crate::state::{MemoryStateStore, StateError, StateStore};

#[derive(Debug)]
pub struct FixedSampler(pub Vec<Sample>);

#[async_trait]
impl Sampler for FixedSampler {
    async fn sample(&self) -> Result<Vec<Sample>, AdapterError> {
        Ok(self.0.clone())
    }

    fn description(&self) -> &str {
        "fixed"
    }
}

#[derive(Debug)]
pub struct BrokenSampler;

#[async_trait]
impl Sampler for BrokenSampler {
    async fn sample(&self) -> Result<Vec<Sample>, AdapterError> {
        Err(AdapterError::SourceUnavailable("ps exited with 1".to_string()))
    }

    fn description(&self) -> &str {
        "broken"
    }
}

#[derive(Debug)]
pub struct FixedReports(pub Vec<(String, Option<WeatherReport>)>);

#[async_trait]
impl ReportSource for FixedReports {
    async fn reports(&self) -> Vec<(String, Option<WeatherReport>)> {
        self.0.clone()
    }
}

/// Records every notification it is asked to deliver.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<Notification>>>,
    fail: bool,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn deliver(&self, notification: &Notification) -> Result<(), AdapterError> {
        self.sent.lock().push(notification.clone());
        if self.fail {
            Err(AdapterError::Connection("refused".to_string()))
        } else {
            Ok(())
        }
    }

    fn description(&self) -> &str {
        "recording"
    }
}

/// A memory store the test keeps a handle to after moving a clone into a
/// monitor.
#[derive(Debug, Clone, Default)]
pub struct SharedStore(Arc<MemoryStateStore>);

impl StateStore for SharedStore {
    fn get_timestamp(&self) -> Result<Option<f64>, StateError> {
        self.0.get_timestamp()
    }

    fn set_timestamp(&self, timestamp: f64) -> Result<(), StateError> {
        self.0.set_timestamp(timestamp)
    }

    fn description(&self) -> &str {
        "shared"
    }
}

/// One process above the default threshold and one below it.
pub fn hot_processes() -> FixedSampler {
    FixedSampler(vec![
        Sample::new("1", "x", 45.2, MetricKind::MemoryPct),
        Sample::new("2", "y", 10.0, MetricKind::MemoryPct),
    ])
}
