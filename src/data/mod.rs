//! Threshold evaluation and alert aggregation.
//!
//! This module turns the raw samples of one cycle into at most one
//! notification.
//!
//! ## Submodules
//!
//! - [`evaluate`]: Filters samples against per-kind [`Thresholds`]
//! - [`aggregate`]: Folds alert batches into a single [`Notification`]
//!
//! ## Data Flow
//!
//! ```text
//! Vec<Sample> (one cycle)
//!        │
//!        ▼
//! evaluate_all(samples, thresholds)
//!        │
//!        ▼
//! Vec<AlertBatch> (one per metric kind, source order)
//!        │
//!        ▼
//! aggregate(title, batches) ──▶ Option<Notification>
//! ```
//!
//! [`Notification`]: hostwatch_types::Notification

pub mod aggregate;
pub mod evaluate;

pub use aggregate::aggregate;
pub use evaluate::{evaluate, evaluate_all};

use hostwatch_types::MetricKind;

/// Alert thresholds, one per metric kind.
///
/// A sample alerts when its value is strictly greater than the threshold for
/// its kind. Weather kinds are optional; a kind without a threshold is never
/// evaluated.
#[derive(Debug, Clone, PartialEq)]
pub struct Thresholds {
    /// Memory usage percentage.
    pub memory: f64,
    /// CPU usage percentage.
    pub cpu: f64,
    /// Temperature in °C.
    pub temperature: Option<f64>,
    /// Precipitation in millimetres.
    pub precipitation: Option<f64>,
    /// Precipitation probability as a fraction (0.5 = 50%).
    pub precipitation_chance: Option<f64>,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            memory: 30.0,
            cpu: 30.0,
            temperature: None,
            precipitation: None,
            precipitation_chance: None,
        }
    }
}

impl Thresholds {
    /// The threshold for `kind`, if one is configured.
    pub fn for_kind(&self, kind: MetricKind) -> Option<f64> {
        match kind {
            MetricKind::MemoryPct => Some(self.memory),
            MetricKind::CpuPct => Some(self.cpu),
            MetricKind::Temperature => self.temperature,
            MetricKind::Precipitation => self.precipitation,
            MetricKind::PrecipitationChance => self.precipitation_chance,
        }
    }
}
