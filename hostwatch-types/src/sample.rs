//! Samples - one metric reading for one entity in one cycle.

use std::fmt;

/// The kind of metric a [`Sample`] carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum MetricKind {
    /// Resident memory as a percentage of physical memory.
    MemoryPct,
    /// CPU utilisation percentage.
    CpuPct,
    /// Air temperature in degrees Celsius.
    Temperature,
    /// Absolute precipitation in millimetres.
    Precipitation,
    /// Probability of precipitation as a fraction in `0.0..=1.0`.
    PrecipitationChance,
}

impl MetricKind {
    /// Heading used for this kind's section of a notification body.
    pub fn heading(&self) -> &'static str {
        match self {
            MetricKind::MemoryPct => "Memory usage alert:",
            MetricKind::CpuPct => "CPU usage alert:",
            MetricKind::Temperature => "Temperature alert:",
            MetricKind::Precipitation => "Precipitation alert:",
            MetricKind::PrecipitationChance => "Precipitation chance alert:",
        }
    }

    /// Whether samples of this kind describe a process (as opposed to a region).
    pub fn is_process_metric(&self) -> bool {
        matches!(self, MetricKind::MemoryPct | MetricKind::CpuPct)
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MetricKind::MemoryPct => "memory",
            MetricKind::CpuPct => "cpu",
            MetricKind::Temperature => "temperature",
            MetricKind::Precipitation => "precipitation",
            MetricKind::PrecipitationChance => "precipitation_chance",
        };
        f.write_str(name)
    }
}

/// A single metric reading.
///
/// For process metrics `identifier` is the PID and `label` the command name.
/// For weather metrics both hold the region name.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Sample {
    pub identifier: String,
    pub label: String,
    pub value: f64,
    pub kind: MetricKind,
}

impl Sample {
    /// Create a new sample.
    pub fn new(
        identifier: impl Into<String>,
        label: impl Into<String>,
        value: f64,
        kind: MetricKind,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            label: label.into(),
            value,
            kind,
        }
    }

    /// Returns true if the value is strictly greater than `threshold`.
    ///
    /// A value equal to the threshold never alerts.
    pub fn exceeds(&self, threshold: f64) -> bool {
        self.value > threshold
    }
}
