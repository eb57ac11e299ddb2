//! Alert lines and per-kind alert batches.

use std::fmt;

use crate::{MetricKind, Sample};

/// A human-readable line describing one sample that crossed its threshold.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AlertLine {
    pub kind: MetricKind,
    pub text: String,
}

impl AlertLine {
    /// Format a line for `sample`, rounding the value to one decimal place.
    pub fn from_sample(sample: &Sample) -> Self {
        let Sample {
            identifier,
            label,
            value,
            kind,
        } = sample;

        let text = match kind {
            MetricKind::MemoryPct => {
                format!("Process: {label} (PID: {identifier}) memory usage: {value:.1}%")
            }
            MetricKind::CpuPct => {
                format!("Process: {label} (PID: {identifier}) CPU usage: {value:.1}%")
            }
            MetricKind::Temperature => format!("Region: {label} temperature: {value:.1}°C"),
            MetricKind::Precipitation => format!("Region: {label} precipitation: {value:.1}mm"),
            MetricKind::PrecipitationChance => format!(
                "Region: {label} chance of precipitation: {:.1}%",
                value * 100.0
            ),
        };

        Self { kind: *kind, text }
    }
}

impl fmt::Display for AlertLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// The alert lines produced for one metric kind in one cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AlertBatch {
    pub kind: MetricKind,
    pub lines: Vec<AlertLine>,
}

impl AlertBatch {
    /// Create an empty batch for `kind`.
    pub fn new(kind: MetricKind) -> Self {
        Self {
            kind,
            lines: Vec::new(),
        }
    }

    /// Append a line. Lines of a different kind are still accepted; the
    /// batch heading is taken from the batch kind.
    pub fn push(&mut self, line: AlertLine) {
        self.lines.push(line);
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Render the batch as a heading followed by one line per alert.
    ///
    /// Each line, the heading included, is terminated by `\n`. An empty batch
    /// renders as an empty string.
    pub fn render(&self) -> String {
        if self.is_empty() {
            return String::new();
        }

        let mut out = String::with_capacity(64 * (self.lines.len() + 1));
        out.push_str(self.kind.heading());
        out.push('\n');
        for line in &self.lines {
            out.push_str(&line.text);
            out.push('\n');
        }
        out
    }
}
