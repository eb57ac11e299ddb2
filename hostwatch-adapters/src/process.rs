//! Process table adapter using `ps`.
//!
//! Runs `ps -eo pid,comm,%mem,%cpu --sort=-<column>` and turns each row into a
//! [`Sample`] of the requested kind.
//!
//! ## Output format
//!
//! ```text
//!     PID COMMAND         %MEM %CPU
//!    1042 postgres        45.2  3.1
//!     811 Web Content     12.0 41.7
//! ```
//!
//! The first line is a header. The command column may contain spaces, so the
//! two metric columns are taken from the end of the row.

use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, warn};

use hostwatch_types::{MetricKind, Sample};

use crate::AdapterError;

/// Columns requested from `ps`.
const PS_FORMAT: &str = "pid,comm,%mem,%cpu";

/// Runs the process listing command.
#[derive(Debug, Clone)]
pub struct ProcessTable {
    program: String,
    timeout: Duration,
}

impl ProcessTable {
    /// Create a new builder for configuring the table.
    pub fn builder() -> ProcessTableBuilder {
        ProcessTableBuilder::default()
    }

    /// The program that is invoked.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Take a snapshot of all processes, sorted descending by `kind`.
    ///
    /// Only [`MetricKind::MemoryPct`] and [`MetricKind::CpuPct`] are supported.
    pub async fn snapshot(&self, kind: MetricKind) -> Result<Vec<Sample>, AdapterError> {
        let column = sort_column(kind)?;

        let output = tokio::time::timeout(
            self.timeout,
            Command::new(&self.program)
                .arg("-eo")
                .arg(PS_FORMAT)
                .arg(format!("--sort=-{}", column))
                .kill_on_drop(true)
                .output(),
        )
        .await
        .map_err(|_| {
            AdapterError::SourceUnavailable(format!(
                "{} timed out after {:?}",
                self.program, self.timeout
            ))
        })?
        .map_err(|e| {
            AdapterError::SourceUnavailable(format!("failed to run {}: {}", self.program, e))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AdapterError::SourceUnavailable(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8(output.stdout).map_err(|e| {
            AdapterError::SourceUnavailable(format!("{} produced non-UTF-8 output: {}", self.program, e))
        })?;

        if stdout.trim().is_empty() {
            return Err(AdapterError::SourceUnavailable(format!(
                "{} produced no output",
                self.program
            )));
        }

        parse_snapshot(&stdout, kind, &self.program)
    }
}

/// Builder for [`ProcessTable`].
#[derive(Debug, Default)]
pub struct ProcessTableBuilder {
    program: Option<String>,
    timeout: Option<Duration>,
}

impl ProcessTableBuilder {
    /// Set the program to run (default: "ps").
    pub fn program(mut self, program: impl Into<String>) -> Self {
        self.program = Some(program.into());
        self
    }

    /// Set the command timeout (default: 10 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the table.
    pub fn build(self) -> ProcessTable {
        ProcessTable {
            program: self.program.unwrap_or_else(|| "ps".to_string()),
            timeout: self.timeout.unwrap_or(Duration::from_secs(10)),
        }
    }
}

fn sort_column(kind: MetricKind) -> Result<&'static str, AdapterError> {
    if !kind.is_process_metric() {
        return Err(AdapterError::Unsupported(format!(
            "process table has no {} column",
            kind
        )));
    }

    Ok(match kind {
        MetricKind::CpuPct => "%cpu",
        _ => "%mem",
    })
}

/// Parse a whole snapshot.
///
/// Fails with [`AdapterError::SourceUnavailable`] when there were data rows
/// but not one of them could be read; a partly readable table is fine.
fn parse_snapshot(
    text: &str,
    kind: MetricKind,
    program: &str,
) -> Result<Vec<Sample>, AdapterError> {
    let samples = parse_process_table(text, kind);

    let rows = text.lines().skip(1).filter(|l| !l.trim().is_empty()).count();
    if samples.is_empty() && rows > 0 {
        return Err(AdapterError::SourceUnavailable(format!(
            "none of the {} rows from {} could be parsed",
            rows, program
        )));
    }

    Ok(samples)
}

/// Parse the full `ps` output, skipping the header line.
///
/// Incomplete rows and rows with a non-numeric metric are skipped and
/// logged; they never abort the rest of the table.
pub fn parse_process_table(text: &str, kind: MetricKind) -> Vec<Sample> {
    let mut samples = Vec::new();

    for line in text.lines().skip(1) {
        match parse_process_line(line, kind) {
            Ok(Some(sample)) => samples.push(sample),
            Ok(None) => debug!(line, "skipping incomplete process line"),
            Err(e) => warn!(error = %e, "skipping malformed process line"),
        }
    }

    samples
}

/// Parse one data row of `ps` output.
///
/// Returns `Ok(None)` for rows with fewer than four fields and
/// [`AdapterError::Parse`] when the metric column is not a number.
pub fn parse_process_line(line: &str, kind: MetricKind) -> Result<Option<Sample>, AdapterError> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 4 {
        return Ok(None);
    }

    let column = sort_column(kind)?;
    let n = fields.len();
    let raw = if column == "%cpu" {
        fields[n - 1]
    } else {
        fields[n - 2]
    };

    let value = parse_decimal(raw).ok_or_else(|| {
        AdapterError::Parse(format!(
            "invalid {} value '{}' in line: {}",
            kind,
            raw,
            line.trim()
        ))
    })?;

    let label = fields[1..n - 2].join(" ");
    Ok(Some(Sample::new(fields[0], label, value, kind)))
}

/// Parse a decimal that may use a comma as the decimal separator.
fn parse_decimal(raw: &str) -> Option<f64> {
    raw.replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}
