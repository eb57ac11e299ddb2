//! Sampler abstraction for collecting metric samples.
//!
//! This module provides a trait-based abstraction over the places samples
//! come from (the process table, a weather service, ...). Each
//! implementation wraps one adapter from `hostwatch-adapters` and is
//! configured at construction, so the pipeline only ever calls
//! [`Sampler::sample`].

mod process;
mod weather;

pub use process::ProcessSampler;
pub use weather::WeatherSampler;

use std::fmt::Debug;

use async_trait::async_trait;
use hostwatch_adapters::weather::WeatherReport;
use hostwatch_adapters::AdapterError;
use hostwatch_types::Sample;

/// Trait for producing one cycle's worth of samples.
///
/// # Example
///
/// ```no_run
/// use hostwatch::{ProcessSampler, Sampler};
/// use hostwatch_adapters::process::ProcessTable;
/// use hostwatch_types::MetricKind;
///
/// # tokio_test::block_on(async {
/// let sampler = ProcessSampler::new(ProcessTable::builder().build(), MetricKind::CpuPct);
/// let samples = sampler.sample().await?;
/// println!("{}: {} samples", sampler.description(), samples.len());
/// # Ok::<_, hostwatch_adapters::AdapterError>(())
/// # });
/// ```
#[async_trait]
pub trait Sampler: Send + Sync + Debug {
    /// Take a fresh set of samples.
    ///
    /// Returns [`AdapterError::SourceUnavailable`] (or another adapter
    /// error) when the source failed as a whole. Individual bad records are
    /// skipped inside the implementation and never fail the call.
    async fn sample(&self) -> Result<Vec<Sample>, AdapterError>;

    /// Returns a human-readable description of the source.
    fn description(&self) -> &str;
}

/// Trait for producing per-region weather reports.
#[async_trait]
pub trait ReportSource: Send + Sync + Debug {
    /// Fetch a report per region, `None` for regions that failed.
    async fn reports(&self) -> Vec<(String, Option<WeatherReport>)>;
}
