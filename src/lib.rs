//! # hostwatch
//!
//! A host monitoring agent that samples process and weather metrics, checks
//! them against thresholds, and pushes a debounced notification to a
//! webhook.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                            Scheduler                             │
//! │  ┌─────────┐   ┌──────────┐   ┌───────────┐   ┌──────────────┐  │
//! │  │ source  │──▶│   data   │──▶│   state   │──▶│   Notifier   │  │
//! │  │(samples)│   │(evaluate,│   │(cooldown) │   │  (webhook)   │  │
//! │  └─────────┘   │aggregate)│   └───────────┘   └──────────────┘  │
//! │                └──────────┘                                      │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`source`]**: the [`Sampler`] trait with process and weather
//!   implementations
//! - **[`data`]**: threshold evaluation into alert batches and aggregation
//!   into a single [`Notification`]
//! - **[`state`]**: the cooldown rate limiter and the [`StateStore`] holding
//!   the last-sent timestamp
//! - **[`pipeline`]**: [`Monitor`], which runs one cycle end to end
//! - **[`notify`]**: [`PrintNotifier`] for dry runs
//! - **[`scheduler`]**: continuous mode with interval and wall-clock cadences
//! - **[`config`]**: [`Settings`] from a TOML file and `HOSTWATCH_*`
//!   environment variables
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # One alert cycle, suited to cron
//! hostwatch --once
//!
//! # Send a weather report now
//! hostwatch --report
//!
//! # Print what would be sent instead of calling the webhook
//! hostwatch --once --dry-run
//!
//! # Run continuously with an explicit config file
//! hostwatch --config /etc/hostwatch.toml
//! ```
//!
//! ### As a library
//!
//! ```
//! use hostwatch::{MemoryStateStore, Monitor, RateLimiter, Thresholds};
//! use hostwatch_adapters::webhook::WebhookNotifier;
//! use std::time::Duration;
//!
//! let notifier = WebhookNotifier::builder("https://api.day.app/yourkey/")
//!     .build()
//!     .unwrap();
//!
//! let monitor = Monitor::builder(notifier)
//!     .thresholds(Thresholds { cpu: 80.0, ..Thresholds::default() })
//!     .limiter(RateLimiter::new(Duration::from_secs(600)))
//!     .store(MemoryStateStore::new())
//!     .build();
//! ```

pub mod config;
pub mod data;
pub mod notify;
pub mod pipeline;
pub mod scheduler;
pub mod source;
pub mod state;

#[cfg(test)]
mod test_support;

// Re-export main types for convenience
pub use config::{ConfigError, DeliveryPolicy, Settings};
pub use data::{aggregate, evaluate, evaluate_all, Thresholds};
pub use hostwatch_types::{AlertBatch, AlertLine, MetricKind, Notification, Sample};
pub use notify::PrintNotifier;
pub use pipeline::{CycleOutcome, Monitor, MonitorBuilder};
pub use scheduler::{unix_now, unix_seconds, IntervalCadence, Scheduler, Tick, WallClockCadence};
pub use source::{ProcessSampler, ReportSource, Sampler, WeatherSampler};
pub use state::{
    FileStateStore, MemoryStateStore, RateLimitState, RateLimiter, StateError, StateStore,
};
