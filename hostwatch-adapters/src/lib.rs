//! # hostwatch-adapters
//!
//! Adapters for the external systems hostwatch talks to.
//!
//! ## Supported Systems
//!
//! - **Process table** ([`process`]) - runs `ps` and parses its columnar output
//!   into memory / CPU samples
//! - **Weather** ([`weather`]) - queries a wttr.in-style endpoint per region and
//!   parses the comma-delimited reply
//! - **Webhook** ([`webhook`]) - POSTs `{title, body}` JSON to a push endpoint
//!
//! Parsing lives in plain functions (`parse_process_table`,
//! `parse_weather_reply`) so it can be tested without spawning anything.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use hostwatch_adapters::process::ProcessTable;
//! use hostwatch_adapters::webhook::{Notifier, WebhookNotifier};
//! use hostwatch_types::{MetricKind, Notification};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let table = ProcessTable::builder().build();
//!     let samples = table.snapshot(MetricKind::MemoryPct).await?;
//!     println!("Sampled {} processes", samples.len());
//!
//!     let notifier = WebhookNotifier::builder("https://push.example.com/key/").build()?;
//!     notifier.deliver(&Notification::new("host", "hello")).await?;
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod process;
pub mod weather;
pub mod webhook;

pub use error::AdapterError;

// Re-export types for convenience
pub use hostwatch_types::{MetricKind, Notification, Sample};
