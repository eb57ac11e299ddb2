//! # hostwatch-types
//!
//! Core types shared by the hostwatch sampling and alerting pipeline.
//!
//! Every cycle produces a fresh set of [`Sample`]s, filters them into
//! [`AlertBatch`]es and folds the batches into at most one
//! [`Notification`]. None of these values outlive the cycle that built them.
//!
//! ## Features
//!
//! - `serde`: JSON serialization via serde (needed for the webhook payload)
//!
//! ## Example
//!
//! ```rust
//! use hostwatch_types::{AlertBatch, AlertLine, MetricKind, Sample};
//!
//! let sample = Sample::new("1", "postgres", 45.2, MetricKind::MemoryPct);
//! assert!(sample.exceeds(30.0));
//!
//! let mut batch = AlertBatch::new(MetricKind::MemoryPct);
//! batch.push(AlertLine::from_sample(&sample));
//! assert_eq!(batch.len(), 1);
//! ```

mod alert;
mod notification;
mod sample;

pub use alert::*;
pub use notification::*;
pub use sample::*;
