//! Rate limiting and the durable state it depends on.
//!
//! The only state that survives between cycles (and process restarts) is the
//! timestamp of the last notification sent. It lives behind the
//! [`StateStore`] trait so the storage mechanism can be swapped without
//! touching the pipeline.
//!
//! - [`FileStateStore`]: one float in a text file, replaced atomically
//! - [`MemoryStateStore`]: in-process only, for tests and dry runs
//! - [`RateLimiter`]: the cooldown decision

mod limiter;
mod store;

pub use limiter::RateLimiter;
pub use store::{FileStateStore, MemoryStateStore};

use std::fmt::Debug;
use std::path::PathBuf;

use thiserror::Error;
use tracing::warn;

/// Errors from reading or writing durable state.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("state I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("state is corrupt: {0}")]
    Corrupt(String),
}

/// Durable key-value storage for the last-sent timestamp.
pub trait StateStore: Send + Sync + Debug {
    /// Read the stored timestamp. `Ok(None)` means nothing was stored yet.
    fn get_timestamp(&self) -> Result<Option<f64>, StateError>;

    /// Store `timestamp`, replacing any previous value.
    fn set_timestamp(&self, timestamp: f64) -> Result<(), StateError>;

    /// Returns a human-readable description of the store.
    fn description(&self) -> &str;
}

/// The rate limiter's view of durable state.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RateLimitState {
    /// Seconds since the Unix epoch; `0.0` when nothing was ever sent.
    pub last_sent_timestamp: f64,
}

impl RateLimitState {
    pub fn new(last_sent_timestamp: f64) -> Self {
        Self {
            last_sent_timestamp,
        }
    }

    /// Read state from `store`.
    ///
    /// Missing state reads as epoch-zero. Unreadable or corrupt state is
    /// logged and also reads as epoch-zero, so sending is always allowed
    /// rather than failing the cycle.
    pub fn load(store: &dyn StateStore) -> Self {
        match store.get_timestamp() {
            Ok(Some(timestamp)) => Self::new(timestamp),
            Ok(None) => Self::default(),
            Err(e) => {
                warn!(store = store.description(), error = %e, "ignoring unreadable rate-limit state");
                Self::default()
            }
        }
    }

    /// Write this state to `store`.
    pub fn save(&self, store: &dyn StateStore) -> Result<(), StateError> {
        store.set_timestamp(self.last_sent_timestamp)
    }
}
