//! State store implementations.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use super::{StateError, StateStore};

/// Stores the timestamp as text in a single file.
///
/// Writes go to a sibling `.tmp` file which is synced and then renamed over
/// the target, so a crash mid-write leaves either the old value or the new
/// one. Anything unparsable on read is reported as [`StateError::Corrupt`].
#[derive(Debug)]
pub struct FileStateStore {
    path: PathBuf,
    description: String,
}

impl FileStateStore {
    /// Create a store backed by `path`. Nothing is touched until first use.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let description = format!("file: {}", path.display());
        Self { path, description }
    }

    /// Returns the path of the state file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(".tmp");
        PathBuf::from(name)
    }

    fn io_error(&self, source: io::Error) -> StateError {
        StateError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl StateStore for FileStateStore {
    fn get_timestamp(&self) -> Result<Option<f64>, StateError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_error(e)),
        };

        parse_timestamp(&content).map(Some)
    }

    fn set_timestamp(&self, timestamp: f64) -> Result<(), StateError> {
        if !timestamp.is_finite() {
            return Err(StateError::Corrupt(format!(
                "refusing to store non-finite timestamp {}",
                timestamp
            )));
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        let temp = self.temp_path();
        let write = || -> io::Result<()> {
            let mut file = fs::File::create(&temp)?;
            file.write_all(timestamp.to_string().as_bytes())?;
            file.sync_all()?;
            fs::rename(&temp, &self.path)
        };

        write().map_err(|e| {
            let _ = fs::remove_file(&temp);
            self.io_error(e)
        })
    }

    fn description(&self) -> &str {
        &self.description
    }
}

fn parse_timestamp(content: &str) -> Result<f64, StateError> {
    let trimmed = content.trim();
    let value: f64 = trimmed
        .parse()
        .map_err(|e| StateError::Corrupt(format!("{:?}: {}", trimmed, e)))?;

    if !value.is_finite() {
        return Err(StateError::Corrupt(format!("{:?} is not finite", trimmed)));
    }

    Ok(value)
}

/// Keeps the timestamp in memory only.
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    timestamp: Mutex<Option<f64>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds `timestamp`.
    pub fn with_timestamp(timestamp: f64) -> Self {
        Self {
            timestamp: Mutex::new(Some(timestamp)),
        }
    }
}

impl StateStore for MemoryStateStore {
    fn get_timestamp(&self) -> Result<Option<f64>, StateError> {
        Ok(*self.timestamp.lock())
    }

    fn set_timestamp(&self, timestamp: f64) -> Result<(), StateError> {
        *self.timestamp.lock() = Some(timestamp);
        Ok(())
    }

    fn description(&self) -> &str {
        "memory"
    }
}
