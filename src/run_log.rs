// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Append-only run log.
//!
//! Every successful run appends one line:
//!
//! ```text
//! 2026-10-15T09:30:00Z field.jpg: 3 strawberry, 1 flower
//! ```
//!
//! The file is created if absent and never truncated. Concurrent writers are
//! not coordinated.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};

use crate::counter::{DetectionCount, summarize};
use crate::error::{CounterError, Result};

/// Default log file name.
pub const DEFAULT_LOG_FILE: &str = "detections_log.txt";

/// An open, append-mode log file.
#[derive(Debug)]
pub struct RunLog {
    file: File,
    path: PathBuf,
}

impl RunLog {
    /// Open `path` for appending, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns [`CounterError::IoError`] if the file cannot be opened.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| {
                CounterError::IoError(format!("Failed to open log {}: {e}", path.display()))
            })?;

        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    /// Append one entry for `source` stamped with the current UTC time.
    ///
    /// # Errors
    ///
    /// Returns [`CounterError::IoError`] if the write fails.
    pub fn record(&mut self, source: &str, counts: &[DetectionCount]) -> Result<()> {
        let line = format_entry(Utc::now(), source, counts);
        self.file
            .write_all(line.as_bytes())
            .and_then(|()| self.file.flush())
            .map_err(|e| {
                CounterError::IoError(format!("Failed to write log {}: {e}", self.path.display()))
            })
    }

    /// Path of the log file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Format one newline-terminated log entry.
#[must_use]
pub fn format_entry(timestamp: DateTime<Utc>, source: &str, counts: &[DetectionCount]) -> String {
    format!(
        "{} {source}: {}\n",
        timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
        summarize(counts)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_entry() {
        let ts = Utc.with_ymd_and_hms(2026, 10, 15, 9, 30, 0).unwrap();
        let counts = [DetectionCount::new("strawberry", 3), DetectionCount::new("flower", 1)];

        assert_eq!(
            format_entry(ts, "field.jpg", &counts),
            "2026-10-15T09:30:00Z field.jpg: 3 strawberry, 1 flower\n"
        );
        assert_eq!(
            format_entry(ts, "empty.jpg", &[]),
            "2026-10-15T09:30:00Z empty.jpg: (no detections)\n"
        );
    }

    #[test]
    fn test_appends_instead_of_truncating() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_LOG_FILE);
        let counts = [DetectionCount::new("strawberry", 2)];

        RunLog::open(&path).unwrap().record("a.jpg", &counts).unwrap();
        let first = std::fs::metadata(&path).unwrap().len();

        let mut log = RunLog::open(&path).unwrap();
        log.record("b.jpg", &counts).unwrap();
        let second = std::fs::metadata(log.path()).unwrap().len();

        assert!(second > first);
        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("a.jpg: 2 strawberry"));
        assert!(lines[1].ends_with("b.jpg: 2 strawberry"));
    }

    #[test]
    fn test_open_failure_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing-dir").join("log.txt");

        assert!(matches!(RunLog::open(&path), Err(CounterError::IoError(_))));
    }
}
