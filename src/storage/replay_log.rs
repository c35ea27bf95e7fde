// src/storage/replay_log.rs
// Manages the plain-text review log for recovery purposes.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::progress::CardProgress;
use crate::scheduler::Rating;

pub struct ReplayLogger {
    log_path: PathBuf,
}

impl ReplayLogger {
    pub fn new(log_path: &Path) -> Result<Self, std::io::Error> {
        if let Some(parent) = log_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        Ok(ReplayLogger { log_path: log_path.to_path_buf() })
    }

    pub fn path(&self) -> &Path {
        &self.log_path
    }

    /// Logs a single review with the progress it produced.
    pub fn log_review(
        &self,
        at: DateTime<Utc>,
        card_id: &str,
        rating: Rating,
        progress: &CardProgress,
    ) -> Result<(), std::io::Error> {
        self.append(at, card_id, rating.as_str(), Some(progress))
    }

    pub fn log_undo(&self, at: DateTime<Utc>, card_id: &str) -> Result<(), std::io::Error> {
        self.append(at, card_id, "undo", None)
    }

    // Format: timestamp_iso,card_id,event,ease,interval_days,due_at
    fn append(
        &self,
        at: DateTime<Utc>,
        card_id: &str,
        event: &str,
        progress: Option<&CardProgress>,
    ) -> Result<(), std::io::Error> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)?;

        let (ease, interval, due) = match progress {
            Some(p) => (
                format!("{:.2}", p.ease),
                p.interval_days.to_string(),
                p.due_at.map(|d| d.to_rfc3339()).unwrap_or_default(),
            ),
            None => (String::new(), String::new(), String::new()),
        };
        let log_entry = format!("{},{},{},{},{},{}\n", at.to_rfc3339(), card_id, event, ease, interval, due);

        file.write_all(log_entry.as_bytes())?;
        Ok(())
    }
}
