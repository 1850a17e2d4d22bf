//! Activity log - the operator-facing record of each run
//!
//! One line per event, appended to a plain text file:
//!
//! ```text
//! 2024-03-01T12:00:00.123456+00:00 - --- Watcher starting run ---
//! 2024-03-01T12:00:01.004200+00:00 - ERROR: HTTP 502 Bad Gateway for POST https://...
//! ```
//!
//! Writes are fail-open: a log that cannot be written never stops the run.
//! Every line is mirrored to `tracing` so it also shows up on stderr.

use chrono::{DateTime, SecondsFormat, Utc};
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

use crate::fail_open::fail_open;

/// Append-only run log
#[derive(Debug, Clone)]
pub struct ActivityLog {
    output_path: PathBuf,
}

impl ActivityLog {
    /// Create a logger writing to `output_path`
    pub fn new(output_path: PathBuf) -> Self {
        Self { output_path }
    }

    /// Path of the log file
    pub fn path(&self) -> &Path {
        &self.output_path
    }

    /// Log an untagged line
    pub async fn info(&self, message: &str) {
        tracing::info!("{}", message);
        self.append(message).await;
    }

    /// Log a `SUCCESS:` line
    pub async fn success(&self, message: &str) {
        tracing::info!("{}", message);
        self.append(&format!("SUCCESS: {}", message)).await;
    }

    /// Log an `ERROR:` line
    pub async fn error(&self, message: &str) {
        tracing::error!("{}", message);
        self.append(&format!("ERROR: {}", message)).await;
    }

    /// Log a `FATAL:` line
    pub async fn fatal(&self, message: &str) {
        tracing::error!("fatal: {}", message);
        self.append(&format!("FATAL: {}", message)).await;
    }

    async fn append(&self, message: &str) {
        let line = format_line(Utc::now(), message);
        fail_open("activity_log::append", || self.append_internal(line)).await;
    }

    /// Append a line to the log (internal, returns Result for fail_open)
    async fn append_internal(&self, line: String) -> crate::Result<()> {
        if let Some(parent) = self.output_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.output_path)
            .await?;

        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        Ok(())
    }
}

/// Render one log line: `<UTC RFC 3339 timestamp> - <message>\n`
pub fn format_line(at: DateTime<Utc>, message: &str) -> String {
    format!(
        "{} - {}\n",
        at.to_rfc3339_opts(SecondsFormat::Micros, false),
        message
    )
}
