//! Core type definitions for inbox-watch

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{Result, WatchError};

/// Persisted watermark of processed comments
///
/// Stored as pretty-printed JSON between runs. Field names are camelCase on
/// disk; keys this type does not know about are kept and written back.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchState {
    /// Unix epoch seconds; comments at or before this are considered processed
    #[serde(default)]
    pub last_seen_timestamp: f64,

    /// Comment ids already acted on, oldest first
    #[serde(default)]
    pub seen_comment_ids: Vec<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl WatchState {
    /// State for a first run: look back `lookback_secs` from `now`, nothing seen
    pub fn fresh(now: DateTime<Utc>, lookback_secs: u64) -> Self {
        Self {
            last_seen_timestamp: epoch_seconds(now) - lookback_secs as f64,
            seen_comment_ids: Vec::new(),
            extra: Map::new(),
        }
    }

    /// Move the watermark to `run_start` and keep only the newest `cap` ids
    pub fn advance(&mut self, run_start: f64, cap: usize) {
        self.last_seen_timestamp = run_start;
        if self.seen_comment_ids.len() > cap {
            let excess = self.seen_comment_ids.len() - cap;
            self.seen_comment_ids.drain(..excess);
        }
    }
}

/// A page returned by a database query; only the id matters here
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Record {
    #[serde(default)]
    pub id: Option<String>,
}

/// Author reference attached to a comment
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommentAuthor {
    #[serde(default)]
    pub id: Option<String>,
}

/// A comment attached to a record
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Comment {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub created_time: Option<String>,
    #[serde(default)]
    pub created_by: Option<CommentAuthor>,
}

impl Comment {
    /// `(id, created_time, author_id)` when all three are present and non-empty
    pub fn required_fields(&self) -> Option<(&str, &str, &str)> {
        let id = non_empty(self.id.as_deref())?;
        let created = non_empty(self.created_time.as_deref())?;
        let author = non_empty(self.created_by.as_ref().and_then(|a| a.id.as_deref()))?;
        Some((id, created, author))
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Paginated list envelope used by the Notion API
#[derive(Debug, Clone, Deserialize)]
pub struct ListResponse<T> {
    #[serde(default)]
    pub results: Vec<T>,
}

/// Result of the fetch-and-detect phase
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Every record and comment was scanned
    Completed { found: bool },
    /// The phase stopped early; nothing counts as found
    Failed { reason: String },
}

impl FetchOutcome {
    /// Whether the run should fire the trigger
    pub fn found_new(&self) -> bool {
        matches!(self, FetchOutcome::Completed { found: true })
    }
}

impl From<Result<bool>> for FetchOutcome {
    fn from(result: Result<bool>) -> Self {
        match result {
            Ok(found) => FetchOutcome::Completed { found },
            Err(e) => FetchOutcome::Failed {
                reason: e.to_string(),
            },
        }
    }
}

/// Result of the trigger phase
#[derive(Debug, Clone, PartialEq)]
pub enum TriggerOutcome {
    /// Nothing new, so nothing was sent
    NotAttempted,
    /// The gateway accepted the spawn request
    Accepted { response: Value },
    /// The spawn request failed; the run carries on
    Failed { reason: String },
}

/// Seconds since the Unix epoch with microsecond precision
pub fn epoch_seconds(at: DateTime<Utc>) -> f64 {
    at.timestamp_micros() as f64 / 1_000_000.0
}

/// Parse an ISO-8601 timestamp into epoch seconds
///
/// Accepts a trailing `Z` or an explicit offset. A timestamp with no offset
/// at all is read as UTC.
pub fn parse_timestamp(value: &str) -> Result<f64> {
    let trimmed = value.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(epoch_seconds(parsed.with_timezone(&Utc)));
    }

    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| epoch_seconds(naive.and_utc()))
        .map_err(|e| WatchError::Timestamp(format!("{:?}: {}", value, e)))
}
