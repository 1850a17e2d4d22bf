//! Watch state persistence
//!
//! The state file is read once at the start of a run and written once near
//! the end. Loading never fails: a missing or unreadable file starts from a
//! short look-back window instead.

use chrono::{DateTime, Utc};
use inbox_core::{Result, WatchState};
use std::path::{Path, PathBuf};

/// JSON file holding the [`WatchState`] between runs
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
    lookback_secs: u64,
}

impl StateStore {
    pub fn new(path: PathBuf, lookback_secs: u64) -> Self {
        Self {
            path,
            lookback_secs,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the state, falling back to a fresh one
    pub async fn load(&self) -> WatchState {
        self.load_at(Utc::now()).await
    }

    /// Load the state, using `now` to build the fallback
    pub async fn load_at(&self, now: DateTime<Utc>) -> WatchState {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!("Failed to read state file {}: {}", self.path.display(), e);
                }
                return WatchState::fresh(now, self.lookback_secs);
            }
        };

        match serde_json::from_str(&content) {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!(
                    "State file {} is corrupt, starting fresh: {}",
                    self.path.display(),
                    e
                );
                WatchState::fresh(now, self.lookback_secs)
            }
        }
    }

    /// Replace the state file with `state`
    ///
    /// Writes a sibling temp file and renames it into place.
    pub async fn save(&self, state: &WatchState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let json = serde_json::to_string_pretty(state)?;

        let tmp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, json).await?;
        tokio::fs::rename(&tmp_path, &self.path).await?;

        Ok(())
    }
}
