//! Fail-open utilities for graceful degradation
//!
//! Some work must never take the run down with it: writing the run log is the
//! main example. Wrap those operations in [`fail_open`] so a failure is traced
//! and swallowed.
//!
//! DO NOT use fail-open for:
//! - Comment fetching (its failure must be recorded as a fetch outcome)
//! - Credential resolution (a missing credential is fatal)

use std::future::Future;
use tracing::warn;

use crate::Result;

/// Run `f`, trading its error for a `tracing` warning
///
/// Returns `None` when `f` fails. The run log uses this for every append, so
/// a full disk or a read-only log directory only costs the log line.
///
/// ```no_run
/// use inbox_core::fail_open::fail_open;
/// use inbox_core::WatchError;
///
/// async fn touch_marker(path: std::path::PathBuf) {
///     let written = fail_open("last_run_marker", || async move {
///         tokio::fs::write(&path, b"ok\n").await?;
///         Ok::<_, WatchError>(())
///     })
///     .await;
///
///     if written.is_none() {
///         // the run carries on without the marker
///     }
/// }
/// ```
pub async fn fail_open<F, Fut, T>(operation: &str, f: F) -> Option<T>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    f().await
        .map_err(|e| warn!("{} failed, continuing without it: {}", operation, e))
        .ok()
}
