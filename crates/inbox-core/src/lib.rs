//! # inbox-core
//!
//! Core types for the inbox-watch job.
//!
//! inbox-watch is a single-shot poller: an external scheduler runs it, it
//! checks a Notion database for new comments from one author, remembers what
//! it has already seen, and asks a local agent gateway to spawn an agent when
//! something new shows up.
//!
//! This crate holds the pieces every other crate leans on:
//! - the unified [`WatchError`] type
//! - [`WatchConfig`], loaded from TOML
//! - the persisted [`WatchState`] and the wire shapes of records and comments
//! - the append-only [`ActivityLog`] that operators read

pub mod activity_log;
pub mod config;
mod error;
pub mod fail_open;
mod types;

pub use activity_log::ActivityLog;
pub use config::{GatewayConfig, NotionConfig, PathsConfig, RunConfig, WatchConfig};
pub use error::{Result, WatchError};
pub use types::*;
