//! # inbox-orchestrator
//!
//! One inbox-watch run, start to finish:
//!
//! 1. load the watermark ([`StateStore`])
//! 2. scan every record's comments for new ones by the configured author
//!    ([`ChangeDetector`])
//! 3. advance the watermark and save it
//! 4. ask the gateway to spawn an agent if anything new turned up
//!
//! Upstream failures never abort a run: they become a [`FetchOutcome`] or a
//! [`TriggerOutcome`] and the run carries on to the end.
//!
//! [`FetchOutcome`]: inbox_core::FetchOutcome
//! [`TriggerOutcome`]: inbox_core::TriggerOutcome

pub mod detector;
pub mod runner;
pub mod state_store;
pub mod trigger;

pub use detector::{scan_for_new_comments, ChangeDetector};
pub use runner::{RunPhase, RunReport, RunSettings, Runner};
pub use state_store::StateStore;
