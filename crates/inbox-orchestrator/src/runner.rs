//! Run orchestration
//!
//! A run walks a fixed sequence of phases:
//!
//! ```text
//! Start → LoadState → FetchAndDetect → UpdateState → SaveState → Idle | Trigger → End
//! ```
//!
//! `FetchAndDetect` is the only phase that talks to Notion. Whatever fails in
//! there becomes [`FetchOutcome::Failed`] and the run keeps going: the
//! watermark still advances and the state is still saved. State is written
//! before the trigger fires, so a failing gateway cannot lose it.

use chrono::Utc;
use inbox_client::{
    AgentTrigger, CommentSource, Credential, GatewayClient, HttpClient, NotionClient,
};
use inbox_core::{
    epoch_seconds, ActivityLog, FetchOutcome, Result, TriggerOutcome, WatchConfig, WatchState,
};
use std::fmt;
use std::time::Duration;

use crate::detector::{scan_for_new_comments, ChangeDetector};
use crate::state_store::StateStore;
use crate::trigger;

/// Phases of a single run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Start,
    LoadState,
    FetchAndDetect,
    UpdateState,
    SaveState,
    /// Nothing new; log and finish
    Idle,
    /// New activity; spawn the agent
    Trigger,
    End,
}

impl RunPhase {
    /// Phase after `self`; `found_new` picks between `Trigger` and `Idle`
    pub fn next(self, found_new: bool) -> RunPhase {
        match self {
            RunPhase::Start => RunPhase::LoadState,
            RunPhase::LoadState => RunPhase::FetchAndDetect,
            RunPhase::FetchAndDetect => RunPhase::UpdateState,
            RunPhase::UpdateState => RunPhase::SaveState,
            RunPhase::SaveState if found_new => RunPhase::Trigger,
            RunPhase::SaveState => RunPhase::Idle,
            RunPhase::Idle | RunPhase::Trigger | RunPhase::End => RunPhase::End,
        }
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunPhase::Start => "start",
            RunPhase::LoadState => "load_state",
            RunPhase::FetchAndDetect => "fetch_and_detect",
            RunPhase::UpdateState => "update_state",
            RunPhase::SaveState => "save_state",
            RunPhase::Idle => "idle",
            RunPhase::Trigger => "trigger",
            RunPhase::End => "end",
        };
        f.write_str(name)
    }
}

/// What a run needs to know beyond its collaborators
#[derive(Debug, Clone)]
pub struct RunSettings {
    /// Notion database to scan
    pub database_id: String,
    /// Only this author's comments count
    pub author_id: String,
    /// Cap on remembered comment ids
    pub max_seen_ids: usize,
}

impl RunSettings {
    pub fn from_config(config: &WatchConfig) -> Self {
        Self {
            database_id: config.notion.database_id.clone(),
            author_id: config.notion.author_id.clone(),
            max_seen_ids: config.run.max_seen_ids,
        }
    }
}

/// Everything a finished run produced
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Epoch seconds at which the run started; the new watermark
    pub run_started_at: f64,
    pub fetch: FetchOutcome,
    pub trigger: TriggerOutcome,
    /// State as it was saved
    pub state: WatchState,
    /// Whether the state file was written
    pub saved: bool,
}

/// Drives one run over a comment source and an agent trigger
pub struct Runner<S, T> {
    source: S,
    trigger: T,
    store: StateStore,
    log: ActivityLog,
    settings: RunSettings,
}

impl Runner<NotionClient, GatewayClient> {
    /// Wire the real Notion and gateway clients from configuration
    pub fn from_config(
        config: &WatchConfig,
        notion_key: Credential,
        gateway_token: Credential,
    ) -> Result<Self> {
        let log = ActivityLog::new(config.paths.log_file.clone());
        let http = HttpClient::new(
            Duration::from_secs(config.run.request_timeout_secs),
            log.clone(),
        )?;

        Ok(Self::new(
            NotionClient::new(http.clone(), &config.notion, notion_key),
            GatewayClient::new(http, &config.gateway, gateway_token),
            StateStore::new(config.paths.state_file.clone(), config.run.lookback_secs),
            log,
            RunSettings::from_config(config),
        ))
    }
}

impl<S, T> Runner<S, T>
where
    S: CommentSource,
    T: AgentTrigger,
{
    pub fn new(
        source: S,
        trigger: T,
        store: StateStore,
        log: ActivityLog,
        settings: RunSettings,
    ) -> Self {
        Self {
            source,
            trigger,
            store,
            log,
            settings,
        }
    }

    /// Run every phase to the end
    ///
    /// Never fails: upstream problems are recorded in the report and the log.
    pub async fn run(&self) -> RunReport {
        let mut report = RunReport {
            run_started_at: 0.0,
            fetch: FetchOutcome::Completed { found: false },
            trigger: TriggerOutcome::NotAttempted,
            state: WatchState::default(),
            saved: false,
        };

        let mut phase = RunPhase::Start;
        loop {
            tracing::debug!("Entering phase {}", phase);

            match phase {
                RunPhase::Start => self.log.info("--- Watcher starting run ---").await,
                RunPhase::LoadState => {
                    report.state = self.store.load().await;
                    report.run_started_at = epoch_seconds(Utc::now());
                }
                RunPhase::FetchAndDetect => {
                    report.fetch = self.fetch_and_detect(&mut report.state).await;
                }
                RunPhase::UpdateState => report
                    .state
                    .advance(report.run_started_at, self.settings.max_seen_ids),
                RunPhase::SaveState => report.saved = self.save(&report.state).await,
                RunPhase::Idle => self.log.info("No new comments found.").await,
                RunPhase::Trigger => {
                    report.trigger = trigger::fire(&self.trigger, &self.log).await;
                }
                RunPhase::End => {
                    self.log.info("--- Watcher run finished ---").await;
                    return report;
                }
            }

            phase = phase.next(report.fetch.found_new());
        }
    }

    async fn fetch_and_detect(&self, state: &mut WatchState) -> FetchOutcome {
        let mut detector = ChangeDetector::new(&self.settings.author_id, state);
        let result =
            scan_for_new_comments(&self.source, &self.settings.database_id, &mut detector).await;

        let outcome = FetchOutcome::from(result);
        if let FetchOutcome::Failed { reason } = &outcome {
            self.log
                .error(&format!(
                    "Failed to check Notion for updates. Error: {}",
                    reason
                ))
                .await;
        }
        outcome
    }

    async fn save(&self, state: &WatchState) -> bool {
        match self.store.save(state).await {
            Ok(()) => true,
            Err(e) => {
                self.log
                    .error(&format!(
                        "Failed to save watch state to {}. Error: {}",
                        self.store.path().display(),
                        e
                    ))
                    .await;
                false
            }
        }
    }
}
