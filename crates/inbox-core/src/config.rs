//! Configuration management for inbox-watch
//!
//! Everything the job needs to know about the outside world lives here: which
//! Notion database to poll and whose comments count, where the agent gateway
//! listens and what it should spawn, and where the state file and run log go.
//!
//! Identifiers that only make sense for one deployment (database id, author
//! id, gateway token) have no compiled-in values and must come from the
//! config file or the environment.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::{Result, WatchError};

/// Environment variable that overrides the config file location
pub const CONFIG_PATH_ENV: &str = "INBOX_WATCH_CONFIG";

/// Top-level job configuration
///
/// Loaded from `~/.config/inbox-watch/config.toml` unless overridden.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Comment source (Notion API)
    #[serde(default)]
    pub notion: NotionConfig,

    /// Agent gateway that receives the spawn request
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Where state and the run log live
    #[serde(default)]
    pub paths: PathsConfig,

    /// Per-run tuning
    #[serde(default)]
    pub run: RunConfig,
}

/// Notion API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotionConfig {
    /// Base URL of the Notion API
    #[serde(default = "default_notion_api_base")]
    pub api_base: String,

    /// Value sent in the `Notion-Version` header
    #[serde(default = "default_notion_version")]
    pub version: String,

    /// Database whose pages are scanned for comments
    #[serde(default)]
    pub database_id: String,

    /// Only comments created by this user id count as activity
    #[serde(default)]
    pub author_id: String,

    /// Environment variable holding the integration token
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// File read when the environment variable is unset
    #[serde(default = "default_api_key_file")]
    pub api_key_file: PathBuf,
}

/// Agent gateway settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Base URL of the gateway; `/tools/invoke` is appended
    #[serde(default = "default_gateway_url")]
    pub base_url: String,

    /// Bearer token, used when `token_env` is unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Environment variable holding the bearer token
    #[serde(default = "default_gateway_token_env")]
    pub token_env: String,

    /// Tool name invoked on the gateway
    #[serde(default = "default_tool")]
    pub tool: String,

    /// Agent to spawn
    #[serde(default = "default_agent_id")]
    pub agent_id: String,

    /// Task handed to the spawned agent
    #[serde(default = "default_task")]
    pub task: String,

    /// Thinking-effort hint
    #[serde(default = "default_thinking")]
    pub thinking: String,

    /// Label attached to the spawned session
    #[serde(default = "default_label")]
    pub label: String,

    /// Session the spawn is issued from
    #[serde(default = "default_session_key")]
    pub session_key: String,
}

/// Filesystem locations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// JSON watermark file
    #[serde(default = "default_state_file")]
    pub state_file: PathBuf,

    /// Append-only run log
    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,
}

/// Per-run tuning knobs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// How far back a fresh state file starts looking, in seconds
    #[serde(default = "default_lookback_secs")]
    pub lookback_secs: u64,

    /// Maximum number of comment ids remembered between runs
    #[serde(default = "default_max_seen_ids")]
    pub max_seen_ids: usize,

    /// Timeout applied to every HTTP request, in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn home() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

// Default value providers
fn default_notion_api_base() -> String {
    "https://api.notion.com".to_string()
}

fn default_notion_version() -> String {
    "2022-06-28".to_string()
}

fn default_api_key_env() -> String {
    "NOTION_API_KEY".to_string()
}

fn default_api_key_file() -> PathBuf {
    home().join(".config/notion/api_key")
}

fn default_gateway_url() -> String {
    "http://127.0.0.1:18789".to_string()
}

fn default_gateway_token_env() -> String {
    "OPENCLAW_GATEWAY_TOKEN".to_string()
}

fn default_tool() -> String {
    "sessions_spawn".to_string()
}

fn default_agent_id() -> String {
    "ops".to_string()
}

fn default_task() -> String {
    "A new comment is available in the Action Inbox. \
     Find the relevant task, understand the full context, and take action immediately."
        .to_string()
}

fn default_thinking() -> String {
    "high".to_string()
}

fn default_label() -> String {
    "notion-watcher-spawn".to_string()
}

fn default_session_key() -> String {
    "main".to_string()
}

fn default_state_file() -> PathBuf {
    home().join(".openclaw/workspace/memory/action-inbox-watch-state.json")
}

fn default_log_file() -> PathBuf {
    home().join(".openclaw/workspace/memory/notion-watcher.log")
}

fn default_lookback_secs() -> u64 {
    300
}

fn default_max_seen_ids() -> usize {
    500
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl WatchConfig {
    /// Config file location: `INBOX_WATCH_CONFIG`, else `~/.config/inbox-watch/config.toml`
    pub fn default_path() -> PathBuf {
        match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) if !path.trim().is_empty() => PathBuf::from(path),
            _ => home().join(".config/inbox-watch/config.toml"),
        }
    }

    /// Load configuration from `path` or use defaults when the file is absent
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            toml::from_str(&content).map_err(|e| {
                WatchError::Config(format!(
                    "Failed to parse config file {}: {}",
                    path.display(),
                    e
                ))
            })
        } else {
            tracing::debug!("No config file at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Write the default configuration to `path`
    pub fn write_default(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(&Self::default())
            .map_err(|e| WatchError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject configurations that cannot possibly produce a useful run
    pub fn validate(&self) -> Result<()> {
        if self.notion.database_id.trim().is_empty() {
            return Err(WatchError::Config(
                "notion.database_id is not set".to_string(),
            ));
        }
        if self.notion.author_id.trim().is_empty() {
            return Err(WatchError::Config("notion.author_id is not set".to_string()));
        }
        if self.gateway.base_url.trim().is_empty() {
            return Err(WatchError::Config("gateway.base_url is empty".to_string()));
        }
        if self.run.max_seen_ids == 0 {
            return Err(WatchError::Config(
                "run.max_seen_ids must be at least 1".to_string(),
            ));
        }
        if self.run.request_timeout_secs == 0 {
            return Err(WatchError::Config(
                "run.request_timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for NotionConfig {
    fn default() -> Self {
        Self {
            api_base: default_notion_api_base(),
            version: default_notion_version(),
            database_id: String::new(),
            author_id: String::new(),
            api_key_env: default_api_key_env(),
            api_key_file: default_api_key_file(),
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: default_gateway_url(),
            token: None,
            token_env: default_gateway_token_env(),
            tool: default_tool(),
            agent_id: default_agent_id(),
            task: default_task(),
            thinking: default_thinking(),
            label: default_label(),
            session_key: default_session_key(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            state_file: default_state_file(),
            log_file: default_log_file(),
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            lookback_secs: default_lookback_secs(),
            max_seen_ids: default_max_seen_ids(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}
