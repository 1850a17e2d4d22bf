//! Credential resolution for the Notion API and the agent gateway
//!
//! Notion key priority:
//! 1. The environment variable named by `notion.api_key_env` (`NOTION_API_KEY`)
//! 2. The file named by `notion.api_key_file` (`~/.config/notion/api_key`), trimmed
//!
//! Gateway token priority:
//! 1. The environment variable named by `gateway.token_env` (`OPENCLAW_GATEWAY_TOKEN`)
//! 2. `gateway.token` from the config file

use inbox_core::{GatewayConfig, NotionConfig, Result, WatchError};
use std::env;
use std::fmt;
use std::path::Path;

/// A bearer token; never printed
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// `Authorization` header value
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Get the Notion integration token
pub fn get_notion_key(config: &NotionConfig) -> Result<Credential> {
    if let Some(key) = from_env(&config.api_key_env) {
        tracing::debug!("Using Notion key from ${}", config.api_key_env);
        return Ok(Credential::new(key));
    }

    if let Some(key) = from_file(&config.api_key_file)? {
        tracing::debug!(
            "Using Notion key from {}",
            config.api_key_file.display()
        );
        return Ok(Credential::new(key));
    }

    Err(WatchError::Credential(format!(
        "Missing {} and {}",
        config.api_key_env,
        config.api_key_file.display()
    )))
}

/// Get the agent gateway bearer token
pub fn get_gateway_token(config: &GatewayConfig) -> Result<Credential> {
    if let Some(token) = from_env(&config.token_env) {
        return Ok(Credential::new(token));
    }

    match config.token.as_deref().map(str::trim) {
        Some(token) if !token.is_empty() => Ok(Credential::new(token)),
        _ => Err(WatchError::Config(format!(
            "No gateway token. Set {} or gateway.token in the config file",
            config.token_env
        ))),
    }
}

fn from_env(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.is_empty())
}

fn from_file(path: &Path) -> Result<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(content) => {
            let key = content.trim();
            Ok((!key.is_empty()).then(|| key.to_string()))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(WatchError::Credential(format!(
            "Failed to read {}: {}",
            path.display(),
            e
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tempfile::TempDir;

    // Mutex to prevent concurrent env var modifications
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn with_env_var<F, R>(key: &str, value: Option<&str>, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let _guard = ENV_LOCK.lock().unwrap();

        let original = env::var(key).ok();
        match value {
            Some(v) => env::set_var(key, v),
            None => env::remove_var(key),
        }

        let result = f();

        match original {
            Some(v) => env::set_var(key, v),
            None => env::remove_var(key),
        }

        result
    }

    fn notion_config(env_name: &str, dir: &TempDir) -> NotionConfig {
        NotionConfig {
            api_key_env: env_name.to_string(),
            api_key_file: dir.path().join("api_key"),
            ..NotionConfig::default()
        }
    }

    #[test]
    fn test_env_var_wins_over_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("api_key"), "from-file\n").unwrap();
        let config = notion_config("INBOX_TEST_KEY_PRIORITY", &dir);

        with_env_var("INBOX_TEST_KEY_PRIORITY", Some("from-env"), || {
            let key = get_notion_key(&config).unwrap();
            assert_eq!(key.bearer(), "Bearer from-env");
        });
    }

    #[test]
    fn test_file_fallback_is_trimmed() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("api_key"), "  secret_abc \n").unwrap();
        let config = notion_config("INBOX_TEST_KEY_FALLBACK", &dir);

        with_env_var("INBOX_TEST_KEY_FALLBACK", None, || {
            let key = get_notion_key(&config).unwrap();
            assert_eq!(key.bearer(), "Bearer secret_abc");
        });
    }

    #[test]
    fn test_empty_env_var_falls_through() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("api_key"), "from-file").unwrap();
        let config = notion_config("INBOX_TEST_KEY_EMPTY", &dir);

        with_env_var("INBOX_TEST_KEY_EMPTY", Some(""), || {
            assert_eq!(get_notion_key(&config).unwrap().bearer(), "Bearer from-file");
        });
    }

    #[test]
    fn test_missing_everywhere_is_credential_error() {
        let dir = TempDir::new().unwrap();
        let config = notion_config("INBOX_TEST_KEY_MISSING", &dir);

        with_env_var("INBOX_TEST_KEY_MISSING", None, || {
            let err = get_notion_key(&config).unwrap_err();
            assert!(matches!(err, WatchError::Credential(_)));
            assert!(err.to_string().contains("INBOX_TEST_KEY_MISSING"));
        });
    }

    #[test]
    fn test_gateway_token_from_config() {
        let config = GatewayConfig {
            token: Some("inline-token".to_string()),
            token_env: "INBOX_TEST_GATEWAY_INLINE".to_string(),
            ..GatewayConfig::default()
        };

        with_env_var("INBOX_TEST_GATEWAY_INLINE", None, || {
            assert_eq!(get_gateway_token(&config).unwrap(), Credential::new("inline-token"));
        });
        with_env_var("INBOX_TEST_GATEWAY_INLINE", Some("env-token"), || {
            assert_eq!(get_gateway_token(&config).unwrap(), Credential::new("env-token"));
        });
    }

    #[test]
    fn test_gateway_token_missing_is_config_error() {
        let config = GatewayConfig {
            token_env: "INBOX_TEST_GATEWAY_MISSING".to_string(),
            ..GatewayConfig::default()
        };

        with_env_var("INBOX_TEST_GATEWAY_MISSING", None, || {
            let err = get_gateway_token(&config).unwrap_err();
            assert!(matches!(err, WatchError::Config(_)));
        });
    }

    #[test]
    fn test_debug_is_redacted() {
        let key = Credential::new("secret_abc");
        assert_eq!(format!("{:?}", key), "Credential(<redacted>)");
    }
}
