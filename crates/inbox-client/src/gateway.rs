//! Agent gateway client: the `/tools/invoke` spawn request

use async_trait::async_trait;
use inbox_core::{GatewayConfig, Result, WatchError};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;

use crate::auth::Credential;
use crate::http::HttpClient;

/// Something that can spawn the downstream agent
#[async_trait]
pub trait AgentTrigger: Send + Sync {
    /// Agent that will be spawned
    fn agent_id(&self) -> &str;

    /// Send the spawn request, returning the gateway's response body
    async fn spawn_agent(&self) -> Result<Value>;
}

/// Body of a `/tools/invoke` call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolInvocation {
    pub tool: String,
    pub args: SpawnArgs,
    #[serde(rename = "sessionKey")]
    pub session_key: String,
}

/// Arguments of the `sessions_spawn` tool
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpawnArgs {
    pub agent_id: String,
    pub task: String,
    pub thinking: String,
    pub label: String,
}

impl ToolInvocation {
    pub fn from_config(config: &GatewayConfig) -> Self {
        Self {
            tool: config.tool.clone(),
            args: SpawnArgs {
                agent_id: config.agent_id.clone(),
                task: config.task.clone(),
                thinking: config.thinking.clone(),
                label: config.label.clone(),
            },
            session_key: config.session_key.clone(),
        }
    }
}

/// Client for the local agent gateway
#[derive(Debug, Clone)]
pub struct GatewayClient {
    http: HttpClient,
    endpoint: String,
    token: Credential,
    invocation: ToolInvocation,
}

impl GatewayClient {
    pub fn new(http: HttpClient, config: &GatewayConfig, token: Credential) -> Self {
        Self {
            http,
            endpoint: format!("{}/tools/invoke", config.base_url.trim_end_matches('/')),
            token,
            invocation: ToolInvocation::from_config(config),
        }
    }

    /// URL the spawn request is posted to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl AgentTrigger for GatewayClient {
    fn agent_id(&self) -> &str {
        &self.invocation.args.agent_id
    }

    async fn spawn_agent(&self) -> Result<Value> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&self.token.bearer())
                .map_err(|_| WatchError::Config("Gateway token is not a valid header value".into()))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let body = serde_json::to_value(&self.invocation)?;
        self.http
            .request(Method::POST, &self.endpoint, headers, Some(&body))
            .await
    }
}
