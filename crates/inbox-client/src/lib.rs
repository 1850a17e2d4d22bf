//! # inbox-client
//!
//! Outbound HTTP for inbox-watch.
//!
//! - [`auth`] resolves the bearer tokens both remote APIs need
//! - [`HttpClient`] is the one place requests are sent and non-2xx responses
//!   are written to the run log
//! - [`NotionClient`] lists database pages and their comments
//! - [`GatewayClient`] asks the local agent gateway to spawn an agent
//!
//! The orchestrator only sees the [`CommentSource`] and [`AgentTrigger`]
//! traits, so runs can be driven by fakes in tests.

pub mod auth;
mod gateway;
mod http;
mod notion;

pub use auth::{get_gateway_token, get_notion_key, Credential};
pub use gateway::{AgentTrigger, GatewayClient, SpawnArgs, ToolInvocation};
pub use http::HttpClient;
pub use notion::{CommentSource, NotionClient};
