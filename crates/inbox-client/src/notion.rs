//! Notion API client: database pages and their comments

use async_trait::async_trait;
use inbox_core::{Comment, ListResponse, NotionConfig, Record, Result, WatchError};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, Url};
use serde_json::json;

use crate::auth::Credential;
use crate::http::HttpClient;

/// Where comments come from
#[async_trait]
pub trait CommentSource: Send + Sync {
    /// Records of a collection, most recently edited first
    async fn list_records(&self, collection_id: &str) -> Result<Vec<Record>>;

    /// Comments attached to one record
    async fn list_comments(&self, record_id: &str) -> Result<Vec<Comment>>;
}

/// Notion REST client
#[derive(Debug, Clone)]
pub struct NotionClient {
    http: HttpClient,
    api_base: String,
    version: String,
    credential: Credential,
}

impl NotionClient {
    pub fn new(http: HttpClient, config: &NotionConfig, credential: Credential) -> Self {
        Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            version: config.version.clone(),
            credential,
        }
    }

    fn headers(&self, json_body: bool) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&self.credential.bearer())
                .map_err(|_| WatchError::Credential("Notion key is not a valid header value".into()))?,
        );
        headers.insert(
            "notion-version",
            HeaderValue::from_str(&self.version)
                .map_err(|e| WatchError::Config(format!("Invalid notion.version: {}", e)))?,
        );
        if json_body {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }
        Ok(headers)
    }
}

#[async_trait]
impl CommentSource for NotionClient {
    async fn list_records(&self, collection_id: &str) -> Result<Vec<Record>> {
        let url = format!("{}/v1/databases/{}/query", self.api_base, collection_id);
        let body = json!({
            "sorts": [{"timestamp": "last_edited_time", "direction": "descending"}]
        });

        let list: ListResponse<Record> = self
            .http
            .request_as(Method::POST, &url, self.headers(true)?, Some(&body))
            .await?;

        tracing::debug!("Database {} returned {} records", collection_id, list.results.len());
        Ok(list.results)
    }

    async fn list_comments(&self, record_id: &str) -> Result<Vec<Comment>> {
        let url = Url::parse_with_params(
            &format!("{}/v1/comments", self.api_base),
            &[("block_id", record_id)],
        )
        .map_err(|e| WatchError::Config(format!("Invalid notion.api_base: {}", e)))?;

        let list: ListResponse<Comment> = self
            .http
            .request_as(Method::GET, url.as_str(), self.headers(false)?, None)
            .await?;

        Ok(list.results)
    }
}
