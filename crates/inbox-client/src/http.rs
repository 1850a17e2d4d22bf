//! Generic JSON-over-HTTP request helper
//!
//! Every outbound call goes through [`HttpClient::request`]. Non-2xx
//! responses are written to the run log with their status, reason phrase and
//! raw body, then returned as [`WatchError::Http`]. Nothing is retried.

use inbox_core::{ActivityLog, Result, WatchError};
use reqwest::header::HeaderMap;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

/// Shared HTTP client with a fixed per-request timeout
#[derive(Debug, Clone)]
pub struct HttpClient {
    http: reqwest::Client,
    log: ActivityLog,
}

impl HttpClient {
    /// Create a client whose requests time out after `timeout`
    pub fn new(timeout: Duration, log: ActivityLog) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| WatchError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { http, log })
    }

    /// Send a request and decode the JSON response body
    ///
    /// `body`, when present, is sent as JSON.
    pub async fn request(
        &self,
        method: Method,
        url: &str,
        headers: HeaderMap,
        body: Option<&Value>,
    ) -> Result<Value> {
        tracing::debug!("{} {}", method, url);

        let mut request = self.http.request(method.clone(), url).headers(headers);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| WatchError::Network(format!("{} {}: {}", method, url, e)))?;

        let status = response.status();

        if !status.is_success() {
            // reqwest does not expose the server's status line, only the code
            let reason = status.canonical_reason().unwrap_or("Unknown").to_string();
            let body = response
                .text()
                .await
                .unwrap_or_else(|e| format!("<unreadable body: {}>", e));

            self.log
                .error(&format!(
                    "HTTP {} {} for {} {}",
                    status.as_u16(),
                    reason,
                    method,
                    url
                ))
                .await;
            self.log.info(&format!("Response body: {}", body)).await;

            return Err(WatchError::Http {
                status: status.as_u16(),
                reason,
                body,
            });
        }

        let text = response
            .text()
            .await
            .map_err(|e| WatchError::Network(format!("{} {}: {}", method, url, e)))?;

        serde_json::from_str(&text)
            .map_err(|e| WatchError::Decode(format!("{} {}: {}", method, url, e)))
    }

    /// Like [`request`](Self::request), decoding into `T`
    pub async fn request_as<T: DeserializeOwned>(
        &self,
        method: Method,
        url: &str,
        headers: HeaderMap,
        body: Option<&Value>,
    ) -> Result<T> {
        let value = self.request(method.clone(), url, headers, body).await?;
        serde_json::from_value(value)
            .map_err(|e| WatchError::Decode(format!("{} {}: {}", method, url, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn client(dir: &TempDir) -> HttpClient {
        let log = ActivityLog::new(dir.path().join("watcher.log"));
        HttpClient::new(Duration::from_secs(5), log).unwrap()
    }

    #[tokio::test]
    async fn test_json_body_is_sent_and_response_decoded() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/echo")
                .header("x-test", "1")
                .json_body(json!({"hello": "world"}));
            then.status(200).json_body(json!({"ok": true}));
        });

        let dir = TempDir::new().unwrap();
        let mut headers = HeaderMap::new();
        headers.insert("x-test", "1".parse().unwrap());

        let value = client(&dir)
            .request(
                Method::POST,
                &server.url("/echo"),
                headers,
                Some(&json!({"hello": "world"})),
            )
            .await
            .unwrap();

        assert_eq!(value, json!({"ok": true}));
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn test_non_success_is_logged_and_returned() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/broken");
            then.status(502).body("upstream exploded");
        });

        let dir = TempDir::new().unwrap();
        let url = server.url("/broken");
        let err = client(&dir)
            .request(Method::GET, &url, HeaderMap::new(), None)
            .await
            .unwrap_err();

        match err {
            WatchError::Http {
                status,
                reason,
                body,
            } => {
                assert_eq!(status, 502);
                assert_eq!(reason, "Bad Gateway");
                assert_eq!(body, "upstream exploded");
            }
            other => panic!("expected Http error, got {:?}", other),
        }

        let log = std::fs::read_to_string(dir.path().join("watcher.log")).unwrap();
        assert!(log.contains(&format!("ERROR: HTTP 502 Bad Gateway for GET {}", url)));
        assert!(log.contains("Response body: upstream exploded"));
    }

    #[tokio::test]
    async fn test_non_standard_status_has_unknown_reason() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/odd");
            then.status(599).body("proxy gave up");
        });

        let dir = TempDir::new().unwrap();
        let url = server.url("/odd");
        let err = client(&dir)
            .request(Method::GET, &url, HeaderMap::new(), None)
            .await
            .unwrap_err();

        assert!(matches!(err, WatchError::Http { status: 599, .. }));
        let log = std::fs::read_to_string(dir.path().join("watcher.log")).unwrap();
        assert!(log.contains(&format!("ERROR: HTTP 599 Unknown for GET {}", url)));
    }

    #[tokio::test]
    async fn test_non_json_success_is_decode_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/html");
            then.status(200).body("<html></html>");
        });

        let dir = TempDir::new().unwrap();
        let err = client(&dir)
            .request(Method::GET, &server.url("/html"), HeaderMap::new(), None)
            .await
            .unwrap_err();

        assert!(matches!(err, WatchError::Decode(_)));
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_error() {
        let dir = TempDir::new().unwrap();
        // Port 9 (discard) on localhost is expected to refuse connections
        let err = client(&dir)
            .request(Method::GET, "http://127.0.0.1:9/", HeaderMap::new(), None)
            .await
            .unwrap_err();

        assert!(matches!(err, WatchError::Network(_)));
    }
}
