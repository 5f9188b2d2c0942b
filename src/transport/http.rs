use crate::config::ClientConfig;
use crate::error::CancelReason;
use crate::transport::TransportError;
use crate::{BoxStream, Error, Result};
use bytes::Bytes;
use futures::TryStreamExt;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub(crate) const JSON: &str = "application/json";
pub(crate) const EVENT_STREAM: &str = "text/event-stream";

pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    api_token: Option<String>,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        // Whole-request deadlines are enforced per attempt (see `guarded`), so the
        // reqwest client only carries the connect timeout.
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout())
            .pool_idle_timeout(Some(Duration::from_secs(90)))
            .build()
            .map_err(|e| {
                Error::configuration_with_context(
                    "Failed to build HTTP client",
                    crate::ErrorContext::new()
                        .with_details(e.to_string())
                        .with_source("http_transport"),
                )
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone(),
            timeout: config.request_timeout(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn endpoint_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// One request/response exchange. Returns the status and the full body of a
    /// successful response; non-success statuses become [`Error::Api`].
    ///
    /// The timeout covers sending, waiting for headers and reading the body.
    pub async fn execute_json(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
        request_id: &str,
        cancel: &CancellationToken,
    ) -> Result<(u16, Bytes)> {
        let url = self.endpoint_url(path);
        self.guarded(cancel, async {
            let resp = self.send(method, &url, body, JSON, request_id).await?;
            let resp = Self::check_status(resp).await?;
            let status = resp.status().as_u16();
            let bytes = resp.bytes().await.map_err(|e| {
                Error::network(
                    format!("Connection dropped while reading response from {}", url),
                    TransportError::Http(e),
                )
            })?;
            Ok((status, bytes))
        })
        .await
    }

    /// Open a streaming response. The timeout covers only the wait for response
    /// headers; the returned body is governed by the caller's cancellation token.
    pub async fn execute_stream(
        &self,
        path: &str,
        body: &serde_json::Value,
        request_id: &str,
        cancel: &CancellationToken,
    ) -> Result<(u16, BoxStream<'static, Bytes>)> {
        let url = self.endpoint_url(path);
        self.guarded(cancel, async {
            let resp = self
                .send(Method::POST, &url, Some(body), EVENT_STREAM, request_id)
                .await?;
            let resp = Self::check_status(resp).await?;
            let status = resp.status().as_u16();
            let byte_stream: BoxStream<'static, Bytes> =
                Box::pin(resp.bytes_stream().map_err(|e| {
                    Error::network("Stream interrupted", TransportError::Http(e))
                }));
            Ok((status, byte_stream))
        })
        .await
    }

    async fn send(
        &self,
        method: Method,
        url: &str,
        body: Option<&serde_json::Value>,
        accept: &str,
        request_id: &str,
    ) -> Result<reqwest::Response> {
        let mut req = self
            .client
            .request(method, url)
            .header(ACCEPT, accept)
            .header("x-request-id", request_id);

        if let Some(body) = body {
            req = req.header(CONTENT_TYPE, JSON).json(body);
        }

        if let Some(token) = &self.api_token {
            req = req.bearer_auth(token);
        }

        req.send().await.map_err(|e| {
            let what = if e.is_timeout() {
                "Connection timed out"
            } else if e.is_connect() {
                "Could not connect"
            } else {
                "Request failed"
            };
            Error::network(format!("{} to {}", what, url), TransportError::Http(e))
        })
    }

    async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(Error::api(status.as_u16(), error_message_from_body(status, &body)))
    }

    /// Race an attempt against the caller's token and the request timeout.
    ///
    /// Dropping the losing future aborts the in-flight request and releases its
    /// connection. A caller cancel wins over a timeout that fires in the same poll.
    async fn guarded<T>(
        &self,
        cancel: &CancellationToken,
        attempt: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(Error::cancelled(CancelReason::Caller)),
            _ = tokio::time::sleep(self.timeout) => Err(Error::cancelled(CancelReason::Timeout)),
            result = attempt => result,
        }
    }
}

/// Pull a readable message out of an error body.
///
/// Accepts `{"error": "..."}`, `{"error": {"message": "..."}}` and FastAPI's
/// `{"detail": ...}`; anything else falls back to `HTTP <status>: <reason>`.
pub(crate) fn error_message_from_body(status: StatusCode, body: &str) -> String {
    let fallback = || {
        format!(
            "HTTP {}: {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("Unknown Status")
        )
    };

    let json: serde_json::Value = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(_) => return fallback(),
    };

    let from_field = |v: &serde_json::Value| -> Option<String> {
        match v {
            serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            serde_json::Value::Object(map) => map
                .get("message")
                .and_then(|m| m.as_str())
                .map(|s| s.to_string()),
            serde_json::Value::Null => None,
            serde_json::Value::String(_) => None,
            other => Some(other.to_string()),
        }
    };

    json.get("error")
        .and_then(from_field)
        .or_else(|| json.get("detail").and_then(from_field))
        .unwrap_or_else(fallback)
}
