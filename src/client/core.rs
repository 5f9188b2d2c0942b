use crate::client::endpoint::Endpoint;
use crate::client::payload::PayloadBuilder;
use crate::client::policy::{Decision, PolicyEngine};
use crate::client::types::{AnswerStream, CancelHandle};
use crate::config::ClientConfig;
use crate::error::CancelReason;
use crate::pipeline::Decoder;
use crate::transport::HttpTransport;
use crate::types::{Message, QueryRequest, QueryResponse, ServiceStatus};
use crate::{Error, Result};
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

/// Client for the RAG question-answering service.
///
/// Cheap to clone; clones share the connection pool. The client does not
/// serialize concurrent queries: callers wanting "one outstanding query" cancel
/// the previous [`CancelHandle`] before issuing the next call.
#[derive(Clone)]
pub struct RagClient {
    pub(crate) config: Arc<ClientConfig>,
    pub(crate) transport: Arc<HttpTransport>,
    pub(crate) payload: PayloadBuilder,
    pub(crate) policy: PolicyEngine,
    pub(crate) decoder: Arc<dyn Decoder>,
}

impl RagClient {
    /// Create a client from an explicit configuration.
    pub fn new(config: ClientConfig) -> Result<Self> {
        crate::client::builder::RagClientBuilder::new()
            .config(config)
            .build()
    }

    /// Create a client configured from `RAG_*` environment variables.
    pub fn from_env() -> Result<Self> {
        crate::client::builder::RagClientBuilder::new().build()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Create a chat request builder.
    pub fn chat(&self) -> crate::client::chat::ChatRequestBuilder<'_> {
        crate::client::chat::ChatRequestBuilder::new(self)
    }

    /// Single-shot query for a transcript.
    pub async fn query(&self, messages: &[Message]) -> Result<QueryResponse> {
        self.chat().messages(messages.to_vec()).execute().await
    }

    /// Streaming query for a transcript.
    pub async fn query_stream(&self, messages: &[Message]) -> Result<AnswerStream> {
        self.chat().messages(messages.to_vec()).execute_stream().await
    }

    /// The request that would be sent for `messages`, without sending it.
    pub fn build_request(&self, messages: &[Message]) -> Result<QueryRequest> {
        self.payload.build(messages)
    }

    /// Fetch the service's health document (`GET /status`).
    pub async fn status(&self) -> Result<ServiceStatus> {
        self.status_with_cancel(&CancelHandle::new()).await
    }

    pub async fn status_with_cancel(&self, cancel: &CancelHandle) -> Result<ServiceStatus> {
        let request_id = Uuid::new_v4().to_string();
        let rid = request_id.as_str();
        let token = cancel.token();

        let (status, _) = self
            .run_with_retry(Endpoint::Status, token, move || {
                self.fetch_status_once(rid, token)
            })
            .await?;
        Ok(status)
    }

    /// Run `attempt` until it succeeds, fails terminally, or retries run out.
    ///
    /// Attempts are strictly sequential and the backoff wait completes before the
    /// next attempt starts. Returns the value and the number of retries performed.
    pub(crate) async fn run_with_retry<T, F, Fut>(
        &self,
        endpoint: Endpoint,
        cancel: &CancellationToken,
        mut attempt: F,
    ) -> Result<(T, u32)>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut failures: u32 = 0;
        loop {
            if cancel.is_cancelled() {
                return Err(Error::cancelled(CancelReason::Caller));
            }

            let err = match attempt().await {
                Ok(value) => return Ok((value, failures)),
                Err(err) => err,
            };
            failures += 1;

            match self.policy.decide(&err, failures) {
                Decision::Retry { delay } => {
                    warn!(
                        endpoint = endpoint.path(),
                        attempt = failures,
                        delay_ms = delay.as_millis() as u64,
                        http_status = err.status().unwrap_or(0),
                        error = %err,
                        "rag request failed, retrying"
                    );
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return Err(Error::cancelled(CancelReason::Caller)),
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
                Decision::Fail => {
                    info!(
                        endpoint = endpoint.path(),
                        attempts = failures,
                        http_status = err.status().unwrap_or(0),
                        retryable = err.is_retryable(),
                        error = %err,
                        "rag request failed"
                    );
                    return Err(self
                        .policy
                        .finalize(err, self.transport.base_url(), failures));
                }
            }
        }
    }
}

impl std::fmt::Debug for RagClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RagClient")
            .field("base_url", &self.transport.base_url())
            .field("max_retries", &self.policy.max_retries)
            .finish()
    }
}
