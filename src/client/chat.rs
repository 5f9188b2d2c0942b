use crate::client::endpoint::Endpoint;
use crate::client::types::{AnswerStream, CallStats, CancelHandle};
use crate::client::validation::classify_error;
use crate::types::{Message, QueryRequest, QueryResponse};
use crate::{Error, Result};
use futures::StreamExt;
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

use super::core::RagClient;

/// Builder for one question to the service.
///
/// The outgoing request is derived from the transcript: the last user message
/// becomes the question and the preceding turns (minus greetings, errors and
/// system entries) become the history.
pub struct ChatRequestBuilder<'a> {
    pub(crate) client: &'a RagClient,
    pub(crate) messages: Vec<Message>,
    pub(crate) system_context: Option<String>,
    pub(crate) user_context: Option<BTreeMap<String, String>>,
    pub(crate) cancel: Option<CancelHandle>,
}

impl<'a> ChatRequestBuilder<'a> {
    pub(crate) fn new(client: &'a RagClient) -> Self {
        Self {
            client,
            messages: Vec::new(),
            system_context: None,
            user_context: None,
            cancel: None,
        }
    }

    /// Replace the transcript.
    pub fn messages(mut self, messages: Vec<Message>) -> Self {
        self.messages = messages;
        self
    }

    /// Append one message to the transcript.
    pub fn message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    pub fn system_context(mut self, context: impl Into<String>) -> Self {
        self.system_context = Some(context.into());
        self
    }

    /// Add one key to the free-form user context object.
    pub fn user_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.user_context
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn user_context_map(mut self, context: BTreeMap<String, String>) -> Self {
        self.user_context = Some(context);
        self
    }

    /// Use a caller-owned cancellation handle instead of a fresh one.
    pub fn cancel_handle(mut self, cancel: CancelHandle) -> Self {
        self.cancel = Some(cancel);
        self
    }

    fn build_request(&self) -> Result<QueryRequest> {
        self.client.payload.build_with_context(
            &self.messages,
            self.system_context.as_deref(),
            self.user_context.as_ref(),
        )
    }

    fn encode(request: &QueryRequest) -> Result<serde_json::Value> {
        serde_json::to_value(request)
            .map_err(|e| Error::chat_service("Failed to encode request", e))
    }

    /// Execute a single-shot query.
    pub async fn execute(self) -> Result<QueryResponse> {
        let (response, _) = self.execute_with_stats().await?;
        Ok(response)
    }

    /// Execute a single-shot query and return per-call stats.
    pub async fn execute_with_stats(self) -> Result<(QueryResponse, CallStats)> {
        let request = self.build_request()?;
        let body = Self::encode(&request)?;
        let cancel = self.cancel.unwrap_or_default();
        let client = self.client;

        let request_id = Uuid::new_v4().to_string();
        let started = Instant::now();
        let body_ref = &body;
        let rid = request_id.as_str();
        let token = cancel.token();

        let ((response, http_status), retry_count) = client
            .run_with_retry(Endpoint::Query, token, move || {
                client.execute_once(body_ref, rid, token)
            })
            .await?;

        let stats = CallStats {
            endpoint: Endpoint::Query.path().to_string(),
            http_status,
            retry_count,
            duration_ms: started.elapsed().as_millis(),
            client_request_id: request_id,
        };
        info!(
            endpoint = %stats.endpoint,
            http_status = stats.http_status,
            retry_count = stats.retry_count,
            duration_ms = stats.duration_ms as u64,
            client_request_id = %stats.client_request_id,
            history = request.chat_history.len(),
            "rag query completed"
        );
        Ok((response, stats))
    }

    /// Open a streaming query.
    ///
    /// Retries apply only while opening the stream. Once the stream is returned,
    /// a failure ends it and is not retried, so no fragment is ever delivered twice.
    pub async fn execute_stream(self) -> Result<AnswerStream> {
        let request = self.build_request()?.streaming();
        let body = Self::encode(&request)?;
        let cancel = self.cancel.unwrap_or_default();
        let client = self.client;

        let request_id = Uuid::new_v4().to_string();
        let started = Instant::now();
        let body_ref = &body;
        let rid = request_id.as_str();
        let token = cancel.token();

        let ((fragments, http_status), retry_count) = client
            .run_with_retry(Endpoint::QueryStream, token, move || {
                client.execute_stream_once(body_ref, rid, token)
            })
            .await?;

        let stats = CallStats {
            endpoint: Endpoint::QueryStream.path().to_string(),
            http_status,
            retry_count,
            duration_ms: started.elapsed().as_millis(),
            client_request_id: request_id,
        };
        info!(
            endpoint = %stats.endpoint,
            http_status = stats.http_status,
            retry_count = stats.retry_count,
            duration_ms = stats.duration_ms as u64,
            client_request_id = %stats.client_request_id,
            "rag stream opened"
        );
        Ok(AnswerStream::new(fragments, cancel, stats))
    }

    /// Stream the answer, handing each fragment to `on_fragment` as it arrives.
    ///
    /// Returns the concatenated answer. An error from the callback stops reading
    /// (releasing the connection) and is returned classified.
    pub async fn execute_stream_with<F>(self, mut on_fragment: F) -> Result<String>
    where
        F: FnMut(&str) -> anyhow::Result<()>,
    {
        let mut stream = self.execute_stream().await?;
        let mut answer = String::new();
        while let Some(fragment) = stream.next().await {
            let fragment = fragment?;
            on_fragment(&fragment).map_err(classify_error)?;
            answer.push_str(&fragment);
        }
        debug!(chars = answer.chars().count(), "rag stream finished");
        Ok(answer)
    }
}
