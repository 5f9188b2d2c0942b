//! 请求执行逻辑：单次尝试的流式与非流式请求执行。
//!
//! Request execution logic (single-attempt). Retry loops live in the caller.

use crate::client::endpoint::Endpoint;
use crate::client::validation::{validate_query_response, validate_status_response};
use crate::types::{QueryResponse, ServiceStatus};
use crate::{BoxStream, Result};
use tokio_util::sync::CancellationToken;

use super::core::RagClient;

impl RagClient {
    /// One `POST /query` exchange: send, check status, validate the body.
    pub(crate) async fn execute_once(
        &self,
        body: &serde_json::Value,
        request_id: &str,
        cancel: &CancellationToken,
    ) -> Result<(QueryResponse, u16)> {
        let (status, bytes) = self
            .transport
            .execute_json(
                Endpoint::Query.method(),
                Endpoint::Query.path(),
                Some(body),
                request_id,
                cancel,
            )
            .await?;
        let response = validate_query_response(&bytes)?;
        Ok((response, status))
    }

    /// Open `POST /query/stream` and attach the fragment decoder.
    ///
    /// Succeeds once response headers arrive with a success status; nothing of the
    /// body has been read yet.
    pub(crate) async fn execute_stream_once(
        &self,
        body: &serde_json::Value,
        request_id: &str,
        cancel: &CancellationToken,
    ) -> Result<(BoxStream<'static, String>, u16)> {
        let (status, bytes) = self
            .transport
            .execute_stream(Endpoint::QueryStream.path(), body, request_id, cancel)
            .await?;
        let fragments = self.decoder.decode_stream(bytes).await?;
        Ok((fragments, status))
    }

    /// One `GET /status` exchange.
    pub(crate) async fn fetch_status_once(
        &self,
        request_id: &str,
        cancel: &CancellationToken,
    ) -> Result<ServiceStatus> {
        let (_, bytes) = self
            .transport
            .execute_json(
                Endpoint::Status.method(),
                Endpoint::Status.path(),
                None,
                request_id,
                cancel,
            )
            .await?;
        validate_status_response(&bytes)
    }
}
