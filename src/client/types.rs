use crate::error::CancelReason;
use crate::{BoxStream, Error, Result};
use futures::{Stream, StreamExt};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio_util::sync::CancellationToken;

/// Per-call diagnostics.
#[derive(Debug, Clone)]
pub struct CallStats {
    pub endpoint: String,
    pub http_status: u16,
    /// Retries performed before the successful attempt.
    pub retry_count: u32,
    pub duration_ms: u128,
    /// Sent to the service as `x-request-id`.
    pub client_request_id: String,
}

/// Caller-side cancellation for an in-flight query or stream.
///
/// Cloning yields a handle to the same signal. Cancelling aborts the current
/// attempt (or backoff wait, or stream read); results already returned are
/// unaffected.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    token: CancellationToken,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub(crate) fn token(&self) -> &CancellationToken {
        &self.token
    }
}

/// Stream of answer fragments from `POST /query/stream`.
///
/// Yields `Ok(fragment)` items in order and ends after the end marker or end of
/// body. A body failure or cancellation yields one `Err` and then ends. The
/// underlying response body is dropped the moment the stream terminates, or when
/// this value is dropped, whichever comes first.
pub struct AnswerStream {
    inner: Option<BoxStream<'static, String>>,
    cancelled: Pin<Box<dyn Future<Output = ()> + Send>>,
    cancel: CancelHandle,
    stats: CallStats,
}

impl AnswerStream {
    pub(crate) fn new(inner: BoxStream<'static, String>, cancel: CancelHandle, stats: CallStats) -> Self {
        let token = cancel.token().clone();
        Self {
            inner: Some(inner),
            cancelled: Box::pin(async move { token.cancelled().await }),
            cancel,
            stats,
        }
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Stats of the attempt that opened the stream.
    pub fn stats(&self) -> &CallStats {
        &self.stats
    }

    /// Whether the response body is still held.
    pub fn is_open(&self) -> bool {
        self.inner.is_some()
    }

    /// Drain the stream and concatenate all fragments.
    pub async fn collect_answer(mut self) -> Result<String> {
        let mut answer = String::new();
        while let Some(fragment) = self.next().await {
            answer.push_str(&fragment?);
        }
        Ok(answer)
    }
}

impl Stream for AnswerStream {
    type Item = Result<String>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.inner.is_none() {
            return Poll::Ready(None);
        }

        if this.cancelled.as_mut().poll(cx).is_ready() {
            this.inner = None;
            return Poll::Ready(Some(Err(Error::cancelled(CancelReason::Caller))));
        }

        let polled = match this.inner.as_mut() {
            Some(inner) => inner.as_mut().poll_next(cx),
            None => return Poll::Ready(None),
        };

        match polled {
            Poll::Ready(None) => {
                this.inner = None;
                Poll::Ready(None)
            }
            Poll::Ready(Some(Err(e))) => {
                this.inner = None;
                Poll::Ready(Some(Err(e)))
            }
            other => other,
        }
    }
}

impl std::fmt::Debug for AnswerStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnswerStream")
            .field("open", &self.inner.is_some())
            .field("cancelled", &self.cancel.is_cancelled())
            .field("stats", &self.stats)
            .finish()
    }
}
