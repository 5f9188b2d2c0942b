//! # rag-chat-client
//!
//! 面向 RAG 问答服务的异步聊天客户端。
//!
//! Async chat client for a retrieval-augmented question-answering service.
//!
//! ## Overview
//!
//! A conversation transcript goes in, an answer comes out. The client picks the
//! newest user message as the question, attaches a bounded window of prior turns
//! as history, and calls the service either single-shot (`POST /query`) or as a
//! stream of answer fragments (`POST /query/stream`).
//!
//! - **Bounded history**: greetings, error bubbles and system entries never reach
//!   the service; the window keeps only the newest `max_history` turns
//! - **Retries**: transient failures retry with exponential backoff, client errors
//!   fail immediately
//! - **Cancellation**: every call can be abandoned through a [`CancelHandle`]; the
//!   connection is released as soon as a call or stream ends
//! - **Closed errors**: every failure is one [`Error`] variant
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rag_chat_client::{Message, RagClientBuilder};
//!
//! #[tokio::main]
//! async fn main() -> rag_chat_client::Result<()> {
//!     let client = RagClientBuilder::new()
//!         .base_url_override("http://127.0.0.1:8000")
//!         .build()?;
//!
//!     let transcript = vec![
//!         Message::assistant("Hi! How can I help you today?").system_greeting(),
//!         Message::user("What is the capital of France?"),
//!     ];
//!
//!     let answer = client.query(&transcript).await?;
//!     println!("{}", answer.answer);
//!
//!     // Streaming response
//!     let text = client
//!         .chat()
//!         .messages(transcript)
//!         .execute_stream_with(|fragment| {
//!             print!("{fragment}");
//!             Ok(())
//!         })
//!         .await?;
//!     assert!(!text.is_empty());
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | Client, builders, request shaping and retry policy |
//! | [`config`] | Configuration from defaults, YAML and `RAG_*` environment variables |
//! | [`pipeline`] | Decoding of the streaming response body |
//! | [`transport`] | HTTP exchange with per-attempt timeout and cancellation |
//! | [`types`] | Transcript messages and wire types |
//! | [`error`] | Error taxonomy |

pub mod client;
pub mod config;
pub mod pipeline;
pub mod transport;
pub mod types;

// Re-export main types for convenience
pub use client::{
    classify_error, AnswerStream, CallStats, CancelHandle, ChatRequestBuilder, RagClient,
    RagClientBuilder,
};
pub use config::ClientConfig;
pub use types::{
    HistoryEntry, HistoryRole, Message, MessageRole, QueryRequest, QueryResponse, ServiceStatus,
    Source, TokenCount,
};

use futures::Stream;
use std::pin::Pin;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// A specialized Result for pipeline operations
pub type PipeResult<T> = std::result::Result<T, Error>;

/// A unified pinned, boxed stream that emits `PipeResult<T>`
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = PipeResult<T>> + Send + 'a>>;

/// Error type for the library
pub mod error;
pub use error::{CancelReason, Error, ErrorContext};
