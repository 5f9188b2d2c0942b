//! # Types Module
//!
//! Wire and transcript types shared by the payload builder, the orchestrator and
//! callers.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Message`] | One transcript entry as the conversation layer stores it |
//! | [`QueryRequest`] | Body of `POST /query` and `POST /query/stream` |
//! | [`QueryResponse`] | Body of a successful `POST /query` |
//! | [`ServiceStatus`] | Body of `GET /status` |
//!
//! ## Example
//!
//! ```rust
//! use rag_chat_client::types::{Message, MessageRole};
//!
//! let greeting = Message::assistant("Hello! How can I help you today?").system_greeting();
//! let question = Message::user("What is the capital of France?");
//! assert_eq!(question.role, MessageRole::User);
//! assert!(greeting.is_system_greeting);
//! ```

pub mod message;
pub mod query;

pub use message::{Message, MessageRole};
pub use query::{
    HistoryEntry, HistoryRole, QueryRequest, QueryResponse, ServiceStatus, Source, TokenCount,
};
