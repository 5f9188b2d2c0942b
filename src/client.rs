//! Chat client for the RAG question-answering service.
//!
//! The public surface is [`RagClient`] plus its builders; request shaping, retry
//! policy and per-attempt execution are split into submodules under `src/client/`.

pub mod builder;
pub mod chat;
pub mod core;
pub mod endpoint;
mod execution;
pub mod payload;
mod policy;
pub mod types;
pub mod validation;

pub use builder::RagClientBuilder;
pub use chat::ChatRequestBuilder;
pub use core::RagClient;
pub use endpoint::Endpoint;
pub use payload::PayloadBuilder;
pub use types::{AnswerStream, CallStats, CancelHandle};
pub use validation::classify_error;
