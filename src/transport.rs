//! HTTP transport: one network attempt per call, nothing more.
//!
//! Retry and fallback decisions live in the client policy layer.

pub mod http;

pub use http::HttpTransport;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transport error: {0}")]
    Other(String),
}
