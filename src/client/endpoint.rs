//! Service endpoints

use reqwest::Method;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// `POST /query` → one JSON answer.
    Query,
    /// `POST /query/stream` → `data: {"chunk": ...}` lines.
    QueryStream,
    /// `GET /status` → backend health document.
    Status,
}

impl Endpoint {
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::Query => "/query",
            Endpoint::QueryStream => "/query/stream",
            Endpoint::Status => "/status",
        }
    }

    pub fn method(self) -> Method {
        match self {
            Endpoint::Query | Endpoint::QueryStream => Method::POST,
            Endpoint::Status => Method::GET,
        }
    }
}
