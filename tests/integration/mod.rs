//! Integration tests with mock HTTP server

pub mod cancellation;
pub mod mock_server;
pub mod query;
pub mod status;
pub mod streaming;
