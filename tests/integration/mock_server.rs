//! Mock HTTP server setup for integration tests

use mockito::{Matcher, Mock, Server, ServerGuard};
use rag_chat_client::{ClientConfig, RagClient, RagClientBuilder};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::net::TcpListener;
use tokio::sync::Mutex;

/// Test fixture that manages a mock server
pub struct MockServerFixture {
    pub server: Arc<Mutex<ServerGuard>>,
    pub base_url: String,
}

impl MockServerFixture {
    pub async fn new() -> Self {
        let server = Server::new_async().await;
        let base_url = server.url();
        Self {
            server: Arc::new(Mutex::new(server)),
            base_url,
        }
    }

    /// Client pointed at the mock server with short backoff so retry tests stay fast.
    pub fn create_test_client(&self, max_retries: u32) -> RagClient {
        client_for(&self.base_url, max_retries, Duration::from_secs(5))
    }

    /// Create a mock for a successful JSON response from `POST /query`
    pub async fn mock_answer(&self, body: &str) -> Mock {
        let mut server = self.server.lock().await;
        server
            .mock("POST", "/query")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await
    }

    /// Create a mock for an error response that is expected exactly `hits` times
    pub async fn mock_error_response(&self, path: &str, status: usize, body: &str, hits: usize) -> Mock {
        let mut server = self.server.lock().await;
        server
            .mock("POST", path)
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(body)
            .expect(hits)
            .create_async()
            .await
    }

    /// Create a mock for a streaming response; each line gets its own `\n`.
    pub async fn mock_stream(&self, lines: &[&str]) -> Mock {
        let mut server = self.server.lock().await;
        let body: String = lines.iter().map(|l| format!("{l}\n")).collect();
        server
            .mock("POST", "/query/stream")
            .match_body(Matcher::PartialJson(serde_json::json!({"stream": true})))
            .with_status(200)
            .with_header("content-type", "text/event-stream")
            .with_body(body)
            .create_async()
            .await
    }

    pub async fn mock_status(&self, status: usize, body: &str) -> Mock {
        let mut server = self.server.lock().await;
        server
            .mock("GET", "/status")
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await
    }
}

pub fn client_for(base_url: &str, max_retries: u32, timeout: Duration) -> RagClient {
    RagClientBuilder::new()
        .config(ClientConfig::default())
        .base_url_override(base_url)
        .max_retries(max_retries)
        .retry_base_delay(Duration::from_millis(20))
        .request_timeout(timeout)
        .build()
        .expect("test client")
}

/// A server that accepts connections, reads the request and never answers.
pub async fn spawn_hanging_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            tokio::spawn(async move {
                let mut buf = [0u8; 4096];
                while let Ok(n) = socket.read(&mut buf).await {
                    if n == 0 {
                        break;
                    }
                }
            });
        }
    });
    format!("http://{addr}")
}

/// An address nothing listens on.
pub async fn unused_address() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    format!("http://{addr}")
}
