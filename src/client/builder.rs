use crate::client::core::RagClient;
use crate::client::payload::PayloadBuilder;
use crate::client::policy::PolicyEngine;
use crate::config::ClientConfig;
use crate::pipeline::{Decoder, SseDecoder};
use crate::transport::HttpTransport;
use crate::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Builder for creating clients with custom configuration.
///
/// Without an explicit [`config`](Self::config) the builder starts from
/// [`ClientConfig::from_env`]; individual overrides are applied on top.
pub struct RagClientBuilder {
    config: Option<ClientConfig>,
    /// Override base URL (primarily for testing with mock servers)
    base_url_override: Option<String>,
    api_token: Option<String>,
    max_retries: Option<u32>,
    retry_base_delay: Option<Duration>,
    request_timeout: Option<Duration>,
    decoder: Option<Arc<dyn Decoder>>,
}

impl RagClientBuilder {
    pub fn new() -> Self {
        Self {
            config: None,
            base_url_override: None,
            api_token: None,
            max_retries: None,
            retry_base_delay: None,
            request_timeout: None,
            decoder: None,
        }
    }

    /// Start from an explicit configuration instead of the environment.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn base_url_override(mut self, base_url: impl Into<String>) -> Self {
        self.base_url_override = Some(base_url.into());
        self
    }

    pub fn api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.max_retries = Some(n);
        self
    }

    pub fn retry_base_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = Some(delay);
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Replace the stream decoder (defaults to [`SseDecoder`]).
    pub fn decoder(mut self, decoder: Arc<dyn Decoder>) -> Self {
        self.decoder = Some(decoder);
        self
    }

    /// Build the client. Fails with [`Error::Configuration`](crate::Error::Configuration)
    /// when the resulting configuration is invalid.
    pub fn build(self) -> Result<RagClient> {
        let mut config = self.config.unwrap_or_else(ClientConfig::from_env);

        if let Some(url) = self.base_url_override {
            config = config.with_base_url(url);
        }
        if let Some(token) = self.api_token {
            config = config.with_api_token(token);
        }
        if let Some(n) = self.max_retries {
            config = config.with_max_retries(n);
        }
        if let Some(delay) = self.retry_base_delay {
            config = config.with_retry_base_delay(delay);
        }
        if let Some(timeout) = self.request_timeout {
            config = config.with_request_timeout(timeout);
        }

        config.validate()?;

        let transport = Arc::new(HttpTransport::new(&config)?);
        let payload = PayloadBuilder::new(&config);
        let policy = PolicyEngine::new(&config);
        let decoder = self
            .decoder
            .unwrap_or_else(|| Arc::new(SseDecoder::default()));

        debug!(
            base_url = %config.base_url,
            max_retries = config.max_retries,
            timeout_ms = config.request_timeout_ms,
            "rag client configured"
        );

        Ok(RagClient {
            config: Arc::new(config),
            transport,
            payload,
            policy,
            decoder,
        })
    }
}

impl Default for RagClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
