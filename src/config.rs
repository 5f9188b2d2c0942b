//! Client configuration.
//!
//! All knobs consumed by the client live in one [`ClientConfig`] value. Resolution
//! order: explicit values → `RAG_*` environment variables → defaults.

use crate::{Error, ErrorContext, Result};
use serde::Deserialize;
use std::env;
use std::path::Path;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 1_000;
const DEFAULT_MAX_HISTORY: usize = 10;
const DEFAULT_MAX_MESSAGE_CHARS: usize = 4_000;

/// Welcome texts the UI seeds a conversation with. Matched exactly.
pub const DEFAULT_GREETINGS: &[&str] = &[
    "Hello! I'm your Civic Nexus assistant. Ask me anything about your documents.",
    "Hi! How can I help you today?",
    "Hello! How can I help you today?",
];

/// Fragments of known greeting variants. Matched as substrings.
pub const DEFAULT_GREETING_MARKERS: &[&str] = &["I'm your Civic Nexus assistant"];

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Root URL of the RAG service; endpoint paths are appended to it.
    pub base_url: String,
    /// Upper bound for one attempt, from sending the request to reading the full body.
    pub request_timeout_ms: u64,
    pub connect_timeout_ms: u64,
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay before retry `k` is `retry_base_delay_ms * 2^(k-1)`.
    pub retry_base_delay_ms: u64,
    /// Most recent history entries sent with a question.
    pub max_history: usize,
    /// Per-message clip length, in characters.
    pub max_message_chars: usize,
    pub greetings: Vec<String>,
    pub greeting_markers: Vec<String>,
    /// Bearer credential handed in by the session layer.
    pub api_token: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_base_delay_ms: DEFAULT_RETRY_BASE_DELAY_MS,
            max_history: DEFAULT_MAX_HISTORY,
            max_message_chars: DEFAULT_MAX_MESSAGE_CHARS,
            greetings: DEFAULT_GREETINGS.iter().map(|s| s.to_string()).collect(),
            greeting_markers: DEFAULT_GREETING_MARKERS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            api_token: None,
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|s| s.trim().parse::<T>().ok())
}

impl ClientConfig {
    /// Defaults overlaid with any `RAG_*` environment variables that are set and parse.
    pub fn from_env() -> Self {
        Self::default().merge_env()
    }

    /// Load a YAML file; missing keys take their defaults, then environment overrides apply.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::configuration_with_context(
                format!("Failed to read config file: {}", e),
                ErrorContext::new()
                    .with_details(path.display().to_string())
                    .with_source("config_loader"),
            )
        })?;
        Self::from_yaml_str(&raw).map(Self::merge_env)
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        serde_yaml::from_str(raw).map_err(|e| {
            Error::configuration_with_context(
                format!("Invalid config file: {}", e),
                ErrorContext::new().with_source("config_loader"),
            )
        })
    }

    fn merge_env(mut self) -> Self {
        if let Ok(url) = env::var("RAG_API_BASE_URL") {
            if !url.trim().is_empty() {
                self.base_url = url.trim().to_string();
            }
        }
        if let Some(v) = env_parse("RAG_TIMEOUT_MS") {
            self.request_timeout_ms = v;
        }
        if let Some(v) = env_parse("RAG_CONNECT_TIMEOUT_MS") {
            self.connect_timeout_ms = v;
        }
        if let Some(v) = env_parse("RAG_MAX_RETRIES") {
            self.max_retries = v;
        }
        if let Some(v) = env_parse("RAG_RETRY_BASE_DELAY_MS") {
            self.retry_base_delay_ms = v;
        }
        if let Some(v) = env_parse("RAG_MAX_HISTORY") {
            self.max_history = v;
        }
        if let Some(v) = env_parse("RAG_MAX_MESSAGE_CHARS") {
            self.max_message_chars = v;
        }
        if let Ok(token) = env::var("RAG_API_TOKEN") {
            if !token.trim().is_empty() {
                self.api_token = Some(token.trim().to_string());
            }
        }
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_max_retries(mut self, n: u32) -> Self {
        self.max_retries = n;
        self
    }

    pub fn with_retry_base_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay_ms = delay.as_millis() as u64;
        self
    }

    pub fn with_max_history(mut self, n: usize) -> Self {
        self.max_history = n;
        self
    }

    pub fn with_max_message_chars(mut self, n: usize) -> Self {
        self.max_message_chars = n;
        self
    }

    pub fn with_api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }

    /// Fail fast on values that would make every query fail.
    pub fn validate(&self) -> Result<()> {
        let parsed = url::Url::parse(&self.base_url).map_err(|e| {
            Error::configuration_with_context(
                format!("Invalid base URL '{}': {}", self.base_url, e),
                ErrorContext::new()
                    .with_field_path("config.base_url")
                    .with_source("config_validator"),
            )
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::configuration_with_context(
                format!("Unsupported URL scheme: {}", parsed.scheme()),
                ErrorContext::new()
                    .with_field_path("config.base_url")
                    .with_source("config_validator"),
            ));
        }
        if self.request_timeout_ms == 0 {
            return Err(Error::configuration_with_context(
                "request timeout must be greater than zero",
                ErrorContext::new()
                    .with_field_path("config.request_timeout_ms")
                    .with_source("config_validator"),
            ));
        }
        if self.max_message_chars == 0 {
            return Err(Error::configuration_with_context(
                "max_message_chars must be greater than zero",
                ErrorContext::new()
                    .with_field_path("config.max_message_chars")
                    .with_source("config_validator"),
            ));
        }
        Ok(())
    }
}
