use crate::transport::TransportError;
use std::fmt;
use thiserror::Error;

/// Structured error context for better error handling and debugging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    /// Field path that caused the error (e.g., "response.answer", "config.base_url")
    pub field_path: Option<String>,
    /// Additional context about the error (e.g., expected type, actual value)
    pub details: Option<String>,
    /// Source of the error (e.g., "response_validator", "config_loader")
    pub source: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self {
            field_path: None,
            details: None,
            source: None,
        }
    }

    pub fn with_field_path(mut self, path: impl Into<String>) -> Self {
        self.field_path = Some(path.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Why an in-flight call was abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// The caller fired its [`CancelHandle`](crate::CancelHandle).
    Caller,
    /// The per-attempt request timeout elapsed before the response completed.
    Timeout,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CancelReason::Caller => f.write_str("cancelled by caller"),
            CancelReason::Timeout => f.write_str("request timed out"),
        }
    }
}

/// Closed error taxonomy for the chat client.
///
/// Every failure that crosses the client boundary is one of these kinds, already
/// classified; callers match exhaustively instead of probing error strings.
#[derive(Debug, Error)]
pub enum Error {
    /// No usable user message was found in the transcript. Raised before any network call.
    #[error("No user message to send")]
    EmptyInput,

    /// The transport could not complete the exchange (refused connection, DNS, reset...).
    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<TransportError>,
    },

    /// The service answered with a non-success status.
    #[error("API error: HTTP {status}: {message}")]
    Api { status: u16, message: String },

    /// The service answered successfully but the body has the wrong shape.
    #[error("Validation error: {message}{}", format_context(.context))]
    Validation {
        message: String,
        context: ErrorContext,
    },

    /// The call was abandoned by the caller or by the request timeout.
    #[error("Request cancelled: {reason}")]
    Cancelled { reason: CancelReason },

    /// Invalid client configuration. Only raised while building a client.
    #[error("Configuration error: {message}{}", format_context(.context))]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    /// Catch-all for failures that are not one of the known kinds.
    #[error("Chat service error: {message}")]
    ChatService {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    },
}

// Helper function to format error context for display
fn format_context(ctx: &ErrorContext) -> String {
    let mut parts = Vec::new();
    if let Some(ref field) = ctx.field_path {
        parts.push(format!("field: {}", field));
    }
    if let Some(ref details) = ctx.details {
        parts.push(format!("details: {}", details));
    }
    if let Some(ref source) = ctx.source {
        parts.push(format!("source: {}", source));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

impl Error {
    pub fn network(msg: impl Into<String>, source: TransportError) -> Self {
        Error::Network {
            message: msg.into(),
            source: Some(source),
        }
    }

    pub fn api(status: u16, msg: impl Into<String>) -> Self {
        Error::Api {
            status,
            message: msg.into(),
        }
    }

    pub fn cancelled(reason: CancelReason) -> Self {
        Error::Cancelled { reason }
    }

    /// Create a new validation error with structured context
    pub fn validation_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Validation {
            message: msg.into(),
            context,
        }
    }

    /// Create a new configuration error with structured context
    pub fn configuration_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Configuration {
            message: msg.into(),
            context,
        }
    }

    pub fn chat_service(
        msg: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
    ) -> Self {
        Error::ChatService {
            message: msg.into(),
            source: Some(source.into()),
        }
    }

    /// HTTP status carried by the error, if the server produced one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether another attempt may succeed.
    ///
    /// - `Api`: 408, 429 and any 5xx
    /// - `Network`: always
    /// - everything else: never
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Api { status, .. } => *status >= 500 || *status == 429 || *status == 408,
            Error::Network { .. } => true,
            Error::EmptyInput
            | Error::Validation { .. }
            | Error::Cancelled { .. }
            | Error::Configuration { .. }
            | Error::ChatService { .. } => false,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled { .. })
    }

    /// Extract error context if available
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::Validation { context, .. } | Error::Configuration { context, .. } => {
                Some(context)
            }
            _ => None,
        }
    }

    /// A sentence suitable for showing in a chat bubble.
    pub fn user_message(&self) -> String {
        match self {
            Error::EmptyInput => "Please enter a message before sending.".to_string(),
            Error::Network { message, .. } => message.clone(),
            Error::Api { status: 429, .. } => {
                "The service is busy right now. Please try again in a moment.".to_string()
            }
            Error::Api { status, message } if *status >= 500 => {
                format!("The service is temporarily unavailable ({}). {}", status, message)
            }
            Error::Api { message, .. } => message.clone(),
            Error::Validation { .. } => {
                "The service returned an unexpected response.".to_string()
            }
            Error::Cancelled {
                reason: CancelReason::Caller,
            } => "Request was cancelled.".to_string(),
            Error::Cancelled {
                reason: CancelReason::Timeout,
            } => "The request took too long and was cancelled.".to_string(),
            Error::Configuration { message, .. } => message.clone(),
            Error::ChatService { .. } => {
                "Something went wrong while contacting the service.".to_string()
            }
        }
    }
}
