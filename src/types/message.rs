//! Transcript messages as the conversation layer stores them.

use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Opaque identifier, unique within a transcript.
    pub id: String,
    pub role: MessageRole,
    pub content: String,
    pub created_at: SystemTime,
    /// The canned welcome bubble the UI seeds a conversation with.
    #[serde(default)]
    pub is_system_greeting: bool,
    /// A rendered error bubble rather than a real answer.
    #[serde(default)]
    pub is_error: bool,
}

impl Message {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            created_at: SystemTime::now(),
            is_system_greeting: false,
            is_error: false,
        }
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::new(MessageRole::System, text)
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(MessageRole::User, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, text)
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn system_greeting(mut self) -> Self {
        self.is_system_greeting = true;
        self
    }

    pub fn error(mut self) -> Self {
        self.is_error = true;
        self
    }
}

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}
