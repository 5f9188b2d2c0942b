//! Turns a transcript into a [`QueryRequest`].

use crate::config::ClientConfig;
use crate::types::{HistoryEntry, HistoryRole, Message, MessageRole, QueryRequest};
use crate::{Error, Result};
use std::collections::BTreeMap;

/// Builds backend requests from transcripts.
///
/// The newest user message becomes the question; the rest of the transcript,
/// minus greetings, system/error bubbles and blank entries, becomes the history
/// window, clipped to the newest `max_history` entries.
#[derive(Debug, Clone)]
pub struct PayloadBuilder {
    max_history: usize,
    max_message_chars: usize,
    greetings: Vec<String>,
    greeting_markers: Vec<String>,
}

impl PayloadBuilder {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            max_history: config.max_history,
            max_message_chars: config.max_message_chars,
            greetings: config.greetings.clone(),
            greeting_markers: config.greeting_markers.clone(),
        }
    }

    pub fn build(&self, messages: &[Message]) -> Result<QueryRequest> {
        self.build_with_context(messages, None, None)
    }

    pub fn build_with_context(
        &self,
        messages: &[Message],
        system_context: Option<&str>,
        user_context: Option<&BTreeMap<String, String>>,
    ) -> Result<QueryRequest> {
        let current = messages
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::User)
            .ok_or(Error::EmptyInput)?;

        let question = self.sanitize(&current.content);
        if question.is_empty() {
            return Err(Error::EmptyInput);
        }

        let eligible: Vec<HistoryEntry> = messages
            .iter()
            .filter(|m| m.id != current.id)
            .filter(|m| !m.is_system_greeting && !m.is_error)
            .filter(|m| !self.is_greeting(&m.content))
            .filter_map(|m| {
                let role = match m.role {
                    MessageRole::User => HistoryRole::User,
                    MessageRole::Assistant => HistoryRole::Assistant,
                    MessageRole::System => return None,
                };
                let content = self.sanitize(&m.content);
                if content.is_empty() {
                    return None;
                }
                Some(HistoryEntry { role, content })
            })
            .collect();

        let skip = eligible.len().saturating_sub(self.max_history);
        let chat_history: Vec<HistoryEntry> = eligible.into_iter().skip(skip).collect();

        let system_context = system_context
            .map(|s| self.sanitize(s))
            .filter(|s| !s.is_empty());
        let user_context = user_context.filter(|m| !m.is_empty()).cloned();

        Ok(QueryRequest {
            question,
            system_context,
            user_context,
            chat_history,
            stream: None,
        })
    }

    /// Exact match against the greeting set, or containment of a known variant marker.
    pub fn is_greeting(&self, content: &str) -> bool {
        self.greetings.iter().any(|g| g == content)
            || self
                .greeting_markers
                .iter()
                .any(|marker| !marker.is_empty() && content.contains(marker.as_str()))
    }

    fn sanitize(&self, text: &str) -> String {
        let trimmed = text.trim();
        match trimmed.char_indices().nth(self.max_message_chars) {
            Some((cut, _)) => trimmed[..cut].trim_end().to_string(),
            None => trimmed.to_string(),
        }
    }
}
