//! Trait definitions for the messaging module.

use async_trait::async_trait;
use thiserror::Error;
use tracing::warn;

use super::types::ChatId;

/// Errors that can occur while talking to the chat service.
#[derive(Debug, Error)]
pub enum MessagingError {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Chat API error {code}: {description}")]
    Api { code: i32, description: String },

    #[error("Request timeout")]
    Timeout,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Sink for human-readable progress and result messages.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Delivers `text` to `chat`.
    async fn send(&self, chat: ChatId, text: &str) -> Result<(), MessagingError>;

    /// Delivers `text`, logging instead of returning a failure.
    async fn notify(&self, chat: ChatId, text: &str) {
        if let Err(e) = self.send(chat, text).await {
            warn!(chat = %chat, error = %e, "Failed to deliver notification");
        }
    }
}

/// Asks a user for the next free-text reply of a conversation.
///
/// The reply itself comes back through the dispatcher as a regular message.
#[async_trait]
pub trait ConversationHost: Send + Sync {
    async fn prompt(&self, chat: ChatId, text: &str) -> Result<(), MessagingError>;

    /// Prompts, logging instead of returning a failure.
    async fn ask(&self, chat: ChatId, text: &str) {
        if let Err(e) = self.prompt(chat, text).await {
            warn!(chat = %chat, error = %e, "Failed to deliver prompt");
        }
    }
}
