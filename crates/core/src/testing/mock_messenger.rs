//! Mock chat transport for testing.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::messaging::{ChatId, ConversationHost, MessagingError, Notifier};

/// What the mock delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentKind {
    Notification,
    Prompt,
}

/// A recorded outbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub chat: ChatId,
    pub text: String,
    pub kind: SentKind,
}

/// Records notifications and prompts instead of delivering them.
#[derive(Debug, Default, Clone)]
pub struct MockMessenger {
    sent: Arc<RwLock<Vec<SentMessage>>>,
    fail_sends: Arc<RwLock<bool>>,
}

impl MockMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every recorded message in delivery order.
    pub async fn sent(&self) -> Vec<SentMessage> {
        self.sent.read().await.clone()
    }

    /// Texts delivered through `Notifier`.
    pub async fn notifications(&self) -> Vec<String> {
        self.texts(SentKind::Notification).await
    }

    /// Texts delivered through `ConversationHost`.
    pub async fn prompts(&self) -> Vec<String> {
        self.texts(SentKind::Prompt).await
    }

    /// Text of the most recent message of either kind.
    pub async fn last_text(&self) -> Option<String> {
        self.sent.read().await.last().map(|m| m.text.clone())
    }

    pub async fn clear(&self) {
        self.sent.write().await.clear();
    }

    /// Make every subsequent delivery fail (nothing is recorded).
    pub async fn set_failing(&self, failing: bool) {
        *self.fail_sends.write().await = failing;
    }

    async fn texts(&self, kind: SentKind) -> Vec<String> {
        self.sent
            .read()
            .await
            .iter()
            .filter(|m| m.kind == kind)
            .map(|m| m.text.clone())
            .collect()
    }

    async fn record(&self, chat: ChatId, text: &str, kind: SentKind) -> Result<(), MessagingError> {
        if *self.fail_sends.read().await {
            return Err(MessagingError::Http("mock delivery failure".to_string()));
        }
        self.sent.write().await.push(SentMessage {
            chat,
            text: text.to_string(),
            kind,
        });
        Ok(())
    }
}

#[async_trait]
impl Notifier for MockMessenger {
    async fn send(&self, chat: ChatId, text: &str) -> Result<(), MessagingError> {
        self.record(chat, text, SentKind::Notification).await
    }
}

#[async_trait]
impl ConversationHost for MockMessenger {
    async fn prompt(&self, chat: ChatId, text: &str) -> Result<(), MessagingError> {
        self.record(chat, text, SentKind::Prompt).await
    }
}
