//! Identity and message types shared by the chat-facing modules.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Telegram user id of the person sending a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for UserId {
    fn from(id: i64) -> Self {
        UserId(id)
    }
}

/// Chat a reply should be delivered to.
///
/// Equal to the user id in private chats, distinct in groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(pub i64);

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A text message received from a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub user_id: UserId,
    pub username: Option<String>,
    pub chat_id: ChatId,
    pub text: String,
}

impl InboundMessage {
    /// Creates a message in the private chat of `user_id`.
    pub fn private(user_id: i64, text: impl Into<String>) -> Self {
        Self {
            user_id: UserId(user_id),
            username: None,
            chat_id: ChatId(user_id),
            text: text.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_private_message_uses_user_as_chat() {
        let msg = InboundMessage::private(42, "/status");
        assert_eq!(msg.user_id, UserId(42));
        assert_eq!(msg.chat_id, ChatId(42));
        assert_eq!(msg.text, "/status");
    }

    #[test]
    fn test_ids_serialize_transparently() {
        assert_eq!(serde_json::to_string(&UserId(7)).unwrap(), "7");
        assert_eq!(serde_json::from_str::<ChatId>("-100").unwrap(), ChatId(-100));
    }
}
