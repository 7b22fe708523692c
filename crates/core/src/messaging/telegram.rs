//! Telegram Bot API client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

use crate::config::TelegramConfig;

use super::{ChatId, ConversationHost, InboundMessage, MessagingError, Notifier, UserId};

/// Maximum length of a single `sendMessage` text.
pub const MAX_MESSAGE_LEN: usize = 4096;

/// Extra time granted to the HTTP client on top of the long poll timeout.
const POLL_GRACE_SECS: u64 = 10;

/// Telegram Bot API client used both for polling and for replies.
pub struct TelegramClient {
    client: Client,
    /// `<api_url>/bot<token>`. Contains the token, never log it.
    endpoint: String,
    poll_timeout_secs: u32,
}

impl TelegramClient {
    /// Create a new Telegram client.
    pub fn new(config: &TelegramConfig) -> Result<Self, MessagingError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(
                config.poll_timeout_secs as u64 + POLL_GRACE_SECS,
            ))
            .build()
            .map_err(|e| MessagingError::Http(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: format!(
                "{}/bot{}",
                config.api_url.trim_end_matches('/'),
                config.token
            ),
            poll_timeout_secs: config.poll_timeout_secs,
        })
    }

    /// Call a Bot API method with a JSON body.
    async fn call<B, T>(&self, method: &str, body: &B) -> Result<T, MessagingError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}/{}", self.endpoint, method);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    MessagingError::Timeout
                } else {
                    // Strip the URL: it carries the bot token.
                    MessagingError::Http(e.without_url().to_string())
                }
            })?;

        let body = response
            .text()
            .await
            .map_err(|e| MessagingError::Http(e.without_url().to_string()))?;

        let parsed: ApiResponse<T> = serde_json::from_str(&body)
            .map_err(|e| MessagingError::InvalidResponse(e.to_string()))?;

        parsed.into_result()
    }

    /// Long-poll for new updates starting at `offset`.
    pub async fn get_updates(&self, offset: Option<i64>) -> Result<Vec<Update>, MessagingError> {
        let request = GetUpdatesRequest {
            offset,
            timeout: self.poll_timeout_secs,
            allowed_updates: &["message"],
        };
        let updates: Vec<Update> = self.call("getUpdates", &request).await?;
        if !updates.is_empty() {
            debug!(count = updates.len(), "Received Telegram updates");
        }
        Ok(updates)
    }

    /// Send a text message, split into as many messages as the length limit requires.
    pub async fn send_message(&self, chat: ChatId, text: &str) -> Result<(), MessagingError> {
        for chunk in split_message(text, MAX_MESSAGE_LEN) {
            let request = SendMessageRequest {
                chat_id: chat.0,
                text: &chunk,
            };
            let _: serde_json::Value = self.call("sendMessage", &request).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Notifier for TelegramClient {
    async fn send(&self, chat: ChatId, text: &str) -> Result<(), MessagingError> {
        self.send_message(chat, text).await
    }
}

#[async_trait]
impl ConversationHost for TelegramClient {
    async fn prompt(&self, chat: ChatId, text: &str) -> Result<(), MessagingError> {
        self.send_message(chat, text).await
    }
}

#[derive(Debug, Serialize)]
struct GetUpdatesRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    offset: Option<i64>,
    timeout: u32,
    allowed_updates: &'a [&'a str],
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: i64,
    text: &'a str,
}

/// Bot API response envelope.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
    error_code: Option<i32>,
}

impl<T> ApiResponse<T> {
    fn into_result(self) -> Result<T, MessagingError> {
        match (self.ok, self.result) {
            (true, Some(result)) => Ok(result),
            (true, None) => Err(MessagingError::InvalidResponse(
                "missing result".to_string(),
            )),
            (false, _) => Err(MessagingError::Api {
                code: self.error_code.unwrap_or_default(),
                description: self.description.unwrap_or_default(),
            }),
        }
    }
}

/// A Telegram update. Only message updates are requested.
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<TelegramMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramMessage {
    pub message_id: i64,
    #[serde(default)]
    pub from: Option<TelegramUser>,
    pub chat: TelegramChat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramUser {
    pub id: i64,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramChat {
    pub id: i64,
}

impl Update {
    /// Converts a text message update into an inbound message.
    ///
    /// Returns `None` for non-text updates and messages without a sender.
    pub fn into_inbound(self) -> Option<InboundMessage> {
        let message = self.message?;
        let from = message.from?;
        let text = message.text?;
        Some(InboundMessage {
            user_id: UserId(from.id),
            username: from.username,
            chat_id: ChatId(message.chat.id),
            text,
        })
    }
}

/// Split text into chunks of at most `limit` characters, preferring line breaks.
pub fn split_message(text: &str, limit: usize) -> Vec<String> {
    if text.chars().count() <= limit {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for line in text.split_inclusive('\n') {
        let line_len = line.chars().count();

        if current_len + line_len > limit && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }

        if line_len > limit {
            // A single line longer than the limit is cut on character boundaries.
            let chars: Vec<char> = line.chars().collect();
            for piece in chars.chunks(limit) {
                chunks.push(piece.iter().collect());
            }
            continue;
        }

        current.push_str(line);
        current_len += line_len;
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_into_inbound() {
        let json = r#"{
            "update_id": 10,
            "message": {
                "message_id": 1,
                "from": {"id": 42, "is_bot": false, "first_name": "A", "username": "alice"},
                "chat": {"id": 42, "type": "private"},
                "date": 0,
                "text": "/status"
            }
        }"#;
        let update: Update = serde_json::from_str(json).unwrap();
        let msg = update.into_inbound().unwrap();
        assert_eq!(msg.user_id, UserId(42));
        assert_eq!(msg.chat_id, ChatId(42));
        assert_eq!(msg.username.as_deref(), Some("alice"));
        assert_eq!(msg.text, "/status");
    }

    #[test]
    fn test_non_text_update_is_ignored() {
        let json = r#"{
            "update_id": 11,
            "message": {
                "message_id": 2,
                "from": {"id": 42, "is_bot": false, "first_name": "A"},
                "chat": {"id": 42, "type": "private"},
                "date": 0
            }
        }"#;
        let update: Update = serde_json::from_str(json).unwrap();
        assert!(update.into_inbound().is_none());

        let no_message: Update = serde_json::from_str(r#"{"update_id": 12}"#).unwrap();
        assert!(no_message.into_inbound().is_none());
    }

    #[test]
    fn test_api_response_error() {
        let json = r#"{"ok": false, "error_code": 401, "description": "Unauthorized"}"#;
        let parsed: ApiResponse<Vec<Update>> = serde_json::from_str(json).unwrap();
        match parsed.into_result() {
            Err(MessagingError::Api { code, description }) => {
                assert_eq!(code, 401);
                assert_eq!(description, "Unauthorized");
            }
            other => panic!("Expected Api error, got {:?}", other),
        }
    }

    #[test]
    fn test_api_response_ok() {
        let json = r#"{"ok": true, "result": []}"#;
        let parsed: ApiResponse<Vec<Update>> = serde_json::from_str(json).unwrap();
        assert!(parsed.into_result().unwrap().is_empty());
    }

    #[test]
    fn test_split_message_short_text_untouched() {
        assert_eq!(split_message("hello", 10), vec!["hello".to_string()]);
    }

    #[test]
    fn test_split_message_on_line_boundaries() {
        let text = "aaaa\nbbbb\ncccc\n";
        let chunks = split_message(text, 10);
        assert_eq!(chunks, vec!["aaaa\nbbbb\n".to_string(), "cccc\n".to_string()]);
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn test_split_message_long_line() {
        let text = "x".repeat(25);
        let chunks = split_message(&text, 10);
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.chars().count() <= 10));
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn test_client_new_builds_endpoint() {
        let config = TelegramConfig {
            token: "123:abc".to_string(),
            api_url: "http://localhost:8081/".to_string(),
            poll_timeout_secs: 5,
        };
        let client = TelegramClient::new(&config).unwrap();
        assert_eq!(client.endpoint, "http://localhost:8081/bot123:abc");
    }
}
