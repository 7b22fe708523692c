//! Chat-facing collaborators.
//!
//! This module provides the `Notifier` and `ConversationHost` traits the
//! relocation core reports through, and a Telegram Bot API implementation
//! of both.

mod telegram;
mod traits;
mod types;

pub use telegram::{split_message, TelegramClient, Update, MAX_MESSAGE_LEN};
pub use traits::{ConversationHost, MessagingError, Notifier};
pub use types::{ChatId, InboundMessage, UserId};
