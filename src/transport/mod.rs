//! Chat transport abstraction
//!
//! The rest of the pipeline only knows how to send text to a chat and
//! receive inbound `(chat, text)` messages. The Telegram implementation
//! lives in [`telegram`]; tests substitute in-memory fakes.

pub mod telegram;

use async_trait::async_trait;

use crate::types::Result;

pub use telegram::{TelegramTransport, TelegramTransportConfig};

/// Numeric handle identifying a messaging-channel recipient
pub type ChatId = i64;

/// An inbound message from the chat transport
#[derive(Debug, Clone)]
pub struct InboundMessage {
    /// Chat the message arrived from
    pub chat: ChatId,
    /// Raw message text
    pub text: String,
}

/// Outbound text transport
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send plain text to a chat.
    ///
    /// Fails with `HeraldError::Delivery` when the transport rejects the
    /// send (unknown or blocked recipient). Callers must not treat that
    /// as success.
    async fn send_text(&self, chat: ChatId, text: &str) -> Result<()>;
}
