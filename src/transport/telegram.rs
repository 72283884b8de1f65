//! Telegram Bot API transport
//!
//! Outbound sends go through `sendMessage`; inbound registrations are
//! read with a `getUpdates` long poll. Poll failures are logged and
//! retried, never propagated - losing one poll cycle only delays
//! inbound messages.

use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::{ChatId, InboundMessage, Transport};
use crate::types::{HeraldError, Result};

/// Delay before retrying after a failed getUpdates poll
const POLL_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Configuration for the Telegram transport
#[derive(Debug, Clone)]
pub struct TelegramTransportConfig {
    /// Bot token from @BotFather
    pub bot_token: String,
    /// Base URL of the Bot API
    pub api_url: String,
    /// Long-poll timeout for getUpdates, in seconds
    pub updates_timeout_secs: u64,
}

impl Default for TelegramTransportConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            api_url: "https://api.telegram.org".to_string(),
            updates_timeout_secs: 30,
        }
    }
}

/// Telegram Bot API response envelope
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
    result: Option<T>,
}

/// One update from getUpdates
#[derive(Debug, Deserialize)]
struct Update {
    update_id: i64,
    message: Option<Message>,
}

#[derive(Debug, Deserialize)]
struct Message {
    chat: Chat,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Chat {
    id: i64,
}

/// Telegram Bot API client
#[derive(Clone)]
pub struct TelegramTransport {
    config: TelegramTransportConfig,
    client: reqwest::Client,
}

impl TelegramTransport {
    /// Create a new Telegram transport
    pub fn new(config: TelegramTransportConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{}",
            self.config.api_url.trim_end_matches('/'),
            self.config.bot_token,
            method
        )
    }

    /// Fetch one batch of updates with a long poll
    async fn get_updates(&self, offset: i64) -> Result<Vec<Update>> {
        let response = self
            .client
            .post(self.method_url("getUpdates"))
            .json(&json!({
                "offset": offset,
                "timeout": self.config.updates_timeout_secs,
                "allowed_updates": ["message"],
            }))
            // Give the HTTP request headroom beyond the server-side long poll
            .timeout(Duration::from_secs(self.config.updates_timeout_secs + 10))
            .send()
            .await
            .map_err(|e| HeraldError::Transport(format!("getUpdates request failed: {}", e)))?;

        let body: ApiResponse<Vec<Update>> = response
            .json()
            .await
            .map_err(|e| HeraldError::Transport(format!("getUpdates decode failed: {}", e)))?;

        if !body.ok {
            return Err(HeraldError::Transport(format!(
                "getUpdates rejected: {}",
                body.description.unwrap_or_else(|| "unknown error".into())
            )));
        }

        Ok(body.result.unwrap_or_default())
    }

    /// Run the inbound update loop until shutdown.
    ///
    /// Text messages are forwarded over `tx`; everything else (stickers,
    /// joins, edits) is skipped. The update offset is advanced past every
    /// update seen so a failed forward is not replayed forever.
    pub async fn run_updates(
        &self,
        tx: mpsc::Sender<InboundMessage>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        info!(
            "Telegram update loop started (long poll timeout: {}s)",
            self.config.updates_timeout_secs
        );

        let mut offset: i64 = 0;

        loop {
            let updates = tokio::select! {
                res = self.get_updates(offset) => res,
                _ = shutdown.changed() => {
                    info!("Telegram update loop stopping (shutdown signal)");
                    return;
                }
            };

            let updates = match updates {
                Ok(u) => u,
                Err(e) => {
                    warn!("getUpdates failed, retrying in {:?}: {}", POLL_RETRY_DELAY, e);
                    tokio::select! {
                        _ = tokio::time::sleep(POLL_RETRY_DELAY) => continue,
                        _ = shutdown.changed() => {
                            info!("Telegram update loop stopping (shutdown signal)");
                            return;
                        }
                    }
                }
            };

            for update in updates {
                offset = offset.max(update.update_id + 1);

                let Some(message) = update.message else {
                    continue;
                };
                let Some(text) = message.text else {
                    debug!(chat = message.chat.id, "Skipping non-text message");
                    continue;
                };

                let inbound = InboundMessage {
                    chat: message.chat.id,
                    text,
                };

                if tx.send(inbound).await.is_err() {
                    error!("Inbound channel closed, stopping update loop");
                    return;
                }
            }
        }
    }
}

#[async_trait]
impl Transport for TelegramTransport {
    async fn send_text(&self, chat: ChatId, text: &str) -> Result<()> {
        let response = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&json!({
                "chat_id": chat,
                "text": text,
            }))
            .send()
            .await
            .map_err(|e| HeraldError::Delivery(format!("sendMessage request failed: {}", e)))?;

        let status = response.status();
        let body: ApiResponse<serde_json::Value> = response
            .json()
            .await
            .map_err(|e| HeraldError::Delivery(format!("sendMessage decode failed: {}", e)))?;

        if !body.ok {
            return Err(HeraldError::Delivery(format!(
                "sendMessage rejected ({}): {}",
                status,
                body.description.unwrap_or_else(|| "unknown error".into())
            )));
        }

        debug!(chat = chat, bytes = text.len(), "Message sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_url() {
        let transport = TelegramTransport::new(TelegramTransportConfig {
            bot_token: "123:abc".to_string(),
            api_url: "https://api.telegram.org/".to_string(),
            ..Default::default()
        });

        assert_eq!(
            transport.method_url("sendMessage"),
            "https://api.telegram.org/bot123:abc/sendMessage"
        );
    }

    #[test]
    fn test_update_envelope_decodes() {
        let raw = r#"{
            "ok": true,
            "result": [
                {"update_id": 7, "message": {"chat": {"id": 42}, "text": "12345"}},
                {"update_id": 8, "message": {"chat": {"id": 43}}}
            ]
        }"#;

        let body: ApiResponse<Vec<Update>> = serde_json::from_str(raw).unwrap();
        assert!(body.ok);
        let updates = body.result.unwrap();
        assert_eq!(updates.len(), 2);
        assert_eq!(updates[0].message.as_ref().unwrap().chat.id, 42);
        assert_eq!(
            updates[0].message.as_ref().unwrap().text.as_deref(),
            Some("12345")
        );
        assert!(updates[1].message.as_ref().unwrap().text.is_none());
    }

    #[tokio::test]
    async fn test_failed_poll_is_transport_error() {
        // Nothing listens on a discard port, so the request fails fast
        let transport = TelegramTransport::new(TelegramTransportConfig {
            bot_token: "123:abc".to_string(),
            api_url: "http://127.0.0.1:9".to_string(),
            updates_timeout_secs: 0,
        });

        let err = transport.get_updates(0).await.unwrap_err();
        assert!(matches!(err, HeraldError::Transport(_)));
    }

    #[test]
    fn test_error_envelope_decodes() {
        let raw = r#"{"ok": false, "description": "Forbidden: bot was blocked by the user"}"#;
        let body: ApiResponse<serde_json::Value> = serde_json::from_str(raw).unwrap();
        assert!(!body.ok);
        assert!(body.description.unwrap().contains("blocked"));
    }
}
