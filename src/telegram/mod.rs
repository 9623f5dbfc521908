//! Outbound Telegram Bot API client.

use serde::Serialize;
use tracing::debug;

use crate::config::ChatwireConfig;
use crate::error::{ChatwireError, Result};
use crate::provider::http::{shared_client, status_to_error};

const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// Sends plain-text replies through `sendMessage`.
#[derive(Debug, Clone)]
pub struct TelegramClient {
    token: Option<String>,
    api_base: String,
}

#[derive(Serialize)]
struct SendMessageBody<'a> {
    chat_id: i64,
    text: &'a str,
}

impl TelegramClient {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: token.filter(|t| !t.is_empty()),
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }

    pub fn from_config(config: &ChatwireConfig) -> Self {
        Self::new(config.telegram_bot_token()).with_api_base(config.telegram_api_base())
    }

    /// Point the client at another Bot API server.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// Send `text` to `chat_id`.
    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<()> {
        let token = self
            .token
            .as_deref()
            .ok_or_else(|| ChatwireError::Configuration("Missing TELEGRAM_BOT_TOKEN".into()))?;
        let url = format!("{}/bot{}/sendMessage", self.api_base, token);

        debug!(chat_id, text_len = text.len(), "Telegram sendMessage");

        let resp = shared_client()
            .post(&url)
            .json(&SendMessageBody { chat_id, text })
            .send()
            .await?;

        let status = resp.status().as_u16();
        if !(200..300).contains(&status) {
            let body_text = resp.text().await.unwrap_or_default();
            return Err(status_to_error(status, &body_text));
        }
        Ok(())
    }
}
