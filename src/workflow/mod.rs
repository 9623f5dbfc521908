//! Two-step chat reply pipeline: generate a reply, then send it to Telegram.
//!
//! Retries and scheduling belong to whatever engine runs the workflow; each
//! call here runs both steps once.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::error::{ChatwireError, Result};
use crate::generation::generate_text;
use crate::provider::{ChatProvider, ChatRequest, ChatSettings};
use crate::telegram::TelegramClient;
use crate::types::ChatMessage;

/// Input of the workflow: one inbound user message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChatInput {
    pub message: String,
    pub thread_id: String,
    pub chat_id: i64,
}

/// Output of the `use-agent` step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AgentReply {
    pub response: String,
    pub chat_id: i64,
}

/// Output of the `send-telegram-reply` step.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReplyOutcome {
    pub sent: bool,
}

/// Generates a reply with a chat provider and forwards it to Telegram.
pub struct ChatReplyWorkflow {
    provider: Arc<dyn ChatProvider>,
    telegram: TelegramClient,
    system_prompt: Option<String>,
    settings: ChatSettings,
}

impl ChatReplyWorkflow {
    pub fn new(provider: Arc<dyn ChatProvider>, telegram: TelegramClient) -> Self {
        Self {
            provider,
            telegram,
            system_prompt: None,
            settings: ChatSettings::default(),
        }
    }

    pub fn with_system_prompt(mut self, prompt: Option<String>) -> Self {
        self.system_prompt = prompt;
        self
    }

    pub fn with_settings(mut self, settings: ChatSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Step `use-agent`: generate a reply to the user's message.
    pub async fn use_agent(&self, input: &ChatInput) -> Result<AgentReply> {
        info!(
            thread_id = input.thread_id.as_str(),
            message_len = input.message.len(),
            "use-agent: starting generation"
        );

        let mut messages = Vec::with_capacity(2);
        if let Some(ref prompt) = self.system_prompt {
            messages.push(ChatMessage::system(prompt.clone()));
        }
        messages.push(ChatMessage::user(input.message.clone()));
        let request = ChatRequest::builder()
            .messages(messages)
            .settings(self.settings.clone())
            .build();

        let result = generate_text(self.provider.as_ref(), &request).await?;
        if result.text.is_empty() {
            return Err(ChatwireError::Stream(format!(
                "model finished with reason '{}' and no text",
                result.finish_reason
            )));
        }

        info!(
            thread_id = input.thread_id.as_str(),
            response_len = result.text.len(),
            finish_reason = %result.finish_reason,
            "use-agent: response generated"
        );
        Ok(AgentReply {
            response: result.text,
            chat_id: input.chat_id,
        })
    }

    /// Step `send-telegram-reply`: forward the reply.
    ///
    /// A missing bot token or a failed send is logged and reported as
    /// `sent: false`, never as an error.
    pub async fn send_reply(&self, reply: &AgentReply) -> ReplyOutcome {
        if !self.telegram.has_token() {
            warn!(chat_id = reply.chat_id, "send-telegram-reply: TELEGRAM_BOT_TOKEN not set, skipping");
            return ReplyOutcome { sent: false };
        }

        match self.telegram.send_message(reply.chat_id, &reply.response).await {
            Ok(()) => {
                info!(chat_id = reply.chat_id, "send-telegram-reply: message sent");
                ReplyOutcome { sent: true }
            }
            Err(e) => {
                error!(chat_id = reply.chat_id, error = %e, "send-telegram-reply: failed to send");
                ReplyOutcome { sent: false }
            }
        }
    }

    /// Run both steps in order.
    pub async fn run(&self, input: &ChatInput) -> Result<ReplyOutcome> {
        let reply = self.use_agent(input).await?;
        Ok(self.send_reply(&reply).await)
    }
}
