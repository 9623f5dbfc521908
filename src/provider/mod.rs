//! Chat provider trait and HTTP implementations.

pub mod http;

#[cfg(feature = "anthropic")]
pub mod anthropic;
#[cfg(feature = "openai")]
pub mod openai;

use async_trait::async_trait;
use bon::Builder;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tokio_util::sync::CancellationToken;

use crate::assembler::Assembler;
use crate::config::ChatwireConfig;
use crate::error::{ChatwireError, Result};
use crate::generation::EventStream;
use crate::types::{ChatMessage, ToolDefinition};

/// Sampling settings forwarded to the provider.
#[derive(Debug, Clone, Default, Builder, Serialize, Deserialize)]
pub struct ChatSettings {
    pub max_tokens: Option<u32>,
    pub temperature: Option<f64>,
    pub top_p: Option<f64>,
    pub stop_sequences: Option<Vec<String>>,
    pub seed: Option<u64>,
    pub user: Option<String>,
}

/// A chat-completion request.
#[derive(Debug, Clone, Builder)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    #[builder(default)]
    pub settings: ChatSettings,
    pub tools: Option<Vec<ToolDefinition>>,
    /// Cancelling this token aborts the stream with reason `unknown`.
    pub cancel: Option<CancellationToken>,
}

impl ChatRequest {
    /// Request with the given messages and default settings.
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            settings: ChatSettings::default(),
            tools: None,
            cancel: None,
        }
    }
}

/// Supported chat-completion backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ProviderKind {
    #[strum(to_string = "openai", serialize = "openai-compatible")]
    #[serde(rename = "openai")]
    OpenAi,
    Anthropic,
}

/// A streaming chat-completion backend.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Provider name (e.g. "openai", "anthropic").
    fn provider_name(&self) -> &str;

    /// The model this provider instance serves.
    fn model_id(&self) -> &str;

    /// Fresh assembler for one stream of this provider.
    fn new_assembler(&self) -> Box<dyn Assembler>;

    /// Send a streaming request and return its live event sequence.
    ///
    /// Errors before the first byte (HTTP status, connection) are returned
    /// directly; everything after travels in-band.
    async fn stream_chat(&self, request: &ChatRequest) -> Result<EventStream>;
}

/// Create a provider of `kind` for `model` from `config`.
#[allow(unused_variables)]
pub fn create_provider(
    kind: ProviderKind,
    model: &str,
    config: &ChatwireConfig,
) -> Result<Box<dyn ChatProvider>> {
    match kind {
        #[cfg(feature = "openai")]
        ProviderKind::OpenAi => {
            let api_key = config
                .get_api_key("openai")
                .ok_or_else(|| ChatwireError::Authentication("Missing OPENAI_API_KEY".into()))?;
            Ok(Box::new(openai::OpenAiCompatibleProvider::new(
                model,
                api_key,
                config.get_base_url("openai"),
            )))
        }
        #[cfg(feature = "anthropic")]
        ProviderKind::Anthropic => {
            let api_key = config.get_api_key("anthropic").ok_or_else(|| {
                ChatwireError::Authentication("Missing ANTHROPIC_API_KEY".into())
            })?;
            Ok(Box::new(anthropic::AnthropicProvider::new(
                model,
                api_key,
                config.get_base_url("anthropic"),
            )))
        }
        #[allow(unreachable_patterns)]
        _ => Err(ChatwireError::Configuration(format!(
            "Provider '{kind}' not enabled via feature flags"
        ))),
    }
}
