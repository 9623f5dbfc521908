//! Generation results and the values they are built from.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::usage::Usage;

/// Why generation finished.
#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Display, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum FinishReason {
    Stop,
    Length,
    ContentFilter,
    ToolCalls,
    Error,
    #[default]
    Unknown,
}

/// Kind of tool invocation. Only function calls exist today.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ToolCallType {
    #[default]
    Function,
}

/// A completed tool invocation whose argument text parses as JSON.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ToolCall {
    pub tool_call_type: ToolCallType,
    pub tool_call_id: String,
    pub tool_name: String,
    /// Raw argument text, exactly as streamed.
    pub args: String,
}

impl ToolCall {
    /// Parse the argument text.
    pub fn arguments(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::from_str(&self.args)
    }
}

/// Provider-specific values keyed by provider name, then field name.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct ProviderMetadata(BTreeMap<String, serde_json::Map<String, serde_json::Value>>);

impl ProviderMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ensure an (possibly empty) entry exists for `provider`.
    pub fn touch(&mut self, provider: &str) {
        self.0.entry(provider.to_string()).or_default();
    }

    /// Set one field, replacing any earlier value.
    pub fn set(&mut self, provider: &str, key: &str, value: impl Into<serde_json::Value>) {
        self.0
            .entry(provider.to_string())
            .or_default()
            .insert(key.to_string(), value.into());
    }

    pub fn get(&self, provider: &str, key: &str) -> Option<&serde_json::Value> {
        self.0.get(provider)?.get(key)
    }

    pub fn provider(&self, provider: &str) -> Option<&serde_json::Map<String, serde_json::Value>> {
        self.0.get(provider)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Response identity reported at the start of a stream.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Source of a fatal stream error.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum StreamErrorKind {
    /// Wire chunk matched no known shape.
    Decode,
    /// Valid chunk in an invalid position.
    Protocol,
    /// Provider sent an error frame.
    Upstream,
    /// The byte stream itself failed.
    Transport,
}

/// Error carried in-band by an `error` event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StreamError {
    pub kind: StreamErrorKind,
    pub message: String,
}

impl StreamError {
    pub fn new(kind: StreamErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for StreamError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} error: {}", self.kind, self.message)
    }
}

impl From<StreamError> for crate::error::ChatwireError {
    fn from(err: StreamError) -> Self {
        match err.kind {
            StreamErrorKind::Decode => Self::Decode(err.message),
            StreamErrorKind::Protocol => Self::ProtocolViolation(err.message),
            StreamErrorKind::Upstream => Self::Upstream(err.message),
            StreamErrorKind::Transport => Self::Stream(err.message),
        }
    }
}

/// Final outcome of one chat-completion stream.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    pub text: String,
    pub reasoning: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning_signature: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub redacted_reasoning: Vec<String>,
    /// Completed tool calls in completion order.
    pub tool_calls: Vec<ToolCall>,
    pub finish_reason: FinishReason,
    pub usage: Usage,
    pub provider_metadata: ProviderMetadata,
    pub response: ResponseMetadata,
    /// The fatal error that ended the stream, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<StreamError>,
}

impl GenerationResult {
    /// Turn a failed generation into an error, passing successful ones through.
    pub fn into_result(self) -> crate::error::Result<Self> {
        match self.error {
            Some(err) => Err(err.into()),
            None => Ok(self),
        }
    }
}

impl std::fmt::Display for GenerationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}
