//! Events produced while a chat-completion stream is assembled.

use serde::{Deserialize, Serialize};

use super::generation::{
    FinishReason, ProviderMetadata, ResponseMetadata, StreamError, ToolCall, ToolCallType,
};
use super::usage::Usage;

/// One normalized event of a generation stream.
///
/// A stream is finite and ends with exactly one [`GenerationEvent::Finish`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum GenerationEvent {
    ResponseMetadata(ResponseMetadata),
    #[serde(rename_all = "camelCase")]
    TextDelta { text_delta: String },
    #[serde(rename_all = "camelCase")]
    ReasoningDelta { text_delta: String },
    ReasoningSignature { signature: String },
    RedactedReasoning { data: String },
    #[serde(rename_all = "camelCase")]
    ToolCallDelta {
        tool_call_type: ToolCallType,
        tool_call_id: String,
        tool_name: String,
        args_text_delta: String,
    },
    ToolCall(ToolCall),
    Error { error: StreamError },
    #[serde(rename_all = "camelCase")]
    Finish {
        finish_reason: FinishReason,
        usage: Usage,
        provider_metadata: ProviderMetadata,
    },
}

impl GenerationEvent {
    pub fn text(delta: impl Into<String>) -> Self {
        Self::TextDelta {
            text_delta: delta.into(),
        }
    }

    pub fn reasoning(delta: impl Into<String>) -> Self {
        Self::ReasoningDelta {
            text_delta: delta.into(),
        }
    }

    pub fn is_finish(&self) -> bool {
        matches!(self, Self::Finish { .. })
    }

    /// Wire tag of this event, e.g. `tool-call-delta`.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ResponseMetadata(_) => "response-metadata",
            Self::TextDelta { .. } => "text-delta",
            Self::ReasoningDelta { .. } => "reasoning-delta",
            Self::ReasoningSignature { .. } => "reasoning-signature",
            Self::RedactedReasoning { .. } => "redacted-reasoning",
            Self::ToolCallDelta { .. } => "tool-call-delta",
            Self::ToolCall(_) => "tool-call",
            Self::Error { .. } => "error",
            Self::Finish { .. } => "finish",
        }
    }
}
