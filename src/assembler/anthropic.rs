//! Assembler for Anthropic Messages API streams.

use std::collections::HashMap;

use serde::Deserialize;

use super::core::StreamCore;
use crate::types::{
    FinishReason, GenerationEvent, ResponseMetadata, StreamError, StreamErrorKind, ToolCallType,
    Usage,
};

/// Provider metadata key for Anthropic cache counters.
pub const METADATA_KEY: &str = "anthropic";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockKind {
    Text,
    Thinking,
    RedactedThinking,
    ToolUse,
}

/// Decodes Messages API server-sent events.
///
/// Content blocks are tracked by index. `message_stop` finishes the stream.
#[derive(Debug)]
pub struct AnthropicAssembler {
    core: StreamCore,
    blocks: HashMap<u32, BlockKind>,
}

impl Default for AnthropicAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl AnthropicAssembler {
    pub fn new() -> Self {
        Self {
            core: StreamCore::new("anthropic"),
            blocks: HashMap::new(),
        }
    }

    fn apply(&mut self, data: &str) -> Result<(), StreamError> {
        let event: AnthropicStreamEvent = serde_json::from_str(data).map_err(|e| {
            StreamError::new(
                StreamErrorKind::Decode,
                format!("invalid messages stream event: {e}"),
            )
        })?;

        match event {
            AnthropicStreamEvent::Ping => {}
            AnthropicStreamEvent::MessageStart { message } => {
                let usage = &message.usage;
                self.core.usage.record(&Usage {
                    prompt_tokens: Some(usage.input_tokens),
                    completion_tokens: Some(usage.output_tokens),
                    ..Default::default()
                });
                self.core.usage.set_metadata(
                    METADATA_KEY,
                    "cacheCreationInputTokens",
                    usage.cache_creation_input_tokens,
                );
                self.core.usage.set_metadata(
                    METADATA_KEY,
                    "cacheReadInputTokens",
                    usage.cache_read_input_tokens,
                );
                self.core
                    .emit(GenerationEvent::ResponseMetadata(ResponseMetadata {
                        id: message.id,
                        model_id: message.model,
                        timestamp: None,
                    }));
            }
            AnthropicStreamEvent::ContentBlockStart {
                index,
                content_block,
            } => match content_block {
                ContentBlock::Text { text } => {
                    self.blocks.insert(index, BlockKind::Text);
                    if !text.is_empty() {
                        self.core.emit(GenerationEvent::text(text));
                    }
                }
                ContentBlock::Thinking { thinking } => {
                    self.blocks.insert(index, BlockKind::Thinking);
                    if !thinking.is_empty() {
                        self.core.emit(GenerationEvent::reasoning(thinking));
                    }
                }
                ContentBlock::RedactedThinking { data } => {
                    self.blocks.insert(index, BlockKind::RedactedThinking);
                    self.core.emit(GenerationEvent::RedactedReasoning { data });
                }
                ContentBlock::ToolUse { id, name } => {
                    self.blocks.insert(index, BlockKind::ToolUse);
                    self.core.tools.start(
                        index,
                        Some(ToolCallType::Function),
                        Some(id),
                        Some(name),
                    )?;
                }
            },
            AnthropicStreamEvent::ContentBlockDelta { index, delta } => match delta {
                BlockDelta::TextDelta { text } => self.core.emit(GenerationEvent::text(text)),
                BlockDelta::ThinkingDelta { thinking } => {
                    self.core.emit(GenerationEvent::reasoning(thinking))
                }
                BlockDelta::SignatureDelta { signature } => {
                    if self.blocks.get(&index) == Some(&BlockKind::Thinking) {
                        self.core
                            .emit(GenerationEvent::ReasoningSignature { signature });
                    }
                }
                BlockDelta::InputJsonDelta { partial_json } => {
                    let events = self.core.tools.append(index, Some(&partial_json))?;
                    self.core.emit_all(events);
                }
            },
            AnthropicStreamEvent::ContentBlockStop { index } => {
                if self.blocks.remove(&index) == Some(BlockKind::ToolUse) {
                    if let Some(event) = self.core.tools.close(index) {
                        self.core.emit(event);
                    }
                }
            }
            AnthropicStreamEvent::MessageDelta { delta, usage } => {
                self.core.usage.record(&Usage {
                    completion_tokens: Some(usage.output_tokens),
                    ..Default::default()
                });
                self.core
                    .set_finish_reason(map_stop_reason(delta.stop_reason.as_deref()));
            }
            AnthropicStreamEvent::MessageStop => self.core.finalize(),
            AnthropicStreamEvent::Error { error } => {
                return Err(StreamError::new(
                    StreamErrorKind::Upstream,
                    format!("{}: {}", error.error_type, error.message),
                ));
            }
        }
        Ok(())
    }
}

delegate_lifecycle!(AnthropicAssembler);

/// Map a Messages API `stop_reason`.
pub fn map_stop_reason(reason: Option<&str>) -> FinishReason {
    match reason {
        Some("end_turn") | Some("stop_sequence") => FinishReason::Stop,
        Some("tool_use") => FinishReason::ToolCalls,
        Some("max_tokens") => FinishReason::Length,
        _ => FinishReason::Unknown,
    }
}

// Wire types (internal). Unknown event, block and delta types fail decoding.

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum AnthropicStreamEvent {
    MessageStart {
        message: MessageStartBody,
    },
    ContentBlockStart {
        index: u32,
        content_block: ContentBlock,
    },
    ContentBlockDelta {
        index: u32,
        delta: BlockDelta,
    },
    ContentBlockStop {
        index: u32,
    },
    MessageDelta {
        delta: MessageDeltaBody,
        usage: MessageDeltaUsage,
    },
    MessageStop,
    Ping,
    Error {
        error: AnthropicErrorBody,
    },
}

#[derive(Deserialize)]
struct MessageStartBody {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    model: Option<String>,
    usage: MessageStartUsage,
}

#[derive(Deserialize)]
struct MessageStartUsage {
    input_tokens: u32,
    output_tokens: u32,
    #[serde(default)]
    cache_creation_input_tokens: Option<u32>,
    #[serde(default)]
    cache_read_input_tokens: Option<u32>,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text { text: String },
    Thinking { thinking: String },
    ToolUse { id: String, name: String },
    RedactedThinking { data: String },
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum BlockDelta {
    InputJsonDelta { partial_json: String },
    TextDelta { text: String },
    ThinkingDelta { thinking: String },
    SignatureDelta { signature: String },
}

#[derive(Deserialize)]
struct MessageDeltaBody {
    #[serde(default)]
    stop_reason: Option<String>,
}

#[derive(Deserialize)]
struct MessageDeltaUsage {
    output_tokens: u32,
}

#[derive(Deserialize)]
struct AnthropicErrorBody {
    #[serde(rename = "type")]
    error_type: String,
    message: String,
}
