//! Assembler for OpenAI-compatible Chat Completions streams.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::core::StreamCore;
use crate::types::{
    FinishReason, GenerationEvent, ResponseMetadata, StreamError, StreamErrorKind, ToolCallType,
    Usage,
};

/// Metadata key used when no provider-specific name is configured.
pub const DEFAULT_METADATA_KEY: &str = "openai-compatible";

/// Decodes `chat.completion.chunk` payloads.
///
/// Tool-call arguments complete as soon as they parse as JSON. The stream
/// finishes on `[DONE]` or when the transport ends.
#[derive(Debug)]
pub struct OpenAiCompatibleAssembler {
    core: StreamCore,
    metadata_key: String,
    first_chunk: bool,
}

impl Default for OpenAiCompatibleAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl OpenAiCompatibleAssembler {
    pub fn new() -> Self {
        Self::with_metadata_key(DEFAULT_METADATA_KEY)
    }

    /// Report provider metadata under `key` instead of `openai-compatible`.
    pub fn with_metadata_key(key: impl Into<String>) -> Self {
        let metadata_key = key.into();
        let mut core = StreamCore::new("openai-compatible");
        core.usage.touch_metadata(&metadata_key);
        Self {
            core,
            metadata_key,
            first_chunk: true,
        }
    }

    fn apply(&mut self, data: &str) -> Result<(), StreamError> {
        let frame: OpenAiStreamFrame = serde_json::from_str(data).map_err(|e| {
            StreamError::new(
                StreamErrorKind::Decode,
                format!("invalid chat completion chunk: {e}"),
            )
        })?;

        let chunk = match frame {
            OpenAiStreamFrame::Error(frame) => {
                return Err(StreamError::new(
                    StreamErrorKind::Upstream,
                    frame.error.message,
                ));
            }
            OpenAiStreamFrame::Chunk(chunk) => chunk,
        };

        if self.first_chunk {
            self.first_chunk = false;
            self.core
                .emit(GenerationEvent::ResponseMetadata(ResponseMetadata {
                    id: chunk.id.clone(),
                    model_id: chunk.model.clone(),
                    timestamp: chunk
                        .created
                        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0)),
                }));
        }

        if let Some(usage) = chunk.usage {
            self.record_usage(&usage);
        }

        let Some(choice) = chunk.choices.into_iter().next() else {
            return Ok(());
        };
        if let Some(reason) = choice.finish_reason.as_deref() {
            self.core.set_finish_reason(map_finish_reason(reason));
        }
        let Some(delta) = choice.delta else {
            return Ok(());
        };

        if let Some(reasoning) = delta.reasoning_content {
            self.core.emit(GenerationEvent::reasoning(reasoning));
        }
        if let Some(content) = delta.content {
            self.core.emit(GenerationEvent::text(content));
        }
        for (position, call) in delta.tool_calls.unwrap_or_default().into_iter().enumerate() {
            self.apply_tool_call(position, call)?;
        }
        Ok(())
    }

    fn apply_tool_call(
        &mut self,
        position: usize,
        call: OpenAiToolCallDelta,
    ) -> Result<(), StreamError> {
        let index = call.index.unwrap_or(position as u32);
        let (name, arguments) = match call.function {
            Some(f) => (f.name, f.arguments),
            None => (None, None),
        };

        if !self.core.tools.contains(index) {
            let call_type = call.call_type.map(|_| ToolCallType::Function);
            self.core.tools.start(index, call_type, call.id, name)?;
        }
        let events = self.core.tools.append(index, arguments.as_deref())?;
        self.core.emit_all(events);
        Ok(())
    }

    fn record_usage(&mut self, usage: &OpenAiUsage) {
        let completion = usage.completion_tokens_details.as_ref();
        let prompt = usage.prompt_tokens_details.as_ref();
        let reported = Usage {
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
            reasoning_tokens: completion.and_then(|d| d.reasoning_tokens),
            accepted_prediction_tokens: completion.and_then(|d| d.accepted_prediction_tokens),
            rejected_prediction_tokens: completion.and_then(|d| d.rejected_prediction_tokens),
            cached_prompt_tokens: prompt.and_then(|d| d.cached_tokens),
        };
        self.core.usage.record(&reported);

        let snapshot = self.core.usage.usage();
        let key = self.metadata_key.as_str();
        let fields = [
            ("reasoningTokens", snapshot.reasoning_tokens),
            ("acceptedPredictionTokens", snapshot.accepted_prediction_tokens),
            ("rejectedPredictionTokens", snapshot.rejected_prediction_tokens),
            ("cachedPromptTokens", snapshot.cached_prompt_tokens),
        ];
        for (field, value) in fields {
            if let Some(value) = value {
                self.core.usage.set_metadata(key, field, value);
            }
        }
    }
}

delegate_lifecycle!(OpenAiCompatibleAssembler);

/// Map a Chat Completions `finish_reason`.
pub fn map_finish_reason(reason: &str) -> FinishReason {
    match reason {
        "stop" => FinishReason::Stop,
        "length" => FinishReason::Length,
        "content_filter" => FinishReason::ContentFilter,
        "function_call" | "tool_calls" => FinishReason::ToolCalls,
        _ => FinishReason::Unknown,
    }
}

// Wire types (internal). An error frame is tried first because every chunk
// field except `choices` is optional.

#[derive(Deserialize)]
#[serde(untagged)]
enum OpenAiStreamFrame {
    Error(OpenAiErrorFrame),
    Chunk(OpenAiStreamChunk),
}

#[derive(Deserialize)]
struct OpenAiErrorFrame {
    error: OpenAiErrorBody,
}

#[derive(Deserialize)]
struct OpenAiErrorBody {
    message: String,
}

#[derive(Deserialize)]
struct OpenAiStreamChunk {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    created: Option<i64>,
    #[serde(default)]
    model: Option<String>,
    choices: Vec<OpenAiStreamChoice>,
    #[serde(default)]
    usage: Option<OpenAiUsage>,
}

#[derive(Deserialize)]
struct OpenAiStreamChoice {
    #[serde(default)]
    delta: Option<OpenAiStreamDelta>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct OpenAiStreamDelta {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    reasoning_content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<OpenAiToolCallDelta>>,
}

#[derive(Deserialize)]
struct OpenAiToolCallDelta {
    #[serde(default)]
    index: Option<u32>,
    #[serde(default)]
    id: Option<String>,
    #[serde(rename = "type", default)]
    call_type: Option<OpenAiToolType>,
    #[serde(default)]
    function: Option<OpenAiFunctionDelta>,
}

#[derive(Deserialize)]
#[serde(rename_all = "lowercase")]
enum OpenAiToolType {
    Function,
}

#[derive(Deserialize)]
struct OpenAiFunctionDelta {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    arguments: Option<String>,
}

#[derive(Deserialize)]
struct OpenAiUsage {
    #[serde(default)]
    prompt_tokens: Option<u32>,
    #[serde(default)]
    completion_tokens: Option<u32>,
    #[serde(default)]
    prompt_tokens_details: Option<OpenAiPromptTokensDetails>,
    #[serde(default)]
    completion_tokens_details: Option<OpenAiCompletionTokensDetails>,
}

#[derive(Deserialize)]
struct OpenAiPromptTokensDetails {
    #[serde(default)]
    cached_tokens: Option<u32>,
}

#[derive(Deserialize)]
struct OpenAiCompletionTokensDetails {
    #[serde(default)]
    reasoning_tokens: Option<u32>,
    #[serde(default)]
    accepted_prediction_tokens: Option<u32>,
    #[serde(default)]
    rejected_prediction_tokens: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::{Assembler, StreamState};

    #[test]
    fn finish_reason_mapping() {
        assert_eq!(map_finish_reason("stop"), FinishReason::Stop);
        assert_eq!(map_finish_reason("function_call"), FinishReason::ToolCalls);
        assert_eq!(map_finish_reason("content_filter"), FinishReason::ContentFilter);
        assert_eq!(map_finish_reason("eos"), FinishReason::Unknown);
    }

    #[test]
    fn first_chunk_emits_response_metadata() {
        let mut assembler = OpenAiCompatibleAssembler::new();
        let events = assembler
            .push(r#"{"id":"chatcmpl-1","created":1700000000,"model":"gpt-4o","choices":[]}"#)
            .unwrap();
        match &events[0] {
            GenerationEvent::ResponseMetadata(meta) => {
                assert_eq!(meta.id.as_deref(), Some("chatcmpl-1"));
                assert_eq!(meta.model_id.as_deref(), Some("gpt-4o"));
                assert_eq!(meta.timestamp.map(|t| t.timestamp()), Some(1_700_000_000));
            }
            other => panic!("unexpected event {other:?}"),
        }

        let events = assembler
            .push(r#"{"id":"chatcmpl-1","choices":[{"delta":{"content":"x"}}]}"#)
            .unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind(), "text-delta");
    }

    #[test]
    fn error_frame_is_upstream_error() {
        let mut assembler = OpenAiCompatibleAssembler::new();
        let events = assembler
            .push(r#"{"error":{"message":"overloaded","type":"server_error"}}"#)
            .unwrap();
        match &events[0] {
            GenerationEvent::Error { error } => {
                assert_eq!(error.kind, StreamErrorKind::Upstream);
                assert_eq!(error.message, "overloaded");
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert_eq!(assembler.state(), StreamState::Done);
    }

    #[test]
    fn unknown_tool_type_fails_decoding() {
        let mut assembler = OpenAiCompatibleAssembler::new();
        let events = assembler
            .push(r#"{"choices":[{"delta":{"tool_calls":[{"index":0,"id":"c1","type":"retrieval","function":{"name":"x"}}]}}]}"#)
            .unwrap();
        let kinds: Vec<_> = events.iter().map(|e| e.kind()).collect();
        assert_eq!(kinds, vec!["error", "finish"]);
    }

    #[test]
    fn metadata_key_is_always_present() {
        let mut assembler = OpenAiCompatibleAssembler::with_metadata_key("groq");
        assembler.push(r#"{"choices":[]}"#).unwrap();
        assembler.end();
        let result = assembler.result().unwrap();
        assert!(result.provider_metadata.provider("groq").is_some());
    }
}
