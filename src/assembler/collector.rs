//! Folding a generation event sequence into a [`GenerationResult`].

use crate::types::{GenerationEvent, GenerationResult};

/// Builds a [`GenerationResult`] from the events of one stream.
#[derive(Debug, Default)]
pub struct ResultCollector {
    result: GenerationResult,
    finished: bool,
}

impl ResultCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, event: &GenerationEvent) {
        let result = &mut self.result;
        match event {
            GenerationEvent::ResponseMetadata(meta) => {
                if meta.id.is_some() {
                    result.response.id = meta.id.clone();
                }
                if meta.model_id.is_some() {
                    result.response.model_id = meta.model_id.clone();
                }
                if meta.timestamp.is_some() {
                    result.response.timestamp = meta.timestamp;
                }
            }
            GenerationEvent::TextDelta { text_delta } => result.text.push_str(text_delta),
            GenerationEvent::ReasoningDelta { text_delta } => {
                result.reasoning.push_str(text_delta)
            }
            GenerationEvent::ReasoningSignature { signature } => {
                result.reasoning_signature = Some(signature.clone())
            }
            GenerationEvent::RedactedReasoning { data } => {
                result.redacted_reasoning.push(data.clone())
            }
            GenerationEvent::ToolCallDelta { .. } => {}
            GenerationEvent::ToolCall(call) => result.tool_calls.push(call.clone()),
            GenerationEvent::Error { error } => {
                if result.error.is_none() {
                    result.error = Some(error.clone());
                }
            }
            GenerationEvent::Finish {
                finish_reason,
                usage,
                provider_metadata,
            } => {
                result.finish_reason = *finish_reason;
                result.usage = *usage;
                result.provider_metadata = provider_metadata.clone();
                self.finished = true;
            }
        }
    }

    /// Whether a `finish` event has been observed.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn result(&self) -> &GenerationResult {
        &self.result
    }

    pub fn into_result(self) -> GenerationResult {
        self.result
    }
}
