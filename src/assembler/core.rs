//! Stream lifecycle shared by every provider assembler.

use tracing::debug;
use uuid::Uuid;

use super::collector::ResultCollector;
use super::tool_calls::ToolCallBuffer;
use super::usage::UsageAccumulator;
use super::StreamState;
use crate::error::{ChatwireError, Result};
use crate::types::{FinishReason, GenerationEvent, GenerationResult, StreamError};

/// Owned per-stream state: lifecycle, buffers, and the outbox of events
/// produced by the chunk currently being applied.
#[derive(Debug)]
pub(crate) struct StreamCore {
    provider: &'static str,
    stream_id: Uuid,
    state: StreamState,
    finish_reason: FinishReason,
    pub(crate) tools: ToolCallBuffer,
    pub(crate) usage: UsageAccumulator,
    collector: ResultCollector,
    outbox: Vec<GenerationEvent>,
}

impl StreamCore {
    pub(crate) fn new(provider: &'static str) -> Self {
        Self {
            provider,
            stream_id: Uuid::new_v4(),
            state: StreamState::Streaming,
            finish_reason: FinishReason::Unknown,
            tools: ToolCallBuffer::new(),
            usage: UsageAccumulator::new(),
            collector: ResultCollector::new(),
            outbox: Vec::new(),
        }
    }

    pub(crate) fn provider(&self) -> &'static str {
        self.provider
    }

    pub(crate) fn state(&self) -> StreamState {
        self.state
    }

    /// Reject input once the stream has closed.
    pub(crate) fn ensure_open(&self) -> Result<()> {
        if self.state.is_done() {
            return Err(ChatwireError::ProtocolViolation(format!(
                "{} stream {} received an event after it finished",
                self.provider, self.stream_id
            )));
        }
        Ok(())
    }

    pub(crate) fn emit(&mut self, event: GenerationEvent) {
        self.collector.observe(&event);
        self.outbox.push(event);
    }

    pub(crate) fn emit_all(&mut self, events: impl IntoIterator<Item = GenerationEvent>) {
        for event in events {
            self.emit(event);
        }
    }

    pub(crate) fn set_finish_reason(&mut self, reason: FinishReason) {
        self.finish_reason = reason;
    }

    /// Emit an `error` event and close the stream with reason `error`.
    pub(crate) fn fail(&mut self, error: StreamError) {
        if self.state.is_done() {
            return;
        }
        debug!(
            provider = self.provider,
            stream_id = %self.stream_id,
            kind = %error.kind,
            message = %error.message,
            "stream failed"
        );
        self.finish_reason = FinishReason::Error;
        self.emit(GenerationEvent::Error { error });
        self.finalize();
    }

    /// Close the stream as aborted by the caller.
    pub(crate) fn abort(&mut self) {
        if self.state.is_done() {
            return;
        }
        debug!(provider = self.provider, stream_id = %self.stream_id, "stream aborted");
        self.finish_reason = FinishReason::Unknown;
        self.finalize();
    }

    /// Move to `Done` and emit the single `finish` event. No-op when done.
    pub(crate) fn finalize(&mut self) {
        if self.state.is_done() {
            return;
        }
        self.state = StreamState::Done;
        let event = GenerationEvent::Finish {
            finish_reason: self.finish_reason,
            usage: self.usage.usage(),
            provider_metadata: self.usage.metadata().clone(),
        };
        self.emit(event);
        debug!(
            provider = self.provider,
            stream_id = %self.stream_id,
            finish_reason = %self.finish_reason,
            "stream finished"
        );
    }

    pub(crate) fn drain(&mut self) -> Vec<GenerationEvent> {
        std::mem::take(&mut self.outbox)
    }

    pub(crate) fn result(&self) -> Option<&GenerationResult> {
        self.collector
            .is_finished()
            .then(|| self.collector.result())
    }
}
