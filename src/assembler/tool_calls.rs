//! Reconstruction of tool calls from interleaved argument fragments.

use std::collections::BTreeMap;

use crate::types::{GenerationEvent, StreamError, StreamErrorKind, ToolCall, ToolCallType};

#[derive(Debug)]
struct PendingToolCall {
    call_type: ToolCallType,
    id: String,
    name: String,
    arguments: String,
    complete: bool,
}

impl PendingToolCall {
    fn delta_event(&self, fragment: &str) -> GenerationEvent {
        GenerationEvent::ToolCallDelta {
            tool_call_type: self.call_type,
            tool_call_id: self.id.clone(),
            tool_name: self.name.clone(),
            args_text_delta: fragment.to_string(),
        }
    }

    fn complete_event(&mut self) -> GenerationEvent {
        self.complete = true;
        GenerationEvent::ToolCall(ToolCall {
            tool_call_type: self.call_type,
            tool_call_id: self.id.clone(),
            tool_name: self.name.clone(),
            args: self.arguments.clone(),
        })
    }
}

/// Buffers tool-call argument text per stream index.
///
/// An entry completes the moment its accumulated text parses as JSON. After
/// that every further fragment for the index is dropped.
#[derive(Debug, Default)]
pub struct ToolCallBuffer {
    pending: BTreeMap<u32, PendingToolCall>,
}

impl ToolCallBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, index: u32) -> bool {
        self.pending.contains_key(&index)
    }

    /// Open a new entry. The call type, id and name are all mandatory.
    pub fn start(
        &mut self,
        index: u32,
        call_type: Option<ToolCallType>,
        id: Option<String>,
        name: Option<String>,
    ) -> Result<(), StreamError> {
        if self.contains(index) {
            return Err(StreamError::new(
                StreamErrorKind::Protocol,
                format!("tool call at index {index} started twice"),
            ));
        }
        let call_type = call_type.ok_or_else(|| {
            StreamError::new(
                StreamErrorKind::Decode,
                format!("tool call at index {index}: expected 'function' type"),
            )
        })?;
        let id = id.ok_or_else(|| {
            StreamError::new(
                StreamErrorKind::Decode,
                format!("tool call at index {index}: expected 'id' to be a string"),
            )
        })?;
        let name = name.ok_or_else(|| {
            StreamError::new(
                StreamErrorKind::Decode,
                format!("tool call at index {index}: expected 'function.name' to be a string"),
            )
        })?;

        self.pending.insert(
            index,
            PendingToolCall {
                call_type,
                id,
                name,
                arguments: String::new(),
                complete: false,
            },
        );
        Ok(())
    }

    /// Append an argument fragment and report what it produced.
    ///
    /// Emits `tool-call-delta` for a non-empty fragment, then `tool-call` if
    /// the text now parses.
    pub fn append(
        &mut self,
        index: u32,
        fragment: Option<&str>,
    ) -> Result<Vec<GenerationEvent>, StreamError> {
        let entry = self.pending.get_mut(&index).ok_or_else(|| {
            StreamError::new(
                StreamErrorKind::Protocol,
                format!("tool call delta for index {index} arrived before the call was started"),
            )
        })?;
        if entry.complete {
            return Ok(Vec::new());
        }

        let fragment = fragment.unwrap_or_default();
        let mut events = Vec::new();
        entry.arguments.push_str(fragment);
        if !fragment.is_empty() {
            events.push(entry.delta_event(fragment));
        }
        if is_parsable_json(&entry.arguments) {
            events.push(entry.complete_event());
        }
        Ok(events)
    }

    /// Close an entry whose provider signals the end of its arguments.
    ///
    /// An incomplete entry is emitted with whatever text it holds; empty text
    /// becomes `{}`.
    pub fn close(&mut self, index: u32) -> Option<GenerationEvent> {
        let entry = self.pending.get_mut(&index)?;
        if entry.complete {
            return None;
        }
        if entry.arguments.is_empty() {
            entry.arguments.push_str("{}");
        }
        Some(entry.complete_event())
    }

    pub fn is_complete(&self, index: u32) -> Option<bool> {
        self.pending.get(&index).map(|e| e.complete)
    }

    pub fn arguments(&self, index: u32) -> Option<&str> {
        self.pending.get(&index).map(|e| e.arguments.as_str())
    }
}

fn is_parsable_json(text: &str) -> bool {
    serde_json::from_str::<serde::de::IgnoredAny>(text).is_ok()
}
