//! Shared test helpers and mock provider.
#![allow(dead_code)]

use async_trait::async_trait;

use chatwire::assembler::{AnthropicAssembler, Assembler, OpenAiCompatibleAssembler};
use chatwire::error::{ChatwireError, Result};
use chatwire::generation::{assemble_stream, EventStream};
use chatwire::provider::{ChatProvider, ChatRequest};
use chatwire::types::GenerationEvent;

/// Render `data:` payloads as one SSE body.
pub fn sse_body(payloads: &[&str]) -> String {
    payloads.iter().map(|p| format!("data: {p}\n\n")).collect()
}

/// Render SSE with `event:` lines, as the Messages API sends it.
pub fn named_sse_body(events: &[(&str, &str)]) -> String {
    events
        .iter()
        .map(|(name, data)| format!("event: {name}\ndata: {data}\n\n"))
        .collect()
}

/// Push every payload into `assembler`, then signal end of input.
pub fn run_payloads(assembler: &mut dyn Assembler, payloads: &[&str]) -> Vec<GenerationEvent> {
    let mut events = Vec::new();
    for payload in payloads {
        if assembler.state().is_done() {
            break;
        }
        events.extend(assembler.push(payload).unwrap());
    }
    events.extend(assembler.end());
    events
}

pub fn finish_count(events: &[GenerationEvent]) -> usize {
    events.iter().filter(|e| e.is_finish()).count()
}

#[derive(Debug, Clone, Copy)]
pub enum Wire {
    OpenAi,
    Anthropic,
}

/// A provider that replays a canned SSE body through the real assembler.
pub struct MockProvider {
    wire: Wire,
    body: std::sync::Mutex<Option<String>>,
    requests: std::sync::Mutex<Vec<ChatRequest>>,
}

impl MockProvider {
    pub fn new(wire: Wire, body: String) -> Self {
        Self {
            wire,
            body: std::sync::Mutex::new(Some(body)),
            requests: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// OpenAI-compatible stream producing `text` in one delta.
    pub fn replying(text: &str) -> Self {
        let chunk = serde_json::json!({
            "id": "chatcmpl-mock",
            "model": "mock-model",
            "created": 1_700_000_000,
            "choices": [{ "delta": { "content": text }, "finish_reason": "stop" }]
        })
        .to_string();
        Self::new(Wire::OpenAi, sse_body(&[&chunk, "[DONE]"]))
    }

    pub fn last_request(&self) -> Option<ChatRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl ChatProvider for MockProvider {
    fn provider_name(&self) -> &str {
        "mock"
    }

    fn model_id(&self) -> &str {
        "mock-model"
    }

    fn new_assembler(&self) -> Box<dyn Assembler> {
        match self.wire {
            Wire::OpenAi => Box::new(OpenAiCompatibleAssembler::new()),
            Wire::Anthropic => Box::new(AnthropicAssembler::new()),
        }
    }

    async fn stream_chat(&self, request: &ChatRequest) -> Result<EventStream> {
        self.requests.lock().unwrap().push(request.clone());
        let body = self
            .body
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| ChatwireError::Stream("mock body already consumed".into()))?;
        let chunks = vec![Ok::<_, std::io::Error>(body.into_bytes())];
        Ok(assemble_stream(
            futures::stream::iter(chunks),
            self.new_assembler(),
            request.cancel.clone(),
        ))
    }
}
