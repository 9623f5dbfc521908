//! Anthropic Messages API provider.

use async_trait::async_trait;
use tracing::debug;

use crate::assembler::{AnthropicAssembler, Assembler};
use crate::error::Result;
use crate::generation::{assemble_stream, EventStream};
use crate::types::Role;

use super::http::{anthropic_headers, shared_client, status_to_error};
use super::{ChatProvider, ChatRequest};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";
const API_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_TOKENS: u32 = 4096;

pub struct AnthropicProvider {
    model: String,
    api_key: String,
    base_url: String,
}

impl AnthropicProvider {
    pub fn new(model: impl Into<String>, api_key: String, base_url: Option<String>) -> Self {
        Self {
            model: model.into(),
            api_key,
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
        }
    }

    pub(crate) fn build_request_body(&self, request: &ChatRequest) -> serde_json::Value {
        let mut system_parts = Vec::new();
        let mut messages = Vec::new();
        for msg in &request.messages {
            match msg.role {
                Role::System => system_parts.push(msg.content.as_str()),
                Role::User | Role::Assistant => messages.push(serde_json::json!({
                    "role": msg.role.to_string(),
                    "content": msg.content,
                })),
            }
        }

        let settings = &request.settings;
        let mut body = serde_json::json!({
            "model": self.model,
            "messages": messages,
            "max_tokens": settings.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            "stream": true,
        });
        let Some(obj) = body.as_object_mut() else {
            return body;
        };

        if !system_parts.is_empty() {
            obj.insert("system".into(), system_parts.join("\n\n").into());
        }
        if let Some(temp) = settings.temperature {
            obj.insert("temperature".into(), temp.into());
        }
        if let Some(top_p) = settings.top_p {
            obj.insert("top_p".into(), top_p.into());
        }
        if let Some(ref stops) = settings.stop_sequences {
            obj.insert("stop_sequences".into(), serde_json::json!(stops));
        }
        if let Some(ref user) = settings.user {
            obj.insert("metadata".into(), serde_json::json!({ "user_id": user }));
        }

        if let Some(ref tools) = request.tools {
            if !tools.is_empty() {
                let tool_defs: Vec<serde_json::Value> = tools
                    .iter()
                    .map(|t| {
                        serde_json::json!({
                            "name": t.name,
                            "description": t.description,
                            "input_schema": t.parameters,
                        })
                    })
                    .collect();
                obj.insert("tools".into(), tool_defs.into());
            }
        }

        body
    }
}

#[async_trait]
impl ChatProvider for AnthropicProvider {
    fn provider_name(&self) -> &str {
        "anthropic"
    }

    fn model_id(&self) -> &str {
        &self.model
    }

    fn new_assembler(&self) -> Box<dyn Assembler> {
        Box::new(AnthropicAssembler::new())
    }

    async fn stream_chat(&self, request: &ChatRequest) -> Result<EventStream> {
        let body = self.build_request_body(request);
        let url = format!("{}/messages", self.base_url);

        debug!(model = self.model.as_str(), "Anthropic stream_chat");

        let resp = shared_client()
            .post(&url)
            .headers(anthropic_headers(&self.api_key, API_VERSION))
            .json(&body)
            .send()
            .await?;

        let status = resp.status().as_u16();
        if !(200..300).contains(&status) {
            let body_text = resp.text().await.unwrap_or_default();
            return Err(status_to_error(status, &body_text));
        }

        Ok(assemble_stream(
            resp.bytes_stream(),
            self.new_assembler(),
            request.cancel.clone(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChatMessage;

    #[test]
    fn system_messages_move_to_top_level() {
        let provider =
            AnthropicProvider::new("claude-sonnet-4-5", "test-key".to_string(), None);
        let request = ChatRequest::new(vec![
            ChatMessage::system("rule one"),
            ChatMessage::system("rule two"),
            ChatMessage::user("hi"),
        ]);
        let body = provider.build_request_body(&request);
        assert_eq!(body["system"], "rule one\n\nrule two");
        assert_eq!(body["messages"].as_array().map(Vec::len), Some(1));
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["max_tokens"], 4096);
        assert_eq!(body["stream"], true);
    }
}
