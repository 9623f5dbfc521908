//! OpenAI-compatible Chat Completions provider.

use async_trait::async_trait;
use tracing::debug;

use crate::assembler::{Assembler, OpenAiCompatibleAssembler};
use crate::error::Result;
use crate::generation::{assemble_stream, EventStream};

use super::http::{bearer_headers, shared_client, status_to_error};
use super::{ChatProvider, ChatRequest};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Streams from any `/chat/completions` endpoint that speaks the OpenAI
/// wire format.
pub struct OpenAiCompatibleProvider {
    model: String,
    api_key: String,
    base_url: String,
    metadata_key: String,
    include_usage: bool,
}

impl OpenAiCompatibleProvider {
    pub fn new(model: impl Into<String>, api_key: String, base_url: Option<String>) -> Self {
        Self {
            model: model.into(),
            api_key,
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            metadata_key: crate::assembler::openai::DEFAULT_METADATA_KEY.to_string(),
            include_usage: true,
        }
    }

    /// Key under which provider metadata is reported.
    pub fn with_metadata_key(mut self, key: impl Into<String>) -> Self {
        self.metadata_key = key.into();
        self
    }

    /// Whether to send `stream_options.include_usage`. Some compatible
    /// servers reject the option.
    pub fn with_include_usage(mut self, include: bool) -> Self {
        self.include_usage = include;
        self
    }

    pub(crate) fn build_request_body(&self, request: &ChatRequest) -> serde_json::Value {
        let messages: Vec<serde_json::Value> = request
            .messages
            .iter()
            .map(|m| serde_json::json!({ "role": m.role.to_string(), "content": m.content }))
            .collect();

        let mut body = serde_json::json!({
            "model": self.model,
            "messages": messages,
            "stream": true,
        });
        let Some(obj) = body.as_object_mut() else {
            return body;
        };

        if self.include_usage {
            obj.insert(
                "stream_options".into(),
                serde_json::json!({ "include_usage": true }),
            );
        }

        let settings = &request.settings;
        if let Some(max) = settings.max_tokens {
            obj.insert("max_tokens".into(), max.into());
        }
        if let Some(temp) = settings.temperature {
            obj.insert("temperature".into(), temp.into());
        }
        if let Some(top_p) = settings.top_p {
            obj.insert("top_p".into(), top_p.into());
        }
        if let Some(ref stops) = settings.stop_sequences {
            obj.insert("stop".into(), serde_json::json!(stops));
        }
        if let Some(seed) = settings.seed {
            obj.insert("seed".into(), seed.into());
        }
        if let Some(ref user) = settings.user {
            obj.insert("user".into(), user.clone().into());
        }

        if let Some(ref tools) = request.tools {
            if !tools.is_empty() {
                let tool_defs: Vec<serde_json::Value> = tools
                    .iter()
                    .map(|t| {
                        serde_json::json!({
                            "type": "function",
                            "function": {
                                "name": t.name,
                                "description": t.description,
                                "parameters": t.parameters,
                            }
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
impl ChatProvider for OpenAiCompatibleProvider {
    fn provider_name(&self) -> &str {
        "openai"
    }

    fn model_id(&self) -> &str {
        &self.model
    }

    fn new_assembler(&self) -> Box<dyn Assembler> {
        Box::new(OpenAiCompatibleAssembler::with_metadata_key(
            self.metadata_key.clone(),
        ))
    }

    async fn stream_chat(&self, request: &ChatRequest) -> Result<EventStream> {
        let body = self.build_request_body(request);
        let url = format!("{}/chat/completions", self.base_url);

        debug!(model = self.model.as_str(), "OpenAI-compatible stream_chat");

        let resp = shared_client()
            .post(&url)
            .headers(bearer_headers(&self.api_key))
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
    use crate::provider::ChatSettings;
    use crate::types::{ChatMessage, ToolDefinition};

    fn provider() -> OpenAiCompatibleProvider {
        OpenAiCompatibleProvider::new("gpt-4o", "test-key".to_string(), None)
    }

    #[test]
    fn request_body_streams_with_usage() {
        let request = ChatRequest::new(vec![
            ChatMessage::system("be brief"),
            ChatMessage::user("hello"),
        ]);
        let body = provider().build_request_body(&request);
        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["stream"], true);
        assert_eq!(body["stream_options"]["include_usage"], true);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "hello");
        assert!(body.get("tools").is_none());
    }

    #[test]
    fn request_body_carries_settings_and_tools() {
        let request = ChatRequest::builder()
            .messages(vec![ChatMessage::user("weather?")])
            .settings(
                ChatSettings::builder()
                    .temperature(0.2)
                    .max_tokens(64)
                    .build(),
            )
            .tools(vec![ToolDefinition {
                name: "lookup".into(),
                description: "Look something up".into(),
                parameters: serde_json::json!({"type": "object"}),
            }])
            .build();
        let body = provider()
            .with_include_usage(false)
            .build_request_body(&request);
        assert_eq!(body["temperature"], 0.2);
        assert_eq!(body["max_tokens"], 64);
        assert_eq!(body["tools"][0]["function"]["name"], "lookup");
        assert!(body.get("stream_options").is_none());
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let provider = OpenAiCompatibleProvider::new(
            "m",
            "k".to_string(),
            Some("http://localhost:8080/v1/".to_string()),
        );
        assert_eq!(provider.base_url, "http://localhost:8080/v1");
    }
}
