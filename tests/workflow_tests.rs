//! Telegram client and chat reply workflow.

mod common;

use std::sync::Arc;

use chatwire::config::ChatwireConfig;
use chatwire::error::ChatwireError;
use chatwire::telegram::TelegramClient;
use chatwire::types::Role;
use chatwire::workflow::{AgentReply, ChatInput, ChatReplyWorkflow, ReplyOutcome};
use common::{sse_body, MockProvider, Wire};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn input(message: &str) -> ChatInput {
    ChatInput {
        message: message.to_string(),
        thread_id: "thread-1".to_string(),
        chat_id: 4242,
    }
}

#[tokio::test]
async fn telegram_send_message_posts_chat_and_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/bot123:abc/sendMessage"))
        .and(body_json(json!({ "chat_id": 4242, "text": "hello" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .expect(1)
        .mount(&server)
        .await;

    let client = TelegramClient::new(Some("123:abc".into())).with_api_base(server.uri());
    client.send_message(4242, "hello").await.unwrap();
}

#[tokio::test]
async fn telegram_rejection_is_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_string("chat not found"))
        .mount(&server)
        .await;

    let client = TelegramClient::new(Some("123:abc".into())).with_api_base(server.uri());
    let err = client.send_message(1, "hello").await.unwrap_err();
    assert!(matches!(err, ChatwireError::Api { status: 400, .. }));
}

#[tokio::test]
async fn workflow_generates_and_sends_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/bot123:abc/sendMessage"))
        .and(body_json(json!({ "chat_id": 4242, "text": "Hi! How can I help?" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = Arc::new(MockProvider::replying("Hi! How can I help?"));
    let telegram = TelegramClient::new(Some("123:abc".into())).with_api_base(server.uri());
    let workflow = ChatReplyWorkflow::new(provider.clone(), telegram)
        .with_system_prompt(Some("You are a friendly bot.".into()));

    let outcome = workflow.run(&input("hello")).await.unwrap();
    assert_eq!(outcome, ReplyOutcome { sent: true });

    let request = provider.last_request().unwrap();
    let roles: Vec<Role> = request.messages.iter().map(|m| m.role).collect();
    assert_eq!(roles, vec![Role::System, Role::User]);
    assert_eq!(request.messages[1].content, "hello");
}

#[tokio::test]
async fn use_agent_returns_reply_for_chat() {
    let provider = Arc::new(MockProvider::replying("pong"));
    let workflow = ChatReplyWorkflow::new(provider, TelegramClient::new(None));

    let reply = workflow.use_agent(&input("ping")).await.unwrap();
    assert_eq!(
        reply,
        AgentReply {
            response: "pong".into(),
            chat_id: 4242
        }
    );
}

#[tokio::test]
async fn missing_token_skips_send() {
    let provider = Arc::new(MockProvider::replying("pong"));
    let workflow = ChatReplyWorkflow::new(provider, TelegramClient::new(None));

    let outcome = workflow.run(&input("ping")).await.unwrap();
    assert_eq!(outcome, ReplyOutcome { sent: false });
}

#[tokio::test]
async fn failed_send_reports_not_sent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(403).set_body_string("bot was blocked by the user"))
        .mount(&server)
        .await;

    let telegram = TelegramClient::new(Some("123:abc".into())).with_api_base(server.uri());
    let workflow = ChatReplyWorkflow::new(Arc::new(MockProvider::replying("pong")), telegram);

    let outcome = workflow.run(&input("ping")).await.unwrap();
    assert!(!outcome.sent);
}

#[tokio::test]
async fn failed_generation_stops_before_send() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let body = sse_body(&[r#"{"type":"error","error":{"type":"api_error","message":"boom"}}"#]);
    let provider = Arc::new(MockProvider::new(Wire::Anthropic, body));
    let telegram = TelegramClient::new(Some("123:abc".into())).with_api_base(server.uri());
    let workflow = ChatReplyWorkflow::new(provider, telegram);

    let err = workflow.run(&input("ping")).await.unwrap_err();
    assert!(matches!(err, ChatwireError::Upstream(ref m) if m == "api_error: boom"));
}

#[tokio::test]
async fn empty_reply_is_an_error() {
    let body = sse_body(&[r#"{"choices":[{"delta":{},"finish_reason":"length"}]}"#, "[DONE]"]);
    let provider = Arc::new(MockProvider::new(Wire::OpenAi, body));
    let workflow = ChatReplyWorkflow::new(provider, TelegramClient::new(None));

    let err = workflow.use_agent(&input("ping")).await.unwrap_err();
    assert!(matches!(err, ChatwireError::Stream(ref m) if m.contains("length")));
}

#[test]
fn chat_input_uses_camel_case_fields() {
    let parsed: ChatInput = serde_json::from_value(json!({
        "message": "hi",
        "threadId": "t-9",
        "chatId": -1001
    }))
    .unwrap();
    assert_eq!(parsed.thread_id, "t-9");
    assert_eq!(parsed.chat_id, -1001);
}

#[test]
fn telegram_client_reads_config() {
    let config = ChatwireConfig::new();
    assert!(!TelegramClient::from_config(&config).has_token());
    config.set_telegram_bot_token("123:abc");
    assert!(TelegramClient::from_config(&config).has_token());
}
