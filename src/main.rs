//! chatwire CLI binary entry point.

use std::io::Write;
use std::sync::Arc;

use clap::Parser;
use chatwire::cli::{ChatArgs, Cli, Commands, ModelArgs, ReplyArgs};
use chatwire::config::ChatwireConfig;
use chatwire::error::ChatwireError;
use chatwire::generation::stream_text;
use chatwire::provider::{create_provider, ChatProvider, ChatRequest, ChatSettings, ProviderKind};
use chatwire::telegram::TelegramClient;
use chatwire::types::{ChatMessage, GenerationEvent};
use chatwire::workflow::{ChatInput, ChatReplyWorkflow};
use futures::StreamExt;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Chat(args) => handle_chat(args).await,
        Commands::Reply(args) => handle_reply(args).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

struct Selected {
    provider: Box<dyn ChatProvider>,
    settings: ChatSettings,
    system: Option<String>,
}

fn select(args: &ModelArgs, config: &ChatwireConfig) -> Result<Selected, ChatwireError> {
    let kind = match &args.provider {
        Some(name) => name.parse::<ProviderKind>().map_err(|_| {
            ChatwireError::InvalidArgument(format!(
                "Unknown provider '{name}'. Use 'openai' or 'anthropic'"
            ))
        })?,
        None => config.provider_kind()?,
    };
    let model = args.model.clone().unwrap_or_else(|| config.model_for(kind));
    let provider = create_provider(kind, &model, config)?;
    let settings = ChatSettings {
        max_tokens: args.max_tokens,
        temperature: args.temperature,
        ..ChatSettings::default()
    };
    Ok(Selected {
        provider,
        settings,
        system: args.system.clone().or_else(|| config.system_prompt()),
    })
}

async fn handle_chat(args: ChatArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = ChatwireConfig::from_env();
    let selected = select(&args.model, &config)?;

    let mut messages = Vec::new();
    if let Some(system) = selected.system {
        messages.push(ChatMessage::system(system));
    }
    messages.push(ChatMessage::user(args.prompt));
    let request = ChatRequest::builder()
        .messages(messages)
        .settings(selected.settings)
        .build();

    let mut stream = stream_text(selected.provider.as_ref(), &request).await?;
    let mut stdout = std::io::stdout();
    let mut failure = None;

    while let Some(event) = stream.next().await {
        if args.events {
            println!("{}", serde_json::to_string(&event)?);
        }
        match event {
            GenerationEvent::TextDelta { text_delta } if !args.events => {
                print!("{text_delta}");
                stdout.flush()?;
            }
            GenerationEvent::ToolCall(call) if !args.events => {
                eprintln!("\n⚡ {} ({}) {}", call.tool_name, call.tool_call_id, call.args);
            }
            GenerationEvent::Error { error } => failure = Some(error),
            GenerationEvent::Finish {
                finish_reason,
                usage,
                ..
            } => {
                if !args.events {
                    println!();
                    eprintln!(
                        "[finish: {finish_reason}, prompt: {}, completion: {}]",
                        usage.prompt_tokens.map_or("-".into(), |n| n.to_string()),
                        usage.completion_tokens.map_or("-".into(), |n| n.to_string()),
                    );
                }
                break;
            }
            _ => {}
        }
    }

    match failure {
        Some(error) => Err(ChatwireError::from(error).into()),
        None => Ok(()),
    }
}

async fn handle_reply(args: ReplyArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = ChatwireConfig::from_env();
    let selected = select(&args.model, &config)?;

    let workflow = ChatReplyWorkflow::new(
        Arc::from(selected.provider),
        TelegramClient::from_config(&config),
    )
    .with_system_prompt(selected.system)
    .with_settings(selected.settings);

    let input = ChatInput {
        message: args.message,
        thread_id: args.thread_id,
        chat_id: args.chat_id,
    };
    let outcome = workflow.run(&input).await?;
    println!("{}", serde_json::to_string(&outcome)?);
    Ok(())
}
