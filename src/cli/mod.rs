//! CLI definitions for chatwire.

use clap::{Parser, Subcommand};

/// chatwire CLI
#[derive(Parser, Debug)]
#[command(name = "chatwire", version, about = "Stream chat completions and send Telegram replies")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Stream a chat completion to the terminal
    Chat(ChatArgs),
    /// Generate a reply and send it to a Telegram chat
    Reply(ReplyArgs),
}

/// Provider and model selection shared by all commands.
#[derive(Parser, Debug)]
pub struct ModelArgs {
    /// Provider to use (openai, anthropic); defaults to CHATWIRE_PROVIDER
    #[arg(short, long)]
    pub provider: Option<String>,

    /// Model ID; defaults to CHATWIRE_MODEL or the provider default
    #[arg(short, long)]
    pub model: Option<String>,

    /// System prompt; defaults to CHATWIRE_SYSTEM_PROMPT
    #[arg(short, long)]
    pub system: Option<String>,

    /// Temperature (0.0 - 2.0)
    #[arg(short, long)]
    pub temperature: Option<f64>,

    /// Max tokens
    #[arg(long)]
    pub max_tokens: Option<u32>,
}

/// Arguments for the `chat` subcommand.
#[derive(Parser, Debug)]
pub struct ChatArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    /// Print every event as JSON instead of plain text
    #[arg(long)]
    pub events: bool,

    /// User prompt
    pub prompt: String,
}

/// Arguments for the `reply` subcommand.
#[derive(Parser, Debug)]
pub struct ReplyArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    /// Telegram chat to reply in (negative for groups)
    #[arg(long, allow_negative_numbers = true)]
    pub chat_id: i64,

    /// Conversation thread identifier
    #[arg(long, default_value = "cli")]
    pub thread_id: String,

    /// Inbound user message
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_chat_command() {
        let cli = Cli::parse_from(["chatwire", "chat", "-p", "anthropic", "--events", "hello"]);
        match cli.command {
            Commands::Chat(args) => {
                assert_eq!(args.model.provider.as_deref(), Some("anthropic"));
                assert!(args.events);
                assert_eq!(args.prompt, "hello");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn parses_reply_command() {
        let cli = Cli::parse_from(["chatwire", "reply", "--chat-id", "-100", "hi there"]);
        match cli.command {
            Commands::Reply(args) => {
                assert_eq!(args.chat_id, -100);
                assert_eq!(args.thread_id, "cli");
                assert_eq!(args.message, "hi there");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
