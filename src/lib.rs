//! chatwire — streaming chat-completion assembly for chat bots.
//!
//! Calls an OpenAI-compatible or Anthropic chat-completion API, reassembles
//! the streamed response into one [`GenerationResult`](types::GenerationResult),
//! and forwards the reply to Telegram.
//!
//! # Quick Start
//!
//! ```no_run
//! use chatwire::prelude::*;
//!
//! # async fn example() -> chatwire::error::Result<()> {
//! let config = ChatwireConfig::from_env();
//! let kind = config.provider_kind()?;
//! let provider = create_provider(kind, &config.model_for(kind), &config)?;
//! let request = ChatRequest::new(vec![ChatMessage::user("Hello!")]);
//! let result = chatwire::generation::generate_text(provider.as_ref(), &request).await?;
//! println!("{result}");
//! # Ok(())
//! # }
//! ```

pub mod assembler;
pub mod config;
pub mod error;
pub mod generation;
pub mod prelude;
pub mod provider;
pub mod telegram;
pub mod types;
pub mod workflow;

#[cfg(feature = "cli")]
pub mod cli;
