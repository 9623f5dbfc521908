//! Convenience re-exports for common use.

pub use crate::assembler::{Assembler, StreamState};
pub use crate::config::ChatwireConfig;
pub use crate::error::{ChatwireError, Result};
pub use crate::generation::{collect_stream, generate_text, EventStream};
pub use crate::provider::{create_provider, ChatProvider, ChatRequest, ChatSettings, ProviderKind};
pub use crate::types::{
    ChatMessage, FinishReason, GenerationEvent, GenerationResult, Role, ToolCall, Usage,
};
