//! Streaming chat response assembly.
//!
//! An [`Assembler`] consumes the raw `data:` payloads of one provider stream
//! in arrival order and turns them into normalized [`GenerationEvent`]s,
//! ending with exactly one `finish` event. Each request gets its own
//! assembler; nothing is shared between streams.
//!
//! ```
//! use chatwire::assembler::{Assembler, OpenAiCompatibleAssembler};
//! use chatwire::types::FinishReason;
//!
//! let mut assembler = OpenAiCompatibleAssembler::new();
//! assembler
//!     .push(r#"{"choices":[{"delta":{"content":"Hi"},"finish_reason":"stop"}]}"#)
//!     .unwrap();
//! assembler.end();
//! let result = assembler.result().unwrap();
//! assert_eq!(result.text, "Hi");
//! assert_eq!(result.finish_reason, FinishReason::Stop);
//! ```

/// Implements the lifecycle half of [`Assembler`] for a type holding a
/// `core: StreamCore` and an `apply(&mut self, &str)` decoder.
macro_rules! delegate_lifecycle {
    ($ty:ty) => {
        impl $crate::assembler::Assembler for $ty {
            fn provider(&self) -> &'static str {
                self.core.provider()
            }

            fn state(&self) -> $crate::assembler::StreamState {
                self.core.state()
            }

            fn push(
                &mut self,
                data: &str,
            ) -> $crate::error::Result<Vec<$crate::types::GenerationEvent>> {
                self.core.ensure_open()?;
                if let Err(error) = self.apply(data) {
                    self.core.fail(error);
                }
                Ok(self.core.drain())
            }

            fn end(&mut self) -> Vec<$crate::types::GenerationEvent> {
                self.core.finalize();
                self.core.drain()
            }

            fn fail(
                &mut self,
                error: $crate::types::StreamError,
            ) -> Vec<$crate::types::GenerationEvent> {
                self.core.fail(error);
                self.core.drain()
            }

            fn abort(&mut self) -> Vec<$crate::types::GenerationEvent> {
                self.core.abort();
                self.core.drain()
            }

            fn result(&self) -> Option<&$crate::types::GenerationResult> {
                self.core.result()
            }
        }
    };
}

pub mod collector;
pub(crate) mod core;
pub mod tool_calls;
pub mod usage;

#[cfg(feature = "anthropic")]
pub mod anthropic;
#[cfg(feature = "openai")]
pub mod openai;

#[cfg(feature = "anthropic")]
pub use anthropic::AnthropicAssembler;
pub use collector::ResultCollector;
#[cfg(feature = "openai")]
pub use openai::OpenAiCompatibleAssembler;
pub use tool_calls::ToolCallBuffer;
pub use usage::UsageAccumulator;

use crate::error::Result;
use crate::types::{GenerationEvent, GenerationResult, StreamError};

/// Lifecycle of one assembler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Streaming,
    Done,
}

impl StreamState {
    pub fn is_done(self) -> bool {
        matches!(self, Self::Done)
    }
}

/// Reducer from provider wire chunks to generation events.
pub trait Assembler: Send {
    /// Provider this assembler decodes for.
    fn provider(&self) -> &'static str;

    fn state(&self) -> StreamState;

    /// Apply one raw `data:` payload.
    ///
    /// Decode failures, protocol violations and upstream error frames are
    /// returned in-band as an `error` event followed by `finish`. Input
    /// arriving after the stream finished is rejected with
    /// [`ChatwireError::ProtocolViolation`](crate::error::ChatwireError::ProtocolViolation).
    fn push(&mut self, data: &str) -> Result<Vec<GenerationEvent>>;

    /// The transport has no more input. Finishes the stream if still open.
    fn end(&mut self) -> Vec<GenerationEvent>;

    /// The transport broke. Finishes the stream with reason `error`.
    fn fail(&mut self, error: StreamError) -> Vec<GenerationEvent>;

    /// The caller gave up. Finishes the stream with reason `unknown`.
    fn abort(&mut self) -> Vec<GenerationEvent>;

    /// Final result, available once the stream is done.
    fn result(&self) -> Option<&GenerationResult>;
}
