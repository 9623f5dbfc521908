//! One-shot text generation on top of a streaming provider.

use tracing::debug;

use crate::error::Result;
use crate::provider::{ChatProvider, ChatRequest};
use crate::types::GenerationResult;

use super::stream::{collect_stream, EventStream};

/// Start a streaming generation.
pub async fn stream_text(provider: &dyn ChatProvider, request: &ChatRequest) -> Result<EventStream> {
    provider.stream_chat(request).await
}

/// Stream a generation to completion.
///
/// A stream that ended in an `error` event is returned as the matching
/// [`ChatwireError`](crate::error::ChatwireError).
pub async fn generate_text(
    provider: &dyn ChatProvider,
    request: &ChatRequest,
) -> Result<GenerationResult> {
    debug!(
        provider = provider.provider_name(),
        model = provider.model_id(),
        "generate_text"
    );
    let stream = provider.stream_chat(request).await?;
    collect_stream(stream).await.into_result()
}
