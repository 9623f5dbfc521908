//! Driving an [`Assembler`] over a provider's byte stream.

use futures::stream::BoxStream;
use futures::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::assembler::{Assembler, ResultCollector};
use crate::provider::http::{SseDecoder, SseFrame};
use crate::types::{GenerationEvent, GenerationResult, StreamError, StreamErrorKind};

/// Live, push-only sequence of generation events ending with one `finish`.
pub type EventStream = BoxStream<'static, GenerationEvent>;

enum Input<T> {
    Cancelled,
    Next(Option<T>),
}

/// Feed an SSE byte stream through `assembler`, yielding events as they are
/// produced.
///
/// The returned stream always terminates with exactly one `finish` event:
/// on `[DONE]`, on the assembler's own terminal signal, when the body ends,
/// when the body fails (reason `error`), or when `cancel` fires (reason
/// `unknown`). Nothing is read from the body once the assembler is done.
pub fn assemble_stream<S, B, E>(
    body: S,
    mut assembler: Box<dyn Assembler>,
    cancel: Option<CancellationToken>,
) -> EventStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    let cancel = cancel.unwrap_or_default();
    let stream = async_stream::stream! {
        let mut decoder = SseDecoder::new();
        futures::pin_mut!(body);

        'read: loop {
            let input = tokio::select! {
                biased;
                _ = cancel.cancelled() => Input::Cancelled,
                next = body.next() => Input::Next(next),
            };

            let frames = match input {
                Input::Cancelled => {
                    debug!(provider = assembler.provider(), "stream cancelled by caller");
                    for event in assembler.abort() {
                        yield event;
                    }
                    break 'read;
                }
                Input::Next(None) => {
                    let frames: Vec<SseFrame> = decoder.finish().into_iter().collect();
                    for frame in frames {
                        for event in apply_frame(assembler.as_mut(), frame) {
                            yield event;
                        }
                    }
                    for event in assembler.end() {
                        yield event;
                    }
                    break 'read;
                }
                Input::Next(Some(Err(e))) => {
                    let error = StreamError::new(StreamErrorKind::Transport, e.to_string());
                    for event in assembler.fail(error) {
                        yield event;
                    }
                    break 'read;
                }
                Input::Next(Some(Ok(chunk))) => decoder.feed(chunk.as_ref()),
            };

            for frame in frames {
                for event in apply_frame(assembler.as_mut(), frame) {
                    yield event;
                }
                if assembler.state().is_done() {
                    break 'read;
                }
            }
        }
    };
    Box::pin(stream)
}

fn apply_frame(assembler: &mut dyn Assembler, frame: SseFrame) -> Vec<GenerationEvent> {
    match frame {
        SseFrame::Done => assembler.end(),
        SseFrame::Data(data) => match assembler.push(&data) {
            Ok(events) => events,
            Err(e) => {
                warn!(provider = assembler.provider(), error = %e, "dropping frame");
                Vec::new()
            }
        },
    }
}

/// Consume an event stream into its final result.
///
/// A stream that ends without a `finish` event yields reason `unknown`.
pub async fn collect_stream(mut stream: EventStream) -> GenerationResult {
    let mut collector = ResultCollector::new();
    while let Some(event) = stream.next().await {
        collector.observe(&event);
        if event.is_finish() {
            break;
        }
    }
    collector.into_result()
}
