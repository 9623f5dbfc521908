//! Streaming and collected text generation.

pub mod stream;
pub mod text;

pub use stream::{assemble_stream, collect_stream, EventStream};
pub use text::{generate_text, stream_text};
