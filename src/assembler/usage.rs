//! Last-writer-wins accumulation of usage and provider metadata.

use crate::types::{ProviderMetadata, Usage};

/// Usage and metadata seen so far in one stream.
#[derive(Debug, Default)]
pub struct UsageAccumulator {
    usage: Usage,
    metadata: ProviderMetadata,
}

impl UsageAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the fields `reported` carries. Absent fields keep their value.
    pub fn record(&mut self, reported: &Usage) {
        self.usage.overwrite_from(reported);
    }

    pub fn set_metadata(&mut self, provider: &str, key: &str, value: impl Into<serde_json::Value>) {
        self.metadata.set(provider, key, value);
    }

    pub fn touch_metadata(&mut self, provider: &str) {
        self.metadata.touch(provider);
    }

    pub fn usage(&self) -> Usage {
        self.usage
    }

    pub fn metadata(&self) -> &ProviderMetadata {
        &self.metadata
    }
}
