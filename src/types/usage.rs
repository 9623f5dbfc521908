//! Token usage reported by a provider.

use serde::{Deserialize, Serialize};

/// Token usage snapshot for one generation.
///
/// `None` means the provider never reported the field. It is not zero.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Usage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accepted_prediction_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejected_prediction_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cached_prompt_tokens: Option<u32>,
}

impl Usage {
    /// Prompt plus completion tokens, if both were reported and the sum fits.
    pub fn total_tokens(&self) -> Option<u32> {
        self.prompt_tokens?.checked_add(self.completion_tokens?)
    }

    /// Overwrite every field `other` reports, keeping the rest.
    ///
    /// Providers re-send cumulative totals, so values replace rather than add.
    pub fn overwrite_from(&mut self, other: &Usage) {
        fn take(slot: &mut Option<u32>, value: Option<u32>) {
            if value.is_some() {
                *slot = value;
            }
        }
        take(&mut self.prompt_tokens, other.prompt_tokens);
        take(&mut self.completion_tokens, other.completion_tokens);
        take(&mut self.reasoning_tokens, other.reasoning_tokens);
        take(
            &mut self.accepted_prediction_tokens,
            other.accepted_prediction_tokens,
        );
        take(
            &mut self.rejected_prediction_tokens,
            other.rejected_prediction_tokens,
        );
        take(&mut self.cached_prompt_tokens, other.cached_prompt_tokens);
    }
}
