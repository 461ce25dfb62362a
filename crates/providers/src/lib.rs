pub mod anthropic;
pub mod factory;
pub mod openai;

use async_trait::async_trait;
use serde_json::Value;
use webaudit_core::types::{ChatMessage, LLMResponse};
use webaudit_core::Result;

/// Largest prefix of `s` that fits in `max_bytes` on a char boundary.
pub(crate) fn truncate_at_char_boundary(s: &str, max_bytes: usize) -> &str {
    if max_bytes >= s.len() {
        return s;
    }
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[async_trait]
pub trait Provider: Send + Sync {
    async fn chat(&self, messages: &[ChatMessage], tools: &[Value]) -> Result<LLMResponse>;
}

pub use anthropic::AnthropicProvider;
pub use factory::{create_provider, infer_provider_from_model};
pub use openai::OpenAIProvider;
