mod openai;

pub use openai::{OpenAiClient, OpenAiConfig};

use crate::error::ProviderError;
use crate::models::ChatMessage;
use async_trait::async_trait;

/// Produces a fixed-dimension embedding for one text. Called once per chunk
/// during an index build and once per query.
#[async_trait]
pub trait EmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError>;
}

/// Produces one free-text answer for a fully assembled message sequence.
#[async_trait]
pub trait ChatProvider {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, ProviderError>;
}
