use anyhow::Result;
use async_trait::async_trait;

// =============================================================================
// ChatAgent Trait
// =============================================================================

#[async_trait]
pub trait ChatAgent: Send + Sync {
    /// Send a system + user prompt pair and return the assistant's text reply.
    async fn chat_completion(&self, system: &str, user: &str) -> Result<String>;
}

// =============================================================================
// EmbedAgent Trait
// =============================================================================

#[async_trait]
pub trait EmbedAgent: Send + Sync {
    async fn embed(&self, text: impl Into<String> + Send) -> Result<Vec<f32>>;
    async fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>>;
}
