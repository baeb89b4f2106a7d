use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

use ai_client::{EmbedAgent, OpenAi};
use trialstream_common::EmbeddedCriteria;

use crate::store::AnalyticsStore;

// --- TextEmbedder trait ---

#[async_trait]
pub trait TextEmbedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Sentence embeddings via an OpenAI-compatible `/embeddings` endpoint.
/// The base URL is configurable so a locally hosted sentence-transformers
/// server is interchangeable with the hosted API. The web server must use
/// the same model that ran here, or similarity scores are meaningless.
pub struct Embedder {
    client: OpenAi,
}

impl Embedder {
    pub fn new(api_key: &str, model: &str, base_url: Option<&str>) -> Self {
        let mut client = OpenAi::new(api_key, model).with_embedding_model(model);
        if let Some(url) = base_url {
            client = client.with_base_url(url);
        }
        Self { client }
    }
}

#[async_trait]
impl TextEmbedder for Embedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.client.embed(text.to_string()).await
    }
}

/// Stage 3: embed every transformed criteria text and load the vectors,
/// serialized as JSON arrays, into criteria_embeddings.
pub async fn generate_embeddings(
    store: &mut AnalyticsStore,
    embedder: &dyn TextEmbedder,
) -> Result<()> {
    let criteria = store.read_transformed_criteria()?;
    info!(rows = criteria.len(), "embedding criteria texts");

    let mut embedded = Vec::with_capacity(criteria.len());
    for (nct_id, brief_title, custom_criteria) in criteria {
        let vector = embedder.embed(&custom_criteria).await?;
        embedded.push(EmbeddedCriteria {
            nct_id,
            brief_title,
            custom_criteria,
            criteria_embeddings: serde_json::to_string(&vector)?,
        });
    }

    store.load_embeddings(&embedded, "criteria_embeddings")?;
    Ok(())
}
