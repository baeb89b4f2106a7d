use std::collections::HashSet;

use anyhow::Result;
use tracing::info;

use trialstream_common::{Config, ExtractorStrategy, FlatRow};

use crate::ages::normalize_ages;
use crate::annotate::{annotate_rows, EntityExtractor, LlmExtractor, NerExtractor};
use crate::embed::{generate_embeddings, Embedder};
use crate::fetch::{fetch_all, ListingClient};
use crate::filter::filter_by_status;
use crate::flatten::flatten;
use crate::store::AnalyticsStore;
use crate::transform::transform_criteria;

/// Stage 1: fetch, flatten, normalize ages, status-filter, annotate the
/// filtered subset, and load both tables.
pub async fn ingest_and_annotate(config: &Config) -> Result<()> {
    let client = ListingClient::new(&config.api_base_url);
    let studies = fetch_all(&client, config.page_size, config.max_pages).await;

    let rows: Vec<FlatRow> = studies.iter().map(flatten).collect();
    let rows = normalize_ages(rows);
    info!(rows = rows.len(), "flattened and normalized");

    let allowed: HashSet<String> = config.target_statuses.iter().cloned().collect();
    let filtered = filter_by_status(&rows, &allowed);
    info!(filtered = filtered.len(), "status filter applied");

    let extractor = build_extractor(config)?;
    let annotated = annotate_rows(extractor.as_ref(), filtered).await;

    let mut store = AnalyticsStore::open(&config.duckdb_file_path)?;
    store.load_studies(&rows, "studies")?;
    store.load_filtered(&annotated, "filtered_studies")?;
    Ok(())
}

/// Stage 2: SQL transform inside the store.
pub fn transform(config: &Config) -> Result<()> {
    let store = AnalyticsStore::open(&config.duckdb_file_path)?;
    transform_criteria(&store)
}

/// Stage 3: embed the transformed criteria and load the vectors back.
pub async fn embed(config: &Config) -> Result<()> {
    let mut store = AnalyticsStore::open(&config.duckdb_file_path)?;
    let embedder = build_embedder(config)?;
    generate_embeddings(&mut store, &embedder).await
}

fn build_extractor(config: &Config) -> Result<Box<dyn EntityExtractor>> {
    Ok(match config.extractor {
        ExtractorStrategy::Local => Box::new(NerExtractor::new(&config.ner_endpoint)),
        ExtractorStrategy::Llm => Box::new(LlmExtractor::new(
            config.require_api_key()?,
            &config.llm_model,
        )),
    })
}

/// Construct the embedder the stages and the web server share. A locally
/// hosted endpoint does not check the bearer token, so the key is only
/// required for the hosted API.
pub fn build_embedder(config: &Config) -> Result<Embedder> {
    let api_key = match config.embedding_base_url {
        Some(_) => config.openai_api_key.as_deref().unwrap_or("unused"),
        None => config.require_api_key()?,
    };
    Ok(Embedder::new(
        api_key,
        &config.embedding_model,
        config.embedding_base_url.as_deref(),
    ))
}
