use std::env;
use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

/// Which entity-extraction strategy the annotation stage uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractorStrategy {
    /// Local token-classification model behind an inference endpoint.
    #[default]
    Local,
    /// Hosted chat-completion API with an extraction prompt.
    Llm,
}

/// Application configuration, constructed once at process start and passed
/// into each component. Nothing reads ambient global state after this.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub duckdb_file_path: String,
    pub api_base_url: String,
    pub target_statuses: Vec<String>,

    /// Records per listing page.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Optional cap on pages fetched, used to bound cost in development.
    #[serde(default)]
    pub max_pages: Option<u32>,

    #[serde(default)]
    pub extractor: ExtractorStrategy,
    /// Token-classification inference endpoint for the local strategy.
    #[serde(default = "default_ner_endpoint")]
    pub ner_endpoint: String,
    /// Chat model for the LLM strategy.
    #[serde(default = "default_llm_model")]
    pub llm_model: String,

    /// OpenAI-compatible base URL for embeddings; None means the hosted API.
    #[serde(default)]
    pub embedding_base_url: Option<String>,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    #[serde(default = "default_web_host")]
    pub web_host: String,
    #[serde(default = "default_web_port")]
    pub web_port: u16,

    /// Secret for hosted model APIs, read from the environment, never from
    /// the config file.
    #[serde(skip)]
    pub openai_api_key: Option<String>,
}

impl Config {
    /// Load configuration from a JSON document. Missing required keys are
    /// fatal: the error propagates out of main before any work starts.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let mut config: Config = serde_json::from_str(&raw)
            .with_context(|| format!("parsing config file {}", path.display()))?;

        if config.duckdb_file_path.is_empty() {
            bail!("duckdb_file_path is not set in the config file");
        }
        if config.api_base_url.is_empty() {
            bail!("api_base_url is not set in the config file");
        }

        config.openai_api_key = env::var("OPENAI_API_KEY").ok();
        Ok(config)
    }

    /// The API key, required by the LLM extractor and hosted embeddings.
    pub fn require_api_key(&self) -> Result<&str> {
        self.openai_api_key
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("OPENAI_API_KEY environment variable is required"))
    }
}

fn default_page_size() -> u32 {
    1000
}

fn default_ner_endpoint() -> String {
    "http://localhost:8090".to_string()
}

fn default_llm_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_embedding_model() -> String {
    "sentence-transformers/all-MiniLM-L6-v2".to_string()
}

fn default_web_host() -> String {
    "0.0.0.0".to_string()
}

fn default_web_port() -> u16 {
    5001
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_config_with_defaults() {
        let raw = r#"{
            "duckdb_file_path": "data/clinical_trial_data.duckdb",
            "api_base_url": "https://clinicaltrials.gov/api/v2/studies",
            "target_statuses": ["AVAILABLE", "RECRUITING"]
        }"#;
        let config: Config = serde_json::from_str(raw).unwrap();
        assert_eq!(config.page_size, 1000);
        assert_eq!(config.max_pages, None);
        assert_eq!(config.extractor, ExtractorStrategy::Local);
        assert_eq!(config.web_port, 5001);
        assert_eq!(config.target_statuses.len(), 2);
    }

    #[test]
    fn parses_overridden_optional_keys() {
        let raw = r#"{
            "duckdb_file_path": "x.duckdb",
            "api_base_url": "https://example.org/studies",
            "target_statuses": [],
            "page_size": 50,
            "max_pages": 5,
            "extractor": "llm",
            "web_port": 8080
        }"#;
        let config: Config = serde_json::from_str(raw).unwrap();
        assert_eq!(config.page_size, 50);
        assert_eq!(config.max_pages, Some(5));
        assert_eq!(config.extractor, ExtractorStrategy::Llm);
        assert_eq!(config.web_port, 8080);
    }
}
