use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrialStreamError {
    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("Unknown age format: {0}")]
    AgeFormat(String),

    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}
