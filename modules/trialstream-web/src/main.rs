use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::State,
    response::Html,
    routing::{get, post},
    Form, Router,
};
use clap::Parser;
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use trialstream_common::Config;
use trialstream_pipeline::embed::{Embedder, TextEmbedder};
use trialstream_pipeline::stages::build_embedder;
use trialstream_pipeline::store::AnalyticsStore;

mod pages;
mod similarity;

use similarity::{most_similar, parse_stored, StoredEmbedding};

#[derive(Parser)]
#[command(name = "trialstream-web", about = "Eligibility-criteria similarity search")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(long, default_value = "config/config.json")]
    config: String,
}

struct AppState {
    /// Stored rows with parsed vectors; empty means "no data yet".
    rows: Vec<StoredEmbedding>,
    embedder: Embedder,
}

#[derive(Deserialize)]
struct QueryForm {
    sentence: String,
}

async fn index(State(state): State<Arc<AppState>>) -> Html<String> {
    if state.rows.is_empty() {
        return Html(pages::render_no_data());
    }
    Html(pages::render_index(None, None))
}

async fn result(
    State(state): State<Arc<AppState>>,
    Form(form): Form<QueryForm>,
) -> Html<String> {
    if state.rows.is_empty() {
        return Html(pages::render_no_data());
    }

    let query = match state.embedder.embed(&form.sentence).await {
        Ok(vector) => vector,
        Err(e) => {
            warn!(error = %e, "query embedding failed");
            return Html(pages::render_index(
                None,
                Some("Could not embed the query. Try again later."),
            ));
        }
    };

    Html(pages::render_index(most_similar(&query, &state.rows), None))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("trialstream=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;

    // Degrade to the no-data page instead of erroring when the pipeline has
    // not produced anything yet.
    let rows = if Path::new(&config.duckdb_file_path).exists() {
        let store = AnalyticsStore::open(&config.duckdb_file_path)?;
        parse_stored(store.read_embeddings()?)
    } else {
        warn!(path = %config.duckdb_file_path, "store file does not exist, serving without data");
        Vec::new()
    };
    info!(rows = rows.len(), "embeddings loaded");

    let state = Arc::new(AppState {
        rows,
        embedder: build_embedder(&config)?,
    });

    let app = Router::new()
        .route("/", get(index))
        .route("/result", post(result))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("{}:{}", config.web_host, config.web_port);
    info!(addr = %addr, "similarity server listening");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
