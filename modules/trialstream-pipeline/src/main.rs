use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use trialstream_common::Config;
use trialstream_pipeline::{stages, workflow};

#[derive(Parser)]
#[command(name = "trialstream", about = "Clinical-trial ETL pipeline")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(long, default_value = "config/config.json")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Stage 1: fetch, flatten, normalize, filter, annotate, load.
    Ingest,
    /// Stage 2: rebuild custom_eligibility_criteria.
    Transform,
    /// Stage 3: generate and load criteria embeddings.
    Embed,
    /// Run all three stages once, with per-task retry.
    Run,
    /// Run the whole pipeline on a monthly cadence.
    Schedule,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("trialstream=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    // Missing required configuration is fatal before any work starts.
    let config = Config::load(&cli.config)?;
    info!(config = %cli.config, "configuration loaded");

    let policy = workflow::TaskPolicy::default();

    match cli.command {
        Command::Ingest => stages::ingest_and_annotate(&config).await?,
        Command::Transform => stages::transform(&config)?,
        Command::Embed => stages::embed(&config).await?,
        Command::Run => workflow::run_pipeline(&config, &policy).await?,
        Command::Schedule => workflow::run_monthly(&config, &policy).await?,
    }

    Ok(())
}
