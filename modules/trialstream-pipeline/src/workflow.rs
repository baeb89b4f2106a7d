use std::future::Future;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Datelike, TimeZone, Utc};
use tracing::{error, info, warn};

use trialstream_common::Config;

use crate::stages;

/// Whole-task retry policy: one retry after a fixed delay. There is no
/// page- or row-level retry anywhere below this.
#[derive(Debug, Clone, Copy)]
pub struct TaskPolicy {
    pub retries: u32,
    pub retry_delay: Duration,
}

impl Default for TaskPolicy {
    fn default() -> Self {
        Self {
            retries: 1,
            retry_delay: Duration::from_secs(5 * 60),
        }
    }
}

/// Run one named task under the policy. A second failure is final and
/// surfaces to the caller, which halts the downstream tasks.
pub async fn run_task<F, Fut>(name: &str, policy: &TaskPolicy, mut task: F) -> Result<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<()>>,
{
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        info!(task = name, attempt, "task starting");
        match task().await {
            Ok(()) => {
                info!(task = name, attempt, "task succeeded");
                return Ok(());
            }
            Err(e) if attempt <= policy.retries => {
                warn!(
                    task = name,
                    attempt,
                    error = %e,
                    delay_secs = policy.retry_delay.as_secs(),
                    "task failed, retrying after delay"
                );
                tokio::time::sleep(policy.retry_delay).await;
            }
            Err(e) => {
                error!(task = name, attempt, error = %e, "task failed, run marked failed");
                return Err(e).with_context(|| format!("task {name} failed"));
            }
        }
    }
}

/// Execute the three-task graph once, in strict linear order:
/// ingest_and_annotate -> transform_criteria -> generate_embeddings.
pub async fn run_pipeline(config: &Config, policy: &TaskPolicy) -> Result<()> {
    run_task("ingest_and_annotate", policy, || {
        stages::ingest_and_annotate(config)
    })
    .await?;

    run_task("transform_criteria", policy, || async {
        stages::transform(config)
    })
    .await?;

    run_task("generate_embeddings", policy, || stages::embed(config)).await?;

    info!("pipeline run complete");
    Ok(())
}

/// The next run boundary: the first of the following month, midnight UTC.
pub fn next_monthly_run(now: DateTime<Utc>) -> DateTime<Utc> {
    let (year, month) = if now.month() == 12 {
        (now.year() + 1, 1)
    } else {
        (now.year(), now.month() + 1)
    };
    Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0)
        .single()
        .expect("first of month is a valid UTC timestamp")
}

/// Monthly cadence, no catch-up: a failed run is logged and the loop waits
/// for the next boundary rather than re-running missed months.
pub async fn run_monthly(config: &Config, policy: &TaskPolicy) -> Result<()> {
    loop {
        let now = Utc::now();
        let next = next_monthly_run(now);
        let wait = (next - now)
            .to_std()
            .context("computing sleep until next run")?;
        info!(next_run = %next, "sleeping until next scheduled run");
        tokio::time::sleep(wait).await;

        if let Err(e) = run_pipeline(config, policy).await {
            error!(error = %e, "scheduled run failed; waiting for next cadence");
        }
    }
}
