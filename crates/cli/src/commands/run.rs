//! Run command - drain the item queue until empty or interrupted

use anyhow::{Context, Result, bail};
use linkdrip_adapters::{
    ConsoleOperator, FileRegistry, GrokCaptioner, HttpProbe, JsonStateStore, JsonlJournal,
    OperatorPresets, TrendsPageSource, XApiPublisher,
};
use linkdrip_domain::{
    RetryPolicy, RunOutcome, SystemClock, TokioSleeper, usecases::Orchestrator,
};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use crate::args::RunArgs;
use crate::config::AppConfig;

pub async fn execute(args: RunArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;

    tracing::info!(
        state = %config.general.state_path.display(),
        source = %config.general.source_path.display(),
        "starting linkdrip run"
    );

    // Build dependencies
    let probe = Arc::new(HttpProbe::with_url(config.network.probe_url.clone()));
    let sleeper = Arc::new(TokioSleeper);
    let retry = RetryPolicy::with_limits(
        Arc::clone(&probe),
        Arc::clone(&sleeper),
        config.network.max_retries,
        Duration::from_secs(config.network.base_delay_secs),
    );

    let captioner = Arc::new(GrokCaptioner::new(config.caption.base_url.clone()));
    let trends = Arc::new(TrendsPageSource::with_base_url(config.trends.base_url.clone()));
    let publisher = Arc::new(XApiPublisher::new(config.publish.url.clone()));
    let registry = Arc::new(FileRegistry::new());
    let state_store = Arc::new(JsonStateStore::new(&config.general.state_path));
    let journal = Arc::new(
        JsonlJournal::new(config.general.journal_path.clone())
            .await
            .context("Failed to open publish journal")?,
    );
    let operator = Arc::new(ConsoleOperator::new(
        presets_from_args(&args),
        config.general.source_path.clone(),
        config.general.source_fetch_url.clone(),
    ));
    let clock = Arc::new(SystemClock);

    let credentials = build_credentials(&config);

    // Forward Ctrl-C into the orchestrator's shutdown channel; the loop
    // persists state and exits at the next safe point.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("shutdown signal received");
            let _ = shutdown_tx.send(true);
        }
    });

    let orchestrator = Orchestrator::new(
        captioner,
        trends,
        publisher,
        registry,
        state_store,
        journal,
        operator,
        sleeper,
        clock,
        retry,
        credentials,
        shutdown_rx,
    );

    match orchestrator.run().await? {
        RunOutcome::Completed => {
            tracing::info!("run completed, queue empty");
            Ok(())
        }
        RunOutcome::Interrupted => {
            tracing::info!("run interrupted, state saved for resume");
            Ok(())
        }
        RunOutcome::Aborted => bail!("run aborted before processing began"),
    }
}

fn presets_from_args(args: &RunArgs) -> OperatorPresets {
    OperatorPresets {
        region: args.region.clone(),
        tags_per_item: args.tags,
        interval_secs: args.interval,
        use_enrichment: if args.no_enrichment { Some(false) } else { None },
        source_path: args.source.clone(),
        assume_resume: if args.yes { Some(true) } else { None },
    }
}

/// The opaque credential header set: configured headers plus the bearer
/// token from the environment, when present.
fn build_credentials(config: &AppConfig) -> BTreeMap<String, String> {
    let mut credentials = config.publish.headers.clone();

    match std::env::var(&config.publish.auth_token_env) {
        Ok(token) if !token.is_empty() => {
            credentials.insert("authorization".to_string(), format!("Bearer {token}"));
        }
        _ => {
            tracing::warn!(
                env = %config.publish.auth_token_env,
                "no publish token in the environment, sending configured headers only"
            );
        }
    }

    credentials
}
