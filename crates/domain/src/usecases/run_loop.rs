//! Run loop use case - the resumable processing state machine
//!
//! States: INIT -> {RESUME, FRESH} -> RUNNING -> {COMPLETED, INTERRUPTED,
//! ABORTED}. One item is in flight at a time; the persisted state reflects
//! the remaining queue at the last safe point on every exit path.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use rand::seq::SliceRandom;
use tokio::sync::watch;

use crate::{
    caption,
    model::{RunConfig, RunOutcome},
    ports::{
        CaptionGenerator, Clock, ConnectivityProbe, ContentPublisher, Operator, OperatorError,
        PublishJournal, Sleeper, SourceRegistry, StateStore, TrendSource,
    },
    retry::RetryPolicy,
    tags,
    usecases::compose::compose_post,
};

/// Fixed pause after an iteration that failed for unclassified reasons
const ERROR_COOLDOWN: Duration = Duration::from_secs(10);

/// Errors that end a run before the processing loop is entered
#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error("operator interaction failed: {0}")]
    Operator(#[from] OperatorError),
}

/// An error caught at the iteration boundary: the item is logged and
/// dropped, the run continues.
#[derive(Debug, thiserror::Error)]
enum IterationError {
    #[error("publish failed: {0}")]
    Publish(String),
}

/// The orchestrator driving a run from INIT to its terminal state
pub struct Orchestrator<Cg, Ts, Pu, Sr, St, Jn, Op, Pr, Sl, Cl>
where
    Cg: CaptionGenerator + ?Sized,
    Ts: TrendSource + ?Sized,
    Pu: ContentPublisher + ?Sized,
    Sr: SourceRegistry + ?Sized,
    St: StateStore + ?Sized,
    Jn: PublishJournal + ?Sized,
    Op: Operator + ?Sized,
    Pr: ConnectivityProbe + ?Sized,
    Sl: Sleeper + ?Sized,
    Cl: Clock + ?Sized,
{
    captioner: Arc<Cg>,
    trends: Arc<Ts>,
    publisher: Arc<Pu>,
    registry: Arc<Sr>,
    state_store: Arc<St>,
    journal: Arc<Jn>,
    operator: Arc<Op>,
    sleeper: Arc<Sl>,
    clock: Arc<Cl>,
    retry: RetryPolicy<Pr, Sl>,
    credentials: BTreeMap<String, String>,
    shutdown: watch::Receiver<bool>,
}

impl<Cg, Ts, Pu, Sr, St, Jn, Op, Pr, Sl, Cl> Orchestrator<Cg, Ts, Pu, Sr, St, Jn, Op, Pr, Sl, Cl>
where
    Cg: CaptionGenerator + ?Sized,
    Ts: TrendSource + ?Sized,
    Pu: ContentPublisher + ?Sized,
    Sr: SourceRegistry + ?Sized,
    St: StateStore + ?Sized,
    Jn: PublishJournal + ?Sized,
    Op: Operator + ?Sized,
    Pr: ConnectivityProbe + ?Sized,
    Sl: Sleeper + ?Sized,
    Cl: Clock + ?Sized,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        captioner: Arc<Cg>,
        trends: Arc<Ts>,
        publisher: Arc<Pu>,
        registry: Arc<Sr>,
        state_store: Arc<St>,
        journal: Arc<Jn>,
        operator: Arc<Op>,
        sleeper: Arc<Sl>,
        clock: Arc<Cl>,
        retry: RetryPolicy<Pr, Sl>,
        credentials: BTreeMap<String, String>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
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
            shutdown,
        }
    }

    /// Drive a run to one of its terminal states
    pub async fn run(&self) -> Result<RunOutcome, OrchestratorError> {
        let mut config = match self.init().await? {
            Some(config) => config,
            None => match self.fresh_start().await? {
                Some(config) => config,
                None => return Ok(RunOutcome::Aborted),
            },
        };

        self.persist(&config).await;
        self.run_to_completion(&mut config).await
    }

    /// INIT/RESUME: offer the saved run to the operator, if there is one
    async fn init(&self) -> Result<Option<RunConfig>, OrchestratorError> {
        let Some(saved) = self.state_store.load().await else {
            return Ok(None);
        };

        tracing::info!(
            remaining = saved.remaining.len(),
            region = %saved.region,
            "found a saved run"
        );

        if self.operator.confirm_resume(&saved)? {
            tracing::info!("resuming the saved run");
            return Ok(Some(saved));
        }

        tracing::info!("operator declined the saved run, starting fresh");
        if let Err(error) = self.state_store.clear().await {
            tracing::warn!(error = %error, "failed to discard the saved run");
        }
        Ok(None)
    }

    /// FRESH: collect setup, seed the queue from the registry, shuffle once.
    /// Returns `None` when no processable queue could be seeded (ABORTED).
    async fn fresh_start(&self) -> Result<Option<RunConfig>, OrchestratorError> {
        let setup = self.operator.collect_setup()?;

        if let Err(error) = self.registry.ensure_present(&setup.source).await {
            tracing::error!(error = %error, "could not obtain the item source file");
            return Ok(None);
        }

        let mut items = match self.registry.load_unconsumed(&setup.source).await {
            Ok(items) => items,
            Err(error) => {
                tracing::error!(error = %error, "could not read the item source file");
                return Ok(None);
            }
        };

        if items.is_empty() {
            tracing::error!("item source has no unconsumed entries, aborting");
            return Ok(None);
        }

        // One-time randomization of the work order; resumes keep it
        items.shuffle(&mut rand::rng());

        tracing::info!(count = items.len(), region = %setup.region, "seeded fresh run");

        Ok(Some(RunConfig {
            region: setup.region,
            tags_per_item: setup.tags_per_item,
            interval_secs: setup.interval_secs,
            use_enrichment: setup.use_enrichment,
            source: setup.source,
            remaining: items.into(),
            credentials: self.credentials.clone(),
        }))
    }

    /// RUNNING: pop, enrich, tag, publish, mark, persist, wait
    async fn run_to_completion(
        &self,
        config: &mut RunConfig,
    ) -> Result<RunOutcome, OrchestratorError> {
        tracing::info!(
            remaining = config.remaining.len(),
            "entering the processing loop"
        );

        loop {
            if self.interrupted() {
                self.persist(config).await;
                tracing::info!(remaining = config.remaining.len(), "interrupted, state saved");
                return Ok(RunOutcome::Interrupted);
            }

            let Some(item) = config.remaining.pop_front() else {
                break;
            };

            tracing::info!(
                item = %item,
                remaining = config.remaining.len(),
                "processing item"
            );

            let pause = match self.process_item(&item, config).await {
                Ok(()) => Duration::from_secs(config.interval_secs),
                Err(error) => {
                    tracing::error!(
                        item = %item,
                        error = %error,
                        "item failed, continuing with the next one"
                    );
                    ERROR_COOLDOWN
                }
            };

            // Saved even after a failed iteration: the queue no longer
            // holds the item, the registry still does.
            self.persist(config).await;

            if self.pace(pause).await {
                tracing::info!(remaining = config.remaining.len(), "interrupted, state saved");
                return Ok(RunOutcome::Interrupted);
            }
        }

        if let Err(error) = self.state_store.clear().await {
            tracing::warn!(error = %error, "failed to remove completed run state");
        }
        tracing::info!("all items processed");
        Ok(RunOutcome::Completed)
    }

    /// One full iteration for one item. Only a terminally failed publish is
    /// an error; everything upstream degrades to fallbacks.
    async fn process_item(&self, item: &str, config: &RunConfig) -> Result<(), IterationError> {
        let item_caption = if config.use_enrichment {
            Some(self.caption_for(item).await)
        } else {
            None
        };

        let selected = self.tags_for(&config.region, config.tags_per_item).await;

        let text = compose_post(item_caption.as_deref(), item, &selected);

        let receipt = self
            .retry
            .execute("publish", || {
                self.publisher.publish(&text, &config.credentials)
            })
            .await
            .map_err(|error| IterationError::Publish(error.to_string()))?;

        tracing::info!(item = %item, status = receipt.status, "published");

        if let Err(error) = self
            .journal
            .record(item, item_caption.as_deref(), &selected, self.clock.now())
            .await
        {
            tracing::warn!(error = %error, "journal append failed");
        }

        if let Err(error) = self.registry.mark_consumed(&config.source, item).await {
            tracing::error!(item = %item, error = %error, "failed to mark item consumed");
        }

        Ok(())
    }

    /// Caption via the retry policy; a terminal failure becomes the fixed
    /// fallback caption so the item still goes out.
    async fn caption_for(&self, item: &str) -> String {
        match self
            .retry
            .execute("generate_caption", || self.captioner.generate(item))
            .await
        {
            Ok(text) => text,
            Err(error) => {
                tracing::warn!(error = %error, "caption generation failed, using fallback");
                caption::FALLBACK_CAPTION.to_string()
            }
        }
    }

    /// Fetch, filter, and sample tags; a terminal failure publishes untagged
    async fn tags_for(&self, region: &str, count: usize) -> Vec<String> {
        match self
            .retry
            .execute("fetch_trends", || self.trends.fetch_anchors(region))
            .await
        {
            Ok(anchors) => {
                let filtered = tags::filter_candidates(&anchors);
                tracing::info!(candidates = filtered.len(), "fetched trend tags");
                tags::select(&filtered, count)
            }
            Err(error) => {
                tracing::warn!(error = %error, "trend fetch failed, publishing without tags");
                Vec::new()
            }
        }
    }

    async fn persist(&self, config: &RunConfig) {
        if let Err(error) = self.state_store.save(config).await {
            tracing::error!(error = %error, "failed to save run state");
        }
    }

    fn interrupted(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Sleep for `duration`, waking early on the shutdown signal.
    /// Returns true when the run was interrupted.
    async fn pace(&self, duration: Duration) -> bool {
        let mut shutdown = self.shutdown.clone();
        tokio::select! {
            _ = self.sleeper.sleep(duration) => false,
            _ = wait_for_stop(&mut shutdown) => true,
        }
    }
}

/// Resolves when the stop signal arrives. A dropped sender means no stop
/// signal can ever arrive, so the wait never resolves.
async fn wait_for_stop(shutdown: &mut watch::Receiver<bool>) {
    if shutdown.wait_for(|stop| *stop).await.is_err() {
        std::future::pending::<()>().await;
    }
}
