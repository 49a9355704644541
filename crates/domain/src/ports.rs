//! Port definitions (traits) for external dependencies
//!
//! These traits define the boundaries between the domain and external systems.
//! Adapters implement these traits to connect to real infrastructure. Every
//! port error that can be caused by the network carries the classification on
//! the value via [`Retryable`].

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;
use time::OffsetDateTime;

use crate::model::{FreshSetup, PublishReceipt, RunConfig, SourceHandle};
use crate::retry::Retryable;

/// Port for the cheap reachability check retry waits are gated on
#[async_trait]
pub trait ConnectivityProbe: Send + Sync {
    /// Whether a known-good endpoint currently answers
    async fn is_reachable(&self) -> bool;
}

/// Error type for caption generation
#[derive(Debug, Error)]
pub enum CaptionError {
    #[error("network error: {0}")]
    Network(String),
    #[error("timeout")]
    Timeout,
    #[error("invalid response: {0}")]
    InvalidFormat(String),
}

impl Retryable for CaptionError {
    fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Timeout)
    }
}

/// Port for the external caption-generation service
#[async_trait]
pub trait CaptionGenerator: Send + Sync {
    /// Produce a short, already post-processed caption for an item.
    ///
    /// Only connectivity problems surface as errors; a service answer that
    /// cannot be used resolves to a fixed fallback caption inside the
    /// implementation.
    async fn generate(&self, item: &str) -> Result<String, CaptionError>;
}

/// Error type for trend lookups
#[derive(Debug, Error)]
pub enum TrendError {
    #[error("network error: {0}")]
    Network(String),
    #[error("timeout")]
    Timeout,
    #[error("listing page returned HTTP {0}")]
    Status(u16),
}

impl Retryable for TrendError {
    fn is_retryable(&self) -> bool {
        true
    }
}

/// Port for the region-keyed trend listing page
#[async_trait]
pub trait TrendSource: Send + Sync {
    /// Raw anchor texts of the region's listing page, unfiltered
    async fn fetch_anchors(&self, region: &str) -> Result<Vec<String>, TrendError>;
}

/// Error type for publish operations
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("network error: {0}")]
    Network(String),
    #[error("timeout")]
    Timeout,
    #[error("endpoint returned HTTP {status}: {body}")]
    Api { status: u16, body: String },
}

// Endpoint rejections are waited out like outages (see DESIGN.md).
impl Retryable for PublishError {
    fn is_retryable(&self) -> bool {
        true
    }
}

/// Port for the publishing endpoint
#[async_trait]
pub trait ContentPublisher: Send + Sync {
    /// Send composed text, authenticated with the run's opaque header set
    async fn publish(
        &self,
        text: &str,
        credentials: &BTreeMap<String, String>,
    ) -> Result<PublishReceipt, PublishError>;
}

/// Error type for the item source registry
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("source file missing: {0}")]
    Missing(String),
    #[error("download failed: {0}")]
    Fetch(String),
}

/// Port for the newline-delimited item source file.
///
/// The registry is the sole writer of consumption markers and the durable
/// record of "never process this item again", independent of run state.
#[async_trait]
pub trait SourceRegistry: Send + Sync {
    /// Download the source file when it is missing and a fetch URL is set
    async fn ensure_present(&self, source: &SourceHandle) -> Result<(), RegistryError>;

    /// Items not yet bearing the consumed marker, in file order
    async fn load_unconsumed(&self, source: &SourceHandle) -> Result<Vec<String>, RegistryError>;

    /// Append the consumed marker to the first line exactly equal to `item`.
    /// Marking an already-marked item leaves the file unchanged.
    async fn mark_consumed(&self, source: &SourceHandle, item: &str)
    -> Result<(), RegistryError>;
}

/// Error type for state store operations
#[derive(Debug, Error)]
pub enum StateError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Port for persisting the run configuration
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Atomically persist the full run configuration
    async fn save(&self, config: &RunConfig) -> Result<(), StateError>;

    /// Load the stored configuration. Missing, unreadable, corrupt, or
    /// incompatible state is "no prior run", never an error.
    async fn load(&self) -> Option<RunConfig>;

    /// Remove the stored configuration
    async fn clear(&self) -> Result<(), StateError>;
}

/// Error type for the publish journal
#[derive(Debug, Error)]
pub enum JournalError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Port for the append-only record of published items
#[async_trait]
pub trait PublishJournal: Send + Sync {
    /// Append one published item; failures never interrupt the run
    async fn record(
        &self,
        item: &str,
        caption: Option<&str>,
        tags: &[String],
        published_at: OffsetDateTime,
    ) -> Result<(), JournalError>;
}

/// Error type for operator interaction
#[derive(Debug, Error)]
pub enum OperatorError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid input: {0}")]
    Invalid(String),
}

/// Port for the human driving the run.
///
/// Implementations return validated primitive values; the orchestrator never
/// re-validates them.
pub trait Operator: Send + Sync {
    /// Ask whether to continue the loaded run; `false` discards it
    fn confirm_resume(&self, config: &RunConfig) -> Result<bool, OperatorError>;

    /// Collect the configuration for a fresh run
    fn collect_setup(&self) -> Result<FreshSetup, OperatorError>;
}

/// Port for time/clock operations (enables deterministic testing)
pub trait Clock: Send + Sync {
    /// Get the current time
    fn now(&self) -> OffsetDateTime;
}

/// Real clock implementation
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// Port for blocking waits (enables deterministic testing)
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Real sleeper implementation
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
