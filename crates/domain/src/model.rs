//! Domain models and value objects

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::path::PathBuf;

/// Where the item source file lives, and where to fetch it from when the
/// local copy is missing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceHandle {
    /// Local path of the newline-delimited item file
    pub path: PathBuf,
    /// Optional URL the file is downloaded from when absent
    #[serde(default)]
    pub fetch_url: Option<String>,
}

impl SourceHandle {
    /// A handle with no download fallback
    pub fn local(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            fetch_url: None,
        }
    }
}

/// The complete persisted description of an in-progress run.
///
/// The orchestrator owns the in-memory value and is its only writer; the
/// state store owns the on-disk form. Persisted after every mutation so a
/// killed process resumes where it left off.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Region key for trend lookups (e.g. "turkey", "united-states")
    pub region: String,
    /// How many tags to attach to each item
    pub tags_per_item: usize,
    /// Minimum spacing between published items, in seconds
    pub interval_secs: u64,
    /// Whether a caption is generated for each item
    pub use_enrichment: bool,
    /// The item source file
    pub source: SourceHandle,
    /// Items still to process, front = next
    pub remaining: VecDeque<String>,
    /// Opaque transport-layer headers for the publishing endpoint.
    /// Round-tripped verbatim, never interpreted by the core.
    #[serde(default)]
    pub credentials: BTreeMap<String, String>,
}

/// Operator-provided configuration for a fresh run
#[derive(Debug, Clone)]
pub struct FreshSetup {
    pub region: String,
    pub tags_per_item: usize,
    pub interval_secs: u64,
    pub use_enrichment: bool,
    pub source: SourceHandle,
}

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every queued item was processed and the stored state removed
    Completed,
    /// The operator stopped the run; stored state reflects the remaining queue
    Interrupted,
    /// The run never entered the processing loop
    Aborted,
}

/// Result of a successful publish call
#[derive(Debug, Clone)]
pub struct PublishReceipt {
    /// HTTP status the endpoint answered with
    pub status: u16,
}
