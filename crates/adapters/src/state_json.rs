//! Versioned JSON run-state store
//!
//! The whole RunConfig is serialized as one document inside a versioned
//! envelope and swapped into place atomically. Anything that cannot be read
//! back (missing, corrupt, foreign version) loads as "no prior run".

use async_trait::async_trait;
use linkdrip_domain::{RunConfig, StateError, StateStore};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use time::OffsetDateTime;
use tokio::fs;

/// Current on-disk layout version. Bumped on incompatible changes so an
/// older file is refused instead of misread.
const STATE_VERSION: u32 = 1;

#[derive(Serialize)]
struct PersistedState<'a> {
    version: u32,
    #[serde(with = "time::serde::rfc3339")]
    saved_at: OffsetDateTime,
    config: &'a RunConfig,
}

#[derive(Deserialize)]
struct LoadedState {
    version: u32,
    #[serde(with = "time::serde::rfc3339")]
    #[allow(dead_code)]
    saved_at: OffsetDateTime,
    config: RunConfig,
}

#[derive(Deserialize)]
struct VersionProbe {
    version: u32,
}

/// State store writing one JSON document at a fixed path
pub struct JsonStateStore {
    path: PathBuf,
}

impl JsonStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl StateStore for JsonStateStore {
    async fn save(&self, config: &RunConfig) -> Result<(), StateError> {
        let state = PersistedState {
            version: STATE_VERSION,
            saved_at: OffsetDateTime::now_utc(),
            config,
        };

        let json = serde_json::to_vec_pretty(&state)
            .map_err(|e| StateError::Serialization(e.to_string()))?;

        // Write-then-rename so a crash never leaves a half-written state file
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, &json)
            .await
            .map_err(|e| StateError::Io(e.to_string()))?;
        fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| StateError::Io(e.to_string()))?;

        tracing::debug!(path = %self.path.display(), "run state saved");
        Ok(())
    }

    async fn load(&self) -> Option<RunConfig> {
        let contents = match fs::read(&self.path).await {
            Ok(contents) => contents,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return None,
            Err(error) => {
                tracing::warn!(error = %error, "state file unreadable, treating as no prior run");
                return None;
            }
        };

        match serde_json::from_slice::<VersionProbe>(&contents) {
            Ok(probe) if probe.version != STATE_VERSION => {
                tracing::error!(
                    found = probe.version,
                    expected = STATE_VERSION,
                    "state file has an incompatible version, refusing to resume from it"
                );
                return None;
            }
            Ok(_) => {}
            Err(error) => {
                tracing::warn!(error = %error, "state file corrupt, treating as no prior run");
                return None;
            }
        }

        match serde_json::from_slice::<LoadedState>(&contents) {
            Ok(state) => Some(state.config),
            Err(error) => {
                tracing::warn!(error = %error, "state file corrupt, treating as no prior run");
                None
            }
        }
    }

    async fn clear(&self) -> Result<(), StateError> {
        match fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(StateError::Io(error.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use linkdrip_domain::SourceHandle;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn sample_config() -> RunConfig {
        RunConfig {
            region: "turkey".to_string(),
            tags_per_item: 3,
            interval_secs: 120,
            use_enrichment: true,
            source: SourceHandle::local("links.txt"),
            remaining: ["https://a.example", "https://b.example"]
                .into_iter()
                .map(String::from)
                .collect(),
            credentials: BTreeMap::from([("authorization".to_string(), "Bearer t".to_string())]),
        }
    }

    #[tokio::test]
    async fn save_then_load_round_trips_every_field() {
        let dir = TempDir::new().unwrap();
        let store = JsonStateStore::new(dir.path().join("state.json"));

        let config = sample_config();
        store.save(&config).await.unwrap();

        let loaded = store.load().await.expect("state present");
        assert_eq!(loaded.region, config.region);
        assert_eq!(loaded.tags_per_item, config.tags_per_item);
        assert_eq!(loaded.interval_secs, config.interval_secs);
        assert_eq!(loaded.use_enrichment, config.use_enrichment);
        assert_eq!(loaded.source.path, config.source.path);
        assert_eq!(loaded.remaining, config.remaining);
        assert_eq!(loaded.credentials, config.credentials);
    }

    #[tokio::test]
    async fn queue_order_survives_the_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = JsonStateStore::new(dir.path().join("state.json"));

        let mut config = sample_config();
        config.remaining = (0..50)
            .map(|n| format!("https://example.com/{n}"))
            .collect();
        store.save(&config).await.unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.remaining, config.remaining);
    }

    #[tokio::test]
    async fn missing_file_loads_as_no_prior_run() {
        let dir = TempDir::new().unwrap();
        let store = JsonStateStore::new(dir.path().join("absent.json"));

        assert!(store.load().await.is_none());
    }

    #[tokio::test]
    async fn corrupt_file_loads_as_no_prior_run() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, b"{ not json").await.unwrap();

        let store = JsonStateStore::new(path);
        assert!(store.load().await.is_none());
    }

    #[tokio::test]
    async fn foreign_version_loads_as_no_prior_run() {
        let dir = TempDir::new().unwrap();
        let store = JsonStateStore::new(dir.path().join("state.json"));
        store.save(&sample_config()).await.unwrap();

        let contents = fs::read_to_string(dir.path().join("state.json"))
            .await
            .unwrap();
        let bumped = contents.replacen("\"version\": 1", "\"version\": 99", 1);
        fs::write(dir.path().join("state.json"), bumped).await.unwrap();

        assert!(store.load().await.is_none());
    }

    #[tokio::test]
    async fn save_overwrites_previous_state() {
        let dir = TempDir::new().unwrap();
        let store = JsonStateStore::new(dir.path().join("state.json"));

        let mut config = sample_config();
        store.save(&config).await.unwrap();

        config.remaining.pop_front();
        store.save(&config).await.unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.remaining.len(), 1);
    }

    #[tokio::test]
    async fn clear_removes_the_state_and_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = JsonStateStore::new(dir.path().join("state.json"));

        store.save(&sample_config()).await.unwrap();
        store.clear().await.unwrap();
        assert!(store.load().await.is_none());

        // Clearing again is a no-op
        store.clear().await.unwrap();
    }
}
