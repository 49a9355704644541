//! Append-only JSONL journal of published items

use async_trait::async_trait;
use linkdrip_domain::{JournalError, PublishJournal};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// Journal appending one JSON line per published item
#[derive(Debug, Clone)]
pub struct JsonlJournal {
    path: PathBuf,
    file: Arc<Mutex<tokio::fs::File>>,
}

impl JsonlJournal {
    pub async fn new(path: PathBuf) -> Result<Self, JournalError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;

        Ok(Self {
            path,
            file: Arc::new(Mutex::new(file)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[derive(Serialize)]
struct JournalEntry<'a> {
    item: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    caption: Option<&'a str>,
    tags: &'a [String],
    #[serde(with = "time::serde::rfc3339")]
    published_at: OffsetDateTime,
}

#[async_trait]
impl PublishJournal for JsonlJournal {
    async fn record(
        &self,
        item: &str,
        caption: Option<&str>,
        tags: &[String],
        published_at: OffsetDateTime,
    ) -> Result<(), JournalError> {
        let entry = JournalEntry {
            item,
            caption,
            tags,
            published_at,
        };

        let line = serde_json::to_string(&entry)?;
        let mut file = self.file.lock().await;
        file.write_all(line.as_bytes()).await?;
        file.write_all(b"\n").await?;
        file.flush().await?;
        Ok(())
    }
}
