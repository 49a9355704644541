//! File-backed item source registry
//!
//! The registry file is newline-delimited item identifiers; a trailing `#`
//! marks a line as consumed. The file survives runs and discarded state, so
//! it is the durable record of "never process this item again".

use async_trait::async_trait;
use linkdrip_domain::{RegistryError, SourceHandle, SourceRegistry};
use reqwest::Client;
use std::time::Duration;
use tokio::fs;

/// Trailing character denoting a consumed line
const CONSUMED_MARKER: char = '#';

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// Registry over the newline-delimited source file named by a
/// [`SourceHandle`], with a one-time download when the file is missing.
pub struct FileRegistry {
    client: Client,
}

impl FileRegistry {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(DOWNLOAD_TIMEOUT)
            .build()
            .expect("Failed to build HTTP client");

        Self { client }
    }
}

impl Default for FileRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SourceRegistry for FileRegistry {
    async fn ensure_present(&self, source: &SourceHandle) -> Result<(), RegistryError> {
        if fs::try_exists(&source.path).await? {
            tracing::debug!(path = %source.path.display(), "source file already present");
            return Ok(());
        }

        let Some(url) = source.fetch_url.as_deref() else {
            return Err(RegistryError::Missing(source.path.display().to_string()));
        };

        tracing::info!(url, path = %source.path.display(), "downloading source file");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| RegistryError::Fetch(e.to_string()))?;

        if !response.status().is_success() {
            return Err(RegistryError::Fetch(format!("HTTP {}", response.status())));
        }

        let body = response
            .text()
            .await
            .map_err(|e| RegistryError::Fetch(e.to_string()))?;

        fs::write(&source.path, body).await?;
        tracing::info!(path = %source.path.display(), "source file downloaded");
        Ok(())
    }

    async fn load_unconsumed(&self, source: &SourceHandle) -> Result<Vec<String>, RegistryError> {
        let contents = fs::read_to_string(&source.path).await?;

        let items: Vec<String> = contents
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter(|line| !line.ends_with(CONSUMED_MARKER))
            .map(String::from)
            .collect();

        tracing::info!(count = items.len(), "loaded unconsumed items");
        Ok(items)
    }

    async fn mark_consumed(
        &self,
        source: &SourceHandle,
        item: &str,
    ) -> Result<(), RegistryError> {
        let contents = fs::read_to_string(&source.path).await?;

        let mut rewritten = String::with_capacity(contents.len() + 2);
        let mut marked = false;
        for line in contents.lines() {
            rewritten.push_str(line);
            // First line exactly equal to the item gets the marker
            if !marked && line == item {
                rewritten.push(CONSUMED_MARKER);
                marked = true;
            }
            rewritten.push('\n');
        }

        if !marked {
            tracing::warn!(item, "item not found unmarked in the source file");
            return Ok(());
        }

        fs::write(&source.path, rewritten).await?;
        tracing::info!(item, "item marked consumed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn write_source(dir: &TempDir, contents: &str) -> SourceHandle {
        let path = dir.path().join("links.txt");
        fs::write(&path, contents).await.unwrap();
        SourceHandle::local(path)
    }

    #[tokio::test]
    async fn load_skips_consumed_and_blank_lines() {
        let dir = TempDir::new().unwrap();
        let source = write_source(
            &dir,
            "https://a.example\nhttps://b.example#\n\nhttps://c.example\n",
        )
        .await;

        let registry = FileRegistry::new();
        let items = registry.load_unconsumed(&source).await.unwrap();

        assert_eq!(items, vec!["https://a.example", "https://c.example"]);
    }

    #[tokio::test]
    async fn mark_appends_the_marker_and_preserves_other_lines() {
        let dir = TempDir::new().unwrap();
        let source = write_source(
            &dir,
            "https://a.example\nhttps://b.example\nhttps://c.example\n",
        )
        .await;

        let registry = FileRegistry::new();
        registry
            .mark_consumed(&source, "https://b.example")
            .await
            .unwrap();

        let contents = fs::read_to_string(&source.path).await.unwrap();
        assert_eq!(
            contents,
            "https://a.example\nhttps://b.example#\nhttps://c.example\n"
        );
    }

    #[tokio::test]
    async fn marking_twice_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let source = write_source(&dir, "https://a.example\nhttps://b.example\n").await;

        let registry = FileRegistry::new();
        registry
            .mark_consumed(&source, "https://a.example")
            .await
            .unwrap();
        let first = fs::read_to_string(&source.path).await.unwrap();

        registry
            .mark_consumed(&source, "https://a.example")
            .await
            .unwrap();
        let second = fs::read_to_string(&source.path).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first, "https://a.example#\nhttps://b.example\n");
    }

    #[tokio::test]
    async fn mark_requires_an_exact_match() {
        let dir = TempDir::new().unwrap();
        let source = write_source(&dir, "https://a.example/page\nhttps://a.example\n").await;

        let registry = FileRegistry::new();
        registry
            .mark_consumed(&source, "https://a.example")
            .await
            .unwrap();

        let contents = fs::read_to_string(&source.path).await.unwrap();
        assert_eq!(contents, "https://a.example/page\nhttps://a.example#\n");
    }

    #[tokio::test]
    async fn marked_items_stay_excluded_across_reloads() {
        let dir = TempDir::new().unwrap();
        let source = write_source(&dir, "https://a.example\nhttps://b.example\n").await;

        let registry = FileRegistry::new();
        registry
            .mark_consumed(&source, "https://a.example")
            .await
            .unwrap();

        let items = registry.load_unconsumed(&source).await.unwrap();
        assert_eq!(items, vec!["https://b.example"]);
    }

    #[tokio::test]
    async fn ensure_present_downloads_a_missing_file() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("https://a.example\nhttps://b.example\n"),
            )
            .mount(&mock_server)
            .await;

        let dir = TempDir::new().unwrap();
        let source = SourceHandle {
            path: dir.path().join("links.txt"),
            fetch_url: Some(mock_server.uri()),
        };

        let registry = FileRegistry::new();
        registry.ensure_present(&source).await.unwrap();

        let items = registry.load_unconsumed(&source).await.unwrap();
        assert_eq!(items.len(), 2);
    }

    #[tokio::test]
    async fn ensure_present_leaves_an_existing_file_alone() {
        let dir = TempDir::new().unwrap();
        let source = write_source(&dir, "https://keep.example\n").await;

        let registry = FileRegistry::new();
        registry.ensure_present(&source).await.unwrap();

        let contents = fs::read_to_string(&source.path).await.unwrap();
        assert_eq!(contents, "https://keep.example\n");
    }

    #[tokio::test]
    async fn ensure_present_without_fetch_url_errors_on_missing_file() {
        let dir = TempDir::new().unwrap();
        let source = SourceHandle::local(dir.path().join("absent.txt"));

        let registry = FileRegistry::new();
        let result = registry.ensure_present(&source).await;

        assert!(matches!(result, Err(RegistryError::Missing(_))));
    }
}
