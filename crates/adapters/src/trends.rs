//! Trend listing page source
//!
//! Fetches the region-keyed public listing page and extracts anchor texts.
//! Filtering the anchors down to usable tags is domain logic and happens in
//! `linkdrip_domain::tags`.

use async_trait::async_trait;
use linkdrip_domain::{TrendError, TrendSource};
use reqwest::Client;
use scraper::{Html, Selector};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://trends24.in";

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Source reading anchor texts off the region's trend listing page
pub struct TrendsPageSource {
    client: Client,
    base_url: String,
}

impl TrendsPageSource {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL.to_string())
    }

    pub fn with_base_url(base_url: String) -> Self {
        let client = Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .expect("Failed to build HTTP client");

        Self { client, base_url }
    }

    fn extract_anchors(html: &str) -> Vec<String> {
        let document = Html::parse_document(html);
        let selector = Selector::parse("a[href]").expect("valid selector");

        document
            .select(&selector)
            .map(|element| element.text().collect::<String>().trim().to_string())
            .filter(|text| !text.is_empty())
            .collect()
    }
}

impl Default for TrendsPageSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TrendSource for TrendsPageSource {
    async fn fetch_anchors(&self, region: &str) -> Result<Vec<String>, TrendError> {
        let url = format!("{}/{}/", self.base_url, region);

        let response = self.client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                TrendError::Timeout
            } else {
                TrendError::Network(e.to_string())
            }
        })?;

        if !response.status().is_success() {
            return Err(TrendError::Status(response.status().as_u16()));
        }

        let html = response
            .text()
            .await
            .map_err(|e| TrendError::Network(e.to_string()))?;

        let anchors = Self::extract_anchors(&html);
        tracing::debug!(count = anchors.len(), region, "extracted anchors");
        Ok(anchors)
    }
}
