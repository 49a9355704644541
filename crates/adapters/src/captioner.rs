//! Caption-generation service client
//!
//! The service answers with newline-delimited JSON records, each optionally
//! carrying a partial text fragment; fragments are concatenated in arrival
//! order and post-processed into the final caption. Only connectivity
//! problems surface as errors: a rejected or unusable answer resolves to the
//! fixed fallback caption so an item never gets stuck on captioning.

use async_trait::async_trait;
use linkdrip_domain::caption::{FALLBACK_CAPTION, clean_caption};
use linkdrip_domain::{CaptionError, CaptionGenerator};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const CAPTION_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for the caption-generation endpoint
pub struct GrokCaptioner {
    client: Client,
    base_url: String,
}

impl GrokCaptioner {
    pub fn new(base_url: String) -> Self {
        let client = Client::builder()
            .timeout(CAPTION_TIMEOUT)
            .build()
            .expect("Failed to build HTTP client");

        Self { client, base_url }
    }

    fn build_prompt(item: &str) -> String {
        format!(
            "Write a short, engaging caption (between 20 and 150 characters) \
             for sharing this link:\n{item}"
        )
    }

    /// Concatenate the partial fragments of an NDJSON body, skipping lines
    /// that do not decode.
    fn assemble_caption(body: &str) -> String {
        let mut fragments: Vec<String> = Vec::new();
        for line in body.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<Fragment>(line) {
                Ok(fragment) => {
                    if let Some(message) = fragment.result.and_then(|r| r.message) {
                        fragments.push(message);
                    }
                }
                Err(error) => {
                    tracing::debug!(error = %error, "skipping undecodable fragment line");
                }
            }
        }
        clean_caption(&fragments.concat())
    }
}

#[derive(Serialize)]
struct CaptionRequest<'a> {
    item: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct Fragment {
    result: Option<FragmentResult>,
}

#[derive(Deserialize)]
struct FragmentResult {
    message: Option<String>,
}

#[async_trait]
impl CaptionGenerator for GrokCaptioner {
    async fn generate(&self, item: &str) -> Result<String, CaptionError> {
        let prompt = Self::build_prompt(item);
        let request = CaptionRequest {
            item,
            prompt: &prompt,
        };

        let url = format!("{}/generate", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CaptionError::Timeout
                } else {
                    CaptionError::Network(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            tracing::warn!(
                status = response.status().as_u16(),
                "caption service rejected the request, using fallback"
            );
            return Ok(FALLBACK_CAPTION.to_string());
        }

        let body = response
            .text()
            .await
            .map_err(|e| CaptionError::Network(e.to_string()))?;

        let caption = Self::assemble_caption(&body);
        tracing::info!(caption = %caption, "caption generated");
        Ok(caption)
    }
}
