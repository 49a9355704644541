//! HTTP reachability probe

use async_trait::async_trait;
use linkdrip_domain::ConnectivityProbe;
use reqwest::Client;
use std::time::Duration;

/// Endpoint assumed to answer whenever the network is up
const DEFAULT_PROBE_URL: &str = "https://www.google.com";

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Probe that issues a short GET against a known-good endpoint. Any
/// response counts as reachable; only transport failures do not.
pub struct HttpProbe {
    client: Client,
    url: String,
}

impl HttpProbe {
    pub fn new() -> Self {
        Self::with_url(DEFAULT_PROBE_URL.to_string())
    }

    pub fn with_url(url: String) -> Self {
        let client = Client::builder()
            .timeout(PROBE_TIMEOUT)
            .build()
            .expect("Failed to build HTTP client");

        Self { client, url }
    }
}

impl Default for HttpProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConnectivityProbe for HttpProbe {
    async fn is_reachable(&self) -> bool {
        self.client.get(&self.url).send().await.is_ok()
    }
}
