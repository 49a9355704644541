//! Publishing endpoint client
//!
//! Sends composed text to the publishing endpoint, authenticated with the
//! run's opaque credential headers. The response is opaque beyond its
//! success/failure classification.

use async_trait::async_trait;
use linkdrip_domain::{ContentPublisher, PublishError, PublishReceipt};
use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;

const PUBLISH_TIMEOUT: Duration = Duration::from_secs(30);

/// Client posting composed content to the publishing endpoint
pub struct XApiPublisher {
    client: Client,
    url: String,
}

impl XApiPublisher {
    pub fn new(url: String) -> Self {
        let client = Client::builder()
            .timeout(PUBLISH_TIMEOUT)
            .build()
            .expect("Failed to build HTTP client");

        Self { client, url }
    }

    /// Credentials are an opaque string map; entries that do not form valid
    /// header names or values are skipped with a log, never interpreted.
    fn header_map(credentials: &BTreeMap<String, String>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for (name, value) in credentials {
            match (
                HeaderName::try_from(name.as_str()),
                HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(value)) => {
                    headers.insert(name, value);
                }
                _ => {
                    tracing::warn!(header = %name, "skipping malformed credential header");
                }
            }
        }
        headers
    }
}

#[derive(Serialize)]
struct PublishRequest<'a> {
    text: &'a str,
}

#[async_trait]
impl ContentPublisher for XApiPublisher {
    async fn publish(
        &self,
        text: &str,
        credentials: &BTreeMap<String, String>,
    ) -> Result<PublishReceipt, PublishError> {
        let response = self
            .client
            .post(&self.url)
            .headers(Self::header_map(credentials))
            .json(&PublishRequest { text })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    PublishError::Timeout
                } else {
                    PublishError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PublishError::Api {
                status: status.as_u16(),
                body,
            });
        }

        tracing::info!(status = status.as_u16(), "content published");
        Ok(PublishReceipt {
            status: status.as_u16(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn credentials() -> BTreeMap<String, String> {
        BTreeMap::from([
            ("authorization".to_string(), "Bearer test-token".to_string()),
            ("x-csrf-token".to_string(), "csrf".to_string()),
        ])
    }

    #[tokio::test]
    async fn publish_sends_text_with_credential_headers() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/post"))
            .and(header("authorization", "Bearer test-token"))
            .and(header("x-csrf-token", "csrf"))
            .and(body_json(serde_json::json!({
                "text": "A caption\n\nhttps://a.example\n\n#one #two"
            })))
            .respond_with(ResponseTemplate::new(200))
            .mount(&mock_server)
            .await;

        let publisher = XApiPublisher::new(format!("{}/post", mock_server.uri()));
        let receipt = publisher
            .publish("A caption\n\nhttps://a.example\n\n#one #two", &credentials())
            .await
            .unwrap();

        assert_eq!(receipt.status, 200);
    }

    #[tokio::test]
    async fn a_rejection_is_reported_with_status_and_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
            .mount(&mock_server)
            .await;

        let publisher = XApiPublisher::new(mock_server.uri());
        let result = publisher.publish("text", &BTreeMap::new()).await;

        match result {
            Err(PublishError::Api { status, body }) => {
                assert_eq!(status, 403);
                assert_eq!(body, "forbidden");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_credential_entries_are_skipped() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201))
            .mount(&mock_server)
            .await;

        let creds = BTreeMap::from([
            ("ok-header".to_string(), "fine".to_string()),
            ("bad header name".to_string(), "value".to_string()),
            ("bad-value".to_string(), "line\nbreak".to_string()),
        ]);

        let publisher = XApiPublisher::new(mock_server.uri());
        let receipt = publisher.publish("text", &creds).await.unwrap();

        assert_eq!(receipt.status, 201);
    }
}
