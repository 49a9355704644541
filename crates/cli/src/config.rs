//! Configuration loading and management

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub network: NetworkConfig,

    #[serde(default)]
    pub trends: TrendsConfig,

    #[serde(default)]
    pub caption: CaptionConfig,

    #[serde(default)]
    pub publish: PublishConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_state_path")]
    pub state_path: PathBuf,

    #[serde(default = "default_journal_path")]
    pub journal_path: PathBuf,

    #[serde(default = "default_source_path")]
    pub source_path: PathBuf,

    /// URL the source file is downloaded from when it is missing locally
    #[serde(default)]
    pub source_fetch_url: Option<String>,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_probe_url")]
    pub probe_url: String,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_base_delay_secs")]
    pub base_delay_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendsConfig {
    #[serde(default = "default_trends_base_url")]
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptionConfig {
    #[serde(default = "default_caption_base_url")]
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishConfig {
    #[serde(default = "default_publish_url")]
    pub url: String,

    /// Environment variable holding the bearer token added as the
    /// authorization header
    #[serde(default = "default_auth_token_env")]
    pub auth_token_env: String,

    /// Additional opaque headers sent verbatim with every publish call
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

// Default value functions
fn default_state_path() -> PathBuf {
    PathBuf::from("./linkdrip_state.json")
}

fn default_journal_path() -> PathBuf {
    PathBuf::from("./published.jsonl")
}

fn default_source_path() -> PathBuf {
    PathBuf::from("./links.txt")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_probe_url() -> String {
    "https://www.google.com".to_string()
}

fn default_max_retries() -> u32 {
    10
}

fn default_base_delay_secs() -> u64 {
    30
}

fn default_trends_base_url() -> String {
    "https://trends24.in".to_string()
}

fn default_caption_base_url() -> String {
    "https://caption.invalid".to_string()
}

fn default_publish_url() -> String {
    "https://publish.invalid/post".to_string()
}

fn default_auth_token_env() -> String {
    "LINKDRIP_AUTH_TOKEN".to_string()
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            state_path: default_state_path(),
            journal_path: default_journal_path(),
            source_path: default_source_path(),
            source_fetch_url: None,
            log_level: default_log_level(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            probe_url: default_probe_url(),
            max_retries: default_max_retries(),
            base_delay_secs: default_base_delay_secs(),
        }
    }
}

impl Default for TrendsConfig {
    fn default() -> Self {
        Self {
            base_url: default_trends_base_url(),
        }
    }
}

impl Default for CaptionConfig {
    fn default() -> Self {
        Self {
            base_url: default_caption_base_url(),
        }
    }
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            url: default_publish_url(),
            auth_token_env: default_auth_token_env(),
            headers: BTreeMap::new(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file and environment
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        // Try default config path if none specified
        let default_path = PathBuf::from("./config.toml");
        let path = config_path.unwrap_or(&default_path);

        if path.exists() {
            builder = builder.add_source(config::File::from(path));
        } else if config_path.is_some() {
            // User specified a path that doesn't exist
            anyhow::bail!("Config file not found: {}", path.display());
        }

        // Add environment variable overrides
        builder = builder.add_source(
            config::Environment::with_prefix("LINKDRIP")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Generate example configuration as TOML string
    pub fn example_toml() -> String {
        r#"# linkdrip configuration

[general]
state_path = "./linkdrip_state.json"
journal_path = "./published.jsonl"
source_path = "./links.txt"
# source_fetch_url = "https://example.com/links.txt"
log_level = "info"

[network]
probe_url = "https://www.google.com"
max_retries = 10
base_delay_secs = 30

[trends]
base_url = "https://trends24.in"

[caption]
base_url = "https://caption.example.com"

[publish]
url = "https://publish.example.com/post"
auth_token_env = "LINKDRIP_AUTH_TOKEN"
# Additional opaque headers sent with every publish call
# [publish.headers]
# x-csrf-token = "..."
"#
        .to_string()
    }
}
