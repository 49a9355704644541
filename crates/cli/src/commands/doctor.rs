//! Doctor command - validate configuration and show status

use anyhow::Result;
use linkdrip_adapters::JsonStateStore;
use linkdrip_domain::StateStore;
use serde::Serialize;
use std::path::PathBuf;

use crate::args::DoctorArgs;
use crate::config::AppConfig;

#[derive(Debug, Serialize)]
struct DoctorReport {
    config: CheckResult,
    source: CheckResult,
    state: CheckResult,
    publish: CheckResult,
    overall: String,
}

#[derive(Debug, Serialize)]
struct CheckResult {
    status: String,
    message: String,
}

impl CheckResult {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            status: "ok".to_string(),
            message: message.into(),
        }
    }

    fn warn(message: impl Into<String>) -> Self {
        Self {
            status: "warn".to_string(),
            message: message.into(),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
        }
    }

    fn is_ok(&self) -> bool {
        self.status == "ok"
    }

    fn is_error(&self) -> bool {
        self.status == "error"
    }
}

pub async fn execute(args: DoctorArgs, config_path: Option<PathBuf>) -> Result<()> {
    let mut report = DoctorReport {
        config: CheckResult::error("Not checked"),
        source: CheckResult::error("Not checked"),
        state: CheckResult::error("Not checked"),
        publish: CheckResult::error("Not checked"),
        overall: "error".to_string(),
    };

    let config = match AppConfig::load(config_path.as_deref()) {
        Ok(config) => {
            report.config = CheckResult::ok("Configuration loaded successfully");
            Some(config)
        }
        Err(error) => {
            report.config = CheckResult::error(format!("Failed to load config: {}", error));
            None
        }
    };

    if let Some(ref config) = config {
        report.source = check_source(config);
        report.state = check_state(config).await;
        report.publish = check_publish(config);
    }

    let checks = [&report.config, &report.source, &report.publish];
    let has_error = checks.iter().any(|c| c.is_error());
    let all_ok = checks.iter().all(|c| c.is_ok());

    report.overall = if has_error {
        "error".to_string()
    } else if all_ok {
        "ok".to_string()
    } else {
        "warn".to_string()
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if report.overall == "error" {
        anyhow::bail!("Validation failed");
    }

    Ok(())
}

fn check_source(config: &AppConfig) -> CheckResult {
    let path = &config.general.source_path;
    if path.exists() {
        CheckResult::ok(format!("Source file present: {}", path.display()))
    } else if config.general.source_fetch_url.is_some() {
        CheckResult::ok(format!(
            "Source file missing, will be downloaded to {}",
            path.display()
        ))
    } else {
        CheckResult::error(format!(
            "Source file missing and no source_fetch_url configured: {}",
            path.display()
        ))
    }
}

async fn check_state(config: &AppConfig) -> CheckResult {
    let store = JsonStateStore::new(&config.general.state_path);
    match store.load().await {
        Some(state) => CheckResult::ok(format!(
            "Saved run found: {} items remaining (region {})",
            state.remaining.len(),
            state.region
        )),
        None => CheckResult::ok("No saved run, next start is fresh"),
    }
}

fn check_publish(config: &AppConfig) -> CheckResult {
    if config.publish.url.is_empty() {
        return CheckResult::error("publish.url is empty");
    }

    let token_set = std::env::var(&config.publish.auth_token_env)
        .map(|token| !token.is_empty())
        .unwrap_or(false);

    if token_set || !config.publish.headers.is_empty() {
        CheckResult::ok("Publish credentials configured")
    } else {
        CheckResult::warn(format!(
            "No credentials: {} unset and publish.headers empty",
            config.publish.auth_token_env
        ))
    }
}

fn print_report(report: &DoctorReport) {
    println!("linkdrip doctor");
    println!();
    println!("  config:  [{}] {}", report.config.status, report.config.message);
    println!("  source:  [{}] {}", report.source.status, report.source.message);
    println!("  state:   [{}] {}", report.state.status, report.state.message);
    println!("  publish: [{}] {}", report.publish.status, report.publish.message);
    println!();
    println!("Overall: {}", report.overall);
}
