//! linkdrip adapters crate
//!
//! This crate contains infrastructure adapters implementing the domain ports:
//! - `probe`: HTTP reachability probe
//! - `registry_fs`: file-backed item source registry
//! - `state_json`: versioned JSON run-state store
//! - `captioner`: caption-generation service client
//! - `trends`: trend listing page source
//! - `x_api`: publishing endpoint client
//! - `journal`: append-only JSONL publish journal
//! - `console`: interactive stdin operator

mod captioner;
mod console;
mod journal;
mod probe;
mod registry_fs;
mod state_json;
mod trends;
mod x_api;

pub use captioner::GrokCaptioner;
pub use console::{ConsoleOperator, OperatorPresets};
pub use journal::JsonlJournal;
pub use probe::HttpProbe;
pub use registry_fs::FileRegistry;
pub use state_json::JsonStateStore;
pub use trends::TrendsPageSource;
pub use x_api::XApiPublisher;
