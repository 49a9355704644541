//! linkdrip domain crate
//!
//! This crate contains the core domain logic following hexagonal architecture:
//! - `model`: Domain entities and value objects
//! - `ports`: Trait definitions for external dependencies (adapters)
//! - `retry`: Connectivity-gated retry policy and error classification
//! - `caption`: Caption post-processing rules and fallback captions
//! - `tags`: Trend tag filtering and sampling
//! - `usecases`: Application use cases / business logic

pub mod caption;
pub mod model;
pub mod ports;
pub mod retry;
pub mod tags;
pub mod usecases;

pub use model::*;
pub use ports::*;
pub use retry::{RetryError, RetryPolicy, Retryable};
