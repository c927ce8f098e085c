//! Error types for `newsfeed-service`.
//!
//! The preference service itself never returns errors; it reports through
//! [`Outcome`](newsfeed_core::outcome::Outcome). Only report generation
//! propagates a failure.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MigrationError {
  #[error("failed to generate migration report: {0}")]
  Report(#[source] Box<dyn std::error::Error + Send + Sync>),
}
