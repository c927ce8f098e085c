//! Error types for `newsfeed-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown {field} value: {value:?}")]
  UnknownVariant { field: &'static str, value: String },

  #[error("unknown field name: {0:?}")]
  UnknownField(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
