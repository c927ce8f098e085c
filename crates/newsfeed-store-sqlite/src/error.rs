//! Error type for `newsfeed-store-sqlite`.

use newsfeed_core::store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] newsfeed_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// The UNIQUE(user_id) constraint rejected an insert.
  #[error("preferences already exist for user {0:?}")]
  PreferencesExist(String),

  /// Preferences exist but their content filter row does not.
  #[error("content filters missing for user {0:?}")]
  MissingFilters(String),
}

impl Error {
  /// Classify an insert failure, recognising unique-key violations.
  pub(crate) fn on_insert(err: tokio_rusqlite::Error, user_id: &str) -> Self {
    match &err {
      tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(e, _))
        if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
      {
        Error::PreferencesExist(user_id.to_owned())
      }
      _ => Error::Database(err),
    }
  }
}

impl StoreError for Error {
  fn is_conflict(&self) -> bool { matches!(self, Error::PreferencesExist(_)) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
