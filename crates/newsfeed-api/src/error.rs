//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Both variants render the same envelope as a failed
//! [`Outcome`](newsfeed_core::outcome::Outcome).

use axum::{
  Json,
  extract::rejection::{JsonRejection, QueryRejection},
  http::StatusCode,
  response::{IntoResponse, Response},
};
use newsfeed_core::outcome::{FieldError, Outcome};
use newsfeed_service::MigrationError;
use thiserror::Error;

/// An error returned by an API handler before or outside the service.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("invalid request body: {0}")]
  Body(#[from] JsonRejection),

  #[error("invalid query string: {0}")]
  Query(#[from] QueryRejection),

  #[error(transparent)]
  Migration(#[from] MigrationError),
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, error) = match &self {
      ApiError::Body(e) => (
        e.status(),
        FieldError::validation("body", e.body_text(), None),
      ),
      ApiError::Query(e) => (
        e.status(),
        FieldError::validation("query", e.body_text(), None),
      ),
      ApiError::Migration(e) => {
        tracing::error!(error = %e, "migration report failed");
        (StatusCode::INTERNAL_SERVER_ERROR, FieldError::system())
      }
    };
    (status, Json(Outcome::<()>::fail(error))).into_response()
  }
}
