//! [`Envelope`]: an [`Outcome`] as an HTTP response.
//!
//! The body is the serialised outcome. A failure takes its status from the
//! first error's kind: validation 400, not found 404, conflict 409 and
//! system 500.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use newsfeed_core::outcome::{ErrorKind, FieldError, Outcome};
use serde::Serialize;

pub struct Envelope<T> {
  outcome: Outcome<T>,
  success: StatusCode,
}

impl<T> Envelope<T> {
  pub fn new(outcome: Outcome<T>) -> Self {
    Self {
      outcome,
      success: StatusCode::OK,
    }
  }

  /// Like [`Envelope::new`], but a success answers 201.
  pub fn created(outcome: Outcome<T>) -> Self {
    Self {
      outcome,
      success: StatusCode::CREATED,
    }
  }
}

impl<T> From<Outcome<T>> for Envelope<T> {
  fn from(outcome: Outcome<T>) -> Self { Self::new(outcome) }
}

/// Status for a failed outcome.
pub fn failure_status(errors: &[FieldError]) -> StatusCode {
  match errors.first().map(|e| e.kind) {
    Some(ErrorKind::Validation) => StatusCode::BAD_REQUEST,
    Some(ErrorKind::NotFound) => StatusCode::NOT_FOUND,
    Some(ErrorKind::Conflict) => StatusCode::CONFLICT,
    Some(ErrorKind::System) | None => StatusCode::INTERNAL_SERVER_ERROR,
  }
}

impl<T: Serialize> IntoResponse for Envelope<T> {
  fn into_response(self) -> Response {
    let status = if self.outcome.is_success() {
      self.success
    } else {
      failure_status(self.outcome.errors())
    };
    (status, Json(self.outcome)).into_response()
  }
}
