//! The uniform result envelope returned by every preference service
//! operation.
//!
//! [`Outcome`] is a tagged union: a success carries data, a failure carries a
//! non-empty list of [`FieldError`]s. On the wire both serialise to the same
//! `{success, data?, errors?, message?}` object.

use serde::{Serialize, Serializer, ser::SerializeStruct};
use serde_json::Value;

// ─── Field errors ────────────────────────────────────────────────────────────

/// Broad classification of a [`FieldError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
  /// Bad input; aggregated across fields.
  Validation,
  /// The targeted record does not exist.
  NotFound,
  /// The record already exists.
  Conflict,
  /// An unexpected fault below the service; details are never surfaced.
  System,
}

/// A field-scoped error entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
  pub field:   String,
  pub message: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub value:   Option<Value>,
  #[serde(rename = "code")]
  pub kind:    ErrorKind,
}

impl FieldError {
  pub fn validation(
    field: impl Into<String>,
    message: impl Into<String>,
    value: Option<Value>,
  ) -> Self {
    Self {
      field: field.into(),
      message: message.into(),
      value,
      kind: ErrorKind::Validation,
    }
  }

  pub fn not_found(field: impl Into<String>, message: impl Into<String>) -> Self {
    Self {
      field:   field.into(),
      message: message.into(),
      value:   None,
      kind:    ErrorKind::NotFound,
    }
  }

  pub fn conflict(field: impl Into<String>, message: impl Into<String>) -> Self {
    Self {
      field:   field.into(),
      message: message.into(),
      value:   None,
      kind:    ErrorKind::Conflict,
    }
  }

  /// The single opaque entry reported for any store fault.
  pub fn system() -> Self {
    Self {
      field:   "general".to_owned(),
      message: "An unexpected error occurred".to_owned(),
      value:   None,
      kind:    ErrorKind::System,
    }
  }
}

// ─── Outcome ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
  Success {
    data:    T,
    message: Option<String>,
  },
  Failure {
    errors:  Vec<FieldError>,
    message: Option<String>,
  },
}

impl<T> Outcome<T> {
  pub fn success(data: T) -> Self { Self::Success { data, message: None } }

  pub fn failure(errors: Vec<FieldError>) -> Self {
    Self::Failure {
      errors,
      message: None,
    }
  }

  pub fn fail(error: FieldError) -> Self { Self::failure(vec![error]) }

  pub fn with_message(self, message: impl Into<String>) -> Self {
    let message = Some(message.into());
    match self {
      Self::Success { data, .. } => Self::Success { data, message },
      Self::Failure { errors, .. } => Self::Failure { errors, message },
    }
  }

  pub fn is_success(&self) -> bool { matches!(self, Self::Success { .. }) }

  pub fn data(&self) -> Option<&T> {
    match self {
      Self::Success { data, .. } => Some(data),
      Self::Failure { .. } => None,
    }
  }

  pub fn errors(&self) -> &[FieldError] {
    match self {
      Self::Success { .. } => &[],
      Self::Failure { errors, .. } => errors,
    }
  }

  pub fn message(&self) -> Option<&str> {
    match self {
      Self::Success { message, .. } | Self::Failure { message, .. } => {
        message.as_deref()
      }
    }
  }

  pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
    match self {
      Self::Success { data, message } => Outcome::Success {
        data: f(data),
        message,
      },
      Self::Failure { errors, message } => Outcome::Failure { errors, message },
    }
  }

  pub fn into_result(self) -> Result<T, Vec<FieldError>> {
    match self {
      Self::Success { data, .. } => Ok(data),
      Self::Failure { errors, .. } => Err(errors),
    }
  }
}

impl<T: Serialize> Serialize for Outcome<T> {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    let mut state = serializer.serialize_struct("Outcome", 3)?;
    match self {
      Self::Success { data, message } => {
        state.serialize_field("success", &true)?;
        state.serialize_field("data", data)?;
        match message {
          Some(m) => state.serialize_field("message", m)?,
          None => state.skip_field("message")?,
        }
      }
      Self::Failure { errors, message } => {
        state.serialize_field("success", &false)?;
        state.serialize_field("errors", errors)?;
        match message {
          Some(m) => state.serialize_field("message", m)?,
          None => state.skip_field("message")?,
        }
      }
    }
    state.end()
  }
}
