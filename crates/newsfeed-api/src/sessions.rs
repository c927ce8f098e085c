//! Handlers for `/sessions/:session_id/preferences`.

use axum::extract::{Json, Path, State, rejection::JsonRejection};
use newsfeed_core::{
  session::SessionPreferences, store::MigrationStore, validation::SessionInput,
};

use crate::{AppState, envelope::Envelope, error::ApiError};

/// `GET /sessions/:session_id/preferences`: `data` is `null` once expired.
pub async fn get_one<S: MigrationStore>(
  State(state): State<AppState<S>>,
  Path(session_id): Path<String>,
) -> Envelope<Option<SessionPreferences>> {
  state.service.get_session_preferences(&session_id).await.into()
}

/// `PUT /sessions/:session_id/preferences` replaces the overlay.
pub async fn store<S: MigrationStore>(
  State(state): State<AppState<S>>,
  Path(session_id): Path<String>,
  body: Result<Json<SessionInput>, JsonRejection>,
) -> Result<Envelope<SessionPreferences>, ApiError> {
  let Json(input) = body?;
  Ok(
    state
      .service
      .store_session_preferences(&session_id, &input)
      .await
      .into(),
  )
}

/// `DELETE /sessions/:session_id/preferences`
pub async fn delete_one<S: MigrationStore>(
  State(state): State<AppState<S>>,
  Path(session_id): Path<String>,
) -> Envelope<bool> {
  state.service.delete_session_preferences(&session_id).await.into()
}
