//! Handlers for `/preferences` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/preferences/:user_id` | `data` is `null` when the user has none |
//! | `POST`   | `/preferences/:user_id` | Body: [`CreateBody`]; returns 201 |
//! | `PATCH`  | `/preferences/:user_id` | Partial preference update |
//! | `DELETE` | `/preferences/:user_id` | `data` says whether a record was removed |
//! | `PATCH`  | `/preferences/:user_id/filters` | Partial content filter update |
//! | `PUT`    | `/preferences/:user_id/{perspective,tone,language,ai-model}` | Body: `{"value":"..."}` |
//! | `GET`    | `/preferences/:user_id/merged` | `?session_id` layers that session's overlay |

use axum::extract::{
  Json, Path, Query, State,
  rejection::{JsonRejection, QueryRejection},
};
use newsfeed_core::{
  filters::ContentFilters,
  preferences::{PreferencesWithFilters, UserPreferences},
  store::MigrationStore,
  validation::{ContentFiltersInput, PreferencesInput},
};
use serde::Deserialize;

use crate::{AppState, envelope::Envelope, error::ApiError};

type Body<T> = Result<Json<T>, JsonRejection>;

// ─── Read ─────────────────────────────────────────────────────────────────────

/// `GET /preferences/:user_id`
pub async fn get_one<S: MigrationStore>(
  State(state): State<AppState<S>>,
  Path(user_id): Path<String>,
) -> Envelope<Option<PreferencesWithFilters>> {
  state.service.get_preferences(&user_id).await.into()
}

#[derive(Debug, Deserialize)]
pub struct MergedParams {
  pub session_id: Option<String>,
}

/// `GET /preferences/:user_id/merged[?session_id=...]`
pub async fn merged<S: MigrationStore>(
  State(state): State<AppState<S>>,
  Path(user_id): Path<String>,
  params: Result<Query<MergedParams>, QueryRejection>,
) -> Result<Envelope<PreferencesWithFilters>, ApiError> {
  let Query(params) = params?;
  Ok(
    state
      .service
      .get_merged_preferences(&user_id, params.session_id.as_deref())
      .await
      .into(),
  )
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /preferences/:user_id`: preference fields at
/// the top level, content filter lists under `contentFilters`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBody {
  #[serde(flatten)]
  pub preferences:     PreferencesInput,
  #[serde(default)]
  pub content_filters: Option<ContentFiltersInput>,
}

/// `POST /preferences/:user_id` returns 201 and the created pair.
pub async fn create<S: MigrationStore>(
  State(state): State<AppState<S>>,
  Path(user_id): Path<String>,
  body: Body<CreateBody>,
) -> Result<Envelope<PreferencesWithFilters>, ApiError> {
  let Json(body) = body?;
  let outcome = state
    .service
    .create_preferences(
      &user_id,
      Some(&body.preferences),
      body.content_filters.as_ref(),
    )
    .await;
  Ok(Envelope::created(outcome))
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// `PATCH /preferences/:user_id`
pub async fn update<S: MigrationStore>(
  State(state): State<AppState<S>>,
  Path(user_id): Path<String>,
  body: Body<PreferencesInput>,
) -> Result<Envelope<UserPreferences>, ApiError> {
  let Json(updates) = body?;
  Ok(state.service.update_preferences(&user_id, &updates).await.into())
}

/// `PATCH /preferences/:user_id/filters`
pub async fn update_filters<S: MigrationStore>(
  State(state): State<AppState<S>>,
  Path(user_id): Path<String>,
  body: Body<ContentFiltersInput>,
) -> Result<Envelope<ContentFilters>, ApiError> {
  let Json(updates) = body?;
  Ok(state.service.update_content_filters(&user_id, &updates).await.into())
}

/// Body of the single-field `PUT` endpoints.
#[derive(Debug, Deserialize)]
pub struct ValueBody {
  pub value: String,
}

/// `PUT /preferences/:user_id/perspective`
pub async fn set_perspective<S: MigrationStore>(
  State(state): State<AppState<S>>,
  Path(user_id): Path<String>,
  body: Body<ValueBody>,
) -> Result<Envelope<UserPreferences>, ApiError> {
  let Json(body) = body?;
  Ok(state.service.update_perspective(&user_id, &body.value).await.into())
}

/// `PUT /preferences/:user_id/tone`
pub async fn set_tone<S: MigrationStore>(
  State(state): State<AppState<S>>,
  Path(user_id): Path<String>,
  body: Body<ValueBody>,
) -> Result<Envelope<UserPreferences>, ApiError> {
  let Json(body) = body?;
  Ok(state.service.update_tone(&user_id, &body.value).await.into())
}

/// `PUT /preferences/:user_id/language`
pub async fn set_language<S: MigrationStore>(
  State(state): State<AppState<S>>,
  Path(user_id): Path<String>,
  body: Body<ValueBody>,
) -> Result<Envelope<UserPreferences>, ApiError> {
  let Json(body) = body?;
  Ok(state.service.update_language(&user_id, &body.value).await.into())
}

/// `PUT /preferences/:user_id/ai-model`
pub async fn set_ai_model<S: MigrationStore>(
  State(state): State<AppState<S>>,
  Path(user_id): Path<String>,
  body: Body<ValueBody>,
) -> Result<Envelope<UserPreferences>, ApiError> {
  let Json(body) = body?;
  Ok(state.service.update_ai_model(&user_id, &body.value).await.into())
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /preferences/:user_id`
pub async fn delete_one<S: MigrationStore>(
  State(state): State<AppState<S>>,
  Path(user_id): Path<String>,
) -> Envelope<bool> {
  state.service.delete_preferences(&user_id).await.into()
}
