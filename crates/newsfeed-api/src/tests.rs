use std::{path::PathBuf, sync::Arc};

use axum::{
  body::Body,
  http::{Request, StatusCode, header},
};
use newsfeed_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use tower::ServiceExt as _;

use super::*;

async fn make_state() -> AppState<SqliteStore> {
  let store = SqliteStore::open_in_memory().await.unwrap();
  AppState::new(Arc::new(store), &ServerConfig {
    host:                 "127.0.0.1".to_string(),
    port:                 8080,
    store_path:           PathBuf::from(":memory:"),
    session_ttl_minutes:  60,
    migration_batch_size: 100,
  })
}

async fn send(
  state: &AppState<SqliteStore>,
  method: &str,
  uri: &str,
  body: Option<Value>,
) -> (StatusCode, Value) {
  let builder = Request::builder().method(method).uri(uri);
  let req = match body {
    Some(body) => builder
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(body.to_string()))
      .unwrap(),
    None => builder.body(Body::empty()).unwrap(),
  };

  let res = router(state.clone()).oneshot(req).await.unwrap();
  let status = res.status();
  let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
  (status, serde_json::from_slice(&bytes).unwrap())
}

// ── Health ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn health_is_ok() {
  let state = make_state().await;
  let (status, body) = send(&state, "GET", "/health", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["status"], "ok");
}

// ── Preferences ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn get_missing_returns_null_data() {
  let state = make_state().await;
  let (status, body) = send(&state, "GET", "/preferences/u1", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["success"], true);
  assert!(body["data"].is_null());
}

#[tokio::test]
async fn create_returns_201_then_409() {
  let state = make_state().await;
  let payload = json!({
    "tone": "analytical",
    "contentFilters": { "excludedTopics": ["sports"] },
  });

  let (status, body) =
    send(&state, "POST", "/preferences/u1", Some(payload.clone())).await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(body["data"]["tone"], "analytical");
  assert_eq!(body["data"]["userId"], "u1");
  assert_eq!(body["data"]["contentFilters"]["excludedTopics"], json!(["sports"]));

  let (status, body) = send(&state, "POST", "/preferences/u1", Some(payload)).await;
  assert_eq!(status, StatusCode::CONFLICT);
  assert_eq!(body["success"], false);
  assert_eq!(body["errors"][0]["field"], "userId");
  assert_eq!(body["errors"][0]["code"], "conflict");
}

#[tokio::test]
async fn invalid_value_is_400_with_field_error() {
  let state = make_state().await;
  let (status, body) = send(
    &state,
    "POST",
    "/preferences/u1",
    Some(json!({ "perspective": "invalid" })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["errors"][0]["field"], "perspective");
  assert_eq!(body["errors"][0]["value"], "invalid");

  let (_, body) = send(&state, "GET", "/preferences/u1", None).await;
  assert!(body["data"].is_null());
}

#[tokio::test]
async fn malformed_body_uses_the_envelope() {
  let state = make_state().await;
  let req = Request::builder()
    .method("PATCH")
    .uri("/preferences/u1")
    .header(header::CONTENT_TYPE, "application/json")
    .body(Body::from("{not json"))
    .unwrap();
  let res = router(state).oneshot(req).await.unwrap();
  assert_eq!(res.status(), StatusCode::BAD_REQUEST);

  let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
  let body: Value = serde_json::from_slice(&bytes).unwrap();
  assert_eq!(body["success"], false);
  assert_eq!(body["errors"][0]["field"], "body");
}

#[tokio::test]
async fn patch_and_single_field_updates() {
  let state = make_state().await;
  send(&state, "POST", "/preferences/u1", Some(json!({}))).await;

  let (status, body) = send(
    &state,
    "PATCH",
    "/preferences/u1",
    Some(json!({ "factCheckingEnabled": false })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["data"]["factCheckingEnabled"], false);
  assert_eq!(body["data"]["tone"], "professional");

  let (status, body) = send(
    &state,
    "PUT",
    "/preferences/u1/ai-model",
    Some(json!({ "value": "anthropic" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["data"]["aiModel"], "anthropic");
  assert_eq!(body["data"]["factCheckingEnabled"], false);

  let (status, _) = send(
    &state,
    "PUT",
    "/preferences/u1/language",
    Some(json!({ "value": "jp" })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn update_unknown_user_is_404() {
  let state = make_state().await;
  let (status, body) = send(
    &state,
    "PATCH",
    "/preferences/ghost/filters",
    Some(json!({ "includedPeople": ["x"] })),
  )
  .await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(body["errors"][0]["code"], "not_found");
}

#[tokio::test]
async fn delete_reports_removal() {
  let state = make_state().await;
  send(&state, "POST", "/preferences/u1", Some(json!({}))).await;

  let (_, body) = send(&state, "DELETE", "/preferences/u1", None).await;
  assert_eq!(body["data"], true);
  let (status, body) = send(&state, "DELETE", "/preferences/u1", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["data"], false);
}

// ── Sessions and merging ─────────────────────────────────────────────────────

#[tokio::test]
async fn merged_view_layers_session_overlay() {
  let state = make_state().await;

  let (status, body) = send(&state, "GET", "/preferences/U1/merged", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["data"]["perspective"], "neutral");

  let (status, _) = send(
    &state,
    "PUT",
    "/sessions/S1/preferences",
    Some(json!({ "perspective": "liberal" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);

  let (_, body) =
    send(&state, "GET", "/preferences/U1/merged?session_id=S1", None).await;
  assert_eq!(body["data"]["perspective"], "liberal");
  assert_eq!(body["data"]["tone"], "professional");

  // The overlay was not persisted.
  let (_, body) = send(&state, "GET", "/preferences/U1", None).await;
  assert_eq!(body["data"]["perspective"], "neutral");
}

#[tokio::test]
async fn session_overlay_lifecycle() {
  let state = make_state().await;

  let (_, body) = send(&state, "GET", "/sessions/s1/preferences", None).await;
  assert!(body["data"].is_null());

  send(
    &state,
    "PUT",
    "/sessions/s1/preferences",
    Some(json!({ "contentFilters": { "includedTopics": ["tech"] } })),
  )
  .await;
  let (_, body) = send(&state, "GET", "/sessions/s1/preferences", None).await;
  assert_eq!(body["data"]["contentFilters"]["includedTopics"], json!(["tech"]));
  assert!(body["data"]["timestamp"].is_string());

  let (_, body) = send(&state, "DELETE", "/sessions/s1/preferences", None).await;
  assert_eq!(body["data"], true);
}

// ── Administration ───────────────────────────────────────────────────────────

#[tokio::test]
async fn report_counts_preferences() {
  let state = make_state().await;
  send(&state, "POST", "/preferences/u1", Some(json!({ "tone": "casual" }))).await;

  let (status, body) = send(&state, "GET", "/admin/report", None).await;
  assert_eq!(status, StatusCode::OK);
  // "u1" was never registered: its record shows up in the distributions but
  // not in adoption.
  assert_eq!(body["data"]["totalUsers"], 0);
  assert_eq!(body["data"]["usersWithPreferences"], 0);
  assert_eq!(body["data"]["toneDistribution"]["casual"], 1);
  assert_eq!(body["data"]["toneDistribution"]["formal"], 0);
}

// ── Configuration ────────────────────────────────────────────────────────────

#[test]
fn config_defaults_apply_without_a_file() {
  let cfg = ServerConfig::load(PathBuf::from("definitely-missing.toml")).unwrap();
  assert_eq!(cfg.session_ttl(), DEFAULT_SESSION_TTL);
  assert_eq!(cfg.migration_batch_size, DEFAULT_BATCH_SIZE);
}

#[test]
fn nonpositive_ttl_falls_back_to_default() {
  let cfg = ServerConfig {
    host:                 "127.0.0.1".to_string(),
    port:                 8080,
    store_path:           PathBuf::from(":memory:"),
    session_ttl_minutes:  0,
    migration_batch_size: 100,
  };
  assert_eq!(cfg.session_ttl(), DEFAULT_SESSION_TTL);
}
