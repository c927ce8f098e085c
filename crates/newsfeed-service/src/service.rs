//! The preference service.
//!
//! Every public operation returns an [`Outcome`] and never fails outright.
//! Expected conditions (bad input, missing record, duplicate create) become
//! structured field errors; store faults are logged and collapsed into the
//! single opaque [`FieldError::system`] entry.

use std::sync::Arc;

use newsfeed_core::{
  filters::{ContentFilters, ContentFiltersPatch},
  outcome::{FieldError, Outcome},
  preferences::{PreferencesPatch, PreferencesWithFilters, UserPreferences},
  session::SessionPreferences,
  store::{PreferenceStore, StoreError},
  validation::{
    ContentFiltersInput, PreferencesInput, SessionInput, parse_content_filters,
    parse_preferences, parse_session_overlay,
  },
};
use serde_json::Value;

use crate::session::{MemorySessionStore, SessionStore};

const USER_ID: &str = "userId";
const SESSION_ID: &str = "sessionId";

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Reject an empty or whitespace-only identifier before any store access.
fn require_id(field: &'static str, id: &str) -> Result<(), FieldError> {
  if id.trim().is_empty() {
    let label = if field == USER_ID { "User ID" } else { "Session ID" };
    return Err(FieldError::validation(
      field,
      format!("{label} is required"),
      Some(Value::String(id.to_owned())),
    ));
  }
  Ok(())
}

/// Log a store fault and replace it with the generic system error.
fn fault<T>(operation: &'static str, key: &str, error: impl std::error::Error) -> Outcome<T> {
  tracing::error!(operation, key, error = %error, "preference store failure");
  Outcome::fail(FieldError::system())
}

fn invalid<T>(errors: Vec<FieldError>) -> Outcome<T> {
  Outcome::failure(errors).with_message("Validation failed")
}

fn already_exists<T>() -> Outcome<T> {
  Outcome::fail(FieldError::conflict(USER_ID, "User preferences already exist"))
}

fn not_found<T>() -> Outcome<T> {
  Outcome::fail(FieldError::not_found(USER_ID, "User preferences not found"))
}

/// Take the parsed value, or stash its errors and fall back to the default.
fn collect<T: Default>(
  parsed: Result<T, Vec<FieldError>>,
  errors: &mut Vec<FieldError>,
) -> T {
  parsed.unwrap_or_else(|e| {
    errors.extend(e);
    T::default()
  })
}

macro_rules! try_id {
  ($field:expr, $id:expr) => {
    if let Err(e) = require_id($field, $id) {
      return Outcome::fail(e);
    }
  };
}

// ─── Service ─────────────────────────────────────────────────────────────────

/// Validates input, persists through a [`PreferenceStore`] and layers
/// session overlays from a [`SessionStore`] on top of persisted records.
pub struct PreferenceService<S, C = MemorySessionStore> {
  store:    Arc<S>,
  sessions: C,
}

impl<S: PreferenceStore> PreferenceService<S> {
  /// A service with a process-local session store and the default TTL.
  pub fn with_memory_sessions(store: Arc<S>) -> Self {
    Self::new(store, MemorySessionStore::default())
  }
}

impl<S, C> PreferenceService<S, C>
where
  S: PreferenceStore,
  C: SessionStore,
{
  pub fn new(store: Arc<S>, sessions: C) -> Self { Self { store, sessions } }

  pub fn store(&self) -> &Arc<S> { &self.store }

  pub fn sessions(&self) -> &C { &self.sessions }

  // ── Reads ─────────────────────────────────────────────────────────────

  /// Preferences and filters read as one unit. A user without a record is
  /// a success with no data.
  pub async fn get_preferences(
    &self,
    user_id: &str,
  ) -> Outcome<Option<PreferencesWithFilters>> {
    try_id!(USER_ID, user_id);

    match self.store.get_preferences_with_filters(user_id).await {
      Ok(Some(found)) => Outcome::success(Some(found)),
      Ok(None) => Outcome::success(None).with_message("No preferences found"),
      Err(e) => fault("get_preferences", user_id, e),
    }
  }

  /// Read the user's preferences, creating an all-default record first if
  /// none exists.
  pub async fn get_or_create_preferences(
    &self,
    user_id: &str,
  ) -> Outcome<PreferencesWithFilters> {
    try_id!(USER_ID, user_id);

    match self.store.get_preferences_with_filters(user_id).await {
      Ok(Some(found)) => return Outcome::success(found),
      Ok(None) => {}
      Err(e) => return fault("get_or_create_preferences", user_id, e),
    }

    let created = self
      .store
      .create_preferences_with_filters(
        user_id,
        &PreferencesPatch::default(),
        &ContentFiltersPatch::default(),
      )
      .await;

    match created {
      Ok(created) => {
        tracing::info!(user_id, "created default preferences");
        Outcome::success(created).with_message("Default preferences created")
      }
      // Lost a creation race; the other writer's record is the answer.
      Err(e) if e.is_conflict() => {
        match self.store.get_preferences_with_filters(user_id).await {
          Ok(Some(found)) => Outcome::success(found),
          Ok(None) => fault("get_or_create_preferences", user_id, e),
          Err(e) => fault("get_or_create_preferences", user_id, e),
        }
      }
      Err(e) => fault("get_or_create_preferences", user_id, e),
    }
  }

  // ── Writes ────────────────────────────────────────────────────────────

  /// Create a user's preference and filter records together. Both inputs
  /// are validated before anything is written; errors from the two are
  /// reported together.
  pub async fn create_preferences(
    &self,
    user_id: &str,
    preferences: Option<&PreferencesInput>,
    filters: Option<&ContentFiltersInput>,
  ) -> Outcome<PreferencesWithFilters> {
    try_id!(USER_ID, user_id);

    let mut errors = Vec::new();
    let preferences = match preferences {
      Some(input) => collect(parse_preferences(input), &mut errors),
      None => PreferencesPatch::default(),
    };
    let filters = match filters {
      Some(input) => collect(parse_content_filters(input), &mut errors),
      None => ContentFiltersPatch::default(),
    };
    if !errors.is_empty() {
      return invalid(errors);
    }

    match self.store.preferences_exist(user_id).await {
      Ok(true) => return already_exists(),
      Ok(false) => {}
      Err(e) => return fault("create_preferences", user_id, e),
    }

    match self
      .store
      .create_preferences_with_filters(user_id, &preferences, &filters)
      .await
    {
      Ok(created) => {
        tracing::info!(user_id, "created preferences");
        Outcome::success(created).with_message("Preferences created successfully")
      }
      Err(e) if e.is_conflict() => {
        tracing::warn!(user_id, "concurrent create rejected by unique constraint");
        already_exists()
      }
      Err(e) => fault("create_preferences", user_id, e),
    }
  }

  /// Change exactly the supplied preference fields.
  pub async fn update_preferences(
    &self,
    user_id: &str,
    updates: &PreferencesInput,
  ) -> Outcome<UserPreferences> {
    try_id!(USER_ID, user_id);

    let patch = match parse_preferences(updates) {
      Ok(patch) => patch,
      Err(errors) => return invalid(errors),
    };

    match self.store.update_preferences(user_id, &patch).await {
      Ok(Some(updated)) => {
        tracing::debug!(user_id, fields = patch.values().len(), "updated preferences");
        Outcome::success(updated).with_message("Preferences updated successfully")
      }
      Ok(None) => not_found(),
      Err(e) => fault("update_preferences", user_id, e),
    }
  }

  /// Replace exactly the supplied content filter lists.
  pub async fn update_content_filters(
    &self,
    user_id: &str,
    updates: &ContentFiltersInput,
  ) -> Outcome<ContentFilters> {
    try_id!(USER_ID, user_id);

    let patch = match parse_content_filters(updates) {
      Ok(patch) => patch,
      Err(errors) => return invalid(errors),
    };

    match self.store.update_content_filters(user_id, &patch).await {
      Ok(Some(updated)) => {
        tracing::debug!(user_id, "updated content filters");
        Outcome::success(updated).with_message("Content filters updated successfully")
      }
      Ok(None) => not_found(),
      Err(e) => fault("update_content_filters", user_id, e),
    }
  }

  pub async fn update_perspective(&self, user_id: &str, value: &str) -> Outcome<UserPreferences> {
    let updates = PreferencesInput {
      perspective: Some(Value::String(value.to_owned())),
      ..Default::default()
    };
    self.update_preferences(user_id, &updates).await
  }

  pub async fn update_tone(&self, user_id: &str, value: &str) -> Outcome<UserPreferences> {
    let updates = PreferencesInput {
      tone: Some(Value::String(value.to_owned())),
      ..Default::default()
    };
    self.update_preferences(user_id, &updates).await
  }

  pub async fn update_language(&self, user_id: &str, value: &str) -> Outcome<UserPreferences> {
    let updates = PreferencesInput {
      language: Some(Value::String(value.to_owned())),
      ..Default::default()
    };
    self.update_preferences(user_id, &updates).await
  }

  pub async fn update_ai_model(&self, user_id: &str, value: &str) -> Outcome<UserPreferences> {
    let updates = PreferencesInput {
      ai_model: Some(Value::String(value.to_owned())),
      ..Default::default()
    };
    self.update_preferences(user_id, &updates).await
  }

  /// Delete the user's preferences and, by cascade, their filters. Deleting
  /// nothing is a success carrying `false`.
  pub async fn delete_preferences(&self, user_id: &str) -> Outcome<bool> {
    try_id!(USER_ID, user_id);

    match self.store.delete_preferences(user_id).await {
      Ok(true) => {
        tracing::info!(user_id, "deleted preferences");
        Outcome::success(true).with_message("Preferences deleted successfully")
      }
      Ok(false) => Outcome::success(false).with_message("No preferences to delete"),
      Err(e) => fault("delete_preferences", user_id, e),
    }
  }

  // ── Session overlays ──────────────────────────────────────────────────

  /// Validate and store a session overlay, replacing any previous one.
  pub async fn store_session_preferences(
    &self,
    session_id: &str,
    input: &SessionInput,
  ) -> Outcome<SessionPreferences> {
    try_id!(SESSION_ID, session_id);

    let overlay = match parse_session_overlay(input) {
      Ok(overlay) => overlay,
      Err(errors) => return invalid(errors),
    };

    match self.sessions.set(session_id, overlay).await {
      Ok(stored) => Outcome::success(stored).with_message("Session preferences stored"),
      Err(e) => fault("store_session_preferences", session_id, e),
    }
  }

  /// The session's overlay, or no data if it is absent or expired.
  pub async fn get_session_preferences(
    &self,
    session_id: &str,
  ) -> Outcome<Option<SessionPreferences>> {
    try_id!(SESSION_ID, session_id);

    match self.sessions.get(session_id).await {
      Ok(found) => Outcome::success(found),
      Err(e) => fault("get_session_preferences", session_id, e),
    }
  }

  pub async fn delete_session_preferences(&self, session_id: &str) -> Outcome<bool> {
    try_id!(SESSION_ID, session_id);

    match self.sessions.delete(session_id).await {
      Ok(removed) => Outcome::success(removed),
      Err(e) => fault("delete_session_preferences", session_id, e),
    }
  }

  /// Persisted preferences (created on demand) with the session overlay, if
  /// any, layered on top. The overlay is never written back.
  ///
  /// Top-level fields from the overlay replace persisted ones; content
  /// filters merge list by list. A failing session store degrades to the
  /// persisted record.
  pub async fn get_merged_preferences(
    &self,
    user_id: &str,
    session_id: Option<&str>,
  ) -> Outcome<PreferencesWithFilters> {
    let mut merged = match self.get_or_create_preferences(user_id).await.into_result() {
      Ok(persisted) => persisted,
      Err(errors) => return Outcome::failure(errors),
    };

    let Some(session_id) = session_id.filter(|id| !id.trim().is_empty()) else {
      return Outcome::success(merged);
    };

    match self.sessions.get(session_id).await {
      Ok(Some(session)) => session.overlay.merge_into(&mut merged),
      Ok(None) => {}
      Err(e) => {
        tracing::warn!(user_id, session_id, error = %e, "session overlay unavailable");
      }
    }
    Outcome::success(merged)
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Mutex;

  use chrono::{DateTime, TimeDelta, Utc};
  use newsfeed_core::{
    outcome::ErrorKind,
    preferences::{AiModel, Language, Perspective, PropagandaSensitivity, Tone},
  };
  use newsfeed_store_sqlite::SqliteStore;
  use serde_json::json;

  use super::*;
  use crate::{session::DEFAULT_SESSION_TTL, testing::InstrumentedStore};

  async fn service() -> PreferenceService<SqliteStore> {
    let store = SqliteStore::open_in_memory().await.unwrap();
    PreferenceService::with_memory_sessions(Arc::new(store))
  }

  fn prefs(value: Value) -> PreferencesInput { serde_json::from_value(value).unwrap() }

  fn filters(value: Value) -> ContentFiltersInput {
    serde_json::from_value(value).unwrap()
  }

  fn session(value: Value) -> SessionInput { serde_json::from_value(value).unwrap() }

  fn only_error<T: std::fmt::Debug>(out: &Outcome<T>) -> &FieldError {
    assert!(!out.is_success(), "expected failure, got {out:?}");
    assert_eq!(out.errors().len(), 1, "{:?}", out.errors());
    &out.errors()[0]
  }

  // ─── Identifiers ──────────────────────────────────────────────────────────

  #[tokio::test]
  async fn empty_user_id_fails_without_store_access() {
    let store = Arc::new(InstrumentedStore::new().await);
    store.fail_reads(true);
    let svc = PreferenceService::with_memory_sessions(store.clone());

    for id in ["", "   "] {
      let out = svc.get_preferences(id).await;
      let err = only_error(&out);
      assert_eq!(err.field, "userId");
      assert_eq!(err.kind, ErrorKind::Validation);
    }
    assert_eq!(store.calls(), 0);
  }

  // ─── Reads and creates ───────────────────────────────────────────────────

  #[tokio::test]
  async fn get_missing_is_success_without_data() {
    let svc = service().await;
    let out = svc.get_preferences("ghost").await;
    assert!(out.is_success());
    assert_eq!(out.data(), Some(&None));
  }

  #[tokio::test]
  async fn create_then_get_returns_external_shape() {
    let svc = service().await;
    let out = svc
      .create_preferences(
        "u1",
        Some(&prefs(json!({ "aiModel": "anthropic", "factCheckingEnabled": false }))),
        Some(&filters(json!({ "includedTopics": ["science"] }))),
      )
      .await;
    assert!(out.is_success());

    let got = svc.get_preferences("u1").await;
    let body = serde_json::to_value(&got).unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["aiModel"], "anthropic");
    assert_eq!(body["data"]["factCheckingEnabled"], false);
    assert_eq!(body["data"]["perspective"], "neutral");
    assert_eq!(body["data"]["contentFilters"]["includedTopics"], json!(["science"]));
    assert!(body["data"].get("ai_model").is_none());
  }

  #[tokio::test]
  async fn second_create_conflicts_and_changes_nothing() {
    let svc = service().await;
    let first = svc
      .create_preferences("u1", Some(&prefs(json!({ "tone": "formal" }))), None)
      .await;
    assert!(first.is_success());
    let after_first = svc.get_preferences("u1").await;

    let second = svc
      .create_preferences("u1", Some(&prefs(json!({ "tone": "casual" }))), None)
      .await;
    let err = only_error(&second);
    assert_eq!(err.kind, ErrorKind::Conflict);
    assert_eq!(err.field, "userId");

    assert_eq!(svc.get_preferences("u1").await, after_first);
  }

  #[tokio::test]
  async fn create_aggregates_errors_from_both_inputs_and_writes_nothing() {
    let svc = service().await;
    let out = svc
      .create_preferences(
        "u1",
        Some(&prefs(json!({ "perspective": "invalid", "language": "xx" }))),
        Some(&filters(json!({ "excludedTopics": "sports" }))),
      )
      .await;

    let fields: Vec<_> = out.errors().iter().map(|e| e.field.as_str()).collect();
    assert_eq!(fields, ["perspective", "language", "excludedTopics"]);
    assert_eq!(out.errors()[0].value, Some(json!("invalid")));
    assert_eq!(out.message(), Some("Validation failed"));
    assert!(!svc.store().preferences_exist("u1").await.unwrap());
  }

  #[tokio::test]
  async fn get_or_create_is_idempotent() {
    let svc = service().await;
    let first = svc.get_or_create_preferences("u1").await.into_result().unwrap();
    let second = svc.get_or_create_preferences("u1").await.into_result().unwrap();
    assert_eq!(first, second);
    assert_eq!(first.preferences.perspective, Perspective::Neutral);
    assert_eq!(first.preferences.tone, Tone::Professional);
    assert_eq!(first.preferences.language, Language::En);
    assert_eq!(first.preferences.ai_model, AiModel::Openai);
    assert_eq!(
      first.preferences.propaganda_sensitivity,
      PropagandaSensitivity::Medium
    );
  }

  #[tokio::test]
  async fn store_fault_becomes_opaque_system_error() {
    let store = Arc::new(InstrumentedStore::new().await);
    store.fail_reads(true);
    let svc = PreferenceService::with_memory_sessions(store);

    let out = svc.get_preferences("u1").await;
    let err = only_error(&out);
    assert_eq!(err.kind, ErrorKind::System);
    assert_eq!(err.field, "general");
    assert!(!err.message.contains("injected"));
  }

  // ─── Updates and deletes ─────────────────────────────────────────────────

  #[tokio::test]
  async fn partial_updates_change_only_supplied_fields() {
    let svc = service().await;
    let created = svc
      .create_preferences("u1", None, None)
      .await
      .into_result()
      .unwrap()
      .preferences;

    let cases = [
      json!({}),
      json!({ "tone": "casual" }),
      json!({ "language": "fr", "propagandaDetectionEnabled": false }),
      json!({
        "perspective": "progressive",
        "tone": "analytical",
        "language": "de",
        "aiModel": "local",
        "factCheckingEnabled": false,
        "propagandaDetectionEnabled": true,
        "propagandaSensitivity": "high",
      }),
    ];

    let mut expected = created.clone();
    for case in cases {
      let input = prefs(case);
      expected.apply(&parse_preferences(&input).unwrap());

      let updated = svc.update_preferences("u1", &input).await.into_result().unwrap();
      assert_eq!(updated.perspective, expected.perspective);
      assert_eq!(updated.tone, expected.tone);
      assert_eq!(updated.language, expected.language);
      assert_eq!(updated.ai_model, expected.ai_model);
      assert_eq!(updated.fact_checking_enabled, expected.fact_checking_enabled);
      assert_eq!(
        updated.propaganda_detection_enabled,
        expected.propaganda_detection_enabled
      );
      assert_eq!(updated.propaganda_sensitivity, expected.propaganda_sensitivity);
      assert_eq!(updated.id, created.id);
    }
  }

  #[tokio::test]
  async fn update_missing_user_is_not_found() {
    let svc = service().await;
    let out = svc.update_tone("ghost", "casual").await;
    let err = only_error(&out);
    assert_eq!(err.kind, ErrorKind::NotFound);
    assert_eq!(err.message, "User preferences not found");

    let out = svc
      .update_content_filters("ghost", &filters(json!({ "includedTopics": [] })))
      .await;
    assert_eq!(only_error(&out).kind, ErrorKind::NotFound);
  }

  #[tokio::test]
  async fn invalid_enum_is_rejected_before_any_mutation() {
    let store = Arc::new(InstrumentedStore::new().await);
    let svc = PreferenceService::with_memory_sessions(store.clone());
    svc.create_preferences("u1", None, None).await;
    let writes = store.writes();

    let out = svc.update_perspective("u1", "invalid").await;
    let err = only_error(&out);
    assert_eq!(err.field, "perspective");
    assert_eq!(err.value, Some(json!("invalid")));
    assert_eq!(store.writes(), writes);
  }

  #[tokio::test]
  async fn convenience_updates_delegate() {
    let svc = service().await;
    svc.create_preferences("u1", None, None).await;

    svc.update_perspective("u1", "liberal").await.into_result().unwrap();
    svc.update_tone("u1", "casual").await.into_result().unwrap();
    svc.update_language("u1", "es").await.into_result().unwrap();
    let last = svc.update_ai_model("u1", "google").await.into_result().unwrap();

    assert_eq!(last.perspective, Perspective::Liberal);
    assert_eq!(last.tone, Tone::Casual);
    assert_eq!(last.language, Language::Es);
    assert_eq!(last.ai_model, AiModel::Google);
  }

  #[tokio::test]
  async fn filter_update_keeps_unsupplied_lists() {
    let svc = service().await;
    svc
      .create_preferences("u1", None, Some(&filters(json!({ "includedPeople": ["x"] }))))
      .await;

    let updated = svc
      .update_content_filters("u1", &filters(json!({ "excludedOrganizations": ["y"] })))
      .await
      .into_result()
      .unwrap();
    assert_eq!(updated.included_people, ["x"]);
    assert_eq!(updated.excluded_organizations, ["y"]);
  }

  #[tokio::test]
  async fn delete_is_idempotent() {
    let svc = service().await;
    svc.create_preferences("u1", None, None).await;

    assert_eq!(svc.delete_preferences("u1").await.data(), Some(&true));
    assert_eq!(svc.delete_preferences("u1").await.data(), Some(&false));
    assert_eq!(svc.get_preferences("u1").await.data(), Some(&None));
  }

  // ─── Sessions and merging ────────────────────────────────────────────────

  #[tokio::test]
  async fn session_roundtrip_and_expiry() {
    let now = Arc::new(Mutex::new(Utc::now()));
    let clock_now = now.clone();
    let sessions = MemorySessionStore::with_clock(
      DEFAULT_SESSION_TTL,
      Arc::new(move || -> DateTime<Utc> { *clock_now.lock().unwrap() }),
    );
    let store = SqliteStore::open_in_memory().await.unwrap();
    let svc = PreferenceService::new(Arc::new(store), sessions);

    let stored = svc
      .store_session_preferences("s1", &session(json!({ "perspective": "liberal" })))
      .await;
    assert!(stored.is_success());

    let got = svc.get_session_preferences("s1").await;
    let body = serde_json::to_value(&got).unwrap();
    assert_eq!(body["data"]["perspective"], "liberal");
    assert!(body["data"]["timestamp"].is_string());

    *now.lock().unwrap() += TimeDelta::minutes(61);
    assert_eq!(svc.get_session_preferences("s1").await.data(), Some(&None));
  }

  #[tokio::test]
  async fn invalid_session_input_is_not_stored() {
    let svc = service().await;
    let out = svc
      .store_session_preferences("s1", &session(json!({ "tone": "shouty" })))
      .await;
    assert_eq!(only_error(&out).field, "tone");
    assert!(svc.sessions().is_empty());

    let out = svc.get_session_preferences("").await;
    assert_eq!(only_error(&out).field, "sessionId");
  }

  #[tokio::test]
  async fn merge_prefers_session_fields_and_merges_filters_per_list() {
    let svc = service().await;
    svc
      .create_preferences(
        "u1",
        Some(&prefs(json!({ "tone": "formal" }))),
        Some(&filters(json!({ "includedTopics": ["a"] }))),
      )
      .await;
    svc
      .store_session_preferences(
        "s1",
        &session(json!({
          "tone": "casual",
          "contentFilters": { "excludedPeople": ["b"] },
        })),
      )
      .await;

    let merged = svc
      .get_merged_preferences("u1", Some("s1"))
      .await
      .into_result()
      .unwrap();
    assert_eq!(merged.preferences.tone, Tone::Casual);
    assert_eq!(merged.content_filters.included_topics, ["a"]);
    assert_eq!(merged.content_filters.excluded_people, ["b"]);

    // Nothing was written back.
    let persisted = svc.get_preferences("u1").await.into_result().unwrap().unwrap();
    assert_eq!(persisted.preferences.tone, Tone::Formal);
    assert!(persisted.content_filters.excluded_people.is_empty());
  }

  #[tokio::test]
  async fn merged_preferences_end_to_end() {
    let svc = service().await;

    let fresh = svc.get_merged_preferences("U1", None).await.into_result().unwrap();
    assert_eq!(fresh.preferences.perspective, Perspective::Neutral);
    assert_eq!(fresh.preferences.tone, Tone::Professional);

    svc
      .store_session_preferences("S1", &session(json!({ "perspective": "liberal" })))
      .await;
    let merged = svc
      .get_merged_preferences("U1", Some("S1"))
      .await
      .into_result()
      .unwrap();

    assert_eq!(merged.preferences.perspective, Perspective::Liberal);
    assert_eq!(merged.preferences.tone, fresh.preferences.tone);
    assert_eq!(merged.preferences.language, fresh.preferences.language);
    assert_eq!(merged.preferences.ai_model, fresh.preferences.ai_model);
    assert_eq!(merged.content_filters, fresh.content_filters);
  }

  #[tokio::test]
  async fn unknown_session_leaves_persisted_values() {
    let svc = service().await;
    let merged = svc
      .get_merged_preferences("u1", Some("missing"))
      .await
      .into_result()
      .unwrap();
    assert_eq!(merged.preferences.perspective, Perspective::Neutral);
  }
}
