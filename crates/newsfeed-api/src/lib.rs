//! JSON HTTP API for newsfeed preferences.
//!
//! Exposes an axum [`Router`] over a [`PreferenceService`] and a
//! [`PreferenceMigrator`] sharing one store. Every body is the
//! `{success, data?, errors?, message?}` envelope; auth and TLS are the
//! caller's responsibility.

pub mod admin;
pub mod envelope;
pub mod error;
pub mod preferences;
pub mod sessions;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Json, Router,
  routing::{get, patch, put},
};
use chrono::TimeDelta;
use newsfeed_core::store::MigrationStore;
use newsfeed_service::{
  DEFAULT_BATCH_SIZE, DEFAULT_SESSION_TTL, MemorySessionStore, PreferenceMigrator,
  PreferenceService,
};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;

pub use envelope::Envelope;
pub use error::ApiError;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `NEWSFEED_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:                 String,
  pub port:                 u16,
  pub store_path:           PathBuf,
  pub session_ttl_minutes:  i64,
  pub migration_batch_size: usize,
}

impl ServerConfig {
  /// Layer defaults, the optional TOML file at `path` and the environment.
  pub fn load(path: PathBuf) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .set_default("host", "127.0.0.1")?
      .set_default("port", 8080_i64)?
      .set_default("store_path", "~/.local/share/newsfeed/preferences.db")?
      .set_default("session_ttl_minutes", DEFAULT_SESSION_TTL.num_minutes())?
      .set_default("migration_batch_size", DEFAULT_BATCH_SIZE as i64)?
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("NEWSFEED").try_parsing(true))
      .build()?
      .try_deserialize()
  }

  /// Session overlay lifetime; falls back to the default when out of range.
  pub fn session_ttl(&self) -> TimeDelta {
    TimeDelta::try_minutes(self.session_ttl_minutes)
      .filter(|ttl| *ttl > TimeDelta::zero())
      .unwrap_or(DEFAULT_SESSION_TTL)
  }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S> {
  pub service:  Arc<PreferenceService<S>>,
  pub migrator: Arc<PreferenceMigrator<S>>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      service:  self.service.clone(),
      migrator: self.migrator.clone(),
    }
  }
}

impl<S: MigrationStore> AppState<S> {
  /// Build the service and migrator over one shared store.
  pub fn new(store: Arc<S>, config: &ServerConfig) -> Self {
    let sessions = MemorySessionStore::new(config.session_ttl());
    Self {
      service:  Arc::new(PreferenceService::new(store.clone(), sessions)),
      migrator: Arc::new(PreferenceMigrator::new(store)),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build a fully-materialised router for `state`, with request tracing.
pub fn router<S>(state: AppState<S>) -> Router<()>
where
  S: MigrationStore + 'static,
{
  Router::new()
    .route("/health", get(health))
    // Preferences
    .route(
      "/preferences/{user_id}",
      get(preferences::get_one::<S>)
        .post(preferences::create::<S>)
        .patch(preferences::update::<S>)
        .delete(preferences::delete_one::<S>),
    )
    .route("/preferences/{user_id}/filters", patch(preferences::update_filters::<S>))
    .route("/preferences/{user_id}/perspective", put(preferences::set_perspective::<S>))
    .route("/preferences/{user_id}/tone", put(preferences::set_tone::<S>))
    .route("/preferences/{user_id}/language", put(preferences::set_language::<S>))
    .route("/preferences/{user_id}/ai-model", put(preferences::set_ai_model::<S>))
    .route("/preferences/{user_id}/merged", get(preferences::merged::<S>))
    // Sessions
    .route(
      "/sessions/{session_id}/preferences",
      get(sessions::get_one::<S>)
        .put(sessions::store::<S>)
        .delete(sessions::delete_one::<S>),
    )
    // Administration
    .route("/admin/report", get(admin::report::<S>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

/// `GET /health`
async fn health() -> Json<Value> { Json(json!({ "status": "ok" })) }

#[cfg(test)]
mod tests;
