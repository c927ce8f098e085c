//! Preference management for the newsfeed platform.
//!
//! [`PreferenceService`] is the sole programmatic entry point for presentation
//! layers: it validates input, delegates persistence to a
//! [`PreferenceStore`](newsfeed_core::store::PreferenceStore) and layers
//! session overlays on top. [`PreferenceMigrator`] runs administrative bulk
//! operations directly against a
//! [`MigrationStore`](newsfeed_core::store::MigrationStore).

#![allow(async_fn_in_trait)]

pub mod error;
pub mod migration;
pub mod service;
pub mod session;

pub use error::MigrationError;
pub use migration::{
  DEFAULT_BATCH_SIZE, MigrationOptions, MigrationPreview, MigrationReport,
  MigrationResult, PreferenceMigrator,
};
pub use service::PreferenceService;
pub use session::{Clock, DEFAULT_SESSION_TTL, MemorySessionStore, SessionStore};

#[cfg(test)]
mod testing;
