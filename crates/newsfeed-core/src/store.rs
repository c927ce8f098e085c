//! The `PreferenceStore` and `MigrationStore` traits.
//!
//! The traits are implemented by storage backends (e.g.
//! `newsfeed-store-sqlite`). The service and migration layers depend on this
//! abstraction, not on any concrete backend.

use std::future::Future;

use crate::{
  filters::{ContentFilters, ContentFiltersPatch},
  preferences::{
    AiModel, Language, Perspective, PreferenceValue, PreferencesPatch,
    PreferencesWithFilters, Tone, UserPreferences,
  },
};

// ─── Errors ──────────────────────────────────────────────────────────────────

/// Error bound for store backends.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  /// Whether the failure is a uniqueness violation on the user id, i.e. the
  /// user already has preferences.
  fn is_conflict(&self) -> bool { false }
}

// ─── Per-user contract ───────────────────────────────────────────────────────

/// Abstraction over the persisted preference records.
///
/// Every user has either both a preference record and a content filter
/// record, or neither. Only the combined create upholds that on its own;
/// the plain preference insert leaves the filter record to the caller.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait PreferenceStore: Send + Sync {
  type Error: StoreError;

  // ── Reads ─────────────────────────────────────────────────────────────

  /// Point lookup. Returns `None` if the user has no preferences.
  fn get_preferences<'a>(
    &'a self,
    user_id: &'a str,
  ) -> impl Future<Output = Result<Option<UserPreferences>, Self::Error>> + Send + 'a;

  fn get_content_filters<'a>(
    &'a self,
    user_id: &'a str,
  ) -> impl Future<Output = Result<Option<ContentFilters>, Self::Error>> + Send + 'a;

  /// Read preferences and filters inside one transaction so a concurrent
  /// writer is never observed half-applied.
  fn get_preferences_with_filters<'a>(
    &'a self,
    user_id: &'a str,
  ) -> impl Future<Output = Result<Option<PreferencesWithFilters>, Self::Error>>
  + Send
  + 'a;

  fn preferences_exist<'a>(
    &'a self,
    user_id: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// All preference records where `value.field()` currently equals `value`.
  fn find_by_field(
    &self,
    value: PreferenceValue,
  ) -> impl Future<Output = Result<Vec<UserPreferences>, Self::Error>> + Send + '_;

  // ── Writes ────────────────────────────────────────────────────────────

  /// Insert a preference record with a generated id; fields missing from
  /// `patch` take their defaults. Fails if the user already has one.
  fn create_preferences<'a>(
    &'a self,
    user_id: &'a str,
    patch: &'a PreferencesPatch,
  ) -> impl Future<Output = Result<UserPreferences, Self::Error>> + Send + 'a;

  /// Create both records in one transaction: both exist afterwards, or
  /// neither does.
  fn create_preferences_with_filters<'a>(
    &'a self,
    user_id: &'a str,
    preferences: &'a PreferencesPatch,
    filters: &'a ContentFiltersPatch,
  ) -> impl Future<Output = Result<PreferencesWithFilters, Self::Error>> + Send + 'a;

  /// Write only the fields defined in `patch`. An empty patch is a plain
  /// read. Returns `None` if the user has no preferences.
  fn update_preferences<'a>(
    &'a self,
    user_id: &'a str,
    patch: &'a PreferencesPatch,
  ) -> impl Future<Output = Result<Option<UserPreferences>, Self::Error>> + Send + 'a;

  fn update_content_filters<'a>(
    &'a self,
    user_id: &'a str,
    patch: &'a ContentFiltersPatch,
  ) -> impl Future<Output = Result<Option<ContentFilters>, Self::Error>> + Send + 'a;

  /// Delete a user's preferences; content filters go with them. Returns
  /// whether a row was removed.
  fn delete_preferences<'a>(
    &'a self,
    user_id: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;
}

// ─── Administrative contract ─────────────────────────────────────────────────

/// Bulk queries used only by the migration utilities.
pub trait MigrationStore: PreferenceStore {
  /// Preference records for an explicit set of users, ordered by user id.
  /// Unknown and repeated ids are skipped. The list may be arbitrarily long.
  fn find_preferences_for_users<'a>(
    &'a self,
    user_ids: &'a [String],
  ) -> impl Future<Output = Result<Vec<UserPreferences>, Self::Error>> + Send + 'a;

  /// Ids of registered users that have no preference record.
  fn find_users_without_preferences(
    &self,
  ) -> impl Future<Output = Result<Vec<String>, Self::Error>> + Send + '_;

  /// Apply `patch` to every listed user atomically. Returns the number of
  /// rows changed. The list may be arbitrarily long.
  fn bulk_update_preferences<'a>(
    &'a self,
    user_ids: &'a [String],
    patch: &'a PreferencesPatch,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + 'a;

  /// Adoption counts and value frequencies, read from one snapshot.
  fn preference_statistics(
    &self,
  ) -> impl Future<Output = Result<PreferenceStatistics, Self::Error>> + Send + '_;
}

/// Aggregates behind the migration report.
///
/// Adoption figures only consider registered users, so
/// `users_with_preferences + users_without_preferences == total_users`.
/// Value frequencies cover every preference record, registered or not.
/// Values that never occur may be absent from the frequency lists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreferenceStatistics {
  pub total_users:                  u64,
  pub users_with_preferences:       u64,
  pub users_without_preferences:    u64,
  pub perspective:                  Vec<(Perspective, u64)>,
  pub tone:                         Vec<(Tone, u64)>,
  pub language:                     Vec<(Language, u64)>,
  pub ai_model:                     Vec<(AiModel, u64)>,
  pub fact_checking_enabled:        u64,
  pub propaganda_detection_enabled: u64,
}
