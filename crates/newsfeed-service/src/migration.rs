//! Administrative bulk operations over preference records.
//!
//! Migrations run against a [`MigrationStore`] directly and take already-typed
//! values, so no request-time validation happens here. Affected users are
//! processed in fixed-size batches, one after another; a failing batch is
//! recorded and the remaining batches still run.

use std::{collections::BTreeMap, fmt::Display, sync::Arc};

use newsfeed_core::{
  filters::ContentFiltersPatch,
  preferences::{
    AiModel, Perspective, PreferenceValue, PreferencesPatch, Tone, UserPreferences,
  },
  store::{MigrationStore, PreferenceStatistics},
};
use serde::Serialize;
use strum::IntoEnumIterator;

use crate::error::MigrationError;

pub const DEFAULT_BATCH_SIZE: usize = 100;

// ─── Options and results ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationOptions {
  /// Report what would change without writing.
  pub dry_run:    bool,
  /// Users per bulk mutation. Zero is treated as one.
  pub batch_size: usize,
}

impl Default for MigrationOptions {
  fn default() -> Self {
    Self {
      dry_run:    false,
      batch_size: DEFAULT_BATCH_SIZE,
    }
  }
}

impl MigrationOptions {
  pub fn dry_run() -> Self {
    Self {
      dry_run: true,
      ..Default::default()
    }
  }

  pub fn with_batch_size(self, batch_size: usize) -> Self { Self { batch_size, ..self } }

  fn effective_batch_size(&self) -> usize { self.batch_size.max(1) }
}

/// One user's state before and after a migration, as reported by a dry run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationPreview {
  pub user_id: String,
  /// The current values of the fields being changed, when known.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub before:  Option<PreferencesPatch>,
  pub after:   PreferencesPatch,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationResult {
  /// True only if no batch failed.
  pub success:        bool,
  pub dry_run:        bool,
  /// Users changed by successful batches, or targeted users in a dry run.
  pub affected_users: u64,
  /// One entry per failed batch.
  pub errors:         Vec<String>,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub preview:        Vec<MigrationPreview>,
}

impl MigrationResult {
  fn preview(preview: Vec<MigrationPreview>) -> Self {
    Self {
      success: true,
      dry_run: true,
      affected_users: preview.len() as u64,
      errors: Vec::new(),
      preview,
    }
  }

  fn empty() -> Self {
    Self {
      success:        true,
      dry_run:        false,
      affected_users: 0,
      errors:         Vec::new(),
      preview:        Vec::new(),
    }
  }

  /// The target lookup itself failed; nothing was attempted.
  fn lookup_failed(dry_run: bool, error: impl Display) -> Self {
    Self {
      success: false,
      dry_run,
      affected_users: 0,
      errors: vec![format!("Failed to find affected users: {error}")],
      preview: Vec::new(),
    }
  }

  fn finish(mut self) -> Self {
    self.success = self.errors.is_empty();
    self
  }
}

// ─── Report ──────────────────────────────────────────────────────────────────

/// Adoption among registered users, and value distribution across all
/// preference records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationReport {
  pub total_users:                  u64,
  pub users_with_preferences:       u64,
  pub users_without_preferences:    u64,
  pub perspective_distribution:     BTreeMap<String, u64>,
  pub tone_distribution:            BTreeMap<String, u64>,
  pub language_distribution:        BTreeMap<String, u64>,
  pub ai_model_distribution:        BTreeMap<String, u64>,
  pub fact_checking_enabled:        u64,
  pub propaganda_detection_enabled: u64,
}

/// Occurrence count per variant; variants that never occur map to zero.
fn distribution<E: IntoEnumIterator + Display>(
  frequencies: Vec<(E, u64)>,
) -> BTreeMap<String, u64> {
  let mut counts: BTreeMap<String, u64> =
    E::iter().map(|v| (v.to_string(), 0)).collect();
  for (value, n) in frequencies {
    *counts.entry(value.to_string()).or_default() += n;
  }
  counts
}

impl From<PreferenceStatistics> for MigrationReport {
  fn from(stats: PreferenceStatistics) -> Self {
    Self {
      total_users:                  stats.total_users,
      users_with_preferences:       stats.users_with_preferences,
      users_without_preferences:    stats.users_without_preferences,
      perspective_distribution:     distribution(stats.perspective),
      tone_distribution:            distribution(stats.tone),
      language_distribution:        distribution(stats.language),
      ai_model_distribution:        distribution(stats.ai_model),
      fact_checking_enabled:        stats.fact_checking_enabled,
      propaganda_detection_enabled: stats.propaganda_detection_enabled,
    }
  }
}

// ─── Migrator ────────────────────────────────────────────────────────────────

pub struct PreferenceMigrator<S> {
  store: Arc<S>,
}

impl<S: MigrationStore> PreferenceMigrator<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store } }

  pub async fn migrate_perspective(
    &self,
    from: Perspective,
    to: Perspective,
    options: MigrationOptions,
  ) -> MigrationResult {
    self
      .migrate_field(
        PreferenceValue::Perspective(from),
        PreferenceValue::Perspective(to),
        options,
      )
      .await
  }

  pub async fn migrate_tone(
    &self,
    from: Tone,
    to: Tone,
    options: MigrationOptions,
  ) -> MigrationResult {
    self
      .migrate_field(PreferenceValue::Tone(from), PreferenceValue::Tone(to), options)
      .await
  }

  pub async fn migrate_ai_model(
    &self,
    from: AiModel,
    to: AiModel,
    options: MigrationOptions,
  ) -> MigrationResult {
    self
      .migrate_field(
        PreferenceValue::AiModel(from),
        PreferenceValue::AiModel(to),
        options,
      )
      .await
  }

  /// Set fact checking to `enabled` for `target_users`, or, when no targets
  /// are given, for every user currently at the opposite value.
  pub async fn migrate_fact_checking(
    &self,
    enabled: bool,
    options: MigrationOptions,
    target_users: Option<&[String]>,
  ) -> MigrationResult {
    let found = match target_users {
      Some(user_ids) => self.store.find_preferences_for_users(user_ids).await,
      None => {
        self
          .store
          .find_by_field(PreferenceValue::FactCheckingEnabled(!enabled))
          .await
      }
    };
    let records = match found {
      Ok(records) => records,
      Err(e) => return self.lookup_failed("fact_checking", options, e),
    };

    let to = PreferenceValue::FactCheckingEnabled(enabled);
    let targets = records
      .iter()
      .map(|p| preview_change(p, to))
      .collect();
    self
      .apply("fact_checking", targets, &PreferencesPatch::single(to), options)
      .await
  }

  /// Set every preference field of the listed users to its default. Dry
  /// runs do not consult the store, so listed users need not exist.
  pub async fn reset_to_defaults(
    &self,
    user_ids: &[String],
    options: MigrationOptions,
  ) -> MigrationResult {
    let defaults = PreferencesPatch::defaults();
    let targets = user_ids
      .iter()
      .map(|user_id| MigrationPreview {
        user_id: user_id.clone(),
        before:  None,
        after:   defaults.clone(),
      })
      .collect();
    self.apply("reset_to_defaults", targets, &defaults, options).await
  }

  /// Create default preferences and filters for every registered user who
  /// has none. Users are created one at a time; within a batch the first
  /// failure skips the rest of that batch.
  pub async fn create_missing_preferences(&self, options: MigrationOptions) -> MigrationResult {
    let user_ids = match self.store.find_users_without_preferences().await {
      Ok(ids) => ids,
      Err(e) => return self.lookup_failed("create_missing", options, e),
    };

    if options.dry_run {
      let defaults = PreferencesPatch::defaults();
      return MigrationResult::preview(
        user_ids
          .into_iter()
          .map(|user_id| MigrationPreview {
            user_id,
            before: None,
            after: defaults.clone(),
          })
          .collect(),
      );
    }

    let mut result = MigrationResult::empty();
    let (preferences, filters) = (PreferencesPatch::default(), ContentFiltersPatch::default());

    for (index, batch) in user_ids.chunks(options.effective_batch_size()).enumerate() {
      let number = index + 1;
      let mut created = 0;
      for user_id in batch {
        match self
          .store
          .create_preferences_with_filters(user_id, &preferences, &filters)
          .await
        {
          Ok(_) => created += 1,
          Err(e) => {
            tracing::warn!(batch = number, user_id, error = %e, "create_missing batch aborted");
            result
              .errors
              .push(format!("Batch {number}: failed to create preferences for {user_id}: {e}"));
            break;
          }
        }
      }
      tracing::info!(batch = number, created, "create_missing batch processed");
      result.affected_users += created;
    }

    result.finish()
  }

  /// Counts and value distributions, read from one store snapshot. A failed
  /// read aborts the report.
  pub async fn generate_report(&self) -> Result<MigrationReport, MigrationError> {
    let stats = self
      .store
      .preference_statistics()
      .await
      .map_err(|e| MigrationError::Report(Box::new(e)))?;
    Ok(stats.into())
  }

  // ── Internals ─────────────────────────────────────────────────────────

  /// Move every user whose field currently equals `from` to `to`.
  async fn migrate_field(
    &self,
    from: PreferenceValue,
    to: PreferenceValue,
    options: MigrationOptions,
  ) -> MigrationResult {
    let operation = from.field().external_name();
    let records = match self.store.find_by_field(from).await {
      Ok(records) => records,
      Err(e) => return self.lookup_failed(operation, options, e),
    };

    let targets = records.iter().map(|p| preview_change(p, to)).collect();
    self
      .apply(operation, targets, &PreferencesPatch::single(to), options)
      .await
  }

  /// Preview `targets` in a dry run; otherwise bulk-update them batch by
  /// batch with `patch`.
  async fn apply(
    &self,
    operation: &str,
    targets: Vec<MigrationPreview>,
    patch: &PreferencesPatch,
    options: MigrationOptions,
  ) -> MigrationResult {
    if options.dry_run {
      tracing::info!(operation, users = targets.len(), "dry run");
      return MigrationResult::preview(targets);
    }

    let user_ids: Vec<String> = targets.into_iter().map(|t| t.user_id).collect();
    let mut result = MigrationResult::empty();

    for (index, batch) in user_ids.chunks(options.effective_batch_size()).enumerate() {
      let number = index + 1;
      match self.store.bulk_update_preferences(batch, patch).await {
        Ok(changed) => {
          tracing::info!(operation, batch = number, changed, "migration batch applied");
          result.affected_users += changed;
        }
        Err(e) => {
          tracing::warn!(operation, batch = number, error = %e, "migration batch failed");
          result.errors.push(format!("Batch {number}: {e}"));
        }
      }
    }

    result.finish()
  }

  fn lookup_failed(
    &self,
    operation: &str,
    options: MigrationOptions,
    error: impl std::error::Error,
  ) -> MigrationResult {
    tracing::error!(operation, error = %error, "migration lookup failed");
    MigrationResult::lookup_failed(options.dry_run, error)
  }
}

/// Preview moving `record` to `to`, citing its current value of that field.
fn preview_change(record: &UserPreferences, to: PreferenceValue) -> MigrationPreview {
  MigrationPreview {
    user_id: record.user_id.clone(),
    before:  Some(PreferencesPatch::single(record.value_of(to.field()))),
    after:   PreferencesPatch::single(to),
  }
}
