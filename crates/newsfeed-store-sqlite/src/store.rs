//! [`SqliteStore`], the SQLite implementation of [`PreferenceStore`] and
//! [`MigrationStore`].

use std::path::Path;

use chrono::Utc;
use newsfeed_core::{
  fields::PreferenceField,
  filters::{ContentFilters, ContentFiltersPatch},
  preferences::{
    PreferenceValue, PreferencesPatch, PreferencesWithFilters, UserPreferences,
  },
  store::{MigrationStore, PreferenceStatistics, PreferenceStore},
};
use rusqlite::{OptionalExtension as _, types::Value};

use crate::{
  Error, Result,
  encode::{
    EncodedFilters, EncodedPreferences, MAX_BOUND_IDS, RawFilters, RawPreferences,
    RawStatistics, SetClause, encode_dt, encode_value, placeholders,
  },
  schema::{FILTER_COLUMNS, MIGRATIONS, MIGRATION_TABLE, PRAGMAS, PREFERENCE_COLUMNS},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A preference store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and apply pending schema migrations.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  pub(crate) async fn init_schema(&self) -> Result<()> {
    let now = encode_dt(Utc::now());

    let applied: Vec<&'static str> = self
      .conn
      .call(move |conn| {
        conn.execute_batch(PRAGMAS)?;
        conn.execute_batch(MIGRATION_TABLE)?;

        let mut applied = Vec::new();
        for (name, ddl) in MIGRATIONS {
          let done = conn
            .query_row(
              "SELECT 1 FROM schema_migrations WHERE name = ?1",
              rusqlite::params![name],
              |_| Ok(()),
            )
            .optional()?
            .is_some();
          if done {
            continue;
          }

          let tx = conn.transaction()?;
          tx.execute_batch(ddl)?;
          tx.execute(
            "INSERT INTO schema_migrations (name, applied_at) VALUES (?1, ?2)",
            rusqlite::params![name, now],
          )?;
          tx.commit()?;
          applied.push(*name);
        }
        Ok(applied)
      })
      .await?;

    for name in applied {
      tracing::info!(migration = name, "applied schema migration");
    }
    Ok(())
  }

  /// Names of the schema migrations recorded as applied, oldest first.
  pub async fn applied_migrations(&self) -> Result<Vec<String>> {
    let names = self
      .conn
      .call(|conn| {
        let mut stmt = conn
          .prepare("SELECT name FROM schema_migrations ORDER BY applied_at, name")?;
        let rows = stmt
          .query_map([], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(names)
  }

  /// Register a user account. Returns `false` if the id was already known.
  pub async fn register_user(
    &self,
    user_id: &str,
    email: Option<&str>,
  ) -> Result<bool> {
    let user_id = user_id.to_owned();
    let email = email.map(str::to_owned);
    let at_str = encode_dt(Utc::now());

    let inserted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "INSERT OR IGNORE INTO users (user_id, email, created_at) VALUES (?1, ?2, ?3)",
          rusqlite::params![user_id, email, at_str],
        )?)
      })
      .await?;
    Ok(inserted > 0)
  }

  /// Run raw SQL, for tests that need states the store API never produces.
  #[cfg(test)]
  pub(crate) async fn execute_batch(&self, sql: &'static str) -> Result<()> {
    self.conn.call(move |conn| Ok(conn.execute_batch(sql)?)).await?;
    Ok(())
  }

  /// Run a `SELECT PREFERENCE_COLUMNS ... {tail}` and decode the rows.
  async fn select_preferences(
    &self,
    tail: String,
    params: Vec<Value>,
  ) -> Result<Vec<UserPreferences>> {
    let raws: Vec<RawPreferences> = self
      .conn
      .call(move |conn| Ok(query_preferences(conn, &tail, params)?))
      .await?;

    raws.into_iter().map(RawPreferences::into_preferences).collect()
  }
}

// ─── Query helpers ───────────────────────────────────────────────────────────

fn query_preferences(
  conn: &rusqlite::Connection,
  tail: &str,
  params: impl IntoIterator<Item = Value>,
) -> rusqlite::Result<Vec<RawPreferences>> {
  let sql = format!("SELECT {PREFERENCE_COLUMNS} FROM user_preferences {tail}");
  let mut stmt = conn.prepare(&sql)?;
  let rows = stmt
    .query_map(rusqlite::params_from_iter(params), RawPreferences::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

fn count(conn: &rusqlite::Connection, sql: &str) -> rusqlite::Result<i64> {
  conn.query_row(sql, [], |row| row.get(0))
}

/// `(value, occurrences)` for one enumerated preference column.
fn frequencies(
  conn: &rusqlite::Connection,
  field: PreferenceField,
) -> rusqlite::Result<Vec<(String, i64)>> {
  let column = field.column();
  let mut stmt = conn.prepare(&format!(
    "SELECT {column}, COUNT(*) FROM user_preferences GROUP BY {column} ORDER BY {column}"
  ))?;
  let rows = stmt
    .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

/// Sorted, de-duplicated copy of `user_ids`.
fn distinct_ids(user_ids: &[String]) -> Vec<String> {
  let mut ids = user_ids.to_vec();
  ids.sort_unstable();
  ids.dedup();
  ids
}

// ─── PreferenceStore impl ────────────────────────────────────────────────────

impl PreferenceStore for SqliteStore {
  type Error = Error;

  // ── Reads ─────────────────────────────────────────────────────────────────

  async fn get_preferences(&self, user_id: &str) -> Result<Option<UserPreferences>> {
    let params = vec![Value::Text(user_id.to_owned())];
    let mut found = self
      .select_preferences("WHERE user_id = ?1".to_owned(), params)
      .await?;
    Ok(found.pop())
  }

  async fn get_content_filters(&self, user_id: &str) -> Result<Option<ContentFilters>> {
    let id_str = user_id.to_owned();

    let raw: Option<RawFilters> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {FILTER_COLUMNS} FROM content_filters WHERE user_id = ?1"),
              rusqlite::params![id_str],
              RawFilters::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawFilters::into_filters).transpose()
  }

  async fn get_preferences_with_filters(
    &self,
    user_id: &str,
  ) -> Result<Option<PreferencesWithFilters>> {
    let id_str = user_id.to_owned();

    let raw: Option<(RawPreferences, Option<RawFilters>)> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let prefs = tx
          .query_row(
            &format!(
              "SELECT {PREFERENCE_COLUMNS} FROM user_preferences WHERE user_id = ?1"
            ),
            rusqlite::params![id_str],
            RawPreferences::from_row,
          )
          .optional()?;

        let Some(prefs) = prefs else {
          return Ok(None);
        };

        let filters = tx
          .query_row(
            &format!("SELECT {FILTER_COLUMNS} FROM content_filters WHERE user_id = ?1"),
            rusqlite::params![id_str],
            RawFilters::from_row,
          )
          .optional()?;

        tx.commit()?;
        Ok(Some((prefs, filters)))
      })
      .await?;

    let Some((prefs, filters)) = raw else {
      return Ok(None);
    };
    let filters = filters.ok_or_else(|| Error::MissingFilters(user_id.to_owned()))?;

    Ok(Some(PreferencesWithFilters {
      preferences:     prefs.into_preferences()?,
      content_filters: filters.into_filters()?,
    }))
  }

  async fn preferences_exist(&self, user_id: &str) -> Result<bool> {
    let id_str = user_id.to_owned();

    let exists = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT 1 FROM user_preferences WHERE user_id = ?1",
              rusqlite::params![id_str],
              |_| Ok(()),
            )
            .optional()?
            .is_some(),
        )
      })
      .await?;
    Ok(exists)
  }

  async fn find_by_field(&self, value: PreferenceValue) -> Result<Vec<UserPreferences>> {
    let column = value.field().column();
    let tail = format!("WHERE {column} = ?1 ORDER BY user_id");
    self.select_preferences(tail, vec![encode_value(value)]).await
  }

  // ── Writes ────────────────────────────────────────────────────────────────

  async fn create_preferences(
    &self,
    user_id: &str,
    patch: &PreferencesPatch,
  ) -> Result<UserPreferences> {
    let prefs = UserPreferences::new(user_id, patch);
    let encoded = EncodedPreferences::new(&prefs);

    self
      .conn
      .call(move |conn| Ok(encoded.insert(conn)?))
      .await
      .map_err(|e| Error::on_insert(e, user_id))?;

    tracing::debug!(user_id, "inserted preferences");
    Ok(prefs)
  }

  async fn create_preferences_with_filters(
    &self,
    user_id: &str,
    preferences: &PreferencesPatch,
    filters: &ContentFiltersPatch,
  ) -> Result<PreferencesWithFilters> {
    let record = PreferencesWithFilters {
      preferences:     UserPreferences::new(user_id, preferences),
      content_filters: ContentFilters::new(user_id, filters),
    };
    let encoded_prefs = EncodedPreferences::new(&record.preferences);
    let encoded_filters = EncodedFilters::new(&record.content_filters)?;

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        encoded_prefs.insert(&tx)?;
        encoded_filters.insert(&tx)?;
        tx.commit()?;
        Ok(())
      })
      .await
      .map_err(|e| Error::on_insert(e, user_id))?;

    tracing::debug!(user_id, "inserted preferences with content filters");
    Ok(record)
  }

  async fn update_preferences(
    &self,
    user_id: &str,
    patch: &PreferencesPatch,
  ) -> Result<Option<UserPreferences>> {
    if patch.is_empty() {
      return self.get_preferences(user_id).await;
    }

    let set = SetClause::for_preferences(patch, Utc::now());
    let id_str = user_id.to_owned();

    let raw: Option<RawPreferences> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let sql = format!(
          "UPDATE user_preferences SET {} WHERE user_id = ?{}",
          set.sql,
          set.next_param(),
        );
        let mut values = set.values;
        values.push(Value::Text(id_str.clone()));
        tx.execute(&sql, rusqlite::params_from_iter(values))?;

        let row = tx
          .query_row(
            &format!(
              "SELECT {PREFERENCE_COLUMNS} FROM user_preferences WHERE user_id = ?1"
            ),
            rusqlite::params![id_str],
            RawPreferences::from_row,
          )
          .optional()?;
        tx.commit()?;
        Ok(row)
      })
      .await?;

    raw.map(RawPreferences::into_preferences).transpose()
  }

  async fn update_content_filters(
    &self,
    user_id: &str,
    patch: &ContentFiltersPatch,
  ) -> Result<Option<ContentFilters>> {
    if patch.is_empty() {
      return self.get_content_filters(user_id).await;
    }

    let set = SetClause::for_filters(patch, Utc::now())?;
    let id_str = user_id.to_owned();

    let raw: Option<RawFilters> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let sql = format!(
          "UPDATE content_filters SET {} WHERE user_id = ?{}",
          set.sql,
          set.next_param(),
        );
        let mut values = set.values;
        values.push(Value::Text(id_str.clone()));
        tx.execute(&sql, rusqlite::params_from_iter(values))?;

        let row = tx
          .query_row(
            &format!("SELECT {FILTER_COLUMNS} FROM content_filters WHERE user_id = ?1"),
            rusqlite::params![id_str],
            RawFilters::from_row,
          )
          .optional()?;
        tx.commit()?;
        Ok(row)
      })
      .await?;

    raw.map(RawFilters::into_filters).transpose()
  }

  async fn delete_preferences(&self, user_id: &str) -> Result<bool> {
    let id_str = user_id.to_owned();

    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM user_preferences WHERE user_id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await?;

    tracing::debug!(user_id, deleted, "deleted preferences");
    Ok(deleted > 0)
  }
}

// ─── MigrationStore impl ─────────────────────────────────────────────────────

impl MigrationStore for SqliteStore {
  async fn find_preferences_for_users(
    &self,
    user_ids: &[String],
  ) -> Result<Vec<UserPreferences>> {
    let ids = distinct_ids(user_ids);
    if ids.is_empty() {
      return Ok(Vec::new());
    }

    let raws: Vec<RawPreferences> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut rows = Vec::new();
        for chunk in ids.chunks(MAX_BOUND_IDS) {
          let tail = format!(
            "WHERE user_id IN ({}) ORDER BY user_id",
            placeholders(1, chunk.len())
          );
          rows.extend(query_preferences(
            &tx,
            &tail,
            chunk.iter().cloned().map(Value::Text),
          )?);
        }
        tx.commit()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawPreferences::into_preferences).collect()
  }

  async fn find_users_without_preferences(&self) -> Result<Vec<String>> {
    let ids = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT u.user_id
           FROM users u
           LEFT JOIN user_preferences p ON p.user_id = u.user_id
           WHERE p.user_id IS NULL
           ORDER BY u.created_at, u.user_id",
        )?;
        let rows = stmt
          .query_map([], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(ids)
  }

  async fn bulk_update_preferences(
    &self,
    user_ids: &[String],
    patch: &PreferencesPatch,
  ) -> Result<u64> {
    let ids = distinct_ids(user_ids);
    if ids.is_empty() || patch.is_empty() {
      return Ok(0);
    }
    let set = SetClause::for_preferences(patch, Utc::now());

    let changed = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut changed = 0;
        for chunk in ids.chunks(MAX_BOUND_IDS) {
          let sql = format!(
            "UPDATE user_preferences SET {} WHERE user_id IN ({})",
            set.sql,
            placeholders(set.next_param(), chunk.len()),
          );
          let values = set
            .values
            .iter()
            .cloned()
            .chain(chunk.iter().cloned().map(Value::Text));
          changed += tx.execute(&sql, rusqlite::params_from_iter(values))?;
        }
        tx.commit()?;
        Ok(changed)
      })
      .await?;
    Ok(changed as u64)
  }

  async fn preference_statistics(&self) -> Result<PreferenceStatistics> {
    let raw = self
      .conn
      .call(|conn| {
        let tx = conn.transaction()?;
        let raw = RawStatistics {
          total_users:                  count(&tx, "SELECT COUNT(*) FROM users")?,
          users_with_preferences:       count(
            &tx,
            "SELECT COUNT(*) FROM users u
             JOIN user_preferences p ON p.user_id = u.user_id",
          )?,
          users_without_preferences:    count(
            &tx,
            "SELECT COUNT(*) FROM users u
             LEFT JOIN user_preferences p ON p.user_id = u.user_id
             WHERE p.user_id IS NULL",
          )?,
          perspective:                  frequencies(&tx, PreferenceField::Perspective)?,
          tone:                         frequencies(&tx, PreferenceField::Tone)?,
          language:                     frequencies(&tx, PreferenceField::Language)?,
          ai_model:                     frequencies(&tx, PreferenceField::AiModel)?,
          fact_checking_enabled:        count(
            &tx,
            "SELECT COUNT(*) FROM user_preferences WHERE fact_checking_enabled",
          )?,
          propaganda_detection_enabled: count(
            &tx,
            "SELECT COUNT(*) FROM user_preferences WHERE propaganda_detection_enabled",
          )?,
        };
        tx.commit()?;
        Ok(raw)
      })
      .await?;

    raw.into_statistics()
  }
}
