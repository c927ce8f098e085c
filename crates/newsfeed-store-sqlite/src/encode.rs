//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings, UUIDs hyphenated lowercase strings,
//! enumerated domains their lowercase names, toggles `0`/`1` integers and
//! content filter lists compact JSON arrays.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use newsfeed_core::{
  fields::{ContentFilterField, PreferenceField},
  filters::{ContentFilters, ContentFiltersPatch},
  preferences::{PreferenceValue, PreferencesPatch, UserPreferences, parse_variant},
  store::PreferenceStatistics,
};
use rusqlite::types::Value;
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_list(list: &[String]) -> Result<String> {
  Ok(serde_json::to_string(list)?)
}

pub fn decode_list(s: &str) -> Result<Vec<String>> { Ok(serde_json::from_str(s)?) }

/// SQL value for one preference field.
pub fn encode_value(value: PreferenceValue) -> Value {
  match (value.as_str(), value.as_bool()) {
    (Some(s), _) => Value::Text(s.to_owned()),
    (None, Some(b)) => Value::Integer(i64::from(b)),
    (None, None) => Value::Null,
  }
}

// ─── Partial updates ─────────────────────────────────────────────────────────

/// A `SET a = ?1, b = ?2, updated_at = ?N` clause plus its bound values.
///
/// Column names come from the static field tables, never from input.
pub struct SetClause {
  pub sql:    String,
  pub values: Vec<Value>,
}

impl SetClause {
  fn build(columns: Vec<(&'static str, Value)>, now: DateTime<Utc>) -> Self {
    let mut parts = Vec::with_capacity(columns.len() + 1);
    let mut values = Vec::with_capacity(columns.len() + 1);
    for (column, value) in columns {
      values.push(value);
      parts.push(format!("{column} = ?{}", values.len()));
    }
    values.push(Value::Text(encode_dt(now)));
    parts.push(format!("updated_at = ?{}", values.len()));
    Self { sql: parts.join(", "), values }
  }

  pub fn for_preferences(patch: &PreferencesPatch, now: DateTime<Utc>) -> Self {
    let columns = patch
      .values()
      .into_iter()
      .map(|v| (v.field().column(), encode_value(v)))
      .collect();
    Self::build(columns, now)
  }

  pub fn for_filters(patch: &ContentFiltersPatch, now: DateTime<Utc>) -> Result<Self> {
    let columns = patch
      .entries()
      .into_iter()
      .map(|(field, list)| Ok((field.column(), Value::Text(encode_list(list)?))))
      .collect::<Result<Vec<_>>>()?;
    Ok(Self::build(columns, now))
  }

  /// Index the next positional parameter will take.
  pub fn next_param(&self) -> usize { self.values.len() + 1 }
}

/// Ids bound per `IN (...)` list. SQLite caps a statement at 32766
/// parameters, and a `SET` clause needs a few of its own.
pub const MAX_BOUND_IDS: usize = 10_000;

/// `?s, ?s+1, ...` placeholders for an `IN (...)` list starting at `start`.
pub fn placeholders(start: usize, count: usize) -> String {
  (start..start + count)
    .map(|i| format!("?{i}"))
    .collect::<Vec<_>>()
    .join(", ")
}

// ─── Inserts ─────────────────────────────────────────────────────────────────

/// A preference record encoded for an INSERT.
pub struct EncodedPreferences {
  values: Vec<Value>,
}

impl EncodedPreferences {
  pub fn new(p: &UserPreferences) -> Self {
    let mut values = vec![
      Value::Text(encode_uuid(p.id)),
      Value::Text(p.user_id.clone()),
    ];
    values.extend(
      PreferenceField::ALL
        .into_iter()
        .map(|field| encode_value(p.value_of(field))),
    );
    values.push(Value::Text(encode_dt(p.created_at)));
    values.push(Value::Text(encode_dt(p.updated_at)));
    Self { values }
  }

  pub fn insert(self, conn: &rusqlite::Connection) -> rusqlite::Result<()> {
    let columns: Vec<&str> = PreferenceField::ALL
      .into_iter()
      .map(PreferenceField::column)
      .collect();
    let sql = format!(
      "INSERT INTO user_preferences (id, user_id, {}, created_at, updated_at)
       VALUES ({})",
      columns.join(", "),
      placeholders(1, self.values.len()),
    );
    conn.execute(&sql, rusqlite::params_from_iter(self.values))?;
    Ok(())
  }
}

/// A content filter record encoded for an INSERT.
pub struct EncodedFilters {
  values: Vec<Value>,
}

impl EncodedFilters {
  pub fn new(f: &ContentFilters) -> Result<Self> {
    let mut values = vec![
      Value::Text(encode_uuid(f.id)),
      Value::Text(f.user_id.clone()),
    ];
    for field in ContentFilterField::ALL {
      values.push(Value::Text(encode_list(f.list(field))?));
    }
    values.push(Value::Text(encode_dt(f.created_at)));
    values.push(Value::Text(encode_dt(f.updated_at)));
    Ok(Self { values })
  }

  pub fn insert(self, conn: &rusqlite::Connection) -> rusqlite::Result<()> {
    let columns: Vec<&str> = ContentFilterField::ALL
      .into_iter()
      .map(ContentFilterField::column)
      .collect();
    let sql = format!(
      "INSERT INTO content_filters (id, user_id, {}, created_at, updated_at)
       VALUES ({})",
      columns.join(", "),
      placeholders(1, self.values.len()),
    );
    conn.execute(&sql, rusqlite::params_from_iter(self.values))?;
    Ok(())
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `user_preferences` row.
pub struct RawPreferences {
  pub id:                           String,
  pub user_id:                      String,
  pub perspective:                  String,
  pub tone:                         String,
  pub language:                     String,
  pub ai_model:                     String,
  pub fact_checking_enabled:        bool,
  pub propaganda_detection_enabled: bool,
  pub propaganda_sensitivity:       String,
  pub created_at:                   String,
  pub updated_at:                   String,
}

impl RawPreferences {
  /// Read a row selected with [`crate::schema::PREFERENCE_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:                           row.get(0)?,
      user_id:                      row.get(1)?,
      perspective:                  row.get(2)?,
      tone:                         row.get(3)?,
      language:                     row.get(4)?,
      ai_model:                     row.get(5)?,
      fact_checking_enabled:        row.get(6)?,
      propaganda_detection_enabled: row.get(7)?,
      propaganda_sensitivity:       row.get(8)?,
      created_at:                   row.get(9)?,
      updated_at:                   row.get(10)?,
    })
  }

  pub fn into_preferences(self) -> Result<UserPreferences> {
    Ok(UserPreferences {
      id:                           decode_uuid(&self.id)?,
      user_id:                      self.user_id,
      perspective:                  parse_variant("perspective", &self.perspective)?,
      tone:                         parse_variant("tone", &self.tone)?,
      language:                     parse_variant("language", &self.language)?,
      ai_model:                     parse_variant("ai_model", &self.ai_model)?,
      fact_checking_enabled:        self.fact_checking_enabled,
      propaganda_detection_enabled: self.propaganda_detection_enabled,
      propaganda_sensitivity:       parse_variant(
        "propaganda_sensitivity",
        &self.propaganda_sensitivity,
      )?,
      created_at:                   decode_dt(&self.created_at)?,
      updated_at:                   decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw strings read directly from a `content_filters` row.
pub struct RawFilters {
  pub id:                     String,
  pub user_id:                String,
  pub included_topics:        String,
  pub excluded_topics:        String,
  pub included_people:        String,
  pub excluded_people:        String,
  pub included_organizations: String,
  pub excluded_organizations: String,
  pub created_at:             String,
  pub updated_at:             String,
}

impl RawFilters {
  /// Read a row selected with [`crate::schema::FILTER_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:                     row.get(0)?,
      user_id:                row.get(1)?,
      included_topics:        row.get(2)?,
      excluded_topics:        row.get(3)?,
      included_people:        row.get(4)?,
      excluded_people:        row.get(5)?,
      included_organizations: row.get(6)?,
      excluded_organizations: row.get(7)?,
      created_at:             row.get(8)?,
      updated_at:             row.get(9)?,
    })
  }

  pub fn into_filters(self) -> Result<ContentFilters> {
    Ok(ContentFilters {
      id:                     decode_uuid(&self.id)?,
      user_id:                self.user_id,
      included_topics:        decode_list(&self.included_topics)?,
      excluded_topics:        decode_list(&self.excluded_topics)?,
      included_people:        decode_list(&self.included_people)?,
      excluded_people:        decode_list(&self.excluded_people)?,
      included_organizations: decode_list(&self.included_organizations)?,
      excluded_organizations: decode_list(&self.excluded_organizations)?,
      created_at:             decode_dt(&self.created_at)?,
      updated_at:             decode_dt(&self.updated_at)?,
    })
  }
}

/// Counts read by the statistics query, enum values still undecoded.
pub struct RawStatistics {
  pub total_users:                  i64,
  pub users_with_preferences:       i64,
  pub users_without_preferences:    i64,
  pub perspective:                  Vec<(String, i64)>,
  pub tone:                         Vec<(String, i64)>,
  pub language:                     Vec<(String, i64)>,
  pub ai_model:                     Vec<(String, i64)>,
  pub fact_checking_enabled:        i64,
  pub propaganda_detection_enabled: i64,
}

fn decode_count(n: i64) -> u64 { u64::try_from(n).unwrap_or(0) }

fn decode_frequencies<E: FromStr>(
  field: &'static str,
  rows: Vec<(String, i64)>,
) -> Result<Vec<(E, u64)>> {
  rows
    .into_iter()
    .map(|(value, n)| -> Result<(E, u64)> {
      Ok((parse_variant(field, &value)?, decode_count(n)))
    })
    .collect()
}

impl RawStatistics {
  pub fn into_statistics(self) -> Result<PreferenceStatistics> {
    Ok(PreferenceStatistics {
      total_users:                  decode_count(self.total_users),
      users_with_preferences:       decode_count(self.users_with_preferences),
      users_without_preferences:    decode_count(self.users_without_preferences),
      perspective:                  decode_frequencies("perspective", self.perspective)?,
      tone:                         decode_frequencies("tone", self.tone)?,
      language:                     decode_frequencies("language", self.language)?,
      ai_model:                     decode_frequencies("ai_model", self.ai_model)?,
      fact_checking_enabled:        decode_count(self.fact_checking_enabled),
      propaganda_detection_enabled: decode_count(self.propaganda_detection_enabled),
    })
  }
}
