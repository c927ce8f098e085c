//! SQL schema for the newsfeed SQLite store.
//!
//! Schema changes are expressed as named migrations. Each is applied at most
//! once, inside its own transaction, and recorded in `schema_migrations`.
//! Entries are append-only: never edit or reorder an applied migration.

/// Connection-level settings; run on every open, outside any transaction.
pub const PRAGMAS: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;
";

/// The migration ledger itself.
pub const MIGRATION_TABLE: &str = "
CREATE TABLE IF NOT EXISTS schema_migrations (
    name        TEXT PRIMARY KEY,
    applied_at  TEXT NOT NULL      -- RFC 3339 UTC
);
";

/// Ordered `(name, ddl)` pairs.
pub const MIGRATIONS: &[(&str, &str)] = &[
  ("001_create_users", "
CREATE TABLE users (
    user_id     TEXT PRIMARY KEY,
    email       TEXT,
    created_at  TEXT NOT NULL
);
"),
  ("002_create_user_preferences", "
-- User ids are opaque; preferences may exist for users that are not
-- registered in `users`.
CREATE TABLE user_preferences (
    id                            TEXT PRIMARY KEY,
    user_id                       TEXT NOT NULL UNIQUE,
    perspective                   TEXT NOT NULL DEFAULT 'neutral'
        CHECK (perspective IN ('conservative', 'liberal', 'democratic', 'progressive', 'neutral')),
    tone                          TEXT NOT NULL DEFAULT 'professional'
        CHECK (tone IN ('formal', 'casual', 'analytical', 'conversational', 'professional')),
    language                      TEXT NOT NULL DEFAULT 'en'
        CHECK (language IN ('en', 'es', 'fr', 'de', 'it', 'pt')),
    ai_model                      TEXT NOT NULL DEFAULT 'openai'
        CHECK (ai_model IN ('openai', 'anthropic', 'google', 'grok', 'local')),
    fact_checking_enabled         INTEGER NOT NULL DEFAULT 1,
    propaganda_detection_enabled  INTEGER NOT NULL DEFAULT 1,
    propaganda_sensitivity        TEXT NOT NULL DEFAULT 'medium'
        CHECK (propaganda_sensitivity IN ('low', 'medium', 'high')),
    created_at                    TEXT NOT NULL,
    updated_at                    TEXT NOT NULL
);

CREATE INDEX user_preferences_perspective_idx ON user_preferences(perspective);
CREATE INDEX user_preferences_tone_idx        ON user_preferences(tone);
CREATE INDEX user_preferences_ai_model_idx    ON user_preferences(ai_model);
"),
  ("003_create_content_filters", "
-- Lists are JSON arrays of strings, order-preserving, duplicates allowed.
CREATE TABLE content_filters (
    id                      TEXT PRIMARY KEY,
    user_id                 TEXT NOT NULL UNIQUE
        REFERENCES user_preferences(user_id) ON DELETE CASCADE,
    included_topics         TEXT NOT NULL DEFAULT '[]',
    excluded_topics         TEXT NOT NULL DEFAULT '[]',
    included_people         TEXT NOT NULL DEFAULT '[]',
    excluded_people         TEXT NOT NULL DEFAULT '[]',
    included_organizations  TEXT NOT NULL DEFAULT '[]',
    excluded_organizations  TEXT NOT NULL DEFAULT '[]',
    created_at              TEXT NOT NULL,
    updated_at              TEXT NOT NULL
);
"),
];

/// Column list shared by every `user_preferences` SELECT; order matches
/// [`crate::encode::RawPreferences::from_row`].
pub const PREFERENCE_COLUMNS: &str = "id, user_id, perspective, tone, language, \
  ai_model, fact_checking_enabled, propaganda_detection_enabled, \
  propaganda_sensitivity, created_at, updated_at";

/// Column list shared by every `content_filters` SELECT; order matches
/// [`crate::encode::RawFilters::from_row`].
pub const FILTER_COLUMNS: &str = "id, user_id, included_topics, excluded_topics, \
  included_people, excluded_people, included_organizations, \
  excluded_organizations, created_at, updated_at";
