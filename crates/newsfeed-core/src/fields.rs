//! Bidirectional mapping between external (API) field names and internal
//! (storage column) names.
//!
//! The API speaks `aiModel` / `factCheckingEnabled`; the store speaks
//! `ai_model` / `fact_checking_enabled`. Every translation goes through the
//! tables below so the two shapes can never drift apart.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A field of the preference record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PreferenceField {
  Perspective,
  Tone,
  Language,
  AiModel,
  FactCheckingEnabled,
  PropagandaDetectionEnabled,
  PropagandaSensitivity,
}

/// A list field of the content filter record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ContentFilterField {
  IncludedTopics,
  ExcludedTopics,
  IncludedPeople,
  ExcludedPeople,
  IncludedOrganizations,
  ExcludedOrganizations,
}

// ─── Tables ──────────────────────────────────────────────────────────────────

const PREFERENCE_NAMES: [(PreferenceField, &str, &str); 7] = [
  (PreferenceField::Perspective, "perspective", "perspective"),
  (PreferenceField::Tone, "tone", "tone"),
  (PreferenceField::Language, "language", "language"),
  (PreferenceField::AiModel, "aiModel", "ai_model"),
  (
    PreferenceField::FactCheckingEnabled,
    "factCheckingEnabled",
    "fact_checking_enabled",
  ),
  (
    PreferenceField::PropagandaDetectionEnabled,
    "propagandaDetectionEnabled",
    "propaganda_detection_enabled",
  ),
  (
    PreferenceField::PropagandaSensitivity,
    "propagandaSensitivity",
    "propaganda_sensitivity",
  ),
];

const FILTER_NAMES: [(ContentFilterField, &str, &str); 6] = [
  (ContentFilterField::IncludedTopics, "includedTopics", "included_topics"),
  (ContentFilterField::ExcludedTopics, "excludedTopics", "excluded_topics"),
  (ContentFilterField::IncludedPeople, "includedPeople", "included_people"),
  (ContentFilterField::ExcludedPeople, "excludedPeople", "excluded_people"),
  (
    ContentFilterField::IncludedOrganizations,
    "includedOrganizations",
    "included_organizations",
  ),
  (
    ContentFilterField::ExcludedOrganizations,
    "excludedOrganizations",
    "excluded_organizations",
  ),
];

impl PreferenceField {
  pub const ALL: [PreferenceField; 7] = [
    Self::Perspective,
    Self::Tone,
    Self::Language,
    Self::AiModel,
    Self::FactCheckingEnabled,
    Self::PropagandaDetectionEnabled,
    Self::PropagandaSensitivity,
  ];

  fn entry(self) -> (PreferenceField, &'static str, &'static str) {
    PREFERENCE_NAMES[self as usize]
  }

  /// Name used in API payloads and validation errors.
  pub fn external_name(self) -> &'static str { self.entry().1 }

  /// Column name in the `user_preferences` table.
  pub fn column(self) -> &'static str { self.entry().2 }

  pub fn from_external(name: &str) -> Option<Self> {
    PREFERENCE_NAMES
      .iter()
      .find(|(_, ext, _)| *ext == name)
      .map(|(f, ..)| *f)
  }

  pub fn from_column(name: &str) -> Option<Self> {
    PREFERENCE_NAMES
      .iter()
      .find(|(.., col)| *col == name)
      .map(|(f, ..)| *f)
  }
}

impl ContentFilterField {
  pub const ALL: [ContentFilterField; 6] = [
    Self::IncludedTopics,
    Self::ExcludedTopics,
    Self::IncludedPeople,
    Self::ExcludedPeople,
    Self::IncludedOrganizations,
    Self::ExcludedOrganizations,
  ];

  fn entry(self) -> (ContentFilterField, &'static str, &'static str) {
    FILTER_NAMES[self as usize]
  }

  pub fn external_name(self) -> &'static str { self.entry().1 }

  /// Column name in the `content_filters` table.
  pub fn column(self) -> &'static str { self.entry().2 }

  pub fn from_external(name: &str) -> Option<Self> {
    FILTER_NAMES
      .iter()
      .find(|(_, ext, _)| *ext == name)
      .map(|(f, ..)| *f)
  }

  pub fn from_column(name: &str) -> Option<Self> {
    FILTER_NAMES
      .iter()
      .find(|(.., col)| *col == name)
      .map(|(f, ..)| *f)
  }
}

// ─── Free conversion functions ───────────────────────────────────────────────

/// Translate an external field name (`aiModel`) to its storage name
/// (`ai_model`). Covers both preference and content filter fields.
pub fn to_internal(external: &str) -> Result<&'static str> {
  PreferenceField::from_external(external)
    .map(PreferenceField::column)
    .or_else(|| ContentFilterField::from_external(external).map(ContentFilterField::column))
    .ok_or_else(|| Error::UnknownField(external.to_owned()))
}

/// Translate a storage name (`fact_checking_enabled`) to its external name
/// (`factCheckingEnabled`).
pub fn to_external(internal: &str) -> Result<&'static str> {
  PreferenceField::from_column(internal)
    .map(PreferenceField::external_name)
    .or_else(|| {
      ContentFilterField::from_column(internal).map(ContentFilterField::external_name)
    })
    .ok_or_else(|| Error::UnknownField(internal.to_owned()))
}
