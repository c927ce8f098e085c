//! Preference records: the per-user tuple of perspective, tone, language,
//! model and analysis toggles.
//!
//! Every enumerated domain is a closed Rust enum. The string forms (used both
//! in the JSON API and in storage) are the lowercase variant names.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};
use uuid::Uuid;

use crate::{Error, Result, fields::PreferenceField, filters::ContentFilters};

// ─── Enumerated domains ──────────────────────────────────────────────────────

/// Political framing applied to generated content.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  EnumIter,
  IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Perspective {
  Conservative,
  Liberal,
  Democratic,
  Progressive,
  #[default]
  Neutral,
}

/// Writing register.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  EnumIter,
  IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Tone {
  Formal,
  Casual,
  Analytical,
  Conversational,
  #[default]
  Professional,
}

/// Content language (ISO 639-1).
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  EnumIter,
  IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Language {
  #[default]
  En,
  Es,
  Fr,
  De,
  It,
  Pt,
}

/// Which model provider generates content for the user.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  EnumIter,
  IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AiModel {
  #[default]
  Openai,
  Anthropic,
  Google,
  Grok,
  Local,
}

/// How aggressively propaganda detection flags content.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  EnumIter,
  IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PropagandaSensitivity {
  Low,
  #[default]
  Medium,
  High,
}

/// Parse the lowercase string form of an enumerated domain.
pub fn parse_variant<E: FromStr>(field: &'static str, value: &str) -> Result<E> {
  value.parse().map_err(|_| Error::UnknownVariant {
    field,
    value: value.to_owned(),
  })
}

// ─── Single field values ─────────────────────────────────────────────────────

/// One typed preference field together with its value.
///
/// Used for partial updates and for by-field lookups against the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreferenceValue {
  Perspective(Perspective),
  Tone(Tone),
  Language(Language),
  AiModel(AiModel),
  FactCheckingEnabled(bool),
  PropagandaDetectionEnabled(bool),
  PropagandaSensitivity(PropagandaSensitivity),
}

impl PreferenceValue {
  pub fn field(&self) -> PreferenceField {
    match self {
      Self::Perspective(_) => PreferenceField::Perspective,
      Self::Tone(_) => PreferenceField::Tone,
      Self::Language(_) => PreferenceField::Language,
      Self::AiModel(_) => PreferenceField::AiModel,
      Self::FactCheckingEnabled(_) => PreferenceField::FactCheckingEnabled,
      Self::PropagandaDetectionEnabled(_) => {
        PreferenceField::PropagandaDetectionEnabled
      }
      Self::PropagandaSensitivity(_) => PreferenceField::PropagandaSensitivity,
    }
  }

  /// String form for the enum-valued fields; `None` for the toggles.
  pub fn as_str(&self) -> Option<&'static str> {
    match *self {
      Self::Perspective(v) => Some(v.into()),
      Self::Tone(v) => Some(v.into()),
      Self::Language(v) => Some(v.into()),
      Self::AiModel(v) => Some(v.into()),
      Self::PropagandaSensitivity(v) => Some(v.into()),
      Self::FactCheckingEnabled(_) | Self::PropagandaDetectionEnabled(_) => None,
    }
  }

  /// Boolean form for the toggle fields; `None` for the enum-valued fields.
  pub fn as_bool(&self) -> Option<bool> {
    match *self {
      Self::FactCheckingEnabled(b) | Self::PropagandaDetectionEnabled(b) => {
        Some(b)
      }
      _ => None,
    }
  }
}

// ─── Persisted record ────────────────────────────────────────────────────────

/// The persisted preference record for one user.
///
/// Serialises with the external (camelCase) field names; the store maps each
/// field to its column through [`PreferenceField::column`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPreferences {
  pub id:                           Uuid,
  pub user_id:                      String,
  pub perspective:                  Perspective,
  pub tone:                         Tone,
  pub language:                     Language,
  pub ai_model:                     AiModel,
  pub fact_checking_enabled:        bool,
  pub propaganda_detection_enabled: bool,
  pub propaganda_sensitivity:       PropagandaSensitivity,
  pub created_at:                   DateTime<Utc>,
  pub updated_at:                   DateTime<Utc>,
}

impl UserPreferences {
  /// Build a fresh record: documented defaults, overridden by `patch`.
  pub fn new(user_id: impl Into<String>, patch: &PreferencesPatch) -> Self {
    let now = Utc::now();
    let mut prefs = Self {
      id:                           Uuid::new_v4(),
      user_id:                      user_id.into(),
      perspective:                  Perspective::default(),
      tone:                         Tone::default(),
      language:                     Language::default(),
      ai_model:                     AiModel::default(),
      fact_checking_enabled:        true,
      propaganda_detection_enabled: true,
      propaganda_sensitivity:       PropagandaSensitivity::default(),
      created_at:                   now,
      updated_at:                   now,
    };
    prefs.apply(patch);
    prefs
  }

  /// Overwrite exactly the fields present in `patch`.
  pub fn apply(&mut self, patch: &PreferencesPatch) {
    for value in patch.values() {
      match value {
        PreferenceValue::Perspective(v) => self.perspective = v,
        PreferenceValue::Tone(v) => self.tone = v,
        PreferenceValue::Language(v) => self.language = v,
        PreferenceValue::AiModel(v) => self.ai_model = v,
        PreferenceValue::FactCheckingEnabled(v) => self.fact_checking_enabled = v,
        PreferenceValue::PropagandaDetectionEnabled(v) => {
          self.propaganda_detection_enabled = v
        }
        PreferenceValue::PropagandaSensitivity(v) => {
          self.propaganda_sensitivity = v
        }
      }
    }
  }

  pub fn value_of(&self, field: PreferenceField) -> PreferenceValue {
    match field {
      PreferenceField::Perspective => PreferenceValue::Perspective(self.perspective),
      PreferenceField::Tone => PreferenceValue::Tone(self.tone),
      PreferenceField::Language => PreferenceValue::Language(self.language),
      PreferenceField::AiModel => PreferenceValue::AiModel(self.ai_model),
      PreferenceField::FactCheckingEnabled => {
        PreferenceValue::FactCheckingEnabled(self.fact_checking_enabled)
      }
      PreferenceField::PropagandaDetectionEnabled => {
        PreferenceValue::PropagandaDetectionEnabled(
          self.propaganda_detection_enabled,
        )
      }
      PreferenceField::PropagandaSensitivity => {
        PreferenceValue::PropagandaSensitivity(self.propaganda_sensitivity)
      }
    }
  }
}

// ─── Partial update ──────────────────────────────────────────────────────────

/// A partial preference update: each field independently optional.
///
/// Only the fields that are `Some` are written; everything else is left
/// untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesPatch {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub perspective:                  Option<Perspective>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub tone:                         Option<Tone>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub language:                     Option<Language>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub ai_model:                     Option<AiModel>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub fact_checking_enabled:        Option<bool>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub propaganda_detection_enabled: Option<bool>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub propaganda_sensitivity:       Option<PropagandaSensitivity>,
}

impl PreferencesPatch {
  /// A patch that sets every field to its documented default.
  pub fn defaults() -> Self {
    Self {
      perspective:                  Some(Perspective::default()),
      tone:                         Some(Tone::default()),
      language:                     Some(Language::default()),
      ai_model:                     Some(AiModel::default()),
      fact_checking_enabled:        Some(true),
      propaganda_detection_enabled: Some(true),
      propaganda_sensitivity:       Some(PropagandaSensitivity::default()),
    }
  }

  /// A patch carrying exactly one field.
  pub fn single(value: PreferenceValue) -> Self {
    let mut patch = Self::default();
    patch.set(value);
    patch
  }

  pub fn set(&mut self, value: PreferenceValue) {
    match value {
      PreferenceValue::Perspective(v) => self.perspective = Some(v),
      PreferenceValue::Tone(v) => self.tone = Some(v),
      PreferenceValue::Language(v) => self.language = Some(v),
      PreferenceValue::AiModel(v) => self.ai_model = Some(v),
      PreferenceValue::FactCheckingEnabled(v) => {
        self.fact_checking_enabled = Some(v)
      }
      PreferenceValue::PropagandaDetectionEnabled(v) => {
        self.propaganda_detection_enabled = Some(v)
      }
      PreferenceValue::PropagandaSensitivity(v) => {
        self.propaganda_sensitivity = Some(v)
      }
    }
  }

  /// The defined fields, in declaration order.
  pub fn values(&self) -> Vec<PreferenceValue> {
    [
      self.perspective.map(PreferenceValue::Perspective),
      self.tone.map(PreferenceValue::Tone),
      self.language.map(PreferenceValue::Language),
      self.ai_model.map(PreferenceValue::AiModel),
      self.fact_checking_enabled.map(PreferenceValue::FactCheckingEnabled),
      self
        .propaganda_detection_enabled
        .map(PreferenceValue::PropagandaDetectionEnabled),
      self
        .propaganda_sensitivity
        .map(PreferenceValue::PropagandaSensitivity),
    ]
    .into_iter()
    .flatten()
    .collect()
  }

  pub fn is_empty(&self) -> bool { self.values().is_empty() }

  /// Overlay `other` on top of `self`: fields set in `other` win.
  pub fn merge(&mut self, other: &PreferencesPatch) {
    for value in other.values() {
      self.set(value);
    }
  }
}

// ─── Combined read model ─────────────────────────────────────────────────────

/// Preferences and content filters for one user, read or created as a unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesWithFilters {
  #[serde(flatten)]
  pub preferences:     UserPreferences,
  pub content_filters: ContentFilters,
}
