//! Session overlays: transient, non-persisted preference fragments scoped to
//! a session identifier.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  filters::ContentFiltersPatch,
  preferences::{PreferencesPatch, PreferencesWithFilters},
};

/// A partial, preference-shaped mapping layered over persisted preferences.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionOverlay {
  #[serde(flatten)]
  pub preferences:     PreferencesPatch,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub content_filters: Option<ContentFiltersPatch>,
}

impl SessionOverlay {
  /// Apply this overlay to a persisted record.
  ///
  /// Top-level preference fields are replaced wholesale. Content filters are
  /// merged list by list: a list in the overlay replaces the persisted list of
  /// the same name, and every other persisted list survives.
  pub fn merge_into(&self, base: &mut PreferencesWithFilters) {
    base.preferences.apply(&self.preferences);
    if let Some(filters) = &self.content_filters {
      base.content_filters.apply(filters);
    }
  }
}

/// A stored overlay together with the moment it was written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionPreferences {
  #[serde(flatten)]
  pub overlay:   SessionOverlay,
  pub timestamp: DateTime<Utc>,
}
