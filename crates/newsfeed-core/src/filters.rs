//! Content filter records: the six include/exclude string lists for a user.
//!
//! Lists keep insertion order and are not deduplicated.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::fields::ContentFilterField;

/// The persisted content filter record, 1:1 with a user's preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentFilters {
  pub id:                     Uuid,
  pub user_id:                String,
  pub included_topics:        Vec<String>,
  pub excluded_topics:        Vec<String>,
  pub included_people:        Vec<String>,
  pub excluded_people:        Vec<String>,
  pub included_organizations: Vec<String>,
  pub excluded_organizations: Vec<String>,
  pub created_at:             DateTime<Utc>,
  pub updated_at:             DateTime<Utc>,
}

impl ContentFilters {
  /// Build a fresh record with empty lists, overridden by `patch`.
  pub fn new(user_id: impl Into<String>, patch: &ContentFiltersPatch) -> Self {
    let now = Utc::now();
    let mut filters = Self {
      id:                     Uuid::new_v4(),
      user_id:                user_id.into(),
      included_topics:        Vec::new(),
      excluded_topics:        Vec::new(),
      included_people:        Vec::new(),
      excluded_people:        Vec::new(),
      included_organizations: Vec::new(),
      excluded_organizations: Vec::new(),
      created_at:             now,
      updated_at:             now,
    };
    filters.apply(patch);
    filters
  }

  /// Replace exactly the lists present in `patch`; others are kept.
  pub fn apply(&mut self, patch: &ContentFiltersPatch) {
    for (field, list) in patch.entries() {
      *self.list_mut(field) = list.to_vec();
    }
  }

  pub fn list(&self, field: ContentFilterField) -> &[String] {
    match field {
      ContentFilterField::IncludedTopics => &self.included_topics,
      ContentFilterField::ExcludedTopics => &self.excluded_topics,
      ContentFilterField::IncludedPeople => &self.included_people,
      ContentFilterField::ExcludedPeople => &self.excluded_people,
      ContentFilterField::IncludedOrganizations => &self.included_organizations,
      ContentFilterField::ExcludedOrganizations => &self.excluded_organizations,
    }
  }

  fn list_mut(&mut self, field: ContentFilterField) -> &mut Vec<String> {
    match field {
      ContentFilterField::IncludedTopics => &mut self.included_topics,
      ContentFilterField::ExcludedTopics => &mut self.excluded_topics,
      ContentFilterField::IncludedPeople => &mut self.included_people,
      ContentFilterField::ExcludedPeople => &mut self.excluded_people,
      ContentFilterField::IncludedOrganizations => {
        &mut self.included_organizations
      }
      ContentFilterField::ExcludedOrganizations => {
        &mut self.excluded_organizations
      }
    }
  }
}

/// A partial content filter update; each list independently optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentFiltersPatch {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub included_topics:        Option<Vec<String>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub excluded_topics:        Option<Vec<String>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub included_people:        Option<Vec<String>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub excluded_people:        Option<Vec<String>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub included_organizations: Option<Vec<String>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub excluded_organizations: Option<Vec<String>>,
}

impl ContentFiltersPatch {
  /// The defined lists, in declaration order.
  pub fn entries(&self) -> Vec<(ContentFilterField, &[String])> {
    ContentFilterField::ALL
      .into_iter()
      .filter_map(|field| self.get(field).map(|list| (field, list)))
      .collect()
  }

  pub fn get(&self, field: ContentFilterField) -> Option<&[String]> {
    let slot = match field {
      ContentFilterField::IncludedTopics => &self.included_topics,
      ContentFilterField::ExcludedTopics => &self.excluded_topics,
      ContentFilterField::IncludedPeople => &self.included_people,
      ContentFilterField::ExcludedPeople => &self.excluded_people,
      ContentFilterField::IncludedOrganizations => &self.included_organizations,
      ContentFilterField::ExcludedOrganizations => &self.excluded_organizations,
    };
    slot.as_deref()
  }

  pub fn set(&mut self, field: ContentFilterField, list: Vec<String>) {
    let slot = match field {
      ContentFilterField::IncludedTopics => &mut self.included_topics,
      ContentFilterField::ExcludedTopics => &mut self.excluded_topics,
      ContentFilterField::IncludedPeople => &mut self.included_people,
      ContentFilterField::ExcludedPeople => &mut self.excluded_people,
      ContentFilterField::IncludedOrganizations => {
        &mut self.included_organizations
      }
      ContentFilterField::ExcludedOrganizations => {
        &mut self.excluded_organizations
      }
    };
    *slot = Some(list);
  }

  pub fn is_empty(&self) -> bool { self.entries().is_empty() }
}
