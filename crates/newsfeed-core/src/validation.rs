//! Validation of untrusted preference and content filter input.
//!
//! Input arrives as loosely-typed JSON values per field. Validation never
//! fails: it returns the list of [`FieldError`]s, empty when the input is
//! valid. [`parse_preferences`] and [`parse_content_filters`] additionally
//! produce the typed patch when there are no errors.

use std::{fmt::Display, str::FromStr};

use serde::Deserialize;
use serde_json::Value;
use strum::IntoEnumIterator;

use crate::{
  fields::{ContentFilterField, PreferenceField},
  filters::ContentFiltersPatch,
  outcome::FieldError,
  preferences::{
    AiModel, Language, Perspective, PreferencesPatch, PropagandaSensitivity, Tone,
  },
  session::SessionOverlay,
};

// ─── Input shapes ────────────────────────────────────────────────────────────

/// Candidate preference values as received from a caller.
///
/// A field that is absent (or JSON `null`) is not part of the update.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesInput {
  pub perspective:                  Option<Value>,
  pub tone:                         Option<Value>,
  pub language:                     Option<Value>,
  pub ai_model:                     Option<Value>,
  pub fact_checking_enabled:        Option<Value>,
  pub propaganda_detection_enabled: Option<Value>,
  pub propaganda_sensitivity:       Option<Value>,
}

/// Candidate content filter lists as received from a caller.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentFiltersInput {
  pub included_topics:        Option<Value>,
  pub excluded_topics:        Option<Value>,
  pub included_people:        Option<Value>,
  pub excluded_people:        Option<Value>,
  pub included_organizations: Option<Value>,
  pub excluded_organizations: Option<Value>,
}

/// Candidate session overlay: preference fields at the top level plus an
/// optional nested `contentFilters` object.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInput {
  #[serde(flatten)]
  pub preferences:     PreferencesInput,
  #[serde(default)]
  pub content_filters: Option<ContentFiltersInput>,
}

impl ContentFiltersInput {
  fn get(&self, field: ContentFilterField) -> Option<&Value> {
    match field {
      ContentFilterField::IncludedTopics => self.included_topics.as_ref(),
      ContentFilterField::ExcludedTopics => self.excluded_topics.as_ref(),
      ContentFilterField::IncludedPeople => self.included_people.as_ref(),
      ContentFilterField::ExcludedPeople => self.excluded_people.as_ref(),
      ContentFilterField::IncludedOrganizations => {
        self.included_organizations.as_ref()
      }
      ContentFilterField::ExcludedOrganizations => {
        self.excluded_organizations.as_ref()
      }
    }
  }
}

// ─── Domain predicates ───────────────────────────────────────────────────────

fn is_member<E: FromStr>(value: &str) -> bool { value.parse::<E>().is_ok() }

pub fn is_valid_perspective(value: &str) -> bool { is_member::<Perspective>(value) }

pub fn is_valid_tone(value: &str) -> bool { is_member::<Tone>(value) }

pub fn is_valid_language(value: &str) -> bool { is_member::<Language>(value) }

pub fn is_valid_ai_model(value: &str) -> bool { is_member::<AiModel>(value) }

pub fn is_valid_propaganda_sensitivity(value: &str) -> bool {
  is_member::<PropagandaSensitivity>(value)
}

pub fn is_boolean(value: &Value) -> bool { value.is_boolean() }

// ─── Field checks ────────────────────────────────────────────────────────────

fn allowed_values<E: IntoEnumIterator + Display>() -> String {
  E::iter().map(|v| v.to_string()).collect::<Vec<_>>().join(", ")
}

/// Check `value` with the domain predicate `is_valid`, then parse it.
fn enum_field<E>(
  field: PreferenceField,
  value: Option<&Value>,
  is_valid: fn(&str) -> bool,
  errors: &mut Vec<FieldError>,
) -> Option<E>
where
  E: FromStr + IntoEnumIterator + Display,
{
  let value = value?;
  match value.as_str().filter(|s| is_valid(s)).map(str::parse::<E>) {
    Some(Ok(parsed)) => Some(parsed),
    _ => {
      let name = field.external_name();
      errors.push(FieldError::validation(
        name,
        format!("Invalid {name}. Must be one of: {}", allowed_values::<E>()),
        Some(value.clone()),
      ));
      None
    }
  }
}

fn bool_field(
  field: PreferenceField,
  value: Option<&Value>,
  errors: &mut Vec<FieldError>,
) -> Option<bool> {
  let value = value?;
  if is_boolean(value) {
    return value.as_bool();
  }

  let name = field.external_name();
  errors.push(FieldError::validation(
    name,
    format!("{name} must be a boolean"),
    Some(value.clone()),
  ));
  None
}

/// Structural check: the value must be an array whose every element is a
/// string. At most one error is reported per field.
fn list_field(
  field: ContentFilterField,
  value: Option<&Value>,
  errors: &mut Vec<FieldError>,
) -> Option<Vec<String>> {
  let value = value?;
  let name = field.external_name();

  let Some(items) = value.as_array() else {
    errors.push(FieldError::validation(
      name,
      format!("{name} must be an array"),
      Some(value.clone()),
    ));
    return None;
  };

  let strings: Option<Vec<String>> = items
    .iter()
    .map(|item| item.as_str().map(str::to_owned))
    .collect();

  if strings.is_none() {
    errors.push(FieldError::validation(
      name,
      format!("All items in {name} must be strings"),
      Some(value.clone()),
    ));
  }
  strings
}

// ─── Entry points ────────────────────────────────────────────────────────────

/// Validate and convert preference input into a typed patch.
pub fn parse_preferences(
  input: &PreferencesInput,
) -> Result<PreferencesPatch, Vec<FieldError>> {
  let mut errors = Vec::new();

  let patch = PreferencesPatch {
    perspective:                  enum_field(
      PreferenceField::Perspective,
      input.perspective.as_ref(),
      is_valid_perspective,
      &mut errors,
    ),
    tone:                         enum_field(
      PreferenceField::Tone,
      input.tone.as_ref(),
      is_valid_tone,
      &mut errors,
    ),
    language:                     enum_field(
      PreferenceField::Language,
      input.language.as_ref(),
      is_valid_language,
      &mut errors,
    ),
    ai_model:                     enum_field(
      PreferenceField::AiModel,
      input.ai_model.as_ref(),
      is_valid_ai_model,
      &mut errors,
    ),
    fact_checking_enabled:        bool_field(
      PreferenceField::FactCheckingEnabled,
      input.fact_checking_enabled.as_ref(),
      &mut errors,
    ),
    propaganda_detection_enabled: bool_field(
      PreferenceField::PropagandaDetectionEnabled,
      input.propaganda_detection_enabled.as_ref(),
      &mut errors,
    ),
    propaganda_sensitivity:       enum_field(
      PreferenceField::PropagandaSensitivity,
      input.propaganda_sensitivity.as_ref(),
      is_valid_propaganda_sensitivity,
      &mut errors,
    ),
  };

  if errors.is_empty() { Ok(patch) } else { Err(errors) }
}

/// Validate and convert content filter input into a typed patch.
pub fn parse_content_filters(
  input: &ContentFiltersInput,
) -> Result<ContentFiltersPatch, Vec<FieldError>> {
  let mut errors = Vec::new();
  let mut patch = ContentFiltersPatch::default();

  for field in ContentFilterField::ALL {
    if let Some(list) = list_field(field, input.get(field), &mut errors) {
      patch.set(field, list);
    }
  }

  if errors.is_empty() { Ok(patch) } else { Err(errors) }
}

/// Validate both tiers of a session overlay, aggregating their errors.
pub fn parse_session_overlay(
  input: &SessionInput,
) -> Result<SessionOverlay, Vec<FieldError>> {
  let preferences = parse_preferences(&input.preferences);
  let content_filters = input
    .content_filters
    .as_ref()
    .map(parse_content_filters)
    .transpose();

  match (preferences, content_filters) {
    (Ok(preferences), Ok(content_filters)) => Ok(SessionOverlay {
      preferences,
      content_filters,
    }),
    (preferences, content_filters) => Err(
      preferences
        .err()
        .into_iter()
        .chain(content_filters.err())
        .flatten()
        .collect(),
    ),
  }
}

/// All validation errors for `input`; empty when valid.
pub fn validate_preferences(input: &PreferencesInput) -> Vec<FieldError> {
  parse_preferences(input).err().unwrap_or_default()
}

/// All validation errors for `input`; empty when valid.
pub fn validate_content_filters(input: &ContentFiltersInput) -> Vec<FieldError> {
  parse_content_filters(input).err().unwrap_or_default()
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  fn prefs(value: Value) -> PreferencesInput { serde_json::from_value(value).unwrap() }

  fn filters(value: Value) -> ContentFiltersInput {
    serde_json::from_value(value).unwrap()
  }

  #[test]
  fn parsing_agrees_with_predicates() {
    for candidate in ["liberal", "Liberal", "neutral", "", "centrist"] {
      let errors = validate_preferences(&prefs(json!({ "perspective": candidate })));
      assert_eq!(errors.is_empty(), is_valid_perspective(candidate), "{candidate}");
    }
    for candidate in ["en", "EN", "pt", "jp"] {
      let errors = validate_preferences(&prefs(json!({ "language": candidate })));
      assert_eq!(errors.is_empty(), is_valid_language(candidate), "{candidate}");
    }
    for candidate in [json!(true), json!(0), json!("false"), json!([])] {
      let errors =
        validate_preferences(&prefs(json!({ "factCheckingEnabled": candidate.clone() })));
      assert_eq!(errors.is_empty(), is_boolean(&candidate), "{candidate}");
    }
  }

  #[test]
  fn predicates_accept_only_domain_members() {
    assert!(is_valid_perspective("progressive"));
    assert!(!is_valid_perspective("Progressive"));
    assert!(is_valid_tone("analytical"));
    assert!(is_valid_language("de"));
    assert!(!is_valid_language("jp"));
    assert!(is_valid_ai_model("anthropic"));
    assert!(is_valid_propaganda_sensitivity("high"));
    assert!(!is_valid_propaganda_sensitivity("extreme"));
    assert!(is_boolean(&json!(false)));
    assert!(!is_boolean(&json!("true")));
  }

  #[test]
  fn empty_input_is_valid() {
    assert!(validate_preferences(&PreferencesInput::default()).is_empty());
    assert!(validate_content_filters(&ContentFiltersInput::default()).is_empty());
  }

  #[test]
  fn invalid_perspective_cites_field_and_value() {
    let errors = validate_preferences(&prefs(json!({ "perspective": "invalid" })));
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].field, "perspective");
    assert_eq!(errors[0].value, Some(json!("invalid")));
    assert!(errors[0].message.contains("conservative"));
  }

  #[test]
  fn errors_are_aggregated_across_fields() {
    let errors = validate_preferences(&prefs(json!({
      "tone": "shouty",
      "aiModel": 7,
      "factCheckingEnabled": "yes",
      "language": "en",
    })));
    let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
    assert_eq!(fields, ["tone", "aiModel", "factCheckingEnabled"]);
  }

  #[test]
  fn parse_produces_typed_patch() {
    let patch = parse_preferences(&prefs(json!({
      "aiModel": "grok",
      "propagandaDetectionEnabled": false,
    })))
    .unwrap();
    assert_eq!(patch.ai_model, Some(AiModel::Grok));
    assert_eq!(patch.propaganda_detection_enabled, Some(false));
    assert_eq!(patch.perspective, None);
  }

  #[test]
  fn null_means_absent() {
    let patch = parse_preferences(&prefs(json!({ "tone": null }))).unwrap();
    assert!(patch.is_empty());
  }

  #[test]
  fn filter_lists_are_checked_per_field() {
    let errors = validate_content_filters(&filters(json!({
      "includedTopics": "politics",
      "excludedPeople": ["a", 1, 2],
      "includedOrganizations": ["ok"],
    })));
    assert_eq!(errors.len(), 2);
    assert_eq!(errors[0].field, "includedTopics");
    assert!(errors[0].message.contains("array"));
    assert_eq!(errors[1].field, "excludedPeople");
    assert!(errors[1].message.contains("strings"));
  }

  #[test]
  fn session_input_reports_both_tiers() {
    let input: SessionInput = serde_json::from_value(json!({
      "tone": "loud",
      "contentFilters": { "includedTopics": [1] },
    }))
    .unwrap();
    let errors = parse_session_overlay(&input).unwrap_err();
    let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
    assert_eq!(fields, ["tone", "includedTopics"]);
  }

  #[test]
  fn session_input_converts_to_overlay() {
    let input: SessionInput = serde_json::from_value(json!({
      "perspective": "liberal",
      "contentFilters": { "excludedPeople": ["b"] },
    }))
    .unwrap();
    let overlay = parse_session_overlay(&input).unwrap();
    assert_eq!(overlay.preferences.perspective, Some(Perspective::Liberal));
    assert_eq!(
      overlay.content_filters.unwrap().excluded_people,
      Some(vec!["b".to_owned()])
    );
  }

  #[test]
  fn valid_filters_convert() {
    let patch = parse_content_filters(&filters(json!({
      "excludedTopics": ["sports", "sports"],
    })))
    .unwrap();
    assert_eq!(
      patch.excluded_topics.as_deref(),
      Some(&["sports".to_owned(), "sports".to_owned()][..])
    );
    assert!(patch.included_topics.is_none());
  }
}
