#![deny(unsafe_code)]

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::rule::{Rule, RuleStatus};

/// Well-known update field names. Any other field name addresses a
/// structured reference list under that standard's field key.
pub mod field {
    pub const TAGS: &str = "tags";
    pub const TARGETED_LANGUAGES: &str = "targeted_languages";
    pub const IRRELEVANT_LANGUAGES: &str = "irrelevant_languages";
    pub const DEFAULT_PROFILES: &str = "default_profiles";
    pub const STATUS: &str = "status";
}

/// A staged value for one rule field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    References(Vec<String>),
    StringSet(BTreeSet<String>),
    Status(RuleStatus),
}

/// Accumulated field updates for a single rule.
///
/// Created empty per rule examined, discarded when empty at the end of a
/// pass, otherwise submitted to the [`crate::source::RuleSource`] exactly
/// once.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PendingUpdate {
    fields: BTreeMap<String, FieldValue>,
}

impl PendingUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn set(&mut self, field_name: impl Into<String>, value: FieldValue) {
        self.fields.insert(field_name.into(), value);
    }

    pub fn get(&self, field_name: &str) -> Option<&FieldValue> {
        self.fields.get(field_name)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Fold another update into this one. Later values win per field; use
    /// [`apply_update`] between passes when values must compose instead.
    pub fn merge(&mut self, other: PendingUpdate) {
        self.fields.extend(other.fields);
    }
}

/// Apply a staged update to a rule, producing the post-update rule.
///
/// Pure: neither input is mutated, and nothing is persisted. Persisting is
/// the caller's explicit `submit_update` step.
pub fn apply_update(rule: &Rule, update: &PendingUpdate) -> Rule {
    let mut next = rule.clone();
    for (name, value) in update.fields() {
        match (name, value) {
            (field::TAGS, FieldValue::StringSet(tags)) => next.tags = tags.clone(),
            (field::TARGETED_LANGUAGES, FieldValue::StringSet(languages)) => {
                next.targeted_languages = languages.clone();
            }
            (field::IRRELEVANT_LANGUAGES, FieldValue::StringSet(languages)) => {
                next.irrelevant_languages = languages.clone();
            }
            (field::DEFAULT_PROFILES, FieldValue::StringSet(profiles)) => {
                next.default_profiles = profiles.clone();
            }
            (field::STATUS, FieldValue::Status(status)) => next.status = *status,
            (field_key, FieldValue::References(ids)) => {
                next.reference_fields
                    .insert(field_key.to_string(), ids.clone());
            }
            // A staged value of the wrong shape for a well-known field is a
            // caller bug; it is dropped rather than misapplied.
            _ => {}
        }
    }
    next
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_update_is_identity() {
        let mut rule = Rule::new("RSPEC-1");
        rule.tags.insert("security".to_string());
        let applied = apply_update(&rule, &PendingUpdate::new());
        assert_eq!(applied.tags, rule.tags);
        assert_eq!(applied.key, rule.key);
    }

    #[test]
    fn applies_reference_and_tag_fields() {
        let rule = Rule::new("RSPEC-1");
        let mut update = PendingUpdate::new();
        update.set(
            "CWE",
            FieldValue::References(vec!["CWE-79".to_string(), "CWE-89".to_string()]),
        );
        update.set(
            field::TAGS,
            FieldValue::StringSet(BTreeSet::from(["cwe".to_string()])),
        );

        let applied = apply_update(&rule, &update);
        assert_eq!(
            applied.references_for("CWE"),
            ["CWE-79".to_string(), "CWE-89".to_string()]
        );
        assert!(applied.tags.contains("cwe"));
        assert!(rule.tags.is_empty(), "input rule must stay untouched");
    }

    #[test]
    fn applies_status() {
        let rule = Rule::new("RSPEC-1");
        let mut update = PendingUpdate::new();
        update.set(field::STATUS, FieldValue::Status(RuleStatus::Deprecated));
        assert_eq!(apply_update(&rule, &update).status, RuleStatus::Deprecated);
    }

    #[test]
    fn merge_later_value_wins() {
        let mut first = PendingUpdate::new();
        first.set("CWE", FieldValue::References(vec!["CWE-1".to_string()]));
        let mut second = PendingUpdate::new();
        second.set("CWE", FieldValue::References(vec!["CWE-2".to_string()]));
        first.merge(second);
        assert_eq!(
            first.get("CWE"),
            Some(&FieldValue::References(vec!["CWE-2".to_string()]))
        );
    }
}
