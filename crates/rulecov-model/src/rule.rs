#![deny(unsafe_code)]

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Lifecycle status of a specification rule in the tracker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleStatus {
    #[default]
    Active,
    Beta,
    Deprecated,
    Superseded,
    Closed,
}

impl RuleStatus {
    /// Retired rules no longer accept new metadata.
    pub fn is_retired(self) -> bool {
        matches!(
            self,
            RuleStatus::Deprecated | RuleStatus::Superseded | RuleStatus::Closed
        )
    }
}

/// A specification rule record, owned by the tracker and mutated only
/// through [`crate::update::PendingUpdate`] submissions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Rule {
    /// Stable tracker identifier (e.g., "RSPEC-1234").
    pub key: String,
    pub status: RuleStatus,
    /// Structured reference lists, keyed by standard field key
    /// (e.g., "CWE" -> ["CWE-79", "CWE-89"]). Order is significant.
    #[serde(default)]
    pub reference_fields: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub targeted_languages: BTreeSet<String>,
    #[serde(default)]
    pub covered_languages: BTreeSet<String>,
    #[serde(default)]
    pub irrelevant_languages: BTreeSet<String>,
    #[serde(default)]
    pub default_profiles: BTreeSet<String>,
    /// Raw citation block as authored in the tracker (rendered HTML lines).
    #[serde(default)]
    pub free_text_references: String,
}

impl Rule {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Self::default()
        }
    }

    /// Structured reference ids for one standard. Missing field reads as
    /// empty; callers that must distinguish "no field" use
    /// `reference_fields.get` directly.
    pub fn references_for(&self, field_key: &str) -> &[String] {
        self.reference_fields
            .get(field_key)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn set_references(&mut self, field_key: impl Into<String>, ids: Vec<String>) {
        self.reference_fields.insert(field_key.into(), ids);
    }

    /// Add a targeted language. A language can never be targeted and
    /// irrelevant at the same time.
    pub fn target_language(&mut self, language: impl Into<String>) {
        let language = language.into();
        self.irrelevant_languages.remove(&language);
        self.targeted_languages.insert(language);
    }

    /// Mark a language irrelevant, withdrawing it from the targeted set.
    pub fn mark_language_irrelevant(&mut self, language: impl Into<String>) {
        let language = language.into();
        self.targeted_languages.remove(&language);
        self.irrelevant_languages.insert(language);
    }

    /// Whether the targeted/irrelevant language sets are disjoint.
    pub fn languages_consistent(&self) -> bool {
        self.targeted_languages
            .is_disjoint(&self.irrelevant_languages)
    }
}
