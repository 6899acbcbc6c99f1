#![deny(unsafe_code)]

use std::collections::BTreeMap;

use rulecov_model::Rule;
use serde::Serialize;

/// Coverage bookkeeping for one external-catalog rule id.
///
/// Both relationship sets are keyed by rule key: more than one specification
/// rule may cite the same catalog id.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CoverageRecord {
    pub rule_id: String,
    specified_by: BTreeMap<String, Rule>,
    implemented_by: BTreeMap<String, Rule>,
}

impl CoverageRecord {
    pub fn new(rule_id: impl Into<String>) -> Self {
        Self {
            rule_id: rule_id.into(),
            ..Self::default()
        }
    }

    pub(crate) fn add_specified(&mut self, rule: &Rule) {
        self.specified_by.insert(rule.key.clone(), rule.clone());
    }

    pub(crate) fn add_implemented(&mut self, rule: &Rule) {
        self.implemented_by.insert(rule.key.clone(), rule.clone());
    }

    pub fn specified_by(&self) -> impl Iterator<Item = &Rule> {
        self.specified_by.values()
    }

    pub fn implemented_by(&self) -> impl Iterator<Item = &Rule> {
        self.implemented_by.values()
    }

    pub fn specified_count(&self) -> usize {
        self.specified_by.len()
    }

    pub fn implemented_count(&self) -> usize {
        self.implemented_by.len()
    }

    pub fn is_specified(&self) -> bool {
        !self.specified_by.is_empty()
    }

    pub fn is_implemented(&self) -> bool {
        !self.implemented_by.is_empty()
    }
}

/// A completed coverage map for one standard, optionally scoped to one
/// language. Immutable once built; rebuilding goes through
/// [`crate::builder::CoverageMapBuilder`] (or the explicit
/// [`crate::cache::CoverageCache`]), never in-place.
#[derive(Debug, Clone, Serialize)]
pub struct CoverageMap {
    standard: String,
    language: Option<String>,
    records: BTreeMap<String, CoverageRecord>,
}

impl CoverageMap {
    pub(crate) fn new(
        standard: impl Into<String>,
        language: Option<&str>,
        records: BTreeMap<String, CoverageRecord>,
    ) -> Self {
        Self {
            standard: standard.into(),
            language: language.map(str::to_string),
            records,
        }
    }

    pub fn standard(&self) -> &str {
        &self.standard
    }

    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    pub fn get(&self, rule_id: &str) -> Option<&CoverageRecord> {
        self.records.get(rule_id)
    }

    pub fn records(&self) -> impl Iterator<Item = &CoverageRecord> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
