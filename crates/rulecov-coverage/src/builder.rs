#![deny(unsafe_code)]

use std::collections::BTreeMap;

use rulecov_model::{RuleLookupError, RuleSource};
use rulecov_standards::{Catalog, Standard};

use crate::expand::expand;
use crate::record::{CoverageMap, CoverageRecord};

/// Instance consulted for catalog-wide coverage when the caller supplies no
/// explicit instance.
pub const REFERENCE_INSTANCE: &str = "https://next.sonarqube.com/sonarqube";

/// Builds the coverage map for one standard.
///
/// Closed standards get one record per catalog id up front; open-ended
/// standards (CWE) create records lazily on first reference, on the
/// assumption that any id actually cited is valid. Reference-field ids are
/// expanded through [`expand`] and written back onto the in-memory rules, so
/// downstream consumers always see canonical, non-wildcard ids.
pub struct CoverageMapBuilder<'a> {
    standard: &'a Standard,
    catalog: &'a Catalog,
}

impl<'a> CoverageMapBuilder<'a> {
    pub fn new(standard: &'a Standard, catalog: &'a Catalog) -> Self {
        Self { standard, catalog }
    }

    pub fn standard(&self) -> &Standard {
        self.standard
    }

    /// Build the map. Lookup failures abort the build; no partial map is
    /// returned.
    pub fn build(
        &self,
        source: &dyn RuleSource,
        language: Option<&str>,
        instance: Option<&str>,
    ) -> Result<CoverageMap, RuleLookupError> {
        let mut records: BTreeMap<String, CoverageRecord> = BTreeMap::new();
        if !self.standard.open_ended {
            for id in self.catalog.ids() {
                records.insert(id.to_string(), CoverageRecord::new(id));
            }
        }

        let query = format!("'{}' is not empty", self.standard.field_key);
        let mut specifying = source.rules_by_query(&query, language)?;
        for rule in &mut specifying {
            let Some(raw) = rule.reference_fields.get(&self.standard.field_key).cloned() else {
                continue;
            };
            let Some(expanded) = expand(Some(&raw), self.catalog) else {
                continue;
            };
            rule.set_references(self.standard.field_key.clone(), expanded.clone());
            for id in &expanded {
                if let Some(record) = self.record_for(&mut records, id) {
                    record.add_specified(rule);
                }
            }
        }

        let instance = instance.unwrap_or(REFERENCE_INSTANCE);
        let implemented = source.implemented_rules(language, instance)?;
        for implemented_rule in &implemented {
            let Some(mut spec_rule) = source.rule_by_key(&implemented_rule.key, language)? else {
                continue;
            };
            let Some(raw) = spec_rule
                .reference_fields
                .get(&self.standard.field_key)
                .cloned()
            else {
                continue;
            };
            let Some(expanded) = expand(Some(&raw), self.catalog) else {
                continue;
            };
            spec_rule.set_references(self.standard.field_key.clone(), expanded.clone());
            for id in &expanded {
                if let Some(record) = self.record_for(&mut records, id) {
                    record.add_implemented(implemented_rule);
                }
            }
        }

        tracing::debug!(
            standard = %self.standard.name,
            records = records.len(),
            specifying = specifying.len(),
            implemented = implemented.len(),
            "coverage map built"
        );

        Ok(CoverageMap::new(
            self.standard.field_key.clone(),
            language,
            records,
        ))
    }

    /// The record for an id, honoring the standard's id-space policy: closed
    /// standards ignore unknown ids, open-ended standards track them lazily.
    fn record_for<'m>(
        &self,
        records: &'m mut BTreeMap<String, CoverageRecord>,
        id: &str,
    ) -> Option<&'m mut CoverageRecord> {
        if records.contains_key(id) {
            return records.get_mut(id);
        }
        if self.standard.open_ended {
            return Some(
                records
                    .entry(id.to_string())
                    .or_insert_with(|| CoverageRecord::new(id)),
            );
        }
        None
    }
}
