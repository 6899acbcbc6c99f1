#![deny(unsafe_code)]

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use rulecov_model::{RuleLookupError, RuleSource};

use crate::builder::CoverageMapBuilder;
use crate::record::CoverageMap;

type CacheKey = (String, Option<String>, Option<String>);

/// Caller-owned cache of completed coverage maps, keyed by
/// `(standard, language, instance)`. Staleness is handled by explicit
/// invalidation, not by hidden reuse.
#[derive(Debug, Default)]
pub struct CoverageCache {
    maps: BTreeMap<CacheKey, CoverageMap>,
}

impl CoverageCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached map for this key, building it on first request.
    pub fn get_or_build(
        &mut self,
        builder: &CoverageMapBuilder<'_>,
        source: &dyn RuleSource,
        language: Option<&str>,
        instance: Option<&str>,
    ) -> Result<&CoverageMap, RuleLookupError> {
        let key = (
            builder.standard().field_key.clone(),
            language.map(str::to_string),
            instance.map(str::to_string),
        );
        match self.maps.entry(key) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let map = builder.build(source, language, instance)?;
                Ok(entry.insert(map))
            }
        }
    }

    /// Drop every cached map for a standard, across languages and instances.
    pub fn invalidate(&mut self, standard_field_key: &str) {
        self.maps
            .retain(|(field_key, _, _), _| field_key != standard_field_key);
    }

    pub fn clear(&mut self) {
        self.maps.clear();
    }

    pub fn len(&self) -> usize {
        self.maps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }
}
