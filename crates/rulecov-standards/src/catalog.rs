#![deny(unsafe_code)]

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Whether a catalog rule id can, in principle, be checked automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Implementability {
    Implementable,
    Rejected,
    NotImplementable,
}

impl Implementability {
    /// Parse the catalog CSV spelling. Case-insensitive, tolerant of the
    /// space/underscore variants seen across vendored catalogs.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace(' ', "_").as_str() {
            "implementable" | "yes" => Some(Implementability::Implementable),
            "rejected" | "no" => Some(Implementability::Rejected),
            "not_implementable" => Some(Implementability::NotImplementable),
            _ => None,
        }
    }
}

/// One entry of an external coding-standard catalog. Immutable after load.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogEntry {
    pub id: String,
    pub implementability: Implementability,
    pub title: String,
    pub mandatory: bool,
}

/// An immutable per-standard table of catalog entries, preserving the
/// catalog's enumeration order alongside an id index.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
    index: BTreeMap<String, usize>,
}

impl Catalog {
    /// Build a catalog from entries in enumeration order. Duplicate ids keep
    /// the first occurrence.
    pub fn from_entries(entries: Vec<CatalogEntry>) -> Self {
        let mut index = BTreeMap::new();
        for (position, entry) in entries.iter().enumerate() {
            index.entry(entry.id.clone()).or_insert(position);
        }
        Self { entries, index }
    }

    pub fn get(&self, id: &str) -> Option<&CatalogEntry> {
        self.index.get(id).map(|position| &self.entries[*position])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Ids in catalog enumeration order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.id.as_str())
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
