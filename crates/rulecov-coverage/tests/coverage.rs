//! Coverage map construction and aggregation against an in-memory source.

use rulecov_coverage::{CoverageCache, CoverageMapBuilder, summarize};
use rulecov_model::{MemoryRuleSource, Rule};
use rulecov_standards::{Catalog, CatalogEntry, Implementability, builtin};

fn entry(id: &str, implementability: Implementability, mandatory: bool) -> CatalogEntry {
    CatalogEntry {
        id: id.to_string(),
        implementability,
        title: format!("title for {id}"),
        mandatory,
    }
}

fn misra_catalog() -> Catalog {
    Catalog::from_entries(vec![
        entry("1.1", Implementability::Implementable, true),
        entry("2.2", Implementability::Implementable, true),
        entry("18.3", Implementability::Rejected, false),
        entry("20.4", Implementability::Implementable, false),
    ])
}

fn citing_rule(key: &str, field_key: &str, ids: &[&str]) -> Rule {
    let mut rule = Rule::new(key);
    rule.set_references(field_key, ids.iter().map(|id| id.to_string()).collect());
    rule.target_language("c");
    rule
}

#[test]
fn build_populates_specified_and_implemented() {
    let standard = builtin::misra_c_2004();
    let catalog = misra_catalog();

    let mut source = MemoryRuleSource::new();
    source.add_rule(citing_rule("RSPEC-1", &standard.field_key, &["1.1", "2.2"]));
    source.add_rule(citing_rule("RSPEC-2", &standard.field_key, &["2.2"]));
    // RSPEC-2 is shipped by an analyzer on the instance.
    source.add_implemented("c", Rule::new("RSPEC-2"));

    let builder = CoverageMapBuilder::new(&standard, &catalog);
    let map = builder.build(&source, Some("c"), None).expect("build");

    // One record per catalog id for a closed standard.
    assert_eq!(map.len(), catalog.len());

    let record = map.get("2.2").expect("record");
    assert_eq!(record.specified_count(), 2);
    assert_eq!(record.implemented_count(), 1);
    assert!(record.is_implemented());

    let record = map.get("1.1").expect("record");
    assert_eq!(record.specified_count(), 1);
    assert!(!record.is_implemented());

    assert!(!map.get("20.4").expect("record").is_specified());
}

#[test]
fn coverage_totals_match_observed_pairs() {
    let standard = builtin::misra_c_2004();
    let catalog = misra_catalog();

    let mut source = MemoryRuleSource::new();
    source.add_rule(citing_rule("RSPEC-1", &standard.field_key, &["1.1", "2.2"]));
    // Wildcard over the 2.x chapter expands to 2.2 only.
    source.add_rule(citing_rule("RSPEC-2", &standard.field_key, &[r"2\..+"]));

    let builder = CoverageMapBuilder::new(&standard, &catalog);
    let map = builder.build(&source, Some("c"), None).expect("build");

    let total_specified: usize = map.records().map(|r| r.specified_count()).sum();
    // (RSPEC-1, 1.1), (RSPEC-1, 2.2), (RSPEC-2, 2.2)
    assert_eq!(total_specified, 3);
    for record in map.records() {
        for rule in record.specified_by() {
            assert!(rule.key == "RSPEC-1" || rule.key == "RSPEC-2");
        }
    }
}

#[test]
fn wildcards_are_written_back_as_concrete_ids() {
    let standard = builtin::misra_c_2004();
    let catalog = misra_catalog();

    let mut source = MemoryRuleSource::new();
    source.add_rule(citing_rule("RSPEC-1", &standard.field_key, &[r"2\..+"]));

    let builder = CoverageMapBuilder::new(&standard, &catalog);
    let map = builder.build(&source, Some("c"), None).expect("build");

    let record = map.get("2.2").expect("record");
    let rule = record.specified_by().next().expect("specifying rule");
    assert_eq!(rule.references_for(&standard.field_key), ["2.2".to_string()]);
}

#[test]
fn unknown_ids_are_ignored_for_closed_standards() {
    let standard = builtin::misra_c_2004();
    let catalog = misra_catalog();

    let mut source = MemoryRuleSource::new();
    source.add_rule(citing_rule("RSPEC-1", &standard.field_key, &["99.99"]));

    let builder = CoverageMapBuilder::new(&standard, &catalog);
    let map = builder.build(&source, Some("c"), None).expect("build");

    assert_eq!(map.len(), catalog.len());
    assert!(map.get("99.99").is_none());
    assert!(map.records().all(|r| !r.is_specified()));
}

#[test]
fn open_ended_standard_tracks_ids_lazily() {
    let standard = builtin::cwe();
    let catalog = Catalog::from_entries(vec![entry(
        "CWE-79",
        Implementability::Implementable,
        false,
    )]);

    let mut source = MemoryRuleSource::new();
    source.add_rule(citing_rule(
        "RSPEC-1",
        &standard.field_key,
        &["CWE-79", "CWE-1021"],
    ));

    let builder = CoverageMapBuilder::new(&standard, &catalog);
    let map = builder.build(&source, Some("c"), None).expect("build");

    // Only referenced ids exist; CWE-1021 is tracked despite being absent
    // from the loaded catalog slice.
    assert_eq!(map.len(), 2);
    assert!(map.get("CWE-1021").expect("lazy record").is_specified());
}

#[test]
fn lookup_failure_aborts_without_partial_map() {
    let standard = builtin::misra_c_2004();
    let catalog = misra_catalog();

    let mut source = MemoryRuleSource::new();
    source.poison("gateway timeout");

    let builder = CoverageMapBuilder::new(&standard, &catalog);
    assert!(builder.build(&source, Some("c"), None).is_err());
}

#[test]
fn summary_splits_mandatory_and_optional() {
    let standard = builtin::misra_c_2004();
    let catalog = misra_catalog();

    let mut source = MemoryRuleSource::new();
    source.add_rule(citing_rule("RSPEC-1", &standard.field_key, &["1.1", "20.4"]));
    source.add_implemented("c", Rule::new("RSPEC-1"));

    let builder = CoverageMapBuilder::new(&standard, &catalog);
    let map = builder.build(&source, Some("c"), None).expect("build");
    let summary = summarize(&map, &catalog);

    // 18.3 is Rejected and never counts.
    assert_eq!(summary.mandatory_total, 2);
    assert_eq!(summary.mandatory_specified, 1);
    assert_eq!(summary.mandatory_implemented, 1);
    assert_eq!(summary.optional_total, 1);
    assert_eq!(summary.optional_implemented, 1);
    assert_eq!(summary.mandatory_implemented_percent, 50.0);
    assert_eq!(summary.optional_implemented_percent, 100.0);
}

#[test]
fn summary_with_empty_denominator_is_zero_percent() {
    let standard = builtin::misra_c_2004();
    // No implementable mandatory ids at all.
    let catalog = Catalog::from_entries(vec![entry(
        "18.3",
        Implementability::NotImplementable,
        true,
    )]);

    let source = MemoryRuleSource::new();
    let builder = CoverageMapBuilder::new(&standard, &catalog);
    let map = builder.build(&source, Some("c"), None).expect("build");
    let summary = summarize(&map, &catalog);

    assert_eq!(summary.mandatory_total, 0);
    assert_eq!(summary.mandatory_implemented_percent, 0.0);
    assert_eq!(summary.optional_implemented_percent, 0.0);
}

#[test]
fn cache_serves_repeat_requests_and_invalidates_explicitly() {
    let standard = builtin::misra_c_2004();
    let catalog = misra_catalog();

    let mut source = MemoryRuleSource::new();
    source.add_rule(citing_rule("RSPEC-1", &standard.field_key, &["1.1"]));

    let builder = CoverageMapBuilder::new(&standard, &catalog);
    let mut cache = CoverageCache::new();

    cache
        .get_or_build(&builder, &source, Some("c"), None)
        .expect("first build");

    // The source dies; the cached map must still be served for the same key.
    source.poison("connection reset");
    let cached = cache
        .get_or_build(&builder, &source, Some("c"), None)
        .expect("cached map");
    assert!(cached.get("1.1").expect("record").is_specified());

    cache.invalidate(&standard.field_key);
    assert!(cache.is_empty());
    assert!(cache.get_or_build(&builder, &source, Some("c"), None).is_err());
}
