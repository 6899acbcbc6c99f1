//! Metadata handover when a rule is retired in favor of replacements.

use rulecov_model::{Rule, RuleStatus, apply_update};
use rulecov_reconcile::{RetirementMode, SupersessionPropagator};
use rulecov_standards::{Standard, builtin};
use std::collections::BTreeSet;

fn old_rule(cwe: &Standard) -> Rule {
    let mut rule = Rule::new("RSPEC-OLD");
    rule.set_references(
        cwe.field_key.clone(),
        vec!["CWE-79".to_string(), "CWE-89".to_string()],
    );
    rule.tags.insert("security".to_string());
    rule.target_language("java");
    rule.default_profiles.insert("Sonar way".to_string());
    rule
}

#[test]
fn deprecation_moves_metadata_without_loss() {
    let standards = vec![builtin::cwe()];
    let cwe = &standards[0];

    let old = old_rule(cwe);
    let mut replacement = Rule::new("RSPEC-NEW");
    replacement.set_references(cwe.field_key.clone(), vec!["CWE-89".to_string()]);

    let propagator = SupersessionPropagator::new(&standards);
    let updates = propagator.propagate(&old, std::slice::from_ref(&replacement), RetirementMode::Deprecate);

    let new_after = apply_update(&replacement, updates.get("RSPEC-NEW").expect("staged"));
    let old_after = apply_update(&old, updates.get("RSPEC-OLD").expect("staged"));

    // Existing id kept its position, the inherited one appended, no
    // duplicates.
    assert_eq!(
        new_after.references_for(&cwe.field_key),
        ["CWE-89".to_string(), "CWE-79".to_string()]
    );
    assert!(new_after.tags.contains("security"));
    assert!(new_after.targeted_languages.contains("java"));
    assert!(new_after.default_profiles.contains("Sonar way"));

    // Move semantics: the old rule hands everything over.
    assert!(old_after.references_for(&cwe.field_key).is_empty());
    assert!(old_after.tags.is_empty());
    assert!(old_after.targeted_languages.is_empty());
    assert!(old_after.default_profiles.is_empty());
    assert_eq!(old_after.status, RuleStatus::Deprecated);
}

#[test]
fn supersession_copies_and_keeps_the_old_record() {
    let standards = vec![builtin::cwe()];
    let cwe = &standards[0];

    let old = old_rule(cwe);
    let replacement = Rule::new("RSPEC-NEW");

    let propagator = SupersessionPropagator::new(&standards);
    let updates = propagator.propagate(&old, std::slice::from_ref(&replacement), RetirementMode::Supersede);

    let new_after = apply_update(&replacement, updates.get("RSPEC-NEW").expect("staged"));
    let old_after = apply_update(&old, updates.get("RSPEC-OLD").expect("staged"));

    assert_eq!(
        new_after.references_for(&cwe.field_key),
        ["CWE-79".to_string(), "CWE-89".to_string()]
    );
    // Copy semantics: the historical record stays intact.
    assert_eq!(
        old_after.references_for(&cwe.field_key),
        ["CWE-79".to_string(), "CWE-89".to_string()]
    );
    assert!(old_after.tags.contains("security"));
    assert_eq!(old_after.status, RuleStatus::Superseded);
}

#[test]
fn every_replacement_inherits_the_full_set() {
    let standards = vec![builtin::cwe()];
    let cwe = &standards[0];

    let old = old_rule(cwe);
    let first = Rule::new("RSPEC-A");
    let second = Rule::new("RSPEC-B");

    let propagator = SupersessionPropagator::new(&standards);
    let updates = propagator.propagate(
        &old,
        &[first.clone(), second.clone()],
        RetirementMode::Supersede,
    );

    for (replacement, key) in [(&first, "RSPEC-A"), (&second, "RSPEC-B")] {
        let after = apply_update(replacement, updates.get(key).expect("staged"));
        assert_eq!(
            after.references_for(&cwe.field_key),
            ["CWE-79".to_string(), "CWE-89".to_string()]
        );
        assert!(after.tags.contains("security"));
    }
}

#[test]
fn irrelevant_and_covered_languages_are_not_inherited() {
    let standards = vec![builtin::cwe()];

    let mut old = Rule::new("RSPEC-OLD");
    old.target_language("java");
    old.covered_languages.insert("cpp".to_string());
    old.covered_languages.insert("python".to_string());

    let mut replacement = Rule::new("RSPEC-NEW");
    replacement.mark_language_irrelevant("cpp");
    replacement.covered_languages.insert("python".to_string());

    let propagator = SupersessionPropagator::new(&standards);
    let updates = propagator.propagate(&old, std::slice::from_ref(&replacement), RetirementMode::Supersede);

    let after = apply_update(&replacement, updates.get("RSPEC-NEW").expect("staged"));
    assert_eq!(
        after.targeted_languages,
        BTreeSet::from(["java".to_string()])
    );
    assert!(after.irrelevant_languages.contains("cpp"));
}

#[test]
fn empty_updates_are_dropped() {
    let standards = vec![builtin::cwe()];
    let cwe = &standards[0];

    // The replacement is already a superset of the old rule's metadata.
    let mut old = Rule::new("RSPEC-OLD");
    old.status = RuleStatus::Superseded;
    old.set_references(cwe.field_key.clone(), vec!["CWE-79".to_string()]);

    let mut replacement = Rule::new("RSPEC-NEW");
    replacement.set_references(cwe.field_key.clone(), vec!["CWE-79".to_string()]);

    let propagator = SupersessionPropagator::new(&standards);
    let updates = propagator.propagate(&old, std::slice::from_ref(&replacement), RetirementMode::Supersede);

    assert!(
        updates.is_empty(),
        "no-op handovers must not reach the tracker"
    );
}

#[test]
fn retire_alone_stages_status_only() {
    let standards = vec![builtin::cwe()];
    let cwe = &standards[0];

    let old = old_rule(cwe);
    let propagator = SupersessionPropagator::new(&standards);

    // Either mode: a standalone retire never touches the collections, since
    // nothing has inherited them yet.
    for (mode, status) in [
        (RetirementMode::Supersede, RuleStatus::Superseded),
        (RetirementMode::Deprecate, RuleStatus::Deprecated),
    ] {
        let update = propagator.retire(&old, mode);
        assert_eq!(update.len(), 1);
        let after = apply_update(&old, &update);
        assert_eq!(after.status, status);
        assert_eq!(
            after.references_for(&cwe.field_key),
            ["CWE-79".to_string(), "CWE-89".to_string()]
        );
        assert!(after.tags.contains("security"));
        assert!(after.targeted_languages.contains("java"));
    }
}
