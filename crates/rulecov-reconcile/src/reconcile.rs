#![deny(unsafe_code)]

use std::collections::{BTreeMap, BTreeSet};

use rulecov_model::{
    FieldValue, PendingUpdate, Rule, RuleLookupError, RuleSource, RuleStatus, apply_update, field,
};
use rulecov_standards::{Standard, Tagging, is_shareable_tag};
use serde::Serialize;
use tracing::{debug, warn};

use crate::parser::parse_reference_tokens;

/// Discrepancy classes the reconciler reports but never auto-fixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// The rule carries the standard's tag but cites nothing from it.
    StaleTag,
    /// A structured-field id has no counterpart in the free-text citations.
    FieldMissingFromCitations,
    /// A structured-field id does not match the standard's id pattern even
    /// after canonicalization.
    MalformedToken,
}

/// One human-review finding from a reconciliation pass.
#[derive(Debug, Clone, Serialize)]
pub struct IntegrityWarning {
    pub rule_key: String,
    pub standard: String,
    pub kind: WarningKind,
    pub message: String,
}

/// Result of reconciling one rule against one standard: the safe fixes to
/// stage plus the findings that need a human.
#[derive(Debug, Default)]
pub struct ReconcileOutcome {
    pub update: PendingUpdate,
    pub warnings: Vec<IntegrityWarning>,
}

/// Result of a whole reconciliation pass. `updates` holds at most one merged
/// update per rule, empty updates already dropped.
#[derive(Debug, Default)]
pub struct ReconcileReport {
    pub updates: BTreeMap<String, PendingUpdate>,
    pub warnings: Vec<IntegrityWarning>,
}

/// Reconcile one rule's metadata against one standard.
///
/// Safe, mechanical fixes are staged on the returned update: free-text
/// citations missing from the structured field are merged in (field order
/// first, citation order after), tokens are canonicalized with
/// first-occurrence-wins dedup, and the standard's tag is added when the
/// field is non-empty and the rule is not deprecated. Everything judgemental
/// becomes a warning instead. The function is pure and idempotent: running
/// it on a rule that already absorbed its own update stages nothing further.
pub fn reconcile(rule: &Rule, standard: &Standard) -> ReconcileOutcome {
    let mut outcome = ReconcileOutcome::default();
    let citations = parse_reference_tokens(&rule.free_text_references, standard);
    let field_ids = rule.references_for(&standard.field_key).to_vec();

    if citations.is_empty() && field_ids.is_empty() {
        if has_stale_tag(rule, standard) {
            push_warning(
                &mut outcome,
                rule,
                standard,
                WarningKind::StaleTag,
                format!(
                    "rule is tagged for {} but cites nothing from it",
                    standard.name
                ),
            );
        }
        return outcome;
    }

    // Merge citations into the field: field ids keep their positions, new
    // citation tokens append in citation order.
    let mut merged = field_ids.clone();
    for token in &citations {
        if !merged.contains(token) {
            merged.push(token.clone());
        }
    }

    // Canonicalize, first occurrence wins.
    let mut canonical: Vec<String> = Vec::new();
    for token in &merged {
        let value = match standard.canonicalizer.canonicalize(token) {
            Some(rewritten) => {
                debug!(rule = %rule.key, standard = %standard.name, from = %token, to = %rewritten, "canonicalized reference token");
                rewritten
            }
            None => token.clone(),
        };
        if !standard.matches_token(&value) {
            push_warning(
                &mut outcome,
                rule,
                standard,
                WarningKind::MalformedToken,
                format!("token {value:?} does not match the {} id pattern", standard.name),
            );
        }
        if !canonical.contains(&value) {
            canonical.push(value);
        }
    }

    if canonical != field_ids {
        outcome.update.set(
            standard.field_key.clone(),
            FieldValue::References(canonical.clone()),
        );
    }

    // A non-empty field implies the standard's tag(s), except on deprecated
    // rules, whose metadata is frozen apart from references.
    if !canonical.is_empty() && rule.status != RuleStatus::Deprecated {
        let expected = standard.tags_for(&canonical);
        if !expected.is_subset(&rule.tags) {
            let mut tags = rule.tags.clone();
            tags.extend(expected);
            outcome.update.set(field::TAGS, FieldValue::StringSet(tags));
        }
    }

    // Cross-check: every field id should be backed by a citation. Report
    // only; the citation block is prose and never edited mechanically.
    let cited: BTreeSet<String> = citations
        .iter()
        .map(|token| {
            standard
                .canonicalizer
                .canonicalize(token)
                .unwrap_or_else(|| token.clone())
        })
        .collect();
    for id in &canonical {
        if !cited.contains(id) {
            push_warning(
                &mut outcome,
                rule,
                standard,
                WarningKind::FieldMissingFromCitations,
                format!("{id} is in the {} field but not cited in the rule text", standard.name),
            );
        }
    }

    outcome
}

/// Reconcile every rule against every standard.
///
/// Per rule, standards apply in sequence against a working copy that absorbs
/// each intermediate update, so a later standard sees the tags an earlier
/// one staged. The per-standard updates merge into one update per rule.
pub fn reconcile_all(rules: &[Rule], standards: &[Standard]) -> ReconcileReport {
    let mut report = ReconcileReport::default();
    for rule in rules {
        let mut working = rule.clone();
        let mut merged = PendingUpdate::new();
        for standard in standards {
            let outcome = reconcile(&working, standard);
            report.warnings.extend(outcome.warnings);
            if !outcome.update.is_empty() {
                working = apply_update(&working, &outcome.update);
                merged.merge(outcome.update);
            }
        }
        if !merged.is_empty() {
            report.updates.insert(rule.key.clone(), merged);
        }
    }
    debug!(
        rules = rules.len(),
        updates = report.updates.len(),
        warnings = report.warnings.len(),
        "reconciliation pass complete"
    );
    report
}

/// Persist a pass's updates, one submission per rule. Returns the number of
/// rules updated.
pub fn submit_all(
    source: &mut dyn RuleSource,
    report: &ReconcileReport,
) -> Result<usize, RuleLookupError> {
    for (rule_key, update) in &report.updates {
        source.submit_update(rule_key, update)?;
    }
    Ok(report.updates.len())
}

fn has_stale_tag(rule: &Rule, standard: &Standard) -> bool {
    match &standard.tagging {
        Tagging::Single => rule.tags.contains(&standard.tag) && !is_shareable_tag(&standard.tag),
        Tagging::PerCategory { prefix } => {
            rule.tags.iter().any(|tag| tag.starts_with(prefix.as_str()))
        }
    }
}

fn push_warning(
    outcome: &mut ReconcileOutcome,
    rule: &Rule,
    standard: &Standard,
    kind: WarningKind,
    message: String,
) {
    warn!(rule = %rule.key, standard = %standard.name, ?kind, "{message}");
    outcome.warnings.push(IntegrityWarning {
        rule_key: rule.key.clone(),
        standard: standard.name.clone(),
        kind,
        message,
    });
}
