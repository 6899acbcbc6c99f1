#![deny(unsafe_code)]

use std::collections::{BTreeMap, BTreeSet};

use rulecov_model::{FieldValue, PendingUpdate, Rule, RuleStatus, field};
use rulecov_standards::Standard;
use tracing::debug;

/// What happens to a retired rule's metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetirementMode {
    /// Metadata moves to the replacements; the old rule's collections are
    /// cleared and its status becomes deprecated.
    Deprecate,
    /// Metadata is copied; the old rule keeps its collections for the
    /// historical record and its status becomes superseded.
    Supersede,
}

impl RetirementMode {
    fn target_status(self) -> RuleStatus {
        match self {
            RetirementMode::Deprecate => RuleStatus::Deprecated,
            RetirementMode::Supersede => RuleStatus::Superseded,
        }
    }

    fn clears_old(self) -> bool {
        matches!(self, RetirementMode::Deprecate)
    }
}

/// Carries a retired rule's coverage metadata onto its replacements so no
/// reference, tag, language, or profile is lost in the handover.
#[derive(Debug)]
pub struct SupersessionPropagator<'a> {
    standards: &'a [Standard],
}

impl<'a> SupersessionPropagator<'a> {
    pub fn new(standards: &'a [Standard]) -> Self {
        Self { standards }
    }

    /// Stage the full handover from `old` to `replacements`.
    ///
    /// Per replacement, the old rule's reference fields (per standard), its
    /// targeted-plus-covered languages, its tags, and its default profiles
    /// merge into the replacement's collections. A replacement field is only
    /// staged when the merge actually grew it, and a language is not
    /// inherited where the replacement already covers it or has declared it
    /// irrelevant. Rules whose update would be empty are absent from the
    /// result. The old rule's own update carries its new status, plus
    /// cleared collections under [`RetirementMode::Deprecate`].
    pub fn propagate(
        &self,
        old: &Rule,
        replacements: &[Rule],
        mode: RetirementMode,
    ) -> BTreeMap<String, PendingUpdate> {
        let mut updates = BTreeMap::new();

        for replacement in replacements {
            let update = self.inherit(old, replacement);
            if !update.is_empty() {
                updates.insert(replacement.key.clone(), update);
            }
        }

        let mut old_update = if mode.clears_old() {
            self.cleared_collections(old)
        } else {
            PendingUpdate::new()
        };
        old_update.merge(self.retire(old, mode));
        if !old_update.is_empty() {
            updates.insert(old.key.clone(), old_update);
        }

        debug!(
            old = %old.key,
            replacements = replacements.len(),
            staged = updates.len(),
            "supersession propagation staged"
        );
        updates
    }

    /// Stage the old rule's status change, and nothing else. Collection
    /// clearing under [`RetirementMode::Deprecate`] happens only inside
    /// [`Self::propagate`], after the replacements have inherited; a
    /// standalone `retire` call never drops metadata.
    pub fn retire(&self, old: &Rule, mode: RetirementMode) -> PendingUpdate {
        let mut update = PendingUpdate::new();
        if old.status != mode.target_status() {
            update.set(field::STATUS, FieldValue::Status(mode.target_status()));
        }
        update
    }

    /// Stage the clearing of the old rule's non-empty collections.
    fn cleared_collections(&self, old: &Rule) -> PendingUpdate {
        let mut update = PendingUpdate::new();
        for standard in self.standards {
            if !old.references_for(&standard.field_key).is_empty() {
                update.set(standard.field_key.clone(), FieldValue::References(Vec::new()));
            }
        }
        if !old.tags.is_empty() {
            update.set(field::TAGS, FieldValue::StringSet(BTreeSet::new()));
        }
        if !old.targeted_languages.is_empty() {
            update.set(
                field::TARGETED_LANGUAGES,
                FieldValue::StringSet(BTreeSet::new()),
            );
        }
        if !old.default_profiles.is_empty() {
            update.set(
                field::DEFAULT_PROFILES,
                FieldValue::StringSet(BTreeSet::new()),
            );
        }
        update
    }

    fn inherit(&self, old: &Rule, replacement: &Rule) -> PendingUpdate {
        let mut update = PendingUpdate::new();

        for standard in self.standards {
            let old_ids = old.references_for(&standard.field_key);
            if old_ids.is_empty() {
                continue;
            }
            let existing = replacement.references_for(&standard.field_key);
            let mut merged = existing.to_vec();
            for id in old_ids {
                if !merged.contains(id) {
                    merged.push(id.clone());
                }
            }
            if merged.len() > existing.len() {
                update.set(standard.field_key.clone(), FieldValue::References(merged));
            }
        }

        // The old rule's reach is targeted plus covered, minus what the
        // replacement has already resolved for itself.
        let mut inherited: BTreeSet<String> = old
            .targeted_languages
            .union(&old.covered_languages)
            .cloned()
            .collect();
        inherited.retain(|language| {
            !replacement.irrelevant_languages.contains(language)
                && !replacement.covered_languages.contains(language)
        });
        let mut targeted = replacement.targeted_languages.clone();
        targeted.extend(inherited);
        if targeted.len() > replacement.targeted_languages.len() {
            update.set(field::TARGETED_LANGUAGES, FieldValue::StringSet(targeted));
        }

        if !old.tags.is_subset(&replacement.tags) {
            let mut tags = replacement.tags.clone();
            tags.extend(old.tags.iter().cloned());
            update.set(field::TAGS, FieldValue::StringSet(tags));
        }

        if !old.default_profiles.is_subset(&replacement.default_profiles) {
            let mut profiles = replacement.default_profiles.clone();
            profiles.extend(old.default_profiles.iter().cloned());
            update.set(field::DEFAULT_PROFILES, FieldValue::StringSet(profiles));
        }

        update
    }
}
