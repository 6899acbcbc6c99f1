#![deny(unsafe_code)]

use std::collections::BTreeMap;

use crate::error::RuleLookupError;
use crate::rule::Rule;
use crate::update::{PendingUpdate, apply_update};

/// Synchronous request/response boundary to the rule tracker and the
/// analyzer instances. Query strings are opaque predicates built by the
/// engine; implementations only need the quoted-field convention honored by
/// [`MemoryRuleSource`] or their own query language.
pub trait RuleSource {
    /// All specification rules matching a query, optionally scoped to one
    /// language.
    fn rules_by_query(
        &self,
        query: &str,
        language: Option<&str>,
    ) -> Result<Vec<Rule>, RuleLookupError>;

    /// One specification rule by tracker key, or `None` when no such rule
    /// exists.
    fn rule_by_key(
        &self,
        key: &str,
        language: Option<&str>,
    ) -> Result<Option<Rule>, RuleLookupError>;

    /// All analyzer rules currently live on an instance, keyed back to their
    /// specification rules. `language` of `None` means every language the
    /// instance serves.
    fn implemented_rules(
        &self,
        language: Option<&str>,
        instance: &str,
    ) -> Result<Vec<Rule>, RuleLookupError>;

    /// Persist one rule's accumulated field updates. Callers submit at most
    /// once per rule per pass, and only non-empty updates.
    fn submit_update(
        &mut self,
        rule_key: &str,
        update: &PendingUpdate,
    ) -> Result<(), RuleLookupError>;
}

/// In-memory [`RuleSource`] used by the test suites and offline batch runs.
///
/// Queries follow the engine's convention: the first single-quoted token is
/// a reference field key and the predicate is "that field is non-empty".
/// Submitted updates are applied to the stored rule and recorded so callers
/// can assert the one-update-per-rule guarantee.
#[derive(Debug, Default)]
pub struct MemoryRuleSource {
    rules: BTreeMap<String, Rule>,
    implemented: BTreeMap<String, Vec<Rule>>,
    submitted: Vec<(String, PendingUpdate)>,
    poison: Option<String>,
}

impl MemoryRuleSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_rule(&mut self, rule: Rule) {
        self.rules.insert(rule.key.clone(), rule);
    }

    /// Register an analyzer rule as live for a language. The rule's key must
    /// map back to a specification rule added via [`Self::add_rule`] for it
    /// to accrue coverage.
    pub fn add_implemented(&mut self, language: impl Into<String>, rule: Rule) {
        self.implemented.entry(language.into()).or_default().push(rule);
    }

    /// Make every subsequent call fail, for exercising fatal-error paths.
    pub fn poison(&mut self, message: impl Into<String>) {
        self.poison = Some(message.into());
    }

    pub fn rule(&self, key: &str) -> Option<&Rule> {
        self.rules.get(key)
    }

    pub fn submitted(&self) -> &[(String, PendingUpdate)] {
        &self.submitted
    }

    fn check_poison(&self) -> Result<(), String> {
        match &self.poison {
            Some(message) => Err(message.clone()),
            None => Ok(()),
        }
    }

    fn language_matches(rule: &Rule, language: Option<&str>) -> bool {
        match language {
            Some(language) => {
                rule.targeted_languages.contains(language)
                    || rule.covered_languages.contains(language)
            }
            None => true,
        }
    }
}

/// Extract the field key from the engine's quoted-field query convention.
fn quoted_field(query: &str) -> Option<&str> {
    let start = query.find('\'')? + 1;
    let end = start + query[start..].find('\'')?;
    Some(&query[start..end])
}

impl RuleSource for MemoryRuleSource {
    fn rules_by_query(
        &self,
        query: &str,
        language: Option<&str>,
    ) -> Result<Vec<Rule>, RuleLookupError> {
        self.check_poison().map_err(|message| RuleLookupError::Query {
            query: query.to_string(),
            message,
        })?;
        let field_key = quoted_field(query).ok_or_else(|| RuleLookupError::Query {
            query: query.to_string(),
            message: "no quoted field key in query".to_string(),
        })?;
        Ok(self
            .rules
            .values()
            .filter(|rule| !rule.references_for(field_key).is_empty())
            .filter(|rule| Self::language_matches(rule, language))
            .cloned()
            .collect())
    }

    fn rule_by_key(
        &self,
        key: &str,
        _language: Option<&str>,
    ) -> Result<Option<Rule>, RuleLookupError> {
        self.check_poison().map_err(|message| RuleLookupError::Key {
            key: key.to_string(),
            message,
        })?;
        Ok(self.rules.get(key).cloned())
    }

    fn implemented_rules(
        &self,
        language: Option<&str>,
        instance: &str,
    ) -> Result<Vec<Rule>, RuleLookupError> {
        self.check_poison()
            .map_err(|message| RuleLookupError::Implemented {
                language: language.unwrap_or("*").to_string(),
                instance: instance.to_string(),
                message,
            })?;
        match language {
            Some(language) => Ok(self.implemented.get(language).cloned().unwrap_or_default()),
            None => Ok(self.implemented.values().flatten().cloned().collect()),
        }
    }

    fn submit_update(
        &mut self,
        rule_key: &str,
        update: &PendingUpdate,
    ) -> Result<(), RuleLookupError> {
        self.check_poison()
            .map_err(|message| RuleLookupError::Submit {
                key: rule_key.to_string(),
                message,
            })?;
        let rule = self
            .rules
            .get_mut(rule_key)
            .ok_or_else(|| RuleLookupError::Submit {
                key: rule_key.to_string(),
                message: "unknown rule key".to_string(),
            })?;
        *rule = apply_update(rule, update);
        self.submitted.push((rule_key.to_string(), update.clone()));
        Ok(())
    }
}
