#![deny(unsafe_code)]

use std::collections::BTreeSet;

use regex::Regex;

use crate::error::StandardsError;

/// Tags that more than one standard legitimately shares; their presence on a
/// rule without a backing reference field is not treated as stale.
const SHAREABLE_TAGS: &[&str] = &["cert", "misra"];

pub fn is_shareable_tag(tag: &str) -> bool {
    SHAREABLE_TAGS.contains(&tag)
}

/// Per-token canonicalization policy for a standard's reference ids.
///
/// Pure data: the reconciler asks [`Canonicalizer::canonicalize`] whether a
/// token needs rewriting and what to rewrite it to.
#[derive(Debug, Clone, Default)]
pub struct Canonicalizer {
    trim_trailing_punctuation: bool,
    required_prefix: Option<String>,
}

impl Canonicalizer {
    /// Tokens are kept exactly as authored.
    pub fn verbatim() -> Self {
        Self::default()
    }

    /// Strip stray trailing periods and commas left over from prose.
    pub fn with_trailing_punctuation_trimmed(mut self) -> Self {
        self.trim_trailing_punctuation = true;
        self
    }

    /// Bare numerals are rewritten to carry the standard's id prefix
    /// (e.g. `79` -> `CWE-79`).
    pub fn with_required_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.required_prefix = Some(prefix.into());
        self
    }

    /// `Some(replacement)` when the token needs rewriting, `None` when it is
    /// already canonical. Idempotent: canonicalizing a canonical token
    /// returns `None`.
    pub fn canonicalize(&self, token: &str) -> Option<String> {
        let mut out = token.trim().to_string();
        if self.trim_trailing_punctuation {
            while out.ends_with('.') || out.ends_with(',') {
                out.pop();
            }
        }
        if let Some(prefix) = &self.required_prefix
            && !out.is_empty()
            && !out.starts_with(prefix.as_str())
            && out.chars().all(|c| c.is_ascii_digit())
        {
            out = format!("{prefix}{out}");
        }
        if out == token { None } else { Some(out) }
    }
}

/// How a standard's tag relates to its reference field.
#[derive(Debug, Clone)]
pub enum Tagging {
    /// One tag marks the rule as referencing the standard at all.
    Single,
    /// One tag per cited sub-code (e.g. OWASP `A1` -> `owasp-a1`).
    PerCategory { prefix: String },
}

/// Capability record for one supported coding standard.
///
/// Standards are data, not types: constructing a `Standard` value is all it
/// takes to support a new catalog.
#[derive(Debug, Clone)]
pub struct Standard {
    /// Display name (e.g. "MISRA C:2004").
    pub name: String,
    /// Key of the structured reference field on a rule.
    pub field_key: String,
    pub tag: String,
    /// Literal text that marks a citation line as belonging to this standard.
    pub search_string: String,
    /// Separator between tokens on a citation line.
    pub separator: String,
    /// Whether the id space is not statically enumerable (e.g. CWE).
    pub open_ended: bool,
    pub canonicalizer: Canonicalizer,
    pub tagging: Tagging,
    token_pattern: Regex,
}

impl Standard {
    /// Build a standard. `token_pattern` is the id pattern; it is anchored
    /// here so matching is always full-token.
    pub fn new(
        name: impl Into<String>,
        field_key: impl Into<String>,
        tag: impl Into<String>,
        search_string: impl Into<String>,
        token_pattern: &str,
    ) -> Result<Self, StandardsError> {
        let anchored =
            Regex::new(&format!("^(?:{token_pattern})$")).map_err(|e| StandardsError::Pattern {
                pattern: token_pattern.to_string(),
                message: e.to_string(),
            })?;
        Ok(Self {
            name: name.into(),
            field_key: field_key.into(),
            tag: tag.into(),
            search_string: search_string.into(),
            separator: " ".to_string(),
            open_ended: false,
            canonicalizer: Canonicalizer::verbatim(),
            tagging: Tagging::Single,
            token_pattern: anchored,
        })
    }

    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    pub fn open_ended(mut self) -> Self {
        self.open_ended = true;
        self
    }

    pub fn with_canonicalizer(mut self, canonicalizer: Canonicalizer) -> Self {
        self.canonicalizer = canonicalizer;
        self
    }

    pub fn with_tagging(mut self, tagging: Tagging) -> Self {
        self.tagging = tagging;
        self
    }

    /// Full-token match against the standard's id pattern.
    pub fn matches_token(&self, token: &str) -> bool {
        self.token_pattern.is_match(token)
    }

    /// The tags implied by a reference-field id list.
    pub fn tags_for(&self, ids: &[String]) -> BTreeSet<String> {
        match &self.tagging {
            Tagging::Single => {
                if ids.is_empty() {
                    BTreeSet::new()
                } else {
                    BTreeSet::from([self.tag.clone()])
                }
            }
            Tagging::PerCategory { prefix } => ids
                .iter()
                .map(|id| format!("{prefix}{}", id.to_lowercase()))
                .collect(),
        }
    }

    /// Manifest role slug for this standard's catalog file. Non-alphanumeric
    /// runs collapse to a single underscore.
    pub fn role(&self) -> String {
        let mut out = String::new();
        for c in self.field_key.to_lowercase().chars() {
            if c.is_ascii_alphanumeric() {
                out.push(c);
            } else if !out.ends_with('_') && !out.is_empty() {
                out.push('_');
            }
        }
        out.trim_end_matches('_').to_string()
    }
}
