#![deny(unsafe_code)]

//! Built-in standard definitions.
//!
//! These are configuration values, not behavior: supporting a further
//! standard means constructing another [`Standard`] and shipping its catalog
//! CSV. The set here covers the catalogs the coverage reports are built for.

use crate::standard::{Canonicalizer, Standard, Tagging};

fn built_in(standard: Result<Standard, crate::error::StandardsError>) -> Standard {
    // Built-in token patterns are compile-time literals.
    standard.expect("built-in token pattern is valid")
}

/// CWE. Open-ended: the full id space is not enumerated, any cited id is
/// tracked. Bare numerals in reference fields are rewritten to `CWE-N`.
pub fn cwe() -> Standard {
    built_in(Standard::new("CWE", "CWE", "cwe", "CWE", r"CWE-\d+")).open_ended().with_canonicalizer(
        Canonicalizer::verbatim()
            .with_trailing_punctuation_trimmed()
            .with_required_prefix("CWE-"),
    )
}

pub fn misra_c_2004() -> Standard {
    built_in(Standard::new(
        "MISRA C:2004",
        "MISRA C 2004",
        "misra",
        "MISRA C:2004,",
        r"\d{1,2}\.\d{1,2}",
    ))
    .with_canonicalizer(Canonicalizer::verbatim().with_trailing_punctuation_trimmed())
}

pub fn misra_cpp_2008() -> Standard {
    built_in(Standard::new(
        "MISRA C++:2008",
        "MISRA C++ 2008",
        "misra",
        "MISRA C++:2008,",
        r"\d{1,2}-\d{1,2}-\d{1,2}",
    ))
    .with_canonicalizer(Canonicalizer::verbatim().with_trailing_punctuation_trimmed())
}

/// OWASP Top 10. One tag per cited category (`A1` -> `owasp-a1`), so tagging
/// goes through the per-category variant instead of the generic single-tag
/// path.
pub fn owasp_top10() -> Standard {
    built_in(Standard::new(
        "OWASP Top Ten",
        "OWASP",
        "owasp",
        "OWASP",
        r"A\d{1,2}",
    ))
    .with_tagging(Tagging::PerCategory {
        prefix: "owasp-".to_string(),
    })
}

/// PMD cites its keys as "PMD - RuleKey" lines.
pub fn pmd() -> Standard {
    built_in(Standard::new(
        "PMD",
        "PMD",
        "pmd",
        "PMD",
        r"[A-Za-z][A-Za-z0-9]*",
    ))
    .with_separator(" - ")
}

/// Checkstyle cites its keys as "Checkstyle - RuleKey" lines.
pub fn checkstyle() -> Standard {
    built_in(Standard::new(
        "Checkstyle",
        "Checkstyle",
        "checkstyle",
        "Checkstyle",
        r"[A-Za-z][A-Za-z0-9]*",
    ))
    .with_separator(" - ")
}

/// FindBugs cites its keys as "FindBugs - RULE_KEY" lines.
pub fn findbugs() -> Standard {
    built_in(Standard::new(
        "FindBugs",
        "FindBugs",
        "findbugs",
        "FindBugs",
        r"[A-Z][A-Z0-9]*(?:_[A-Z0-9]+)*",
    ))
    .with_separator(" - ")
}

/// Every built-in standard, in report order.
pub fn all() -> Vec<Standard> {
    vec![
        cwe(),
        misra_c_2004(),
        misra_cpp_2008(),
        owasp_top10(),
        pmd(),
        checkstyle(),
        findbugs(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn built_ins_construct() {
        let standards = all();
        assert_eq!(standards.len(), 7);
        assert!(standards.iter().any(|s| s.open_ended));
    }

    #[test]
    fn misra_roles_are_distinct_slugs() {
        assert_eq!(misra_c_2004().role(), "misra_c_2004");
        assert_eq!(misra_cpp_2008().role(), "misra_c_2008");
    }

    #[test]
    fn cwe_tokens() {
        let cwe = cwe();
        assert!(cwe.matches_token("CWE-89"));
        assert!(!cwe.matches_token("89"));
    }
}
