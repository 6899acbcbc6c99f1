#![deny(unsafe_code)]

use regex::Regex;
use rulecov_standards::Catalog;

/// Expand a reference-id token list against a catalog.
///
/// A token containing any of `* + ?` is compiled as a full-match regex and
/// every matching catalog id is appended in catalog enumeration order; any
/// other token passes through literally. `None` propagates as `None` ("no
/// data", which callers must distinguish from "empty data"). No
/// deduplication happens here: expanding the same wildcard twice yields
/// duplicate ids, and callers that need set semantics dedupe downstream.
pub fn expand(tokens: Option<&[String]>, catalog: &Catalog) -> Option<Vec<String>> {
    let tokens = tokens?;
    let mut out = Vec::new();
    for token in tokens {
        if !has_wildcard(token) {
            out.push(token.clone());
            continue;
        }
        match Regex::new(&format!("^(?:{token})$")) {
            Ok(pattern) => {
                for id in catalog.ids() {
                    if pattern.is_match(id) {
                        out.push(id.to_string());
                    }
                }
            }
            Err(error) => {
                tracing::warn!(
                    token = %token,
                    error = %error,
                    "wildcard token failed to compile, matches nothing"
                );
            }
        }
    }
    Some(out)
}

/// Tested as regex metacharacters, not as a glob.
fn has_wildcard(token: &str) -> bool {
    token.contains(['*', '+', '?'])
}
