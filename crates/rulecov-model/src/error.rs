#![deny(unsafe_code)]

/// Failures at the rule-source boundary. Fatal to the current unit of work
/// (one coverage build or one reconciliation pass); never retried here.
#[derive(Debug, thiserror::Error)]
pub enum RuleLookupError {
    #[error("rule query failed ({query}): {message}")]
    Query { query: String, message: String },

    #[error("rule lookup failed for {key}: {message}")]
    Key { key: String, message: String },

    #[error("implemented-rule fetch failed for language {language} on {instance}: {message}")]
    Implemented {
        language: String,
        instance: String,
        message: String,
    },

    #[error("update submission failed for {key}: {message}")]
    Submit { key: String, message: String },

    #[error("malformed rule data from source: {message}")]
    Malformed { message: String },
}
