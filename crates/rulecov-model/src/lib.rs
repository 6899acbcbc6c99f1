#![deny(unsafe_code)]

pub mod error;
pub mod rule;
pub mod source;
pub mod update;

pub use crate::error::RuleLookupError;
pub use crate::rule::{Rule, RuleStatus};
pub use crate::source::{MemoryRuleSource, RuleSource};
pub use crate::update::{FieldValue, PendingUpdate, apply_update, field};
