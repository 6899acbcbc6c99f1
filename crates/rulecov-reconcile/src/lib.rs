#![deny(unsafe_code)]

pub mod parser;
pub mod reconcile;
pub mod supersede;

pub use crate::parser::parse_reference_tokens;
pub use crate::reconcile::{
    IntegrityWarning, ReconcileOutcome, ReconcileReport, WarningKind, reconcile, reconcile_all,
    submit_all,
};
pub use crate::supersede::{RetirementMode, SupersessionPropagator};
