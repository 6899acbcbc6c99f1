#![deny(unsafe_code)]

pub mod aggregate;
pub mod builder;
pub mod cache;
pub mod expand;
pub mod record;

pub use crate::aggregate::{CoverageSummary, summarize};
pub use crate::builder::{CoverageMapBuilder, REFERENCE_INSTANCE};
pub use crate::cache::CoverageCache;
pub use crate::expand::expand;
pub use crate::record::{CoverageMap, CoverageRecord};
