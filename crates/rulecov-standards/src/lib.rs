#![deny(unsafe_code)]

pub mod builtin;
pub mod catalog;
pub mod csv;
pub mod error;
pub mod hash;
pub mod manifest;
pub mod registry;
pub mod standard;

pub use crate::catalog::{Catalog, CatalogEntry, Implementability};
pub use crate::error::StandardsError;
pub use crate::registry::{CatalogRegistry, VerifySummary};
pub use crate::standard::{Canonicalizer, Standard, Tagging, is_shareable_tag};
