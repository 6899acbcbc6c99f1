#![deny(unsafe_code)]

use std::path::Path;

use crate::catalog::{CatalogEntry, Implementability};
use crate::error::StandardsError;

/// Parse a catalog CSV into entries, preserving row order.
///
/// Required headers: `Rule ID`, `Implementability`, `Title`. The `Mandatory`
/// column is optional; absent or blank means optional.
pub fn parse_catalog_csv(path: &Path) -> Result<Vec<CatalogEntry>, StandardsError> {
    let bytes = std::fs::read(path).map_err(|e| StandardsError::io(path, e))?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(bytes.as_slice());

    let headers = reader
        .headers()
        .map_err(|e| StandardsError::csv(path, e.to_string()))?
        .clone();

    let header_idx = |name: &str| -> Option<usize> { headers.iter().position(|h| h == name) };

    let id_i = header_idx("Rule ID")
        .ok_or_else(|| StandardsError::csv(path, "missing header: Rule ID"))?;
    let impl_i = header_idx("Implementability")
        .ok_or_else(|| StandardsError::csv(path, "missing header: Implementability"))?;
    let title_i =
        header_idx("Title").ok_or_else(|| StandardsError::csv(path, "missing header: Title"))?;
    let mandatory_i = header_idx("Mandatory");

    let mut entries = Vec::new();

    for row in reader.records() {
        let row = row.map_err(|e| StandardsError::csv(path, e.to_string()))?;

        let get = |i: usize| -> Option<&str> { row.get(i).map(str::trim).filter(|s| !s.is_empty()) };

        let id = get(id_i)
            .ok_or_else(|| StandardsError::csv(path, "missing Rule ID"))?
            .to_string();

        let implementability_raw = get(impl_i).ok_or_else(|| {
            StandardsError::csv(path, format!("missing Implementability for rule {id}"))
        })?;
        let implementability = Implementability::parse(implementability_raw).ok_or_else(|| {
            StandardsError::csv(
                path,
                format!("unknown Implementability '{implementability_raw}' for rule {id}"),
            )
        })?;

        let title = get(title_i).unwrap_or_default().to_string();

        let mandatory = mandatory_i
            .and_then(get)
            .map(|value| matches!(value.to_lowercase().as_str(), "yes" | "true" | "1"))
            .unwrap_or(false);

        entries.push(CatalogEntry {
            id,
            implementability,
            title,
            mandatory,
        });
    }

    Ok(entries)
}
