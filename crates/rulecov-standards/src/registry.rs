#![deny(unsafe_code)]

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Component, Path, PathBuf};

use crate::catalog::Catalog;
use crate::csv::parse_catalog_csv;
use crate::error::StandardsError;
use crate::hash::sha256_hex;
use crate::manifest::{Manifest, ManifestFile};
use crate::standard::Standard;

const MANIFEST_SCHEMA: &str = "rulecov.catalog-manifest";
const MANIFEST_SCHEMA_VERSION: u32 = 1;

const ALLOWED_KINDS: &[&str] = &["csv"];

#[derive(Debug, Clone, serde::Serialize)]
pub struct VerifySummary {
    pub catalog_dir: PathBuf,
    pub file_count: usize,
    pub standard_count: usize,
    /// Loaded catalog entry counts, keyed by standard field key.
    pub entry_counts: BTreeMap<String, usize>,
}

/// Verified, loaded catalog tables for a set of standards.
///
/// Catalog files are pinned by `manifest.toml`: every file's sha256 must
/// match, every closed standard must have a catalog role, and no unlisted
/// file may sit in the catalog directory.
#[derive(Debug, Clone)]
pub struct CatalogRegistry {
    pub manifest: Manifest,
    pub files: Vec<ManifestFile>,
    catalogs: BTreeMap<String, Catalog>,
}

impl CatalogRegistry {
    pub fn verify_and_load(
        catalog_dir: &Path,
        standards: &[Standard],
    ) -> Result<(Self, VerifySummary), StandardsError> {
        let manifest = load_manifest(&catalog_dir.join("manifest.toml"))?;

        validate_manifest(&manifest, catalog_dir, standards)?;

        let mut files = manifest.files.clone();
        files.sort_by(|a, b| a.path.cmp(&b.path));

        for file in &files {
            verify_file(catalog_dir, file)?;
        }

        let mut catalogs = BTreeMap::new();
        let mut entry_counts = BTreeMap::new();
        for standard in standards {
            let catalog = match resolve_role_path(catalog_dir, &files, &standard.role()) {
                Ok(path) => Catalog::from_entries(parse_catalog_csv(&path)?),
                // Open-ended standards may ship no enumeration at all.
                Err(StandardsError::MissingRole { .. }) if standard.open_ended => {
                    Catalog::default()
                }
                Err(e) => return Err(e),
            };
            entry_counts.insert(standard.field_key.clone(), catalog.len());
            catalogs.insert(standard.field_key.clone(), catalog);
        }

        tracing::debug!(
            files = files.len(),
            standards = standards.len(),
            "catalog registry verified and loaded"
        );

        let summary = VerifySummary {
            catalog_dir: catalog_dir.to_path_buf(),
            file_count: files.len(),
            standard_count: standards.len(),
            entry_counts,
        };

        Ok((
            Self {
                manifest,
                files,
                catalogs,
            },
            summary,
        ))
    }

    /// The loaded catalog for a standard's field key.
    pub fn catalog(&self, field_key: &str) -> Option<&Catalog> {
        self.catalogs.get(field_key)
    }
}

fn load_manifest(path: &Path) -> Result<Manifest, StandardsError> {
    let contents = std::fs::read_to_string(path).map_err(|e| StandardsError::io(path, e))?;
    toml::from_str(&contents).map_err(|e| StandardsError::Toml {
        path: path.to_path_buf(),
        source: e,
    })
}

fn validate_manifest(
    manifest: &Manifest,
    catalog_dir: &Path,
    standards: &[Standard],
) -> Result<(), StandardsError> {
    if manifest.manifest.schema != MANIFEST_SCHEMA {
        return Err(StandardsError::InvalidManifest {
            message: format!("unsupported schema: {}", manifest.manifest.schema),
        });
    }
    if manifest.manifest.schema_version != MANIFEST_SCHEMA_VERSION {
        return Err(StandardsError::InvalidManifest {
            message: format!(
                "unsupported schema_version: {}",
                manifest.manifest.schema_version
            ),
        });
    }

    let mut roles: BTreeSet<&str> = BTreeSet::new();
    let mut manifest_paths: BTreeSet<PathBuf> = BTreeSet::new();

    for file in &manifest.files {
        if roles.contains(file.role.as_str()) {
            return Err(StandardsError::DuplicateRole {
                role: file.role.clone(),
            });
        }
        roles.insert(file.role.as_str());

        if !ALLOWED_KINDS.contains(&file.kind.as_str()) {
            return Err(StandardsError::InvalidManifest {
                message: format!("unsupported kind '{}' for {}", file.kind, file.path),
            });
        }

        validate_sha(&file.sha256, &file.path)?;

        let path = validate_path(&file.path)?;
        manifest_paths.insert(path);
    }

    for standard in standards {
        if !standard.open_ended && !roles.contains(standard.role().as_str()) {
            return Err(StandardsError::MissingRole {
                role: standard.role(),
            });
        }
    }

    let actual_files = list_files_under(catalog_dir)?;
    let manifest_paths: BTreeSet<PathBuf> = manifest_paths
        .into_iter()
        .map(|p| normalize_path(&p))
        .collect();

    for path in actual_files {
        if path == PathBuf::from("manifest.toml") {
            continue;
        }
        let normalized = normalize_path(&path);
        if !manifest_paths.contains(&normalized) {
            return Err(StandardsError::UnexpectedFile {
                path: catalog_dir.join(path),
            });
        }
    }

    Ok(())
}

fn verify_file(catalog_dir: &Path, file: &ManifestFile) -> Result<(), StandardsError> {
    let full_path = catalog_dir.join(&file.path);
    let bytes = std::fs::read(&full_path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            StandardsError::MissingFile {
                path: full_path.clone(),
            }
        } else {
            StandardsError::io(full_path.clone(), e)
        }
    })?;

    let actual = sha256_hex(&bytes);
    let expected = file.sha256.to_ascii_lowercase();
    if actual != expected {
        return Err(StandardsError::Sha256Mismatch {
            path: full_path,
            expected,
            actual,
        });
    }
    Ok(())
}

fn resolve_role_path(
    catalog_dir: &Path,
    files: &[ManifestFile],
    role: &str,
) -> Result<PathBuf, StandardsError> {
    let f = files
        .iter()
        .find(|f| f.role == role)
        .ok_or_else(|| StandardsError::MissingRole {
            role: role.to_string(),
        })?;
    Ok(catalog_dir.join(&f.path))
}

fn validate_sha(sha: &str, path: &str) -> Result<(), StandardsError> {
    if sha.len() != 64 || !sha.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(StandardsError::InvalidSha256 {
            path: PathBuf::from(path),
            message: "sha256 must be 64 hex characters".to_string(),
        });
    }
    Ok(())
}

fn validate_path(path: &str) -> Result<PathBuf, StandardsError> {
    if path.contains('\\') {
        return Err(StandardsError::InvalidPath {
            path: PathBuf::from(path),
            message: "manifest path must use '/' separators".to_string(),
        });
    }

    let p = PathBuf::from(path);
    if p.is_absolute() {
        return Err(StandardsError::InvalidPath {
            path: p,
            message: "manifest path must be relative".to_string(),
        });
    }

    for c in p.components() {
        if matches!(c, Component::ParentDir) {
            return Err(StandardsError::InvalidPath {
                path: PathBuf::from(path),
                message: "manifest path must not traverse out of the catalog directory"
                    .to_string(),
            });
        }
    }

    Ok(p)
}

fn list_files_under(root: &Path) -> Result<BTreeSet<PathBuf>, StandardsError> {
    let mut stack = vec![root.to_path_buf()];
    let mut files = BTreeSet::new();

    while let Some(dir) = stack.pop() {
        for entry in std::fs::read_dir(&dir).map_err(|e| StandardsError::io(&dir, e))? {
            let entry = entry.map_err(|e| StandardsError::io(&dir, e))?;
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
            } else if path.is_file() {
                let rel = path
                    .strip_prefix(root)
                    .map_err(|e| StandardsError::InvalidPath {
                        path: path.clone(),
                        message: format!("failed to relativize path: {e}"),
                    })?
                    .to_path_buf();
                files.insert(rel);
            }
        }
    }

    Ok(files)
}

fn normalize_path(p: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for c in p.components() {
        match c {
            Component::CurDir => {}
            _ => out.push(c.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::ManifestHeader;

    fn manifest_with(files: Vec<ManifestFile>) -> Manifest {
        Manifest {
            manifest: ManifestHeader {
                schema: MANIFEST_SCHEMA.to_string(),
                schema_version: MANIFEST_SCHEMA_VERSION,
            },
            notes: None,
            pins: BTreeMap::new(),
            files,
        }
    }

    fn file(path: &str, role: &str) -> ManifestFile {
        ManifestFile {
            path: path.to_string(),
            sha256: "a".repeat(64),
            kind: "csv".to_string(),
            role: role.to_string(),
            notes: None,
        }
    }

    #[test]
    fn duplicate_role_is_rejected() {
        let manifest = manifest_with(vec![file("a.csv", "cwe"), file("b.csv", "cwe")]);
        let err = validate_manifest(&manifest, Path::new("."), &[]).unwrap_err();
        assert!(matches!(err, StandardsError::DuplicateRole { role } if role == "cwe"));
    }

    #[test]
    fn short_sha_is_rejected() {
        let mut bad = file("a.csv", "cwe");
        bad.sha256 = "abc123".to_string();
        let manifest = manifest_with(vec![bad]);
        let err = validate_manifest(&manifest, Path::new("."), &[]).unwrap_err();
        assert!(matches!(err, StandardsError::InvalidSha256 { .. }));
    }

    #[test]
    fn parent_traversal_is_rejected() {
        let manifest = manifest_with(vec![file("../a.csv", "cwe")]);
        let err = validate_manifest(&manifest, Path::new("."), &[]).unwrap_err();
        assert!(matches!(err, StandardsError::InvalidPath { .. }));
    }

    #[test]
    fn wrong_schema_is_rejected() {
        let mut manifest = manifest_with(vec![]);
        manifest.manifest.schema = "something-else".to_string();
        let err = validate_manifest(&manifest, Path::new("."), &[]).unwrap_err();
        assert!(matches!(err, StandardsError::InvalidManifest { .. }));
    }
}
