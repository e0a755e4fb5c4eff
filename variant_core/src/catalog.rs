//! # Template Catalog
//!
//! A catalog file is the batch job's input: a schema version plus the list of
//! templates to generate variants for.
//!
//! ```json
//! {
//!   "version": "0.1.0",
//!   "templates": [
//!     { "key": "earthworks.trench", "unit": "m", "defaultParams": { "depth_m": 1.2 } }
//!   ]
//! }
//! ```
//!
//! Loading validates the schema version and rejects duplicate template keys.
//! Saving uses the same atomic temp-file-and-rename write as the
//! [file store](crate::store::FileStore).

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{VariantError, VariantResult};
use crate::store::write_atomic;
use crate::template::Template;

/// Current schema version for catalog and batch files.
/// Increment when making breaking changes to the file format.
pub const SCHEMA_VERSION: &str = "0.1.0";

/// Versioned list of templates. A file without a version is read as the
/// current schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default = "current_version")]
    pub version: String,
    #[serde(default)]
    pub templates: Vec<Template>,
}

fn current_version() -> String {
    SCHEMA_VERSION.to_string()
}

impl Catalog {
    pub fn new(templates: Vec<Template>) -> Self {
        Catalog {
            version: current_version(),
            templates,
        }
    }

    /// Find a template by key.
    pub fn get(&self, template_key: &str) -> VariantResult<&Template> {
        self.templates
            .iter()
            .find(|t| t.key == template_key)
            .ok_or_else(|| VariantError::template_not_found(template_key))
    }

    /// Check that template keys are unique.
    pub fn check_unique_keys(&self) -> VariantResult<()> {
        let mut seen = HashSet::new();
        for template in &self.templates {
            if !seen.insert(template.key.as_str()) {
                return Err(VariantError::DuplicateTemplate {
                    template_key: template.key.clone(),
                });
            }
        }
        Ok(())
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Catalog::new(Vec::new())
    }
}

/// Load and validate a catalog file.
pub fn load_catalog(path: &Path) -> VariantResult<Catalog> {
    let contents = fs::read_to_string(path).map_err(|e| {
        VariantError::store_error("read catalog", path.display().to_string(), e.to_string())
    })?;

    let catalog: Catalog = serde_json::from_str(&contents).map_err(|e| {
        VariantError::serialization(format!("Invalid JSON in {}: {}", path.display(), e))
    })?;

    validate_version(&catalog.version)?;
    catalog.check_unique_keys()?;

    Ok(catalog)
}

/// Save a catalog atomically.
pub fn save_catalog(catalog: &Catalog, path: &Path) -> VariantResult<()> {
    catalog.check_unique_keys()?;
    let json = serde_json::to_string_pretty(catalog)
        .map_err(|e| VariantError::serialization(e.to_string()))?;
    write_atomic(path, json.as_bytes())
}

/// Validate that a file version is compatible with the current schema.
pub(crate) fn validate_version(file_version: &str) -> VariantResult<()> {
    let mismatch = || VariantError::VersionMismatch {
        file_version: file_version.to_string(),
        expected_version: SCHEMA_VERSION.to_string(),
    };

    let parse = |v: &str| -> Vec<u32> { v.split('.').filter_map(|p| p.parse().ok()).collect() };
    let file_parts = parse(file_version);
    let current_parts = parse(SCHEMA_VERSION);

    if file_parts.is_empty() || current_parts.is_empty() {
        return Err(mismatch());
    }

    // Major version must match
    if file_parts[0] != current_parts[0] {
        return Err(mismatch());
    }

    // In 0.x a newer minor may carry breaking changes
    if current_parts[0] == 0
        && file_parts.len() > 1
        && current_parts.len() > 1
        && file_parts[1] > current_parts[1]
    {
        return Err(mismatch());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Catalog {
        Catalog::new(vec![
            Template::new("earthworks.trench", "m").with_param("depth_m", 1.2),
            Template::new("misc.cleanup", "h"),
        ])
    }

    #[test]
    fn test_version_validation() {
        assert!(validate_version(SCHEMA_VERSION).is_ok());
        assert!(validate_version("0.1.5").is_ok());
        assert!(validate_version("0.0.9").is_ok());
        assert!(validate_version("1.0.0").is_err());
        assert!(validate_version("0.2.0").is_err());
        assert!(validate_version("garbage").is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        save_catalog(&sample(), &path).unwrap();

        let loaded = load_catalog(&path).unwrap();
        assert_eq!(loaded, sample());
        assert_eq!(loaded.get("misc.cleanup").unwrap().unit, "h");
        assert_eq!(loaded.get("nope").unwrap_err().error_code(), "TEMPLATE_NOT_FOUND");
    }

    #[test]
    fn test_duplicate_keys_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dupes.json");
        let text = json!({
            "version": "0.1.0",
            "templates": [ { "key": "gas.main" }, { "key": "gas.main", "unit": "m" } ]
        });
        fs::write(&path, text.to_string()).unwrap();

        let err = load_catalog(&path).unwrap_err();
        assert!(matches!(
            err,
            VariantError::DuplicateTemplate { ref template_key } if template_key == "gas.main"
        ));
    }

    #[test]
    fn test_null_defaults_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("legacy.json");
        let text = json!({
            "templates": [
                { "key": "sewer.main", "defaultParams": null },
                { "key": "gas.main", "defaultParams": { "dn": 50 } }
            ]
        });
        fs::write(&path, text.to_string()).unwrap();

        let catalog = load_catalog(&path).unwrap();
        assert_eq!(catalog.version, SCHEMA_VERSION);
        assert_eq!(catalog.templates.len(), 2);
        assert!(catalog.get("sewer.main").unwrap().default_params.is_empty());
        assert_eq!(catalog.get("gas.main").unwrap().default_params["dn"], 50);
    }

    #[test]
    fn test_newer_catalog_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("future.json");
        fs::write(&path, r#"{ "version": "0.3.0", "templates": [] }"#).unwrap();
        assert_eq!(load_catalog(&path).unwrap_err().error_code(), "VERSION_MISMATCH");
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_catalog(&dir.path().join("absent.json")).unwrap_err();
        assert_eq!(err.error_code(), "STORE_ERROR");
    }
}
