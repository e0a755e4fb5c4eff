//! # Generation Configuration
//!
//! The run configuration is read once and injected into the
//! [`Generator`](crate::orchestrator::Generator). It carries exactly two kinds
//! of knobs:
//!
//! - `default_cap_per_template` - global fallback cap for smart-built templates
//! - `[family_caps]` - per-family cap overrides, keyed by family slug
//!
//! Values are kept raw here. Validation happens in the
//! [capacity policy](crate::policy), where invalid overrides are ignored and
//! resolution falls through to the next tier.
//!
//! ## TOML Example
//!
//! ```toml
//! default_cap_per_template = 10
//!
//! [family_caps]
//! water-network = 16
//! site-logistics = 4
//! ```
//!
//! ```rust
//! use variant_core::config::GenerationConfig;
//!
//! let config = GenerationConfig::from_toml_str(r#"
//!     default_cap_per_template = 10
//!     [family_caps]
//!     water-network = 16
//! "#).unwrap();
//! assert_eq!(config.family_caps.len(), 1);
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::errors::{VariantError, VariantResult};
use crate::family::Family;

/// Run configuration for variant generation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Global fallback cap (positive integer expected)
    #[serde(default, alias = "defaultCapPerTemplate", skip_serializing_if = "Option::is_none")]
    pub default_cap_per_template: Option<Value>,

    /// Per-family cap overrides, keyed by family slug (e.g. "water-network")
    #[serde(default, alias = "familyCaps")]
    pub family_caps: BTreeMap<String, Value>,
}

impl GenerationConfig {
    /// Configuration with only a global default cap.
    pub fn with_default_cap(cap: u32) -> Self {
        GenerationConfig {
            default_cap_per_template: Some(Value::from(cap)),
            family_caps: BTreeMap::new(),
        }
    }

    /// Add a family override.
    pub fn with_family_cap(mut self, family: Family, cap: impl Into<Value>) -> Self {
        self.family_caps.insert(family.slug().to_string(), cap.into());
        self
    }

    /// Parse configuration from TOML text.
    pub fn from_toml_str(text: &str) -> VariantResult<Self> {
        let config: GenerationConfig = toml::from_str(text)
            .map_err(|e| VariantError::config(format!("Invalid TOML: {}", e)))?;
        config.warn_unknown_families();
        Ok(config)
    }

    /// Parse configuration from JSON text.
    pub fn from_json_str(text: &str) -> VariantResult<Self> {
        let config: GenerationConfig = serde_json::from_str(text)
            .map_err(|e| VariantError::config(format!("Invalid JSON: {}", e)))?;
        config.warn_unknown_families();
        Ok(config)
    }

    /// Load configuration from a `.toml` or `.json` file.
    pub fn load(path: &Path) -> VariantResult<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| VariantError::config(format!("Cannot read {}: {}", path.display(), e)))?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&text),
            _ => Self::from_toml_str(&text),
        }
    }

    /// Raw override for a family, if configured. `general` is never
    /// configurable.
    pub fn family_cap(&self, family: Family) -> Option<&Value> {
        if !family.is_configurable() {
            return None;
        }
        self.family_caps.get(family.slug())
    }

    fn warn_unknown_families(&self) {
        for slug in self.family_caps.keys() {
            let family = Family::from_slug(slug).filter(Family::is_configurable);
            if family.is_none() {
                warn!(family = %slug, "ignoring cap override for unconfigurable family");
            }
        }
    }
}
