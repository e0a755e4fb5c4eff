//! # Templates and Variants
//!
//! Templates are read-only input owned by the catalog; variants are produced
//! fresh on every run.
//!
//! ## JSON Shapes
//!
//! ```json
//! { "key": "earthworks.trench", "unit": "m", "defaultParams": { "depth_m": 1.2 } }
//! ```
//!
//! ```json
//! {
//!   "templateKey": "earthworks.trench",
//!   "key": "earthworks.trench|3f1c0a9be2d4",
//!   "unit": "m",
//!   "params": {
//!     "depth_m": 1.5,
//!     "__meta": { "family": "civil-earthworks", "label": "depth 1.5 m", ... }
//!   },
//!   "enabled": true
//! }
//! ```

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::annotate::{annotate, VariantMeta};
use crate::errors::VariantResult;
use crate::family::fallback_baseline;
use crate::params::{IngestedParams, ParamSet, META_KEY};
use crate::variant_key::derive_variant_key;

/// A calculation template as read from the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    /// Unique stable identifier (e.g. "water.pipe_laying")
    pub key: String,

    /// Unit of measure, opaque display string (e.g. "m", "m²", "pcs")
    #[serde(default, deserialize_with = "null_as_default")]
    pub unit: String,

    /// Default parameters, raw JSON. `null` reads as no defaults.
    #[serde(default, deserialize_with = "null_as_default")]
    pub default_params: Map<String, Value>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl Template {
    pub fn new(key: impl Into<String>, unit: impl Into<String>) -> Self {
        Template {
            key: key.into(),
            unit: unit.into(),
            default_params: Map::new(),
        }
    }

    /// Builder-style default parameter.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.default_params.insert(key.into(), value.into());
        self
    }
}

/// Where a template's generation baseline came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BaselineSource {
    /// The template's own default parameters
    Template,
    /// The family fallback table (template had no usable defaults)
    FamilyFallback,
    /// No defaults and no family fallback: empty baseline
    Empty,
}

impl BaselineSource {
    pub fn is_fallback(&self) -> bool {
        !matches!(self, BaselineSource::Template)
    }
}

/// Generation baseline for one template.
#[derive(Debug, Clone, PartialEq)]
pub struct Baseline {
    pub params: ParamSet,
    pub source: BaselineSource,
    /// Default param keys skipped because of unsupported value shapes
    pub rejected: Vec<String>,
}

/// Resolve the baseline: the template's own defaults when they contain at
/// least one usable value, otherwise the family fallback, otherwise empty.
///
/// The fallback is used for generation only and never written back.
pub fn resolve_baseline(template: &Template) -> Baseline {
    let IngestedParams { params, rejected } = ParamSet::from_json(&template.default_params);
    if !params.is_empty() {
        return Baseline {
            params,
            source: BaselineSource::Template,
            rejected,
        };
    }
    match fallback_baseline(&template.key) {
        Some(params) => Baseline {
            params,
            source: BaselineSource::FamilyFallback,
            rejected,
        },
        None => Baseline {
            params: ParamSet::new(),
            source: BaselineSource::Empty,
            rejected,
        },
    }
}

/// Realized params plus the metadata namespace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantParams {
    #[serde(rename = "__meta")]
    pub meta: VariantMeta,

    #[serde(flatten)]
    pub values: ParamSet,
}

/// One concrete parameter combination of a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variant {
    pub template_key: String,
    pub key: String,
    pub unit: String,
    pub params: VariantParams,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl Variant {
    /// Derive the key and metadata for a realized parameter set.
    pub fn realize(
        template: &Template,
        base: &ParamSet,
        realized: ParamSet,
    ) -> VariantResult<Self> {
        let key = derive_variant_key(&template.key, &realized)?;
        let meta = annotate(&template.key, base, &realized);
        Ok(Variant {
            template_key: template.key.clone(),
            key,
            unit: template.unit.clone(),
            params: VariantParams {
                meta,
                values: realized,
            },
            enabled: true,
        })
    }

    /// Realized parameters without metadata.
    pub fn real_params(&self) -> &ParamSet {
        &self.params.values
    }

    pub fn label(&self) -> &str {
        &self.params.meta.label
    }

    /// Params as stored: realized values plus the `__meta` object.
    pub fn params_json(&self) -> Value {
        let mut obj = match self.params.values.to_json() {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        let meta = serde_json::to_value(&self.params.meta).unwrap_or(Value::Null);
        obj.insert(META_KEY.to_string(), meta);
        Value::Object(obj)
    }
}
