//! # Parameter Values and Sets
//!
//! Template parameters arrive as loosely-typed JSON. Inside the engine they are
//! a closed union of three scalar shapes held in an insertion-ordered map:
//!
//! ```text
//! ParamSet (IndexMap, discovery order preserved)
//! ├── "dn"          => Number(150.0)
//! ├── "soil_class"  => Text("medium")
//! └── "groundwater" => Bool(false)
//! ```
//!
//! Nested objects, arrays and nulls are not parameter values. They are
//! rejected at ingestion and reported, never stringified.
//!
//! ## Example
//!
//! ```rust
//! use serde_json::json;
//! use variant_core::params::ParamSet;
//!
//! let raw = json!({ "depth_m": 1.2, "lining": { "kind": "steel" } });
//! let ingested = ParamSet::from_json(raw.as_object().unwrap());
//!
//! assert_eq!(ingested.params.len(), 1);
//! assert_eq!(ingested.rejected, vec!["lining".to_string()]);
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Reserved namespace inside variant params holding display metadata.
pub const META_KEY: &str = "__meta";

/// A single parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl ParamValue {
    /// Convert a raw JSON value. Returns `None` for unsupported shapes
    /// (null, arrays, objects, numbers that are not finite).
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(ParamValue::Bool(*b)),
            Value::Number(n) => n.as_f64().filter(|f| f.is_finite()).map(ParamValue::Number),
            Value::String(s) => Some(ParamValue::Text(s.clone())),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            ParamValue::Bool(b) => Value::Bool(*b),
            ParamValue::Number(n) => serde_json::Number::from_f64(*n)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            ParamValue::Text(s) => Value::String(s.clone()),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Short human-readable rendering used in labels (`1.5`, `true`, `medium`).
    pub fn display_value(&self) -> String {
        match self {
            ParamValue::Bool(b) => b.to_string(),
            ParamValue::Number(n) => crate::canonical::format_number(*n),
            ParamValue::Text(s) => s.clone(),
        }
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Number(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

/// Ordered mapping from parameter name to value.
///
/// Iteration order is insertion order and defines the discovery order used by
/// the smart builder. Identity (canonical form, variant keys) ignores order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParamSet(IndexMap<String, ParamValue>);

/// Result of converting raw JSON params into a [`ParamSet`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestedParams {
    pub params: ParamSet,
    /// Keys whose values had an unsupported shape, in input order
    pub rejected: Vec<String>,
}

impl ParamSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convert raw JSON params. The metadata namespace is stripped silently;
    /// unsupported values are dropped and listed in `rejected`.
    pub fn from_json(raw: &Map<String, Value>) -> IngestedParams {
        let mut ingested = IngestedParams::default();
        for (key, value) in raw {
            if key == META_KEY {
                continue;
            }
            match ParamValue::from_json(value) {
                Some(v) => {
                    ingested.params.insert(key.clone(), v);
                }
                None => ingested.rejected.push(key.clone()),
            }
        }
        ingested
    }

    /// Builder-style insert, handy for literals in tests and fallback tables.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(key.into(), value.into());
        self
    }

    /// Insert or overwrite a value. Overwriting keeps the key's original position.
    pub fn insert(&mut self, key: String, value: ParamValue) -> Option<ParamValue> {
        self.0.insert(key, value)
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParamValue)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(ParamValue::as_f64)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(ParamValue::as_bool)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(ParamValue::as_str)
    }

    /// Copy of this set with one key overridden.
    pub fn with_override(&self, key: &str, value: ParamValue) -> ParamSet {
        let mut next = self.clone();
        next.insert(key.to_string(), value);
        next
    }

    pub fn to_json(&self) -> Value {
        Value::Object(
            self.0
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
        )
    }
}

/// Remove the metadata namespace from raw variant params.
pub fn strip_meta(raw: &Map<String, Value>) -> Map<String, Value> {
    raw.iter()
        .filter(|(k, _)| k.as_str() != META_KEY)
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}
