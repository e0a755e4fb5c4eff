//! # Extreme Variant Builder
//!
//! A handful of flagship templates get exhaustive review coverage: the full
//! Cartesian product over 2-5 hand-picked dimensions. These templates ignore
//! the per-template cap; their size is bounded by the curated dimension sizes.
//!
//! | Template               | Dimensions                                            | Variants |
//! |------------------------|-------------------------------------------------------|----------|
//! | `earthworks.trench*`   | depth 6 × width 3 × soil 5 × restricted × groundwater | 360      |
//! | `water.pipe_laying*`   | dn 6 × depth 3 × bedding 2                            | 36       |
//! | `telecom.duct_blow_in` | depth 3 × fittings 4 × restricted                     | 24       |
//!
//! Flags (`restricted`, `groundwater`) have two values.
//!
//! Each combination is merged onto the baseline, so keys outside the curated
//! set keep their baseline value.

use serde::{Deserialize, Serialize};

use super::{Dimension, UniqueSets};
use crate::params::{ParamSet, ParamValue};
use crate::suggest::SOIL_CLASSES;

/// How an allow-list entry matches template keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyMatch {
    Exact(String),
    Prefix(String),
}

impl KeyMatch {
    pub fn matches(&self, template_key: &str) -> bool {
        match self {
            KeyMatch::Exact(key) => template_key == key,
            KeyMatch::Prefix(prefix) => template_key.starts_with(prefix.as_str()),
        }
    }
}

/// One allow-listed template (or template prefix) and its curated dimensions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtremeEntry {
    pub matcher: KeyMatch,
    /// Curated dimensions; empty means "allow-listed, no generator yet"
    pub dimensions: Vec<Dimension>,
}

/// The allow-list of extreme templates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtremeCatalog {
    pub entries: Vec<ExtremeEntry>,
}

impl ExtremeCatalog {
    pub fn empty() -> Self {
        ExtremeCatalog { entries: Vec::new() }
    }

    pub fn with_entry(mut self, matcher: KeyMatch, dimensions: Vec<Dimension>) -> Self {
        self.entries.push(ExtremeEntry { matcher, dimensions });
        self
    }

    /// First entry matching the template key.
    pub fn entry_for(&self, template_key: &str) -> Option<&ExtremeEntry> {
        self.entries.iter().find(|e| e.matcher.matches(template_key))
    }

    pub fn is_extreme(&self, template_key: &str) -> bool {
        self.entry_for(template_key).is_some()
    }
}

impl Default for ExtremeCatalog {
    fn default() -> Self {
        ExtremeCatalog::empty()
            .with_entry(KeyMatch::Prefix("earthworks.trench".into()), trench_dimensions())
            .with_entry(KeyMatch::Prefix("water.pipe_laying".into()), pipe_laying_dimensions())
            .with_entry(KeyMatch::Exact("telecom.duct_blow_in".into()), duct_blow_in_dimensions())
    }
}

fn numbers(key: &str, values: &[f64]) -> Dimension {
    Dimension::new(key, values.iter().map(|v| ParamValue::Number(*v)).collect())
}

fn flags(key: &str) -> Dimension {
    Dimension::new(key, vec![ParamValue::Bool(false), ParamValue::Bool(true)])
}

fn trench_dimensions() -> Vec<Dimension> {
    vec![
        numbers("depth_m", &[0.8, 1.0, 1.2, 1.5, 1.8, 2.0]),
        numbers("width_m", &[0.4, 0.6, 0.8]),
        Dimension::new(
            "soil_class",
            SOIL_CLASSES.iter().map(|s| ParamValue::Text((*s).to_string())).collect(),
        ),
        flags("restricted"),
        flags("groundwater"),
    ]
}

fn pipe_laying_dimensions() -> Vec<Dimension> {
    vec![
        numbers("dn", &[80.0, 100.0, 150.0, 200.0, 250.0, 300.0]),
        numbers("depth_m", &[1.2, 1.5, 1.8]),
        flags("bedding"),
    ]
}

fn duct_blow_in_dimensions() -> Vec<Dimension> {
    vec![
        numbers("depth_m", &[0.6, 0.8, 1.0]),
        numbers("fittings_per_100m", &[0.0, 2.0, 4.0, 6.0]),
        flags("restricted"),
    ]
}

/// Enumerate the full Cartesian product of `dimensions` merged onto `base`.
///
/// Empty dimensions are ignored; if nothing remains the baseline alone is returned.
pub fn cartesian(base: &ParamSet, dimensions: &[Dimension]) -> Vec<ParamSet> {
    let dims: Vec<&Dimension> = dimensions.iter().filter(|d| !d.is_empty()).collect();
    if dims.is_empty() {
        return vec![base.clone()];
    }

    let mut combos: Vec<ParamSet> = vec![base.clone()];
    for dim in dims {
        let mut next = Vec::with_capacity(combos.len() * dim.len());
        for combo in &combos {
            for value in &dim.values {
                next.push(combo.with_override(&dim.key, value.clone()));
            }
        }
        combos = next;
    }

    let mut unique = UniqueSets::default();
    for combo in combos {
        unique.push(combo);
    }
    unique.into_vec()
}

/// Build variants for an allow-listed template.
///
/// Returns `None` if the template is not on the allow-list. Allow-listed
/// templates without curated dimensions yield the baseline alone.
pub fn build_extreme(
    catalog: &ExtremeCatalog,
    template_key: &str,
    base: &ParamSet,
) -> Option<Vec<ParamSet>> {
    let entry = catalog.entry_for(template_key)?;
    let variants = cartesian(base, &entry.dimensions);
    if variants.is_empty() {
        return Some(vec![base.clone()]);
    }
    Some(variants)
}
