//! # Metadata Annotator
//!
//! Computes display metadata for a realized variant: family, tags, the keys
//! changed relative to the baseline, a short label and a review score hint.
//! Metadata lives under the `__meta` namespace of a variant's params and never
//! takes part in key derivation.
//!
//! ## Score Hint
//!
//! Weighted, clamped-linear contributions summed and clamped to `[0, 1]`,
//! rounded to 4 decimals:
//!
//! | Input                  | Range / condition | Weight |
//! |------------------------|-------------------|--------|
//! | `depth_m`              | 0.8 – 1.8         | 0.25   |
//! | `dn`                   | 32 – 400          | 0.20   |
//! | `haul_km`              | 0 – 25            | 0.10   |
//! | `restricted`           | true              | +0.12  |
//! | `groundwater`          | true              | +0.18  |
//! | `bedding`              | true              | +0.05  |
//! | `soil_class`           | ordinal position  | 0.12   |
//! | family site-logistics  |                   | +0.03  |
//! | family telecom-duct    |                   | +0.02  |
//!
//! ## Example
//!
//! ```rust
//! use variant_core::annotate::annotate;
//! use variant_core::params::ParamSet;
//!
//! let base = ParamSet::new().with("dn", 150.0).with("depth_m", 1.2);
//! let realized = base.with_override("dn", 200.0.into());
//!
//! let meta = annotate("water.pipe_laying", &base, &realized);
//! assert_eq!(meta.label, "DN200");
//! assert_eq!(meta.changed_keys, vec!["dn".to_string()]);
//! ```

use serde::{Deserialize, Serialize};

use crate::canonical::canonicalize_value;
use crate::family::{classify, tags_for, Family};
use crate::params::{ParamSet, ParamValue};
use crate::suggest::{round4, SOIL_CLASSES};

/// Label for a variant identical to its baseline.
pub const STANDARD_LABEL: &str = "Standard";

/// Maximum number of fragments in a label.
pub const MAX_LABEL_FRAGMENTS: usize = 3;

/// Display metadata stored under `__meta`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantMeta {
    pub family: Family,
    pub tags: Vec<String>,
    pub changed_keys: Vec<String>,
    pub label: String,
    pub score_hint: f64,
}

/// Keys that produce label fragments, in preference order.
const LABEL_ORDER: [&str; 8] = [
    "dn",
    "pn",
    "depth_m",
    "width_m",
    "soil_class",
    "restricted",
    "groundwater",
    "haul_km",
];

fn label_fragment(key: &str, value: &ParamValue) -> String {
    let shown = value.display_value();
    match (key, value.as_bool()) {
        ("dn", _) => format!("DN{}", shown),
        ("pn", _) => format!("PN{}", shown),
        ("depth_m", _) => format!("depth {} m", shown),
        ("width_m", _) => format!("width {} m", shown),
        ("soil_class", _) => format!("soil {}", shown),
        ("restricted", Some(true)) => "restricted access".to_string(),
        ("restricted", Some(false)) => "open access".to_string(),
        ("groundwater", Some(true)) => "groundwater".to_string(),
        ("groundwater", Some(false)) => "dry".to_string(),
        ("haul_km", _) => format!("haul {} km", shown),
        _ => format!("{} {}", key, shown),
    }
}

/// Compute metadata for `realized` relative to `base`.
pub fn annotate(template_key: &str, base: &ParamSet, realized: &ParamSet) -> VariantMeta {
    let family = classify(template_key);
    let changed_keys = changed_keys(base, realized);
    let label = label_for(&changed_keys, realized);
    VariantMeta {
        family,
        tags: tags_for(template_key),
        label,
        score_hint: score_hint(family, realized),
        changed_keys,
    }
}

/// Keys whose values differ between the two sets, including keys present on
/// only one side. Base key order first, then keys only in `realized`.
pub fn changed_keys(base: &ParamSet, realized: &ParamSet) -> Vec<String> {
    let value_eq = |a: Option<&ParamValue>, b: Option<&ParamValue>| match (a, b) {
        (Some(a), Some(b)) => canonicalize_value(&a.to_json()) == canonicalize_value(&b.to_json()),
        (None, None) => true,
        _ => false,
    };

    let mut changed: Vec<String> = base
        .keys()
        .filter(|k| !value_eq(base.get(k), realized.get(k)))
        .cloned()
        .collect();
    changed.extend(
        realized
            .keys()
            .filter(|k| !base.contains_key(k))
            .cloned(),
    );
    changed
}

fn label_for(changed_keys: &[String], realized: &ParamSet) -> String {
    if changed_keys.is_empty() {
        return STANDARD_LABEL.to_string();
    }

    let fragments: Vec<String> = LABEL_ORDER
        .iter()
        .filter(|key| changed_keys.iter().any(|c| c.as_str() == **key))
        .filter_map(|key| realized.get(key).map(|v| label_fragment(key, v)))
        .take(MAX_LABEL_FRAGMENTS)
        .collect();

    if fragments.is_empty() {
        changed_keys.join(", ")
    } else {
        fragments.join(", ")
    }
}

fn position(value: f64, min: f64, max: f64) -> f64 {
    ((value - min) / (max - min)).clamp(0.0, 1.0)
}

/// Review score hint in `[0, 1]`.
pub fn score_hint(family: Family, params: &ParamSet) -> f64 {
    let mut score = 0.0;

    if let Some(depth) = params.get_f64("depth_m") {
        score += position(depth, 0.8, 1.8) * 0.25;
    }
    if let Some(dn) = params.get_f64("dn") {
        score += position(dn, 32.0, 400.0) * 0.20;
    }
    if let Some(haul) = params.get_f64("haul_km") {
        score += position(haul, 0.0, 25.0) * 0.10;
    }
    if params.get_bool("restricted") == Some(true) {
        score += 0.12;
    }
    if params.get_bool("groundwater") == Some(true) {
        score += 0.18;
    }
    if params.get_bool("bedding") == Some(true) {
        score += 0.05;
    }
    if let Some(idx) = params
        .get_str("soil_class")
        .and_then(|s| SOIL_CLASSES.iter().position(|c| *c == s))
    {
        score += idx as f64 / (SOIL_CLASSES.len() - 1) as f64 * 0.12;
    }
    score += match family {
        Family::SiteLogistics => 0.03,
        Family::TelecomDuct => 0.02,
        _ => 0.0,
    };

    round4(score.clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> ParamSet {
        ParamSet::new()
            .with("dn", 150.0)
            .with("pn", 10.0)
            .with("depth_m", 1.2)
            .with("width_m", 0.6)
            .with("soil_class", "medium")
            .with("restricted", false)
            .with("groundwater", false)
            .with("haul_km", 10.0)
    }

    #[test]
    fn test_standard_label() {
        let meta = annotate("water.pipe_laying", &base(), &base());
        assert_eq!(meta.label, STANDARD_LABEL);
        assert!(meta.changed_keys.is_empty());
        assert_eq!(meta.family, Family::WaterNetwork);
        assert_eq!(meta.tags, vec!["water-network", "pipe-laying"]);
    }

    #[test]
    fn test_label_preference_order_and_limit() {
        let realized = base()
            .with_override("haul_km", ParamValue::Number(15.0))
            .with_override("groundwater", ParamValue::Bool(true))
            .with_override("depth_m", ParamValue::Number(1.5))
            .with_override("dn", ParamValue::Number(200.0));
        let meta = annotate("water.pipe_laying", &base(), &realized);
        assert_eq!(meta.label, "DN200, depth 1.5 m, groundwater");
        assert_eq!(meta.changed_keys, vec!["dn", "depth_m", "groundwater", "haul_km"]);
    }

    #[test]
    fn test_label_fragments() {
        let realized = base()
            .with_override("restricted", ParamValue::Bool(true))
            .with_override("soil_class", ParamValue::Text("rock".into()));
        let meta = annotate("earthworks.trench", &base(), &realized);
        assert_eq!(meta.label, "soil rock, restricted access");

        let realized = base().with_override("pn", ParamValue::Number(16.0));
        assert_eq!(annotate("water.main", &base(), &realized).label, "PN16");
    }

    #[test]
    fn test_label_falls_back_to_raw_keys() {
        let base = ParamSet::new().with("crew_size", 4.0).with("shifts", 2.0);
        let realized = base
            .with_override("crew_size", ParamValue::Number(5.0))
            .with_override("shifts", ParamValue::Number(3.0));
        let meta = annotate("misc.cleanup", &base, &realized);
        assert_eq!(meta.label, "crew_size, shifts");
    }

    #[test]
    fn test_changed_keys_symmetric() {
        let a = ParamSet::new().with("x", 1.0).with("y", 2.0);
        let b = ParamSet::new().with("y", 2.0).with("z", true);
        assert_eq!(changed_keys(&a, &b), vec!["x", "z"]);
        assert_eq!(changed_keys(&b, &a), vec!["z", "x"]);
        assert!(changed_keys(&a, &a).is_empty());
    }

    #[test]
    fn test_score_examples() {
        assert_eq!(score_hint(Family::General, &ParamSet::new()), 0.0);

        // depth 1.3 -> 0.5 * 0.25 = 0.125; soil heavy -> 2/4 * 0.12 = 0.06
        let params = ParamSet::new().with("depth_m", 1.3).with("soil_class", "heavy");
        assert_eq!(score_hint(Family::CivilEarthworks, &params), 0.185);

        // Everything maxed out clamps to 1
        let params = ParamSet::new()
            .with("depth_m", 3.0)
            .with("dn", 600.0)
            .with("haul_km", 50.0)
            .with("restricted", true)
            .with("groundwater", true)
            .with("bedding", true)
            .with("soil_class", "rock");
        let score = score_hint(Family::SiteLogistics, &params);
        assert!(score <= 1.0);
        assert_eq!(score, 1.0);

        assert_eq!(score_hint(Family::TelecomDuct, &ParamSet::new()), 0.02);
    }

    #[test]
    fn test_score_in_unit_interval() {
        let values = [-5.0, 0.0, 0.8, 1.2, 32.0, 150.0, 400.0, 1e9];
        for v in values {
            let params = ParamSet::new().with("depth_m", v).with("dn", v).with("haul_km", v);
            let score = score_hint(Family::SiteLogistics, &params);
            assert!((0.0..=1.0).contains(&score), "score {} for {}", score, v);
        }
    }

    #[test]
    fn test_metadata_is_pure() {
        let realized = base().with_override("dn", ParamValue::Number(125.0));
        let a = annotate("water.pipe_laying", &base(), &realized);
        let b = annotate("water.pipe_laying", &base(), &realized);
        assert_eq!(a, b);
    }

    #[test]
    fn test_meta_serialization() {
        let meta = annotate("site.setup", &ParamSet::new(), &ParamSet::new());
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["family"], "site-logistics");
        assert_eq!(json["label"], "Standard");
        assert!(json.get("changedKeys").is_some());
        assert!(json.get("scoreHint").is_some());
    }
}
