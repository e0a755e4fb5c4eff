//! # Dimension Value Suggester
//!
//! Proposes a short, ordered list of alternative values for one parameter key,
//! given its baseline value. Domain knowledge lives in a declarative table
//! ([`DIMENSION_RULES`]) consulted by a single dispatch function, [`suggest`].
//!
//! ## Rule Order (first match wins)
//!
//! 1. Boolean baseline → `[false, true]`
//! 2. Categorical key with a text baseline → its fixed domain list
//! 3. Curated continuous key with a numeric baseline → presets near the baseline
//!    (diameters: up to 5 nearest sizes from the standard DN ladder)
//! 4. Any other numeric baseline → `[b - step, b, b + step]`
//! 5. Anything else → no suggestion
//!
//! Domain rules are checked before the generic numeric fallback so a pipe
//! diameter is only ever varied along real pipe sizes.
//!
//! ## Example
//!
//! ```rust
//! use variant_core::params::ParamValue::{self, Number};
//! use variant_core::suggest::suggest;
//!
//! let depths = suggest("depth_m", &Number(1.2)).unwrap();
//! assert_eq!(depths, vec![Number(1.0), Number(1.2), Number(1.5)]);
//!
//! let counts = suggest("crew_size", &Number(4.0)).unwrap();
//! assert_eq!(counts, vec![Number(3.2), Number(4.0), Number(4.8)]);
//!
//! assert!(suggest("remarks", &ParamValue::Text("n/a".into())).is_none());
//! ```

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::params::ParamValue;

/// Excavation soil classes, lightest to heaviest.
pub const SOIL_CLASSES: [&str; 5] = ["light", "medium", "heavy", "very_heavy", "rock"];

/// Excavated material disposal classes, cleanest first.
pub const DISPOSAL_CLASSES: [&str; 4] = ["inert", "non_hazardous", "contaminated", "hazardous"];

/// Pipe materials.
pub const MATERIALS: [&str; 5] = ["PE100", "PVC-U", "ductile_iron", "steel", "GRP"];

/// Standard nominal diameter ladder (mm).
pub const DN_LADDER: [f64; 17] = [
    20.0, 25.0, 32.0, 40.0, 50.0, 65.0, 80.0, 100.0, 125.0, 150.0, 200.0, 250.0, 300.0, 350.0,
    400.0, 500.0, 600.0,
];

/// Number of ladder sizes offered for diameter-like keys.
pub const DN_WINDOW: usize = 5;

const DEPTH_PRESETS_M: [f64; 9] = [0.6, 0.8, 1.0, 1.2, 1.5, 1.8, 2.0, 2.5, 3.0];
const WIDTH_PRESETS_M: [f64; 7] = [0.3, 0.4, 0.5, 0.6, 0.8, 1.0, 1.2];
const THICKNESS_PRESETS_CM: [f64; 7] = [4.0, 6.0, 8.0, 10.0, 12.0, 15.0, 20.0];
const SURFACE_LAYER_PRESETS_CM: [f64; 5] = [3.0, 4.0, 5.0, 6.0, 8.0];
const BASE_LAYER_PRESETS_CM: [f64; 7] = [8.0, 10.0, 12.0, 14.0, 16.0, 18.0, 22.0];
const PN_PRESETS: [f64; 7] = [1.0, 4.0, 6.0, 10.0, 16.0, 25.0, 40.0];
const FITTING_PRESETS_PER_100M: [f64; 6] = [0.0, 2.0, 4.0, 6.0, 8.0, 10.0];
const HAUL_PRESETS_KM: [f64; 9] = [0.0, 5.0, 10.0, 15.0, 20.0, 25.0, 30.0, 40.0, 50.0];

/// How presets are picked from a ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LadderWindow {
    /// Nearest lower preset, baseline, nearest higher preset
    Neighbors,
    /// The `n` presets closest to the baseline (baseline included), ascending
    Nearest(usize),
}

/// Kind of domain knowledge attached to a parameter key.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DimensionRule {
    /// Categorical key with a closed list of values
    FixedDomain(&'static [&'static str]),
    /// Continuous key with curated preset values
    Ladder {
        presets: &'static [f64],
        window: LadderWindow,
    },
    /// Numeric key with known limits for the generic ±step rule
    GenericNumeric { min: f64, max: f64 },
}

impl DimensionRule {
    /// Ladder rule offering the nearest lower and higher preset.
    const fn neighbors(presets: &'static [f64]) -> Self {
        DimensionRule::Ladder {
            presets,
            window: LadderWindow::Neighbors,
        }
    }
}

/// Key → rule table. Several spellings may share one rule.
pub const DIMENSION_RULES: &[(&[&str], DimensionRule)] = &[
    (&["soil_class"], DimensionRule::FixedDomain(&SOIL_CLASSES)),
    (&["disposal_class"], DimensionRule::FixedDomain(&DISPOSAL_CLASSES)),
    (&["material"], DimensionRule::FixedDomain(&MATERIALS)),
    (
        &["depth_m", "depth"],
        DimensionRule::neighbors(&DEPTH_PRESETS_M),
    ),
    (
        &["width_m", "width"],
        DimensionRule::neighbors(&WIDTH_PRESETS_M),
    ),
    (
        &["thickness_cm", "thickness"],
        DimensionRule::neighbors(&THICKNESS_PRESETS_CM),
    ),
    (
        &["surface_layer_cm"],
        DimensionRule::neighbors(&SURFACE_LAYER_PRESETS_CM),
    ),
    (
        &["base_layer_cm"],
        DimensionRule::neighbors(&BASE_LAYER_PRESETS_CM),
    ),
    (
        &["dn", "diameter_mm"],
        DimensionRule::Ladder { presets: &DN_LADDER, window: LadderWindow::Nearest(DN_WINDOW) },
    ),
    (
        &["pn", "pressure_bar"],
        DimensionRule::neighbors(&PN_PRESETS),
    ),
    (
        &["fittings_per_100m"],
        DimensionRule::neighbors(&FITTING_PRESETS_PER_100M),
    ),
    (
        &["haul_km", "haul_distance_km"],
        DimensionRule::neighbors(&HAUL_PRESETS_KM),
    ),
    (&["slope_percent"], DimensionRule::GenericNumeric { min: 0.0, max: 100.0 }),
    (&["compaction_percent"], DimensionRule::GenericNumeric { min: 90.0, max: 103.0 }),
    (&["length_m", "quantity"], DimensionRule::GenericNumeric { min: 0.0, max: f64::MAX }),
];

static RULE_INDEX: Lazy<HashMap<&'static str, DimensionRule>> = Lazy::new(|| {
    DIMENSION_RULES
        .iter()
        .flat_map(|(keys, rule)| keys.iter().map(move |k| (*k, *rule)))
        .collect()
});

/// Look up the domain rule for a parameter key, if any.
pub fn rule_for(key: &str) -> Option<DimensionRule> {
    RULE_INDEX.get(key).copied()
}

/// Propose ordered candidate values for `key`, always including `baseline`.
///
/// Returns `None` when the key contributes no dimension. Lists may be longer
/// than three (categorical domains, diameter windows); the smart builder
/// trims them.
pub fn suggest(key: &str, baseline: &ParamValue) -> Option<Vec<ParamValue>> {
    if let ParamValue::Bool(_) = baseline {
        return Some(vec![ParamValue::Bool(false), ParamValue::Bool(true)]);
    }

    match (rule_for(key), baseline) {
        (Some(DimensionRule::FixedDomain(domain)), ParamValue::Text(current)) => {
            Some(fixed_domain(domain, current))
        }
        (Some(DimensionRule::Ladder { presets, window }), ParamValue::Number(b)) => {
            Some(ladder(presets, window, *b))
        }
        (Some(DimensionRule::GenericNumeric { min, max }), ParamValue::Number(b)) => {
            Some(generic_numeric(*b, Some((min, max))))
        }
        (_, ParamValue::Number(b)) => Some(generic_numeric(*b, None)),
        _ => None,
    }
}

fn fixed_domain(domain: &[&str], current: &str) -> Vec<ParamValue> {
    let mut values: Vec<ParamValue> = Vec::with_capacity(domain.len() + 1);
    if !domain.contains(&current) {
        values.push(ParamValue::Text(current.to_string()));
    }
    values.extend(domain.iter().map(|v| ParamValue::Text((*v).to_string())));
    values
}

fn ladder(presets: &[f64], window: LadderWindow, baseline: f64) -> Vec<ParamValue> {
    let mut picked: Vec<f64> = match window {
        LadderWindow::Neighbors => {
            let lower = presets
                .iter()
                .copied()
                .filter(|p| *p < baseline)
                .max_by(f64::total_cmp);
            let upper = presets
                .iter()
                .copied()
                .filter(|p| *p > baseline)
                .min_by(f64::total_cmp);
            lower.into_iter().chain(std::iter::once(baseline)).chain(upper).collect()
        }
        LadderWindow::Nearest(n) => {
            let mut others: Vec<f64> = presets.iter().copied().filter(|p| *p != baseline).collect();
            others.sort_by(|a, b| {
                let da = (a - baseline).abs();
                let db = (b - baseline).abs();
                da.total_cmp(&db).then(a.total_cmp(b))
            });
            others.truncate(n.saturating_sub(1));
            others.push(baseline);
            others
        }
    };
    picked.sort_by(f64::total_cmp);
    picked.dedup();
    picked.into_iter().map(ParamValue::Number).collect()
}

/// Generic ±step candidates for a numeric baseline without domain knowledge.
pub fn numeric_step(baseline: f64) -> f64 {
    let magnitude = baseline.abs();
    if magnitude >= 10.0 {
        (0.2 * magnitude).round().max(1.0)
    } else {
        (0.2 * magnitude).max(0.05)
    }
}

fn generic_numeric(baseline: f64, bounds: Option<(f64, f64)>) -> Vec<ParamValue> {
    let step = numeric_step(baseline);
    let clamp = |v: f64| match bounds {
        Some((min, max)) => v.clamp(min, max),
        None => v,
    };

    let mut values: Vec<f64> = Vec::with_capacity(3);
    for candidate in [baseline - step, baseline, baseline + step] {
        let v = if candidate == baseline { baseline } else { round4(clamp(candidate)) };
        if v.is_finite() && !values.contains(&v) {
            values.push(v);
        }
    }
    values.into_iter().map(ParamValue::Number).collect()
}

/// Round to 4 decimal places. Values too large to scale are returned as is.
pub(crate) fn round4(value: f64) -> f64 {
    let scaled = value * 10_000.0;
    if !scaled.is_finite() {
        return value;
    }
    scaled.round() / 10_000.0
}
