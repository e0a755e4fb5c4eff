//! # Smart Variant Builder
//!
//! Bounded exploration around a baseline, never exceeding the template's cap.
//!
//! ## Algorithm
//!
//! 1. Empty baseline → the baseline alone
//! 2. Ask the suggester for every key; keys without a suggestion are dropped
//! 3. Trim each dimension to at most 3 values (baseline kept)
//! 4. Start with the baseline itself
//! 5. One-at-a-time: per dimension (discovery order) the baseline with that key
//!    set to the dimension's first, then last value
//! 6. If room remains and 2+ dimensions exist, the cross product of the
//!    **first two** dimensions, skipping the baseline pair
//! 7. Deduplicate by canonical form, cut to the cap
//!
//! The pair is always the first two dimensions in discovery order.
//!
//! ## Example
//!
//! ```rust
//! use variant_core::builders::build_smart;
//! use variant_core::params::ParamSet;
//!
//! let base = ParamSet::new().with("depth_m", 1.2).with("restricted", false);
//! let variants = build_smart(&base, 8);
//!
//! assert_eq!(variants[0], base);
//! assert!(variants.len() <= 8);
//! ```

use tracing::trace;

use super::{Dimension, UniqueSets, MAX_DIMENSION_VALUES};
use crate::params::ParamSet;
use crate::suggest::suggest;

/// Discover the explorable dimensions of a baseline, in key order.
pub fn discover_dimensions(base: &ParamSet) -> Vec<Dimension> {
    base.iter()
        .filter_map(|(key, value)| {
            suggest(key, value).map(|values| {
                Dimension::new(key.clone(), values).trimmed(value, MAX_DIMENSION_VALUES)
            })
        })
        .filter(|dim| !dim.is_empty())
        .collect()
}

/// Build at most `cap` unique parameter sets around `base`.
///
/// The first entry is always `base` itself. A `cap` of zero is treated as one.
pub fn build_smart(base: &ParamSet, cap: usize) -> Vec<ParamSet> {
    let cap = cap.max(1);
    if base.is_empty() {
        return vec![base.clone()];
    }

    let dimensions = discover_dimensions(base);
    if dimensions.is_empty() {
        return vec![base.clone()];
    }
    trace!(
        dimensions = dimensions.len(),
        cap,
        "smart builder dimensions discovered"
    );

    let mut out = UniqueSets::default();
    out.push(base.clone());

    // One-at-a-time variation
    'dims: for dim in &dimensions {
        let Some(baseline_value) = base.get(&dim.key) else {
            continue;
        };
        for candidate in [dim.first(), dim.last()].into_iter().flatten() {
            if out.len() >= cap {
                break 'dims;
            }
            if candidate == baseline_value {
                continue;
            }
            out.push(base.with_override(&dim.key, candidate.clone()));
        }
    }

    // Cross product of the first two dimensions
    if out.len() < cap && dimensions.len() >= 2 {
        let (first, second) = (&dimensions[0], &dimensions[1]);
        let base_first = base.get(&first.key);
        let base_second = base.get(&second.key);

        'cross: for a in &first.values {
            for b in &second.values {
                if out.len() >= cap {
                    break 'cross;
                }
                if Some(a) == base_first && Some(b) == base_second {
                    continue;
                }
                let mut candidate = base.with_override(&first.key, a.clone());
                candidate.insert(second.key.clone(), b.clone());
                if !out.contains(&candidate) {
                    out.push(candidate);
                }
            }
        }
    }

    let mut variants = out.into_vec();
    variants.truncate(cap);
    if variants.is_empty() {
        variants.push(base.clone());
    }
    variants
}
