//! # Variant Builders
//!
//! Builders turn one baseline [`ParamSet`] into the raw parameter sets a
//! template should offer. Both are pure functions of their inputs.
//!
//! - [`smart`] - bounded exploration (one-at-a-time + 2-D cross), capped per template
//! - [`extreme`] - full Cartesian product for a curated allow-list, uncapped
//!
//! ## Dimensions
//!
//! A [`Dimension`] is one parameter key and the ordered candidate values to
//! explore for it. Dimensions used by the smart builder hold at most
//! [`MAX_DIMENSION_VALUES`] values and always contain the baseline value.

pub mod extreme;
pub mod smart;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::canonical::canonicalize;
use crate::params::{ParamSet, ParamValue};

pub use extreme::{build_extreme, ExtremeCatalog, ExtremeEntry, KeyMatch};
pub use smart::build_smart;

/// Maximum number of candidate values per smart-builder dimension.
pub const MAX_DIMENSION_VALUES: usize = 3;

/// One parameter key and its candidate values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dimension {
    pub key: String,
    pub values: Vec<ParamValue>,
}

impl Dimension {
    pub fn new(key: impl Into<String>, values: Vec<ParamValue>) -> Self {
        Dimension {
            key: key.into(),
            values,
        }
    }

    /// Cut the candidate list to at most `max` values without losing the
    /// baseline.
    ///
    /// Lists longer than `max` keep the `max`-wide window centred on the
    /// baseline (clamped to the list ends). A baseline missing from the list
    /// replaces the last kept value.
    pub fn trimmed(mut self, baseline: &ParamValue, max: usize) -> Self {
        if max == 0 || self.values.len() <= max {
            if max > 0 && !self.values.contains(baseline) {
                self.values.truncate(max);
                insert_baseline(&mut self.values, baseline, max);
            }
            return self;
        }

        match self.values.iter().position(|v| v == baseline) {
            Some(idx) => {
                let start = idx.saturating_sub(max / 2).min(self.values.len() - max);
                self.values = self.values[start..start + max].to_vec();
            }
            None => {
                self.values.truncate(max);
                insert_baseline(&mut self.values, baseline, max);
            }
        }
        self
    }

    pub fn first(&self) -> Option<&ParamValue> {
        self.values.first()
    }

    pub fn last(&self) -> Option<&ParamValue> {
        self.values.last()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

fn insert_baseline(values: &mut Vec<ParamValue>, baseline: &ParamValue, max: usize) {
    if values.len() >= max {
        values.pop();
    }
    values.push(baseline.clone());
}

/// Ordered collection of unique parameter sets, deduplicated by canonical form.
#[derive(Debug, Default)]
pub(crate) struct UniqueSets {
    seen: HashSet<Vec<u8>>,
    sets: Vec<ParamSet>,
}

impl UniqueSets {
    /// Add a set unless an identical one is already present. Returns true if added.
    pub(crate) fn push(&mut self, params: ParamSet) -> bool {
        if self.seen.insert(canonicalize(&params)) {
            self.sets.push(params);
            true
        } else {
            false
        }
    }

    pub(crate) fn contains(&self, params: &ParamSet) -> bool {
        self.seen.contains(&canonicalize(params))
    }

    pub(crate) fn len(&self) -> usize {
        self.sets.len()
    }

    pub(crate) fn into_vec(self) -> Vec<ParamSet> {
        self.sets
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nums(values: &[f64]) -> Vec<ParamValue> {
        values.iter().map(|v| ParamValue::Number(*v)).collect()
    }

    #[test]
    fn test_trim_keeps_short_lists() {
        let dim =
            Dimension::new("depth_m", nums(&[1.0, 1.2, 1.5])).trimmed(&ParamValue::Number(1.2), 3);
        assert_eq!(dim.values, nums(&[1.0, 1.2, 1.5]));
    }

    #[test]
    fn test_trim_centres_on_baseline() {
        let dim = Dimension::new("dn", nums(&[80.0, 100.0, 125.0, 150.0, 200.0]))
            .trimmed(&ParamValue::Number(125.0), 3);
        assert_eq!(dim.values, nums(&[100.0, 125.0, 150.0]));

        let dim = Dimension::new("dn", nums(&[80.0, 100.0, 125.0, 150.0, 200.0]))
            .trimmed(&ParamValue::Number(200.0), 3);
        assert_eq!(dim.values, nums(&[125.0, 150.0, 200.0]));

        let dim = Dimension::new("dn", nums(&[20.0, 25.0, 32.0, 40.0, 50.0]))
            .trimmed(&ParamValue::Number(20.0), 3);
        assert_eq!(dim.values, nums(&[20.0, 25.0, 32.0]));
    }

    #[test]
    fn test_trim_reinserts_missing_baseline() {
        let dim =
            Dimension::new("x", nums(&[1.0, 2.0, 3.0, 4.0])).trimmed(&ParamValue::Number(9.0), 3);
        assert_eq!(dim.values, nums(&[1.0, 2.0, 9.0]));

        let dim = Dimension::new("x", nums(&[1.0, 2.0])).trimmed(&ParamValue::Number(9.0), 3);
        assert_eq!(dim.values, nums(&[1.0, 2.0, 9.0]));
    }

    #[test]
    fn test_unique_sets() {
        let mut sets = UniqueSets::default();
        assert!(sets.push(ParamSet::new().with("a", 1.0).with("b", 2.0)));
        assert!(!sets.push(ParamSet::new().with("b", 2.0).with("a", 1.0)));
        assert!(sets.contains(&ParamSet::new().with("a", 1.0).with("b", 2.0)));
        assert_eq!(sets.len(), 1);
    }
}
