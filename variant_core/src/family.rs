//! # Template Families
//!
//! Template keys carry their trade family as the first key segment
//! (`water.pipe_laying_pe`, `earthworks.trench`, `site-logistics.crane`).
//! This module classifies keys into families and keyword tags with two
//! static tables, and holds the per-family fallback baselines used when a
//! template ships without default parameters.
//!
//! Classification is a pure function of the key, like a small tokenizer:
//!
//! ```rust
//! use variant_core::family::{classify, keyword_tags, Family};
//!
//! assert_eq!(classify("water.pipe_laying_pe"), Family::WaterNetwork);
//! assert_eq!(classify("Telecom-Duct_blow_in"), Family::TelecomDuct);
//! assert_eq!(classify("misc.cleanup"), Family::General);
//! assert_eq!(keyword_tags("earthworks.trench_shoring"), vec!["trenching", "shoring"]);
//! ```

use serde::{Deserialize, Serialize};

use crate::params::ParamSet;

/// Coarse trade family of a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Family {
    WaterNetwork,
    TelecomDuct,
    Sewer,
    CivilEarthworks,
    SurfaceRestoration,
    SiteLogistics,
    Power,
    Gas,
    /// No recognized prefix
    #[default]
    General,
}

impl Family {
    /// All families with a configurable cap override
    pub const CONFIGURABLE: [Family; 8] = [
        Family::WaterNetwork,
        Family::TelecomDuct,
        Family::Sewer,
        Family::CivilEarthworks,
        Family::SurfaceRestoration,
        Family::SiteLogistics,
        Family::Power,
        Family::Gas,
    ];

    /// Stable slug used in tags and configuration keys
    pub fn slug(&self) -> &'static str {
        match self {
            Family::WaterNetwork => "water-network",
            Family::TelecomDuct => "telecom-duct",
            Family::Sewer => "sewer",
            Family::CivilEarthworks => "civil-earthworks",
            Family::SurfaceRestoration => "surface-restoration",
            Family::SiteLogistics => "site-logistics",
            Family::Power => "power",
            Family::Gas => "gas",
            Family::General => "general",
        }
    }

    /// Whether a cap override may target this family.
    pub fn is_configurable(&self) -> bool {
        Family::CONFIGURABLE.contains(self)
    }

    pub fn from_slug(slug: &str) -> Option<Family> {
        Family::CONFIGURABLE
            .iter()
            .chain(std::iter::once(&Family::General))
            .copied()
            .find(|f| f.slug() == slug)
    }
}

impl std::fmt::Display for Family {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.slug())
    }
}

/// Leading key segment → family. Multi-segment prefixes are matched against
/// the key with separators normalized to `-`.
const FAMILY_PREFIXES: &[(&str, Family)] = &[
    ("water-network", Family::WaterNetwork),
    ("water", Family::WaterNetwork),
    ("telecom-duct", Family::TelecomDuct),
    ("telecom", Family::TelecomDuct),
    ("fiber", Family::TelecomDuct),
    ("fibre", Family::TelecomDuct),
    ("sewer", Family::Sewer),
    ("drainage", Family::Sewer),
    ("civil-earthworks", Family::CivilEarthworks),
    ("earthworks", Family::CivilEarthworks),
    ("civil", Family::CivilEarthworks),
    ("surface-restoration", Family::SurfaceRestoration),
    ("restoration", Family::SurfaceRestoration),
    ("surface", Family::SurfaceRestoration),
    ("site-logistics", Family::SiteLogistics),
    ("logistics", Family::SiteLogistics),
    ("site", Family::SiteLogistics),
    ("power", Family::Power),
    ("electric", Family::Power),
    ("gas", Family::Gas),
];

/// Substring → keyword tag, in output order.
const KEYWORD_TAGS: &[(&[&str], &str)] = &[
    (&["pipe"], "pipe-laying"),
    (&["cable"], "cable"),
    (&["trench", "excavat"], "trenching"),
    (&["blow"], "blow-in"),
    (&["pressure_test", "pressure-test", "pressuretest"], "pressure-testing"),
    (&["disposal", "dispose"], "disposal"),
    (&["shoring", "sheeting"], "shoring"),
    (&["paving", "asphalt", "pavement"], "paving"),
    (&["provisional", "temporary"], "provisional"),
    (&["logistics", "haul", "transport"], "logistics"),
];

fn normalized(key: &str) -> String {
    key.trim()
        .to_ascii_lowercase()
        .chars()
        .map(|c| if matches!(c, '.' | '_' | '/' | ':' | ' ') { '-' } else { c })
        .collect()
}

/// Classify a template key into its family.
pub fn classify(template_key: &str) -> Family {
    let key = normalized(template_key);
    FAMILY_PREFIXES
        .iter()
        .find(|(prefix, _)| {
            key.strip_prefix(prefix)
                .map(|rest| rest.is_empty() || rest.starts_with('-'))
                .unwrap_or(false)
        })
        .map(|(_, family)| *family)
        .unwrap_or(Family::General)
}

/// Keyword tags detected from key substrings, deduplicated, in table order.
pub fn keyword_tags(template_key: &str) -> Vec<&'static str> {
    let key = template_key.to_ascii_lowercase();
    let mut tags: Vec<&'static str> = Vec::new();
    for (needles, tag) in KEYWORD_TAGS {
        if needles.iter().any(|n| key.contains(n)) && !tags.contains(tag) {
            tags.push(tag);
        }
    }
    tags
}

/// Family tag followed by keyword tags.
pub fn tags_for(template_key: &str) -> Vec<String> {
    let mut tags = vec![classify(template_key).slug().to_string()];
    for tag in keyword_tags(template_key) {
        if !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_string());
        }
    }
    tags
}

/// Generation-only baseline for templates without default parameters.
///
/// Depends on the template key alone so repeated runs stay idempotent.
/// Returns `None` for families without a sensible default.
pub fn fallback_baseline(template_key: &str) -> Option<ParamSet> {
    let params = match classify(template_key) {
        Family::WaterNetwork => ParamSet::new()
            .with("dn", 150.0)
            .with("pn", 10.0)
            .with("material", "PE100")
            .with("depth_m", 1.5)
            .with("width_m", 0.6)
            .with("soil_class", "medium")
            .with("bedding", true),
        Family::TelecomDuct => ParamSet::new()
            .with("depth_m", 0.8)
            .with("width_m", 0.4)
            .with("fittings_per_100m", 4.0)
            .with("restricted", false),
        Family::Sewer => ParamSet::new()
            .with("dn", 300.0)
            .with("depth_m", 2.0)
            .with("width_m", 1.0)
            .with("soil_class", "medium")
            .with("groundwater", false),
        Family::CivilEarthworks => ParamSet::new()
            .with("depth_m", 1.2)
            .with("width_m", 0.6)
            .with("soil_class", "medium")
            .with("disposal_class", "non_hazardous")
            .with("haul_km", 10.0),
        Family::SurfaceRestoration => ParamSet::new()
            .with("surface_layer_cm", 4.0)
            .with("base_layer_cm", 14.0)
            .with("restricted", false),
        Family::SiteLogistics => ParamSet::new()
            .with("haul_km", 10.0)
            .with("restricted", false),
        Family::Power => ParamSet::new()
            .with("depth_m", 0.8)
            .with("width_m", 0.4)
            .with("soil_class", "medium"),
        Family::Gas => ParamSet::new()
            .with("dn", 50.0)
            .with("pn", 4.0)
            .with("material", "PE100")
            .with("depth_m", 1.0),
        Family::General => return None,
    };
    Some(params)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_prefixes() {
        assert_eq!(classify("water.pipe_laying"), Family::WaterNetwork);
        assert_eq!(classify("water-network/hydrant"), Family::WaterNetwork);
        assert_eq!(classify("telecom.duct_blow_in"), Family::TelecomDuct);
        assert_eq!(classify("sewer.manhole_dn1000"), Family::Sewer);
        assert_eq!(classify("earthworks.trench"), Family::CivilEarthworks);
        assert_eq!(classify("civil-earthworks.backfill"), Family::CivilEarthworks);
        assert_eq!(classify("restoration.asphalt_paving"), Family::SurfaceRestoration);
        assert_eq!(classify("site.setup"), Family::SiteLogistics);
        assert_eq!(classify("power.cable_laying"), Family::Power);
        assert_eq!(classify("GAS.house_connection"), Family::Gas);
    }

    #[test]
    fn test_classify_requires_segment_boundary() {
        assert_eq!(classify("gasket.replace"), Family::General);
        assert_eq!(classify("watering.lawn"), Family::General);
        assert_eq!(classify(""), Family::General);
    }

    #[test]
    fn test_keyword_tags() {
        assert_eq!(keyword_tags("water.pipe_laying"), vec!["pipe-laying"]);
        assert_eq!(keyword_tags("telecom.duct_blow_in"), vec!["blow-in"]);
        assert_eq!(
            keyword_tags("water.pipe_pressure_test"),
            vec!["pipe-laying", "pressure-testing"]
        );
        assert_eq!(keyword_tags("earthworks.soil_disposal_haul"), vec!["disposal", "logistics"]);
        assert!(keyword_tags("misc.cleanup").is_empty());
    }

    #[test]
    fn test_tags_include_family_first() {
        let tags = tags_for("power.cable_trench");
        assert_eq!(tags, vec!["power", "cable", "trenching"]);
    }

    #[test]
    fn test_slug_roundtrip() {
        for family in Family::CONFIGURABLE {
            assert_eq!(Family::from_slug(family.slug()), Some(family));
        }
        assert_eq!(Family::from_slug("unknown"), None);
        assert_eq!(Family::from_slug("general"), Some(Family::General));
        assert!(!Family::General.is_configurable());
        let slug = serde_json::to_string(&Family::SiteLogistics).unwrap();
        assert_eq!(slug, "\"site-logistics\"");
    }

    #[test]
    fn test_fallback_baseline_is_pure() {
        let a = fallback_baseline("sewer.main").unwrap();
        let b = fallback_baseline("sewer.main").unwrap();
        assert_eq!(a, b);
        assert!(fallback_baseline("misc.cleanup").is_none());
        for family in Family::CONFIGURABLE {
            let key = format!("{}.x", family.slug());
            assert!(fallback_baseline(&key).is_some(), "{}", key);
        }
    }
}
