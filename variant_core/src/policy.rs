//! # Capacity Policy
//!
//! Resolves the smart builder's cap for a template through an ordered list of
//! resolvers. The first resolver returning a value wins:
//!
//! 1. [`FamilyOverride`] - `family_caps[<family slug>]` from the configuration
//! 2. [`GlobalDefault`] - `default_cap_per_template` from the configuration
//! 3. [`BuiltinDefault`] - [`DEFAULT_CAP`]
//!
//! Invalid configured values (non-numeric, zero, negative, fractional) are
//! ignored and resolution moves on to the next resolver. New tiers can be put
//! in front of the chain with [`CapPolicy::with_resolver_first`].
//!
//! ## Example
//!
//! ```rust
//! use variant_core::config::GenerationConfig;
//! use variant_core::family::Family;
//! use variant_core::policy::CapPolicy;
//!
//! let config = GenerationConfig::with_default_cap(10).with_family_cap(Family::Power, 4);
//! let policy = CapPolicy::from_config(&config);
//!
//! assert_eq!(policy.resolve("power.cable_laying"), 4);
//! assert_eq!(policy.resolve("sewer.manhole"), 10);
//! ```

use serde_json::Value;
use tracing::warn;

use crate::config::GenerationConfig;
use crate::family::{classify, Family};

/// Cap used when nothing is configured.
pub const DEFAULT_CAP: usize = 12;

/// One tier of cap resolution.
pub trait CapResolver: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Cap for the template, or `None` to defer to the next resolver.
    fn resolve(&self, template_key: &str, family: Family) -> Option<usize>;
}

/// Per-family override from the configuration.
#[derive(Debug, Clone)]
pub struct FamilyOverride {
    config: GenerationConfig,
}

impl CapResolver for FamilyOverride {
    fn name(&self) -> &'static str {
        "family-override"
    }

    fn resolve(&self, template_key: &str, family: Family) -> Option<usize> {
        let raw = self.config.family_cap(family)?;
        let cap = parse_cap(raw);
        if cap.is_none() {
            warn!(
                template = template_key,
                family = %family,
                value = %raw,
                "ignoring invalid family cap override"
            );
        }
        cap
    }
}

/// Global default from the configuration.
#[derive(Debug, Clone)]
pub struct GlobalDefault {
    value: Option<Value>,
}

impl CapResolver for GlobalDefault {
    fn name(&self) -> &'static str {
        "global-default"
    }

    fn resolve(&self, template_key: &str, _family: Family) -> Option<usize> {
        let raw = self.value.as_ref()?;
        let cap = parse_cap(raw);
        if cap.is_none() {
            warn!(template = template_key, value = %raw, "ignoring invalid default cap");
        }
        cap
    }
}

/// Compiled-in last resort.
#[derive(Debug, Clone, Copy)]
pub struct BuiltinDefault;

impl CapResolver for BuiltinDefault {
    fn name(&self) -> &'static str {
        "builtin-default"
    }

    fn resolve(&self, _template_key: &str, _family: Family) -> Option<usize> {
        Some(DEFAULT_CAP)
    }
}

/// Parse a configured cap. Accepts positive integers given as integers,
/// integral floats or numeric strings.
pub fn parse_cap(raw: &Value) -> Option<usize> {
    let n = match raw {
        Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                u as f64
            } else {
                n.as_f64()?
            }
        }
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !n.is_finite() || n < 1.0 || n.fract() != 0.0 || n > usize::MAX as f64 {
        return None;
    }
    Some(n as usize)
}

/// Ordered cap resolver chain.
pub struct CapPolicy {
    resolvers: Vec<Box<dyn CapResolver>>,
}

impl CapPolicy {
    /// Standard chain: family override, global default, builtin default.
    pub fn from_config(config: &GenerationConfig) -> Self {
        CapPolicy {
            resolvers: vec![
                Box::new(FamilyOverride { config: config.clone() }),
                Box::new(GlobalDefault {
                    value: config.default_cap_per_template.clone(),
                }),
                Box::new(BuiltinDefault),
            ],
        }
    }

    /// Put a resolver in front of the chain.
    pub fn with_resolver_first(mut self, resolver: Box<dyn CapResolver>) -> Self {
        self.resolvers.insert(0, resolver);
        self
    }

    /// Names of the resolvers in evaluation order.
    pub fn resolver_names(&self) -> Vec<&'static str> {
        self.resolvers.iter().map(|r| r.name()).collect()
    }

    /// Resolve the cap for a template. Always at least 1.
    pub fn resolve(&self, template_key: &str) -> usize {
        let family = classify(template_key);
        self.resolvers
            .iter()
            .find_map(|r| r.resolve(template_key, family))
            .unwrap_or(DEFAULT_CAP)
            .max(1)
    }
}

impl Default for CapPolicy {
    fn default() -> Self {
        CapPolicy::from_config(&GenerationConfig::default())
    }
}

impl std::fmt::Debug for CapPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapPolicy")
            .field("resolvers", &self.resolver_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_cap() {
        assert_eq!(parse_cap(&json!(8)), Some(8));
        assert_eq!(parse_cap(&json!(8.0)), Some(8));
        assert_eq!(parse_cap(&json!("12")), Some(12));
        assert_eq!(parse_cap(&json!(" 3 ")), Some(3));
        assert_eq!(parse_cap(&json!(0)), None);
        assert_eq!(parse_cap(&json!(-4)), None);
        assert_eq!(parse_cap(&json!(2.5)), None);
        assert_eq!(parse_cap(&json!("many")), None);
        assert_eq!(parse_cap(&json!(true)), None);
        assert_eq!(parse_cap(&json!(null)), None);
    }

    #[test]
    fn test_builtin_default() {
        let policy = CapPolicy::default();
        assert_eq!(policy.resolve("water.pipe_laying"), DEFAULT_CAP);
        assert_eq!(policy.resolve("misc.cleanup"), DEFAULT_CAP);
    }

    #[test]
    fn test_family_override_wins() {
        let config = GenerationConfig::with_default_cap(10)
            .with_family_cap(Family::WaterNetwork, 16)
            .with_family_cap(Family::SiteLogistics, 4);
        let policy = CapPolicy::from_config(&config);
        assert_eq!(policy.resolve("water.hydrant"), 16);
        assert_eq!(policy.resolve("site.setup"), 4);
        assert_eq!(policy.resolve("gas.main"), 10);
        assert_eq!(policy.resolve("unknown"), 10);
    }

    #[test]
    fn test_general_family_not_overridable() {
        let config = GenerationConfig::from_toml_str("[family_caps]\ngeneral = 3\n").unwrap();
        assert_eq!(CapPolicy::from_config(&config).resolve("misc.cleanup"), DEFAULT_CAP);

        let config = GenerationConfig::with_default_cap(9).with_family_cap(Family::General, 2);
        let policy = CapPolicy::from_config(&config);
        assert_eq!(policy.resolve("misc.cleanup"), 9);
        assert_eq!(policy.resolve("unknown"), 9);
    }

    #[test]
    fn test_invalid_overrides_fall_through() {
        let config = GenerationConfig {
            default_cap_per_template: Some(json!("lots")),
            ..GenerationConfig::default()
        }
        .with_family_cap(Family::Sewer, json!(0))
        .with_family_cap(Family::Gas, json!("abc"))
        .with_family_cap(Family::Power, json!(-1));
        let policy = CapPolicy::from_config(&config);

        // Family override invalid, default invalid: builtin wins
        assert_eq!(policy.resolve("sewer.main"), DEFAULT_CAP);
        assert_eq!(policy.resolve("gas.main"), DEFAULT_CAP);
        assert_eq!(policy.resolve("power.cable"), DEFAULT_CAP);

        let config =
            GenerationConfig::with_default_cap(7).with_family_cap(Family::Sewer, json!(-3));
        assert_eq!(CapPolicy::from_config(&config).resolve("sewer.main"), 7);
    }

    struct FixedFor(&'static str, usize);

    impl CapResolver for FixedFor {
        fn name(&self) -> &'static str {
            "per-template"
        }

        fn resolve(&self, template_key: &str, _family: Family) -> Option<usize> {
            (template_key == self.0).then_some(self.1)
        }
    }

    #[test]
    fn test_extension_resolver_first() {
        let config = GenerationConfig::with_default_cap(10);
        let policy = CapPolicy::from_config(&config)
            .with_resolver_first(Box::new(FixedFor("sewer.special", 2)));
        assert_eq!(policy.resolve("sewer.special"), 2);
        assert_eq!(policy.resolve("sewer.main"), 10);
        assert_eq!(
            policy.resolver_names(),
            vec!["per-template", "family-override", "global-default", "builtin-default"]
        );
    }
}
