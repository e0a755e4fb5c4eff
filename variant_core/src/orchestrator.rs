//! # Generation Orchestrator
//!
//! Runs the batch: for every template in the catalog
//!
//! 1. Resolve the baseline (template defaults, family fallback or empty)
//! 2. Build parameter sets with the extreme builder if the template is
//!    allow-listed, otherwise with the smart builder under the resolved cap
//! 3. Fall back to the baseline alone if the builder produced nothing
//! 4. Derive keys and metadata, dropping duplicate keys
//! 5. Replace the template's stored variant set in one store call
//!
//! Templates are independent. They run in parallel and a failure in one is
//! recorded in the [`RunSummary`] without stopping the others. A template key
//! listed more than once is generated from its first entry only; later
//! entries are reported as `DuplicateTemplate` failures. Running the batch
//! again over unchanged templates yields the same key sets.
//!
//! ## Example
//!
//! ```rust
//! use variant_core::config::GenerationConfig;
//! use variant_core::orchestrator::Generator;
//! use variant_core::store::{MemoryStore, VariantStore};
//! use variant_core::template::Template;
//!
//! let templates = vec![
//!     Template::new("earthworks.backfill", "m³").with_param("depth_m", 1.2),
//!     Template::new("misc.cleanup", "h"),
//! ];
//!
//! let generator = Generator::new(&GenerationConfig::with_default_cap(8), MemoryStore::new());
//! let summary = generator.run(&templates);
//!
//! assert!(!summary.has_failures());
//! assert_eq!(generator.store().load("misc.cleanup").unwrap().len(), 1);
//! ```

use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::builders::{build_extreme, build_smart, ExtremeCatalog};
use crate::config::GenerationConfig;
use crate::errors::{VariantError, VariantResult};
use crate::policy::CapPolicy;
use crate::store::VariantStore;
use crate::template::{resolve_baseline, Baseline, BaselineSource, Template, Variant};

/// Which builder produced a template's variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BuildMode {
    Extreme,
    Smart,
}

/// Result of processing one template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateOutcome {
    pub template_key: String,
    pub mode: BuildMode,
    pub baseline_source: BaselineSource,
    /// Default param keys skipped for unsupported value shapes
    pub rejected_params: Vec<String>,
    pub variants_written: usize,
    pub error: Option<VariantError>,
}

impl TemplateOutcome {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// A template whose variants could not be generated or stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateFailure {
    pub template_key: String,
    pub error: VariantError,
}

/// Aggregate report for one batch run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub templates_processed: usize,
    pub extreme_templates: usize,
    pub smart_templates: usize,
    pub variants_written: usize,
    /// Templates generated from the family fallback or an empty baseline
    pub fallback_baselines: Vec<String>,
    pub failures: Vec<TemplateFailure>,
    pub outcomes: Vec<TemplateOutcome>,
}

impl RunSummary {
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    fn from_outcomes(
        run_id: Uuid,
        started_at: DateTime<Utc>,
        outcomes: Vec<TemplateOutcome>,
    ) -> Self {
        let count_mode = |mode: BuildMode| outcomes.iter().filter(|o| o.mode == mode).count();
        RunSummary {
            run_id,
            started_at,
            finished_at: Utc::now(),
            templates_processed: outcomes.len(),
            extreme_templates: count_mode(BuildMode::Extreme),
            smart_templates: count_mode(BuildMode::Smart),
            variants_written: outcomes.iter().map(|o| o.variants_written).sum(),
            fallback_baselines: outcomes
                .iter()
                .filter(|o| o.is_ok() && o.baseline_source.is_fallback())
                .map(|o| o.template_key.clone())
                .collect(),
            failures: outcomes
                .iter()
                .filter_map(|o| {
                    o.error.as_ref().map(|e| TemplateFailure {
                        template_key: o.template_key.clone(),
                        error: e.clone(),
                    })
                })
                .collect(),
            outcomes,
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Run {}", self.run_id)?;
        writeln!(f, "  templates processed: {}", self.templates_processed)?;
        writeln!(
            f,
            "  extreme / smart:     {} / {}",
            self.extreme_templates, self.smart_templates
        )?;
        writeln!(f, "  variants written:    {}", self.variants_written)?;
        writeln!(f, "  fallback baselines:  {}", self.fallback_baselines.len())?;
        for key in &self.fallback_baselines {
            writeln!(f, "    - {}", key)?;
        }
        write!(f, "  failures:            {}", self.failures.len())?;
        for failure in &self.failures {
            write!(f, "\n    - {}: {}", failure.template_key, failure.error)?;
        }
        Ok(())
    }
}

/// Batch variant generator over a store.
pub struct Generator<S: VariantStore> {
    policy: CapPolicy,
    extremes: ExtremeCatalog,
    store: S,
}

impl<S: VariantStore> Generator<S> {
    /// Generator with the standard cap policy and extreme allow-list.
    pub fn new(config: &GenerationConfig, store: S) -> Self {
        Generator {
            policy: CapPolicy::from_config(config),
            extremes: ExtremeCatalog::default(),
            store,
        }
    }

    pub fn with_policy(mut self, policy: CapPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_extreme_catalog(mut self, extremes: ExtremeCatalog) -> Self {
        self.extremes = extremes;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Build the variant set for a template without touching the store.
    pub fn build_variants(
        &self,
        template: &Template,
    ) -> VariantResult<(BuildMode, Baseline, Vec<Variant>)> {
        let baseline = resolve_baseline(template);
        let base = &baseline.params;

        let (mode, sets) = match build_extreme(&self.extremes, &template.key, base) {
            Some(sets) => (BuildMode::Extreme, sets),
            None => {
                let cap = self.policy.resolve(&template.key);
                debug!(template = %template.key, cap, "smart build");
                (BuildMode::Smart, build_smart(base, cap))
            }
        };
        let sets = if sets.is_empty() { vec![base.clone()] } else { sets };

        let mut seen = HashSet::new();
        let mut variants = Vec::with_capacity(sets.len());
        for realized in sets {
            let variant = Variant::realize(template, base, realized)?;
            if seen.insert(variant.key.clone()) {
                variants.push(variant);
            }
        }

        Ok((mode, baseline, variants))
    }

    fn empty_outcome(&self, template: &Template) -> TemplateOutcome {
        let mode = if self.extremes.is_extreme(&template.key) {
            BuildMode::Extreme
        } else {
            BuildMode::Smart
        };
        TemplateOutcome {
            template_key: template.key.clone(),
            mode,
            baseline_source: BaselineSource::Empty,
            rejected_params: Vec::new(),
            variants_written: 0,
            error: None,
        }
    }

    /// Generate and store one template's variants.
    pub fn process(&self, template: &Template) -> TemplateOutcome {
        let mut outcome = self.empty_outcome(template);

        let result = self.build_variants(template).and_then(|(mode, baseline, variants)| {
            outcome.mode = mode;
            outcome.baseline_source = baseline.source;
            outcome.rejected_params = baseline.rejected;
            if !outcome.rejected_params.is_empty() {
                warn!(
                    template = %template.key,
                    keys = ?outcome.rejected_params,
                    "skipped default params with unsupported values"
                );
            }
            self.store.replace(&template.key, &variants)?;
            Ok(variants.len())
        });

        match result {
            Ok(count) => {
                debug!(
                    template = %template.key,
                    mode = ?outcome.mode,
                    variants = count,
                    "template stored"
                );
                outcome.variants_written = count;
            }
            Err(e) => {
                error!(template = %template.key, error = %e, "template failed");
                outcome.error = Some(e);
            }
        }
        outcome
    }

    /// Process every template and summarize.
    ///
    /// Each template key is generated at most once per run. Repeats of a key
    /// are not processed and fail with `DuplicateTemplate`.
    pub fn run(&self, templates: &[Template]) -> RunSummary {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        info!(%run_id, templates = templates.len(), "variant generation started");

        let mut seen = HashSet::new();
        let first_seen: Vec<bool> = templates.iter().map(|t| seen.insert(t.key.as_str())).collect();

        let outcomes: Vec<TemplateOutcome> = templates
            .par_iter()
            .zip(first_seen.par_iter())
            .map(|(template, &first)| {
                if first {
                    return self.process(template);
                }
                warn!(template = %template.key, "duplicate template key skipped");
                let mut outcome = self.empty_outcome(template);
                outcome.error = Some(VariantError::DuplicateTemplate {
                    template_key: template.key.clone(),
                });
                outcome
            })
            .collect();
        let summary = RunSummary::from_outcomes(run_id, started_at, outcomes);

        info!(
            %run_id,
            processed = summary.templates_processed,
            variants = summary.variants_written,
            failures = summary.failures.len(),
            "variant generation finished"
        );
        summary
    }
}

impl<S: VariantStore + fmt::Debug> fmt::Debug for Generator<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Generator")
            .field("policy", &self.policy)
            .field("extremes", &self.extremes.entries.len())
            .field("store", &self.store)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{FileStore, MemoryStore};
    use serde_json::json;

    fn generator(cap: u32) -> Generator<MemoryStore> {
        Generator::new(&GenerationConfig::with_default_cap(cap), MemoryStore::new())
    }

    fn keys(variants: &[Variant]) -> HashSet<String> {
        variants.iter().map(|v| v.key.clone()).collect()
    }

    #[test]
    fn test_smart_template_scenario() {
        let template = Template::new("earthworks.backfill", "m³")
            .with_param("depth_m", 1.2)
            .with_param("restricted", false);
        let gen = generator(8);
        let summary = gen.run(std::slice::from_ref(&template));
        assert!(!summary.has_failures());
        assert_eq!(summary.smart_templates, 1);

        let stored = gen.store().load(&template.key).unwrap();
        assert!(stored.len() <= 8);
        assert_eq!(keys(&stored).len(), stored.len());

        let depths: Vec<f64> = stored
            .iter()
            .filter_map(|v| v.real_params().get_f64("depth_m"))
            .collect();
        assert!(stored.iter().any(|v| v.label() == "Standard"));
        assert!(depths.iter().any(|d| *d < 1.2));
        assert!(depths.iter().any(|d| *d > 1.2));
        assert!(stored.iter().any(|v| v.real_params().get_bool("restricted") == Some(true)));
    }

    #[test]
    fn test_empty_baseline_single_variant() {
        let gen = generator(8);
        let summary = gen.run(&[Template::new("misc.cleanup", "h")]);
        let stored = gen.store().load("misc.cleanup").unwrap();
        assert_eq!(stored.len(), 1);
        assert!(stored[0].real_params().is_empty());
        assert_eq!(summary.fallback_baselines, vec!["misc.cleanup"]);
        assert_eq!(summary.outcomes[0].baseline_source, BaselineSource::Empty);
    }

    #[test]
    fn test_extreme_trench_ignores_cap() {
        let gen = generator(2);
        let template = Template::new("earthworks.trench", "m").with_param("depth_m", 1.2);
        let summary = gen.run(&[template]);
        assert_eq!(summary.extreme_templates, 1);
        assert_eq!(summary.variants_written, 360);
        assert_eq!(gen.store().load("earthworks.trench").unwrap().len(), 360);
    }

    #[test]
    fn test_rerun_is_idempotent() {
        let templates = vec![
            Template::new("water.hydrant", "pcs").with_param("dn", 100).with_param("pn", 16),
            Template::new("sewer.main", "m"),
            Template::new("telecom.duct_blow_in", "m").with_param("depth_m", 0.8),
        ];
        let gen = generator(10);
        gen.run(&templates);
        let before: Vec<HashSet<String>> = templates
            .iter()
            .map(|t| keys(&gen.store().load(&t.key).unwrap()))
            .collect();

        let second = gen.run(&templates);
        assert!(!second.has_failures());
        let after: Vec<HashSet<String>> = templates
            .iter()
            .map(|t| keys(&gen.store().load(&t.key).unwrap()))
            .collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_unsupported_nested_value_skipped() {
        let template = Template::new("earthworks.backfill", "m³")
            .with_param("depth_m", 1.2)
            .with_param("layers", json!({ "top": { "cm": 10 } }));
        let gen = generator(8);
        let summary = gen.run(std::slice::from_ref(&template));
        assert!(!summary.has_failures());
        assert_eq!(summary.outcomes[0].rejected_params, vec!["layers"]);

        let stored = gen.store().load(&template.key).unwrap();
        assert!(stored.len() > 1);
        assert!(stored.iter().all(|v| !v.real_params().contains_key("layers")));
    }

    #[test]
    fn test_variant_keys_unique_per_template() {
        let gen = generator(12);
        let template = Template::new("water.main", "m")
            .with_param("dn", 150)
            .with_param("pn", 10)
            .with_param("soil_class", "medium");
        let (_, _, variants) = gen.build_variants(&template).unwrap();
        assert_eq!(keys(&variants).len(), variants.len());
        assert!(variants.len() <= 12);
    }

    #[test]
    fn test_empty_template_key_fails_alone() {
        let gen = generator(4);
        let summary = gen.run(&[Template::new("", "m"), Template::new("misc.cleanup", "h")]);
        assert_eq!(summary.templates_processed, 2);
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].template_key, "");
        assert_eq!(summary.failures[0].error.error_code(), "INVALID_INPUT");
        assert_eq!(gen.store().load("misc.cleanup").unwrap().len(), 1);
    }

    #[test]
    fn test_duplicate_template_keys_processed_once() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        let gen = Generator::new(&GenerationConfig::with_default_cap(6), store);
        let first = Template::new("gas.main", "m").with_param("dn", 50);
        let templates = vec![
            first.clone(),
            Template::new("gas.main", "pcs").with_param("dn", 100),
            Template::new("power.cable", "m"),
            first.clone(),
        ];

        let summary = gen.run(&templates);
        assert_eq!(summary.templates_processed, 4);
        assert_eq!(summary.failures.len(), 2);
        assert!(summary
            .failures
            .iter()
            .all(|f| f.template_key == "gas.main" && f.error.error_code() == "DUPLICATE_TEMPLATE"));
        assert!(summary.outcomes[0].is_ok());
        assert!(summary.outcomes[2].is_ok());
        assert_eq!(summary.fallback_baselines, vec!["power.cable"]);

        let (_, _, expected) = gen.build_variants(&first).unwrap();
        let stored = gen.store().load("gas.main").unwrap();
        assert_eq!(keys(&stored), keys(&expected));
        assert!(stored.iter().all(|v| v.unit == "m"));
        assert_eq!(summary.variants_written, expected.len() + summary.outcomes[2].variants_written);

        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    struct FailingFor {
        key: &'static str,
        inner: MemoryStore,
    }

    impl VariantStore for FailingFor {
        fn replace(&self, template_key: &str, variants: &[Variant]) -> VariantResult<()> {
            if template_key == self.key {
                return Err(VariantError::store_error("replace", template_key, "disk full"));
            }
            self.inner.replace(template_key, variants)
        }

        fn load(&self, template_key: &str) -> VariantResult<Vec<Variant>> {
            self.inner.load(template_key)
        }
    }

    #[test]
    fn test_store_failure_isolated() {
        let store = FailingFor {
            key: "gas.main",
            inner: MemoryStore::new(),
        };
        let gen = Generator::new(&GenerationConfig::default(), store);
        let templates = [Template::new("gas.main", "m"), Template::new("power.cable", "m")];
        let summary = gen.run(&templates);

        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].template_key, "gas.main");
        assert!(summary.failures[0].error.is_recoverable());
        assert!(gen.store().load("gas.main").unwrap().is_empty());
        assert!(!gen.store().load("power.cable").unwrap().is_empty());
        assert!(summary.to_string().contains("gas.main: Store error"));
    }

    #[test]
    fn test_custom_extreme_catalog() {
        let gen = generator(3).with_extreme_catalog(ExtremeCatalog::empty());
        let template = Template::new("earthworks.trench", "m").with_param("depth_m", 1.2);
        let outcome = gen.process(&template);
        assert_eq!(outcome.mode, BuildMode::Smart);
        assert!(outcome.variants_written <= 3);
    }
}
