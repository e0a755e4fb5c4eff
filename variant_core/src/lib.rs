//! # variant_core - Calculation Template Variant Engine
//!
//! `variant_core` expands a catalog of calculation templates into concrete,
//! stably-keyed parameter variants for estimators to pick from. All inputs and
//! outputs are JSON-serializable.
//!
//! ## Design Philosophy
//!
//! - **Deterministic**: identical templates always yield identical variant keys
//! - **JSON-First**: all types implement Serialize/Deserialize
//! - **Rich Errors**: structured error types, not just strings
//! - **Per-template atomicity**: a template's variant set is replaced as one unit
//!
//! ## Quick Start
//!
//! ```rust
//! use variant_core::{GenerationConfig, Generator, MemoryStore, Template, VariantStore};
//!
//! let templates = vec![
//!     Template::new("earthworks.trench", "m").with_param("depth_m", 1.2),
//!     Template::new("water.hydrant", "pcs").with_param("dn", 100),
//! ];
//!
//! let generator = Generator::new(&GenerationConfig::default(), MemoryStore::new());
//! let summary = generator.run(&templates);
//!
//! assert_eq!(summary.templates_processed, 2);
//! assert_eq!(generator.store().load("earthworks.trench").unwrap().len(), 360);
//! ```
//!
//! ## Modules
//!
//! - [`params`] - Parameter values and ordered parameter sets
//! - [`canonical`] - Canonical serialization for identity
//! - [`variant_key`] - Stable variant key derivation
//! - [`family`] - Template family classification and fallback baselines
//! - [`suggest`] - Per-key alternative value suggestions
//! - [`builders`] - Smart (capped) and extreme (exhaustive) variant builders
//! - [`policy`] - Cap resolution chain
//! - [`annotate`] - Variant display metadata
//! - [`template`] - Template and variant types
//! - [`orchestrator`] - Batch generation
//! - [`store`] - Variant storage with atomic replace and run locking
//! - [`catalog`] - Versioned template catalog files
//! - [`config`] - Generation configuration
//! - [`errors`] - Structured error types

pub mod annotate;
pub mod builders;
pub mod canonical;
pub mod catalog;
pub mod config;
pub mod errors;
pub mod family;
pub mod orchestrator;
pub mod params;
pub mod policy;
pub mod store;
pub mod suggest;
pub mod template;
pub mod variant_key;

// Re-export commonly used types at crate root for convenience
pub use catalog::{load_catalog, save_catalog, Catalog, SCHEMA_VERSION};
pub use config::GenerationConfig;
pub use errors::{VariantError, VariantResult};
pub use orchestrator::{Generator, RunSummary};
pub use params::{ParamSet, ParamValue};
pub use store::{FileStore, MemoryStore, StoreLock, VariantStore};
pub use template::{Template, Variant};
pub use variant_key::derive_variant_key;
