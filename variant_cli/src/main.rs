//! # variant-gen
//!
//! Command line runner for the variant generation batch job.
//!
//! ```text
//! variant-gen generate --catalog catalog.json --store variants/ --config generation.toml
//! variant-gen show --store variants/ earthworks.trench
//! variant-gen key water.pipe_laying '{"dn": 150, "depth_m": 1.5}'
//! ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing::{debug, info, trace};

use variant_core::canonical::canonicalize;
use variant_core::{
    derive_variant_key, load_catalog, FileStore, GenerationConfig, Generator, ParamSet, StoreLock,
    VariantStore,
};

#[derive(Parser)]
#[command(name = "variant-gen")]
#[command(
    about = "Generate stable parameter variants for calculation templates",
    long_about = None
)]
#[command(version)]
struct Cli {
    /// Enable verbose output (-v for debug, -vv for trace, -vvv for all)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Regenerate variants for every template in a catalog
    Generate {
        /// Template catalog file (JSON)
        #[arg(long)]
        catalog: PathBuf,

        /// Variant store directory
        #[arg(long)]
        store: PathBuf,

        /// Generation configuration (TOML or JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Identity recorded in the store lock
        #[arg(long)]
        user: Option<String>,

        /// Print the run summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the stored variants of a template
    Show {
        /// Variant store directory
        #[arg(long)]
        store: PathBuf,

        /// Template key
        template_key: String,

        /// Print raw JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Derive the variant key for a parameter set
    Key {
        /// Template key
        template_key: String,

        /// Parameters as a JSON object
        params: String,
    },
}

fn init_tracing(verbose: u8) {
    let log_level = match verbose {
        0 => "info",
        1 => "debug",
        2 => "trace",
        _ => "trace,rayon_core=debug",
    };

    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_target(verbose >= 2)
        .with_thread_ids(verbose >= 3)
        .with_line_number(verbose >= 3)
        .with_writer(std::io::stderr)
        .init();

    debug!("variant-gen started with verbosity level: {}", verbose);
    trace!("Full CLI args: {:?}", std::env::args().collect::<Vec<_>>());
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Generate {
            catalog,
            store,
            config,
            user,
            json,
        } => run_generate(&catalog, &store, config.as_deref(), user, json),
        Commands::Show {
            store,
            template_key,
            json,
        } => run_show(&store, &template_key, json).map(|_| true),
        Commands::Key { template_key, params } => run_key(&template_key, &params).map(|_| true),
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(1)
        }
    }
}

/// Returns `Ok(false)` if any template failed.
fn run_generate(
    catalog_path: &Path,
    store_dir: &Path,
    config_path: Option<&Path>,
    user: Option<String>,
    json: bool,
) -> Result<bool> {
    let catalog = load_catalog(catalog_path)
        .with_context(|| format!("Failed to load catalog {}", catalog_path.display()))?;

    let config = match config_path {
        Some(path) => GenerationConfig::load(path)
            .with_context(|| format!("Failed to load configuration {}", path.display()))?,
        None => GenerationConfig::default(),
    };

    let user = user
        .or_else(|| std::env::var("USER").ok())
        .or_else(|| std::env::var("USERNAME").ok())
        .unwrap_or_else(|| "variant-gen".to_string());
    let _lock = StoreLock::acquire(store_dir, user)
        .with_context(|| format!("Failed to lock store {}", store_dir.display()))?;

    let store = FileStore::open(store_dir).context("Failed to open variant store")?;
    info!(
        catalog = %catalog_path.display(),
        store = %store.root().display(),
        templates = catalog.templates.len(),
        "loaded catalog"
    );

    let summary = Generator::new(&config, store).run(&catalog.templates);

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{}", summary);
    }

    Ok(!summary.has_failures())
}

fn run_show(store_dir: &Path, template_key: &str, json: bool) -> Result<()> {
    if !store_dir.is_dir() {
        bail!("Store directory {} does not exist", store_dir.display());
    }
    let store = FileStore::open(store_dir).context("Failed to open variant store")?;
    let variants = store
        .load(template_key)
        .with_context(|| format!("Failed to load variants for {}", template_key))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&variants)?);
        return Ok(());
    }

    if variants.is_empty() {
        println!("No variants stored for {}", template_key);
        return Ok(());
    }

    println!("{} ({} variants)", template_key, variants.len());
    for variant in &variants {
        println!(
            "  {:<40} {:>6.3}  {}",
            variant.key,
            variant.params.meta.score_hint,
            variant.label()
        );
    }
    Ok(())
}

fn run_key(template_key: &str, params: &str) -> Result<()> {
    let raw: Value = serde_json::from_str(params).context("Parameters must be valid JSON")?;
    let Value::Object(map) = raw else {
        bail!("Parameters must be a JSON object");
    };

    let ingested = ParamSet::from_json(&map);
    for key in &ingested.rejected {
        eprintln!("warning: skipped '{}' (unsupported value)", key);
    }

    let key = derive_variant_key(template_key, &ingested.params)?;
    println!("{}", key);
    println!("{}", String::from_utf8_lossy(&canonicalize(&ingested.params)));
    Ok(())
}
