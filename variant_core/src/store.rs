//! # Variant Storage
//!
//! The orchestrator only needs one storage operation: replace a template's
//! whole variant set. [`VariantStore`] is that seam. Two implementations ship:
//!
//! - [`MemoryStore`] - in-process map, one write lock per replace
//! - [`FileStore`] - one JSON batch file per template, written atomically
//!
//! ## Atomic Replace (FileStore)
//!
//! 1. Serialize the batch to JSON
//! 2. Write to a temporary file (`.tmp`)
//! 3. Sync to disk (fsync)
//! 4. Rename over the previous batch file (atomic on most filesystems)
//!
//! A reader therefore sees either the complete old batch or the complete new
//! one. An interrupted run leaves earlier templates fully committed.
//!
//! ## Run Lock
//!
//! [`StoreLock`] guards a store directory against two concurrent generation
//! runs. It combines an OS-level lock (fs2) with a `.generation.lock` file
//! describing the holder.
//!
//! ```rust,no_run
//! use std::path::Path;
//! use variant_core::store::{FileStore, StoreLock, VariantStore};
//!
//! let lock = StoreLock::acquire(Path::new("variants"), "ci@company.com")?;
//! let store = FileStore::open("variants")?;
//! let stored = store.load("earthworks.trench")?;
//! drop(lock);
//! # Ok::<(), variant_core::errors::VariantError>(())
//! ```

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use chrono::{DateTime, Duration, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use tracing::{debug, warn};

use crate::catalog::{validate_version, SCHEMA_VERSION};
use crate::errors::{VariantError, VariantResult};
use crate::template::Variant;

/// Storage seam for generated variants.
pub trait VariantStore: Send + Sync {
    /// Replace the entire variant set of a template. Must be failure-atomic:
    /// afterwards the template holds either the old set or the new set (or,
    /// after a crash, nothing), never a mix.
    fn replace(&self, template_key: &str, variants: &[Variant]) -> VariantResult<()>;

    /// All stored variants of a template (empty if none).
    fn load(&self, template_key: &str) -> VariantResult<Vec<Variant>>;
}

/// In-memory store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    batches: RwLock<HashMap<String, Vec<Variant>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of templates with a stored batch.
    pub fn template_count(&self) -> usize {
        self.batches.read().map(|b| b.len()).unwrap_or(0)
    }
}

impl VariantStore for MemoryStore {
    fn replace(&self, template_key: &str, variants: &[Variant]) -> VariantResult<()> {
        let mut batches = self
            .batches
            .write()
            .map_err(|e| VariantError::store_error("replace", "memory", e.to_string()))?;
        batches.insert(template_key.to_string(), variants.to_vec());
        Ok(())
    }

    fn load(&self, template_key: &str) -> VariantResult<Vec<Variant>> {
        let batches = self
            .batches
            .read()
            .map_err(|e| VariantError::store_error("load", "memory", e.to_string()))?;
        Ok(batches.get(template_key).cloned().unwrap_or_default())
    }
}

/// Batch file contents for one template.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantBatch {
    /// Schema version (for migration compatibility)
    pub version: String,
    pub template_key: String,
    pub generated_at: DateTime<Utc>,
    pub variants: Vec<Variant>,
}

/// Directory-backed store, one `<name>.variants.json` file per template.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Open (and create if needed) a store directory.
    pub fn open(root: impl Into<PathBuf>) -> VariantResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(io_error("create store directory", &root))?;
        Ok(FileStore { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Batch file path for a template key.
    pub fn batch_path(&self, template_key: &str) -> PathBuf {
        self.root.join(batch_file_name(template_key))
    }
}

/// File name for a template's batch: sanitized key plus a short hash so that
/// distinct keys never share a file.
fn batch_file_name(template_key: &str) -> String {
    let sanitized: String = template_key
        .chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '.' | '-' | '_' => c,
            _ => '_',
        })
        .collect();
    let digest = hex::encode(Sha1::digest(template_key.as_bytes()));
    format!("{}-{}.variants.json", sanitized, &digest[..8])
}

impl VariantStore for FileStore {
    fn replace(&self, template_key: &str, variants: &[Variant]) -> VariantResult<()> {
        let path = self.batch_path(template_key);
        let batch = VariantBatch {
            version: SCHEMA_VERSION.to_string(),
            template_key: template_key.to_string(),
            generated_at: Utc::now(),
            variants: variants.to_vec(),
        };
        let json = serde_json::to_string_pretty(&batch)
            .map_err(|e| VariantError::serialization(e.to_string()))?;
        write_atomic(&path, json.as_bytes())?;
        debug!(
            template = template_key,
            path = %path.display(),
            count = variants.len(),
            "batch written"
        );
        Ok(())
    }

    fn load(&self, template_key: &str) -> VariantResult<Vec<Variant>> {
        let path = self.batch_path(template_key);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let contents = fs::read_to_string(&path).map_err(io_error("read", &path))?;
        let batch: VariantBatch = serde_json::from_str(&contents).map_err(|e| {
            VariantError::serialization(format!("Invalid JSON in {}: {}", path.display(), e))
        })?;
        validate_version(&batch.version)?;
        if batch.template_key != template_key {
            return Err(VariantError::store_error(
                "load",
                path.display().to_string(),
                format!("batch belongs to '{}'", batch.template_key),
            ));
        }
        Ok(batch.variants)
    }
}

/// Map an I/O error to a [`VariantError::StoreError`] for `path`.
fn io_error<'a>(operation: &'a str, path: &'a Path) -> impl FnOnce(io::Error) -> VariantError + 'a {
    move |e| VariantError::store_error(operation, path.display().to_string(), e.to_string())
}

/// Write bytes to `path` via temp file, fsync and rename.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> VariantResult<()> {
    let tmp_path = path.with_extension("json.tmp");

    let mut tmp_file = File::create(&tmp_path).map_err(io_error("create temp file", &tmp_path))?;
    tmp_file.write_all(bytes).map_err(io_error("write temp file", &tmp_path))?;
    tmp_file.sync_all().map_err(io_error("sync temp file", &tmp_path))?;

    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(io_error("rename to final", path)(e));
    }
    Ok(())
}

/// Lock file name inside a store directory.
pub const LOCK_FILE_NAME: &str = ".generation.lock";

/// Age after which a recorded holder on another machine is presumed gone.
pub const STALE_LOCK_HOURS: i64 = 24;

/// Who holds a store's run lock, as recorded in the lock file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockHolder {
    pub user: String,
    pub machine: String,
    pub pid: u32,
    pub since: DateTime<Utc>,
}

impl LockHolder {
    fn current(user: String) -> Self {
        LockHolder {
            user,
            machine: machine_name(),
            pid: std::process::id(),
            since: Utc::now(),
        }
    }

    pub fn is_stale(&self) -> bool {
        Utc::now() - self.since > Duration::hours(STALE_LOCK_HOURS)
    }

    fn describe(&self) -> String {
        format!("{}@{} (pid {})", self.user, self.machine, self.pid)
    }
}

fn machine_name() -> String {
    ["HOSTNAME", "HOST", "COMPUTERNAME"]
        .iter()
        .find_map(|var| std::env::var(var).ok())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Exclusive run lock on a store directory, released on drop.
///
/// The OS lock (fs2) decides ownership between processes of one machine.
/// The holder record in the lock file covers shared drives where advisory
/// locks do not reach other machines: a fresh record from another machine
/// blocks acquisition, an old one is taken over.
#[derive(Debug)]
pub struct StoreLock {
    path: PathBuf,
    file: File,
    holder: LockHolder,
}

impl StoreLock {
    /// Acquire the run lock for `store_dir`, failing with
    /// [`VariantError::StoreLocked`] if another run holds it.
    pub fn acquire(store_dir: &Path, user: impl Into<String>) -> VariantResult<Self> {
        fs::create_dir_all(store_dir).map_err(io_error("create store directory", store_dir))?;
        let path = store_dir.join(LOCK_FILE_NAME);

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&path)
            .map_err(io_error("open lock", &path))?;
        let previous = read_holder(&mut file);

        if file.try_lock_exclusive().is_err() {
            return Err(locked_error(store_dir, previous.as_ref()));
        }

        let holder = LockHolder::current(user.into());
        if let Some(prev) = previous {
            if prev.machine != holder.machine && !prev.is_stale() {
                let _ = file.unlock();
                return Err(locked_error(store_dir, Some(&prev)));
            }
            warn!(holder = %prev.describe(), "taking over abandoned store lock");
        }

        let json = serde_json::to_vec_pretty(&holder)
            .map_err(|e| VariantError::serialization(e.to_string()))?;
        file.set_len(0).map_err(io_error("write lock", &path))?;
        file.seek(SeekFrom::Start(0)).map_err(io_error("write lock", &path))?;
        file.write_all(&json).map_err(io_error("write lock", &path))?;
        file.sync_all().map_err(io_error("sync lock", &path))?;

        debug!(store = %store_dir.display(), holder = %holder.describe(), "store locked");
        Ok(StoreLock { path, file, holder })
    }

    pub fn holder(&self) -> &LockHolder {
        &self.holder
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
        let _ = self.file.unlock();
    }
}

fn read_holder(file: &mut File) -> Option<LockHolder> {
    let mut contents = String::new();
    file.read_to_string(&mut contents).ok()?;
    serde_json::from_str(&contents).ok()
}

fn locked_error(store_dir: &Path, holder: Option<&LockHolder>) -> VariantError {
    match holder {
        Some(h) => VariantError::store_locked(
            store_dir.display().to_string(),
            h.describe(),
            h.since.to_rfc3339(),
        ),
        None => VariantError::store_locked(
            store_dir.display().to_string(),
            "another process",
            "unknown",
        ),
    }
}
