//! # Error Types
//!
//! Structured error types for variant_core. Generation itself is designed to
//! degrade rather than fail (unsupported values are skipped, empty builder
//! output falls back to the baseline), so these errors surface at the edges:
//! key derivation, storage, catalog and configuration I/O.
//!
//! ## Example
//!
//! ```rust
//! use variant_core::errors::{VariantError, VariantResult};
//!
//! fn require_key(key: &str) -> VariantResult<()> {
//!     if key.is_empty() {
//!         return Err(VariantError::invalid_input(
//!             "template_key",
//!             key,
//!             "Template key must not be empty",
//!         ));
//!     }
//!     Ok(())
//! }
//! # assert!(require_key("").is_err());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for variant_core operations
pub type VariantResult<T> = Result<T, VariantError>;

/// Structured error type for variant generation.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum VariantError {
    /// An input value is invalid (empty key, malformed params, etc.)
    #[error("Invalid input for '{field}': {value} - {reason}")]
    InvalidInput {
        field: String,
        value: String,
        reason: String,
    },

    /// Template not present in the catalog or store
    #[error("Template not found: {template_key}")]
    TemplateNotFound { template_key: String },

    /// The same template key appears twice in one catalog
    #[error("Duplicate template key in catalog: {template_key}")]
    DuplicateTemplate { template_key: String },

    /// Variant store read/write failure
    #[error("Store error: {operation} on '{path}' - {reason}")]
    StoreError {
        operation: String,
        path: String,
        reason: String,
    },

    /// Another generation run holds the store lock
    #[error("Store locked: '{path}' is locked by {locked_by} since {locked_at}")]
    StoreLocked {
        path: String,
        locked_by: String,
        locked_at: String,
    },

    /// JSON/TOML serialization or deserialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },

    /// Configuration could not be read or parsed
    #[error("Configuration error: {reason}")]
    ConfigError { reason: String },

    /// Schema version mismatch
    #[error("Version mismatch: file version {file_version}, expected {expected_version}")]
    VersionMismatch {
        file_version: String,
        expected_version: String,
    },

    /// Generic internal error (should be rare)
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl VariantError {
    /// Create an InvalidInput error
    pub fn invalid_input(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        VariantError::InvalidInput {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a TemplateNotFound error
    pub fn template_not_found(template_key: impl Into<String>) -> Self {
        VariantError::TemplateNotFound {
            template_key: template_key.into(),
        }
    }

    /// Create a StoreError
    pub fn store_error(
        operation: impl Into<String>,
        path: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        VariantError::StoreError {
            operation: operation.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a StoreLocked error
    pub fn store_locked(
        path: impl Into<String>,
        locked_by: impl Into<String>,
        locked_at: impl Into<String>,
    ) -> Self {
        VariantError::StoreLocked {
            path: path.into(),
            locked_by: locked_by.into(),
            locked_at: locked_at.into(),
        }
    }

    /// Create a SerializationError
    pub fn serialization(reason: impl Into<String>) -> Self {
        VariantError::SerializationError {
            reason: reason.into(),
        }
    }

    /// Create a ConfigError
    pub fn config(reason: impl Into<String>) -> Self {
        VariantError::ConfigError {
            reason: reason.into(),
        }
    }

    /// Check if this is a recoverable error (e.g., can retry)
    pub fn is_recoverable(&self) -> bool {
        matches!(self, VariantError::StoreLocked { .. } | VariantError::StoreError { .. })
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            VariantError::InvalidInput { .. } => "INVALID_INPUT",
            VariantError::TemplateNotFound { .. } => "TEMPLATE_NOT_FOUND",
            VariantError::DuplicateTemplate { .. } => "DUPLICATE_TEMPLATE",
            VariantError::StoreError { .. } => "STORE_ERROR",
            VariantError::StoreLocked { .. } => "STORE_LOCKED",
            VariantError::SerializationError { .. } => "SERIALIZATION_ERROR",
            VariantError::ConfigError { .. } => "CONFIG_ERROR",
            VariantError::VersionMismatch { .. } => "VERSION_MISMATCH",
            VariantError::Internal { .. } => "INTERNAL_ERROR",
        }
    }
}
