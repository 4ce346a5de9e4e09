//! Error types and load result structures for schema and rule loading.

use std::path::PathBuf;

use crate::error::RuleError;

/// Errors that can occur while loading entity types or rule sets.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// Filesystem I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parse/deserialization error.
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// Document validation error (bad apiVersion, id, kind mismatch).
    #[error("Validation error: {0}")]
    Validation(String),

    /// The rule storage provider failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// A rule failed to construct and the load was strict.
    #[error("Rule '{rule_id}' failed to load: {source}")]
    Rule { rule_id: String, source: RuleError },

    /// Invalid engine configuration.
    #[error(transparent)]
    Config(#[from] rulebook_core::CoreError),
}

/// Result alias for load operations.
pub type Result<T> = std::result::Result<T, LoadError>;

/// Outcome of loading a single document file.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadResult {
    /// Path to the file that was loaded.
    pub path: PathBuf,
    /// Status of the load attempt.
    pub status: LoadStatus,
}

/// Outcome of constructing a single stored rule.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleLoadReport {
    /// Stored id, or `#<index>` for records without one.
    pub rule_id: String,
    pub status: LoadStatus,
}

/// Status of a single load attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadStatus {
    /// Loaded successfully.
    Loaded { id: String },
    /// Skipped (dotfile, non-YAML, tombstoned, other kind, ...).
    Skipped { reason: String },
    /// Parse or validation error occurred.
    Failed { error: String },
}

impl LoadStatus {
    pub fn is_loaded(&self) -> bool {
        matches!(self, LoadStatus::Loaded { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, LoadStatus::Failed { .. })
    }
}
