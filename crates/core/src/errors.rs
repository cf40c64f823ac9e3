//! Error types for the markpatch core library.
//!
//! Each subsystem has its own error type derived with `thiserror`, and a
//! top-level [`CoreError`] enum unifies them all for callers that want a
//! single error type.

use std::path::PathBuf;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Unified error type for the entire core library.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Marker(#[from] MarkerError),

    #[error(transparent)]
    Rewrite(#[from] RewriteError),

    #[error(transparent)]
    Prune(#[from] PruneError),

    #[error(transparent)]
    Reconcile(#[from] ReconcileError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Backup(#[from] BackupError),
}

// ---------------------------------------------------------------------------
// Marker errors
// ---------------------------------------------------------------------------

/// Problems with the marker token set itself (not with a file's markers).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MarkerError {
    /// A token was configured as the empty string.
    #[error("marker token '{name}' must not be empty")]
    EmptyToken { name: &'static str },

    /// One token is contained in another, so substring matching is ambiguous.
    #[error("marker token '{inner}' is contained in '{outer}'")]
    OverlappingTokens { inner: String, outer: String },
}

// ---------------------------------------------------------------------------
// Rewrite errors
// ---------------------------------------------------------------------------

/// Errors from rewriting a single marked file.
#[derive(Debug, Error)]
pub enum RewriteError {
    /// The file's marker structure is malformed. Fatal for the whole run.
    #[error("invalid markers in '{}' at line {line}: {reason}", .path.display())]
    Invalid {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    /// The file could not be read.
    #[error("failed to read '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The temporary file could not be written or renamed over the original.
    #[error("failed to write '{}': {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl RewriteError {
    /// `true` for errors that must abort the whole invocation.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Invalid { .. })
    }
}

// ---------------------------------------------------------------------------
// Prune errors
// ---------------------------------------------------------------------------

/// Errors from the prune (rewrite + retention + sweep) workflow.
#[derive(Debug, Error)]
pub enum PruneError {
    /// The working root does not exist or is not a directory.
    #[error("working root not found: {}", .0.display())]
    RootMissing(PathBuf),

    /// At least one file failed marker validation; nothing was modified.
    #[error("{} file(s) failed marker validation; no files were modified", .0.len())]
    Validation(Vec<RewriteError>),

    /// Walking the working tree failed.
    #[error("failed to walk '{}': {detail}", .path.display())]
    Walk { path: PathBuf, detail: String },
}

// ---------------------------------------------------------------------------
// Reconcile errors
// ---------------------------------------------------------------------------

/// Errors from the reconciliation / patch-generation workflow.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// The working root does not exist.
    #[error("working root not found: {}", .0.display())]
    EditRootMissing(PathBuf),

    /// Neither baseline root exists.
    #[error("no baseline root found (looked for '{}' and '{}')", .git.display(), .local.display())]
    BaselineRootMissing { git: PathBuf, local: PathBuf },

    /// The effective sequence came out empty for non-empty input.
    #[error("reconciled output for '{0}' is empty although its inputs are not")]
    EmptyOutput(String),

    /// Walking a tree failed.
    #[error("failed to walk '{}': {detail}", .path.display())]
    Walk { path: PathBuf, detail: String },

    #[error("reconcile I/O error at '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors from configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file not found.
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    /// TOML parse error.
    #[error("configuration parse error: {0}")]
    ParseError(String),

    /// A config value is invalid.
    #[error("invalid configuration value for '{field}': {detail}")]
    InvalidValue { field: String, detail: String },

    /// Generic I/O error reading the config file.
    #[error("configuration I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Fetch errors
// ---------------------------------------------------------------------------

/// Errors from materializing baseline trees and the remembered repo list.
#[derive(Debug, Error)]
pub enum FetchError {
    /// No directory name could be derived from the URL.
    #[error("cannot derive a directory name from '{0}'")]
    BadUrl(String),

    /// A `git2` library error.
    #[error("git2 error: {0}")]
    Git2Error(#[from] git2::Error),

    /// Generic I/O wrapper.
    #[error("fetch I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Store errors
// ---------------------------------------------------------------------------

/// Errors from the file-store collaborator.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{op} failed for '{}': {source}", .path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

// ---------------------------------------------------------------------------
// Backup errors
// ---------------------------------------------------------------------------

/// Errors from backup / restore of working-root entries.
#[derive(Debug, Error)]
pub enum BackupError {
    /// The working root does not exist.
    #[error("working root not found: {}", .0.display())]
    RootMissing(PathBuf),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("backup I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
