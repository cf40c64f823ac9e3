//! markpatch core library.
//!
//! This crate provides the marker workflow behind the `markpatch` tool:
//! marker grammar and validation, in-place file rewriting, retention and
//! pruning of the working tree, reconciliation against baselines and
//! patch generation, plus the configuration, baseline fetching and backup
//! plumbing around them.

pub mod backup;
pub mod config;
pub mod content;
pub mod errors;
pub mod fetch;
pub mod markers;
pub mod path_policy;
pub mod project;
pub mod prune;
pub mod reconcile;
pub mod retention;
pub mod rewrite;
pub mod store;

// Re-exports for convenience.
pub use config::{AppConfig, WorkspaceLayout};
pub use errors::CoreError;
pub use markers::MarkerSet;
pub use path_policy::PathPolicy;
pub use reconcile::{DiffyDiffer, PatchGenerator};
pub use store::LocalFileStore;
