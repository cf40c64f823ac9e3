//! Reconciliation of edit trees against baselines, and patch generation.
//!
//! - [`effective`] rebuilds the file an edit tree stands for, line by line.
//! - [`differ`] renders unified diffs.
//! - [`generator`] walks projects and writes the patches.

pub mod differ;
pub mod effective;
pub mod generator;

pub use differ::{Differ, DiffyDiffer, DEV_NULL};
pub use effective::{effective_sequence, reconcile_text, Reconciled};
pub use generator::{
    patch_file_name, ExportReport, PatchGenerator, PatchKind, PatchRecord, ProjectReport,
};
