//! The "mark" and "prune" workflows over the working tree.
//!
//! Pruning runs in phases:
//!
//! 1. Capture a [`TreeSnapshot`] of the working root.
//! 2. Read, scan and validate every candidate file. Any invalid file aborts
//!    the run here, before a single byte is written.
//! 3. If no file carries any marker, wipe the tree under the root.
//! 4. Rewrite files carrying edit tokens and decide, per file, keep or drop.
//! 5. [`classify`] and [`sweep`].

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::content::is_binary;
use crate::errors::{PruneError, RewriteError};
use crate::markers::MarkerSet;
use crate::path_policy::{PathDecision, PathPolicy};
use crate::retention::{classify, sweep, SweepReport, TreeSnapshot};
use crate::rewrite::{MarkedFile, RewriteOutcome};
use crate::store::FileStore;

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// Summary of one prune run.
#[derive(Debug, Clone, Default)]
pub struct PruneReport {
    /// Files rewritten by the rewrite engine.
    pub rewritten: Vec<PathBuf>,
    /// Files kept after classification.
    pub kept: Vec<PathBuf>,
    /// Files left untouched because reading or writing them failed.
    pub skipped: Vec<(PathBuf, String)>,
    /// `true` when no marker was found anywhere and the tree was wiped.
    pub wiped: bool,
    pub sweep: SweepReport,
}

/// Summary of marking individual files.
#[derive(Debug, Clone, Default)]
pub struct MarkReport {
    pub outcomes: Vec<(PathBuf, RewriteOutcome)>,
    pub skipped: Vec<(PathBuf, String)>,
}

// ---------------------------------------------------------------------------
// Mark
// ---------------------------------------------------------------------------

/// Validate every file first, then rewrite each one.
///
/// An invalid file fails the whole call with nothing written. Read and write
/// failures only skip the affected file.
pub fn mark_files(paths: &[PathBuf], markers: &MarkerSet) -> Result<MarkReport, PruneError> {
    let mut report = MarkReport::default();
    let mut loaded = Vec::new();
    let mut invalid = Vec::new();

    for path in paths {
        match MarkedFile::load(path, markers) {
            Ok(file) => loaded.push(file),
            Err(e) if e.is_fatal() => invalid.push(e),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping file");
                report.skipped.push((path.clone(), e.to_string()));
            }
        }
    }
    if !invalid.is_empty() {
        return Err(PruneError::Validation(invalid));
    }

    for file in loaded {
        match file.rewrite(markers) {
            Ok(outcome) => report.outcomes.push((file.path().to_path_buf(), outcome)),
            Err(e) => {
                warn!(path = %file.path().display(), error = %e, "skipping file");
                report.skipped.push((file.path().to_path_buf(), e.to_string()));
            }
        }
    }
    Ok(report)
}

// ---------------------------------------------------------------------------
// Prune
// ---------------------------------------------------------------------------

/// Per-file state between the validation and rewrite phases.
enum Candidate {
    /// README or ignored: retained without being read.
    Protected,
    /// Binary: no markers possible.
    Unmarked,
    Loaded(MarkedFile),
    /// Read failure. Retained untouched.
    Unreadable(String),
}

/// Run the whole prune workflow over `root`.
pub fn prune_workspace(
    root: &Path,
    markers: &MarkerSet,
    policy: &PathPolicy,
    store: &dyn FileStore,
) -> Result<PruneReport, PruneError> {
    info!(root = %root.display(), "pruning working tree");
    let snapshot = TreeSnapshot::capture(root)?;

    // Phase 2: read + validate everything before touching anything.
    let mut candidates = Vec::new();
    let mut invalid = Vec::new();
    for rel in snapshot.files() {
        let candidate = match policy.evaluate_in_workspace(&rel) {
            PathDecision::Include => load_candidate(&snapshot.abs(&rel), markers),
            decision => {
                debug!(path = %rel.display(), decision = decision.label(), "protected file");
                Ok(Candidate::Protected)
            }
        };
        match candidate {
            Ok(c) => candidates.push((rel, c)),
            Err(e) => invalid.push(e),
        }
    }
    if !invalid.is_empty() {
        for e in &invalid {
            warn!(error = %e, "marker validation failed");
        }
        return Err(PruneError::Validation(invalid));
    }

    let any_marker = candidates.iter().any(|(_, c)| match c {
        Candidate::Loaded(f) => !f.scan().is_empty(),
        _ => false,
    });
    if !any_marker {
        info!("no markers anywhere under the working root, wiping it");
        return Ok(wipe(&snapshot, store));
    }

    // Phase 4: rewrite and decide.
    let mut report = PruneReport::default();
    let mut keep = BTreeSet::new();
    for (rel, candidate) in candidates {
        let kept = match candidate {
            Candidate::Protected => true,
            Candidate::Unmarked => false,
            Candidate::Unreadable(reason) => {
                report.skipped.push((rel.clone(), reason));
                true
            }
            Candidate::Loaded(file) => decide(&rel, &file, markers, &mut report),
        };
        if kept {
            keep.insert(rel);
        }
    }

    // Phase 5: classify and sweep.
    let kept = classify(&snapshot, |rel| keep.contains(rel));
    report.kept = kept.files.iter().cloned().collect();
    report.sweep = sweep(&snapshot, &kept, store);
    info!(
        rewritten = report.rewritten.len(),
        kept = report.kept.len(),
        removed = report.sweep.files_removed.len(),
        "prune complete"
    );
    Ok(report)
}

fn load_candidate(abs: &Path, markers: &MarkerSet) -> Result<Candidate, RewriteError> {
    let bytes = match std::fs::read(abs) {
        Ok(b) => b,
        Err(e) => {
            warn!(path = %abs.display(), error = %e, "could not read file");
            return Ok(Candidate::Unreadable(e.to_string()));
        }
    };
    if is_binary(&bytes) {
        return Ok(Candidate::Unmarked);
    }
    MarkedFile::from_bytes(abs, bytes, markers).map(Candidate::Loaded)
}

/// Keep rule for one loaded file, rewriting it first when it has edit tokens.
fn decide(rel: &Path, file: &MarkedFile, markers: &MarkerSet, report: &mut PruneReport) -> bool {
    let scan = file.scan();
    if scan.is_empty() {
        return false;
    }
    if !scan.has_edits() {
        // Flagged with the sentinel but not edited yet.
        return true;
    }
    match file.rewrite(markers) {
        Ok(outcome) => {
            report.rewritten.push(rel.to_path_buf());
            outcome.scan.had_both() || outcome.has_content
        }
        Err(e) => {
            warn!(path = %rel.display(), error = %e, "rewrite failed, keeping original");
            report.skipped.push((rel.to_path_buf(), e.to_string()));
            true
        }
    }
}

/// Remove everything under the root except VCS metadata.
fn wipe(snapshot: &TreeSnapshot, store: &dyn FileStore) -> PruneReport {
    let kept = classify(snapshot, |_| false);
    PruneReport {
        wiped: true,
        sweep: sweep(snapshot, &kept, store),
        ..PruneReport::default()
    }
}
