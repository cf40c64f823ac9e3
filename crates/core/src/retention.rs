//! Retention: which files and directories of the working tree survive a prune.
//!
//! The working tree is captured once into an in-memory [`TreeSnapshot`].
//! Classification turns per-file keep decisions into a [`KeptSet`] (kept
//! files plus every ancestor directory of a kept file), and the sweep
//! deletes everything else: first files, then directories in post-order so
//! children always go before their parents. The root itself is never removed.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::errors::PruneError;
use crate::path_policy::is_vcs_metadata;
use crate::store::FileStore;

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// One directory of the snapshot. Paths are relative to the snapshot root.
#[derive(Debug, Clone, Default)]
pub struct DirNode {
    pub rel: PathBuf,
    pub files: Vec<PathBuf>,
    pub dirs: Vec<DirNode>,
    /// Directly contains VCS metadata, which is never swept.
    pub holds_vcs_metadata: bool,
}

/// In-memory picture of a directory tree.
#[derive(Debug, Clone)]
pub struct TreeSnapshot {
    root: PathBuf,
    tree: DirNode,
}

impl TreeSnapshot {
    /// Walk `root` without following symlinks. VCS metadata directories are
    /// not descended into.
    pub fn capture(root: &Path) -> Result<Self, PruneError> {
        if !root.is_dir() {
            return Err(PruneError::RootMissing(root.to_path_buf()));
        }
        let tree = capture_dir(root, PathBuf::new())?;
        Ok(Self {
            root: root.to_path_buf(),
            tree,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn tree(&self) -> &DirNode {
        &self.tree
    }

    /// Every file, relative to the root, in a stable order.
    pub fn files(&self) -> Vec<PathBuf> {
        let mut out = Vec::new();
        collect_files(&self.tree, &mut out);
        out
    }

    pub fn abs(&self, rel: &Path) -> PathBuf {
        self.root.join(rel)
    }
}

fn capture_dir(abs: &Path, rel: PathBuf) -> Result<DirNode, PruneError> {
    let walk_err = |e: std::io::Error| PruneError::Walk {
        path: abs.to_path_buf(),
        detail: e.to_string(),
    };

    let mut node = DirNode {
        rel,
        ..DirNode::default()
    };

    let mut entries = std::fs::read_dir(abs)
        .map_err(walk_err)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(walk_err)?;
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let name = entry.file_name();
        let child_rel = node.rel.join(&name);
        let file_type = entry.file_type().map_err(walk_err)?;

        if file_type.is_dir() {
            if is_vcs_metadata(&name.to_string_lossy()) {
                node.holds_vcs_metadata = true;
                continue;
            }
            node.dirs.push(capture_dir(&entry.path(), child_rel)?);
        } else {
            node.files.push(child_rel);
        }
    }
    Ok(node)
}

fn collect_files(node: &DirNode, out: &mut Vec<PathBuf>) {
    out.extend(node.files.iter().cloned());
    for d in &node.dirs {
        collect_files(d, out);
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Files and directories that survive the sweep, relative to the root.
/// The root is the empty path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeptSet {
    pub files: BTreeSet<PathBuf>,
    pub dirs: BTreeSet<PathBuf>,
}

impl KeptSet {
    /// Keep a file and every directory above it.
    pub fn keep_file(&mut self, rel: &Path) {
        self.files.insert(rel.to_path_buf());
        if let Some(parent) = rel.parent() {
            self.keep_dir(parent);
        }
    }

    /// Keep a directory and every directory above it.
    pub fn keep_dir(&mut self, rel: &Path) {
        for ancestor in rel.ancestors() {
            if !self.dirs.insert(ancestor.to_path_buf()) {
                break;
            }
        }
    }

    pub fn is_file_kept(&self, rel: &Path) -> bool {
        self.files.contains(rel)
    }

    pub fn is_dir_kept(&self, rel: &Path) -> bool {
        self.dirs.contains(rel)
    }
}

/// Build the kept set from a per-file decision.
///
/// Directories holding VCS metadata are kept as well, since the sweep never
/// empties them.
pub fn classify<F>(snapshot: &TreeSnapshot, mut keep: F) -> KeptSet
where
    F: FnMut(&Path) -> bool,
{
    let mut kept = KeptSet::default();
    kept.dirs.insert(PathBuf::new());
    classify_dir(&snapshot.tree, &mut keep, &mut kept);
    debug!(
        files = kept.files.len(),
        dirs = kept.dirs.len(),
        "classification complete"
    );
    kept
}

fn classify_dir<F>(node: &DirNode, keep: &mut F, kept: &mut KeptSet)
where
    F: FnMut(&Path) -> bool,
{
    if node.holds_vcs_metadata {
        kept.keep_dir(&node.rel);
    }
    for file in &node.files {
        if keep(file) {
            kept.keep_file(file);
        }
    }
    for dir in &node.dirs {
        classify_dir(dir, keep, kept);
    }
}

// ---------------------------------------------------------------------------
// Sweep
// ---------------------------------------------------------------------------

/// What the sweep removed, and what it failed to remove.
#[derive(Debug, Clone, Default)]
pub struct SweepReport {
    pub files_removed: Vec<PathBuf>,
    pub dirs_removed: Vec<PathBuf>,
    pub failures: Vec<(PathBuf, String)>,
}

/// Delete every file not kept, then every directory not kept (post-order).
///
/// Failures are recorded and the sweep continues with the next entry.
pub fn sweep(snapshot: &TreeSnapshot, kept: &KeptSet, store: &dyn FileStore) -> SweepReport {
    let mut report = SweepReport::default();

    for file in snapshot.files() {
        if kept.is_file_kept(&file) {
            continue;
        }
        match store.remove_file(&snapshot.abs(&file)) {
            Ok(()) => report.files_removed.push(file),
            Err(e) => {
                warn!(path = %file.display(), error = %e, "could not delete file");
                report.failures.push((file, e.to_string()));
            }
        }
    }

    for child in &snapshot.tree.dirs {
        sweep_dirs(snapshot, child, kept, store, &mut report);
    }

    info!(
        files = report.files_removed.len(),
        dirs = report.dirs_removed.len(),
        failures = report.failures.len(),
        "sweep complete"
    );
    report
}

fn sweep_dirs(
    snapshot: &TreeSnapshot,
    node: &DirNode,
    kept: &KeptSet,
    store: &dyn FileStore,
    report: &mut SweepReport,
) {
    for child in &node.dirs {
        sweep_dirs(snapshot, child, kept, store, report);
    }
    if kept.is_dir_kept(&node.rel) {
        return;
    }
    match store.remove_dir(&snapshot.abs(&node.rel)) {
        Ok(()) => report.dirs_removed.push(node.rel.clone()),
        Err(e) => {
            warn!(path = %node.rel.display(), error = %e, "could not remove directory");
            report.failures.push((node.rel.clone(), e.to_string()));
        }
    }
}
