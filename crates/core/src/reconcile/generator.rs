//! Per-project patch generation.
//!
//! For every project with a baseline, the generator walks the edit subtree
//! and the baseline subtree and emits:
//!
//! | Edit file | Baseline file | Patch |
//! |-----------|---------------|-------|
//! | text | missing | add (`/dev/null` → `b/<rel>`) |
//! | text | text, effective differs | change (`a/<rel>` → `b/<rel>`) |
//! | text | text, effective identical | none |
//! | missing | text containing the sentinel | delete (`a/<rel>` → `/dev/null`) |
//! | missing | text without the sentinel | none |
//! | binary on either side | | none, skipped with a warning |
//!
//! The edit and baseline trees are only ever read.

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::WorkspaceLayout;
use crate::content::{contains, read_text};
use crate::errors::ReconcileError;
use crate::markers::MarkerSet;
use crate::path_policy::{is_vcs_metadata, PathPolicy};
use crate::project::{discover, Project, ProjectStatus, SkipReason};

use super::differ::{Differ, DEV_NULL};
use super::effective::reconcile_text;

// ---------------------------------------------------------------------------
// Report types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchKind {
    Add,
    Change,
    Delete,
}

impl fmt::Display for PatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Add => write!(f, "add"),
            Self::Change => write!(f, "change"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

/// One patch written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchRecord {
    pub rel_path: PathBuf,
    pub kind: PatchKind,
    pub file: PathBuf,
}

/// Outcome for one project.
#[derive(Debug, Clone, Default)]
pub struct ProjectReport {
    pub name: String,
    pub patches: Vec<PatchRecord>,
    pub unchanged: usize,
    /// Files skipped with a diagnostic (binary content, read failure, ...).
    pub skipped: Vec<(PathBuf, String)>,
}

/// Outcome of a whole export run.
#[derive(Debug, Clone, Default)]
pub struct ExportReport {
    /// `true` when no sentinel exists under the working root and nothing ran.
    pub no_sentinels: bool,
    pub projects: Vec<ProjectReport>,
    pub skipped_projects: Vec<(String, SkipReason)>,
}

impl ExportReport {
    pub fn patch_count(&self) -> usize {
        self.projects.iter().map(|p| p.patches.len()).sum()
    }
}

/// Flatten a project-relative path into a patch file name.
pub fn patch_file_name(rel_path: &Path) -> String {
    let flat: String = rel_path
        .to_string_lossy()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ' ' => '_',
            other => other,
        })
        .collect();
    format!("{}.patch", flat)
}

/// Forward-slash form used in patch labels.
fn label_path(rel_path: &Path) -> String {
    rel_path.to_string_lossy().replace('\\', "/")
}

// ---------------------------------------------------------------------------
// Generator
// ---------------------------------------------------------------------------

/// Reconciles edit trees against baselines and writes patch files.
pub struct PatchGenerator<'a, D: Differ> {
    layout: &'a WorkspaceLayout,
    markers: &'a MarkerSet,
    policy: &'a PathPolicy,
    backup_suffix: &'a str,
    differ: D,
}

impl<'a, D: Differ> PatchGenerator<'a, D> {
    pub fn new(
        layout: &'a WorkspaceLayout,
        markers: &'a MarkerSet,
        policy: &'a PathPolicy,
        backup_suffix: &'a str,
        differ: D,
    ) -> Self {
        Self {
            layout,
            markers,
            policy,
            backup_suffix,
            differ,
        }
    }

    /// Reconcile every project and write its patches.
    pub fn run(&self) -> Result<ExportReport, ReconcileError> {
        let layout = self.layout;
        if !layout.edit_root.is_dir() {
            return Err(ReconcileError::EditRootMissing(layout.edit_root.clone()));
        }
        if !layout.git_root.is_dir() && !layout.local_root.is_dir() {
            return Err(ReconcileError::BaselineRootMissing {
                git: layout.git_root.clone(),
                local: layout.local_root.clone(),
            });
        }

        let mut report = ExportReport::default();
        if !self.any_sentinel(&layout.edit_root)? {
            info!("no sentinel under the working root, nothing to export");
            report.no_sentinels = true;
            return Ok(report);
        }

        let projects = discover(layout, self.backup_suffix).map_err(|source| ReconcileError::Io {
            path: layout.edit_root.clone(),
            source,
        })?;

        for project in projects {
            match project.baseline() {
                Some((source, baseline_dir)) => {
                    info!(project = project.name.as_str(), %source, "reconciling project");
                    let project_report = self.reconcile_project(&project, baseline_dir)?;
                    report.projects.push(project_report);
                }
                None => {
                    if let ProjectStatus::Skipped(reason) = project.status {
                        debug!(project = project.name.as_str(), %reason, "skipping project");
                        report.skipped_projects.push((project.name, reason));
                    }
                }
            }
        }

        info!(
            projects = report.projects.len(),
            patches = report.patch_count(),
            "export complete"
        );
        Ok(report)
    }

    /// Reconcile one project against `baseline_dir`.
    pub fn reconcile_project(
        &self,
        project: &Project,
        baseline_dir: &Path,
    ) -> Result<ProjectReport, ReconcileError> {
        let mut report = ProjectReport {
            name: project.name.clone(),
            ..ProjectReport::default()
        };
        let out_dir = self.layout.output_root.join(&project.name);

        let edit_files = self.relative_files(&project.edit_dir)?;
        for rel in &edit_files {
            let edit_path = project.edit_dir.join(rel);
            let base_path = baseline_dir.join(rel);
            let rendered = if base_path.is_file() {
                self.change_patch(rel, &base_path, &edit_path)
            } else {
                self.add_patch(rel, &edit_path)
            };
            self.record(rendered, rel, &out_dir, &mut report);
        }

        let edit_set: BTreeSet<&PathBuf> = edit_files.iter().collect();
        for rel in self.relative_files(baseline_dir)? {
            if edit_set.contains(&rel) || project.edit_dir.join(&rel).exists() {
                continue;
            }
            let rendered = self.delete_patch(&rel, &baseline_dir.join(&rel));
            self.record(rendered, &rel, &out_dir, &mut report);
        }

        Ok(report)
    }

    // -----------------------------------------------------------------------
    // Patch kinds
    // -----------------------------------------------------------------------

    fn add_patch(&self, rel: &Path, edit_path: &Path) -> Rendered {
        let edit = match read_text(edit_path) {
            Ok(Some(text)) => text,
            Ok(None) => return Rendered::Skip("binary file without baseline".into()),
            Err(e) => return Rendered::Skip(format!("read failed: {}", e)),
        };
        let label = format!("b/{}", label_path(rel));
        Rendered::Patch(
            PatchKind::Add,
            self.differ.unified_diff(b"", &edit, DEV_NULL, &label),
        )
    }

    fn change_patch(&self, rel: &Path, base_path: &Path, edit_path: &Path) -> Rendered {
        let (baseline, edit) = match (read_text(base_path), read_text(edit_path)) {
            (Ok(Some(b)), Ok(Some(e))) => (b, e),
            (Ok(None), _) | (_, Ok(None)) => return Rendered::Skip("binary content".into()),
            (Err(e), _) | (_, Err(e)) => return Rendered::Skip(format!("read failed: {}", e)),
        };

        let reconciled = reconcile_text(&baseline, &edit, self.markers);
        if reconciled.is_unchanged() {
            return Rendered::Unchanged;
        }
        // An empty edit file legitimately removes all content.
        if reconciled.effective.is_empty() && !edit.is_empty() {
            let err = ReconcileError::EmptyOutput(label_path(rel));
            return Rendered::Skip(err.to_string());
        }

        let label = label_path(rel);
        Rendered::Patch(
            PatchKind::Change,
            self.differ.unified_diff(
                &reconciled.baseline,
                &reconciled.effective,
                &format!("a/{}", label),
                &format!("b/{}", label),
            ),
        )
    }

    fn delete_patch(&self, rel: &Path, base_path: &Path) -> Rendered {
        let baseline = match read_text(base_path) {
            Ok(Some(text)) => text,
            Ok(None) => return Rendered::Unchanged,
            Err(e) => return Rendered::Skip(format!("read failed: {}", e)),
        };
        if !contains(&baseline, self.markers.edit_out.as_bytes()) {
            debug!(path = %rel.display(), "baseline-only file without sentinel, no delete patch");
            return Rendered::Unchanged;
        }
        let label = format!("a/{}", label_path(rel));
        Rendered::Patch(
            PatchKind::Delete,
            self.differ.unified_diff(&baseline, b"", &label, DEV_NULL),
        )
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn record(&self, rendered: Rendered, rel: &Path, out_dir: &Path, report: &mut ProjectReport) {
        match rendered {
            Rendered::Unchanged => report.unchanged += 1,
            Rendered::Skip(reason) => {
                warn!(project = report.name.as_str(), path = %rel.display(), reason = reason.as_str(), "skipping file");
                report.skipped.push((rel.to_path_buf(), reason));
            }
            Rendered::Patch(kind, body) => {
                let file = out_dir.join(patch_file_name(rel));
                let written = std::fs::create_dir_all(out_dir)
                    .and_then(|()| std::fs::write(&file, &body));
                match written {
                    Ok(()) => {
                        debug!(path = %rel.display(), %kind, patch = %file.display(), "wrote patch");
                        report.patches.push(PatchRecord {
                            rel_path: rel.to_path_buf(),
                            kind,
                            file,
                        });
                    }
                    Err(e) => {
                        warn!(patch = %file.display(), error = %e, "could not write patch");
                        report
                            .skipped
                            .push((rel.to_path_buf(), format!("patch write failed: {}", e)));
                    }
                }
            }
        }
    }

    /// Files under `dir` that `include` accepts, relative to `dir`, sorted.
    fn walk_files<F>(&self, dir: &Path, include: F) -> Result<Vec<PathBuf>, ReconcileError>
    where
        F: Fn(&Path) -> bool,
    {
        let mut out = Vec::new();
        let walker = WalkDir::new(dir)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !(e.file_type().is_dir() && is_vcs_metadata(&e.file_name().to_string_lossy())));

        for entry in walker {
            let entry = entry.map_err(|e| ReconcileError::Walk {
                path: dir.to_path_buf(),
                detail: e.to_string(),
            })?;
            if entry.file_type().is_dir() {
                continue;
            }
            let rel = match entry.path().strip_prefix(dir) {
                Ok(rel) => rel.to_path_buf(),
                Err(_) => continue,
            };
            if include(&rel) {
                out.push(rel);
            }
        }
        Ok(out)
    }

    /// Included files of one project tree, relative to its root.
    fn relative_files(&self, dir: &Path) -> Result<Vec<PathBuf>, ReconcileError> {
        self.walk_files(dir, |rel| self.policy.evaluate(rel).is_included())
    }

    /// Pre-check: does any included text file under the working root hold the sentinel?
    fn any_sentinel(&self, root: &Path) -> Result<bool, ReconcileError> {
        let files = self.walk_files(root, |rel| {
            self.policy.evaluate_in_workspace(rel).is_included()
        })?;
        for rel in files {
            let path = root.join(&rel);
            match read_text(&path) {
                Ok(Some(text)) if contains(&text, self.markers.edit_out.as_bytes()) => {
                    return Ok(true)
                }
                Ok(_) => {}
                Err(e) => warn!(path = %path.display(), error = %e, "could not read file"),
            }
        }
        Ok(false)
    }
}

/// Result of rendering one file, before anything is written.
enum Rendered {
    Patch(PatchKind, Vec<u8>),
    Unchanged,
    Skip(String),
}
