//! Project discovery.
//!
//! A project is a directory directly under the working root. Reconciliation
//! pairs it with a same-named directory under the manual baseline root or,
//! failing that, under the version-control baseline root.

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::WorkspaceLayout;
use crate::path_policy::is_readme;

/// Which baseline root a project's baseline came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaselineSource {
    /// Manually supplied tree.
    Local,
    /// Tree fetched from version control.
    Git,
}

impl fmt::Display for BaselineSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Git => write!(f, "git"),
        }
    }
}

/// Why a project takes no part in reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Its name ends with the backup suffix.
    BackupArtifact,
    /// `<name><suffix>` exists next to it.
    HasBackup,
    /// Neither baseline root has a directory of that name.
    NoBaseline,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BackupArtifact => write!(f, "backup artifact"),
            Self::HasBackup => write!(f, "has a backup sibling"),
            Self::NoBaseline => write!(f, "no baseline"),
        }
    }
}

/// A project directory under the working root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub name: String,
    pub edit_dir: PathBuf,
    pub status: ProjectStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectStatus {
    Ready {
        source: BaselineSource,
        baseline_dir: PathBuf,
    },
    Skipped(SkipReason),
}

impl Project {
    /// Baseline directory, if the project takes part in reconciliation.
    pub fn baseline(&self) -> Option<(BaselineSource, &Path)> {
        match &self.status {
            ProjectStatus::Ready {
                source,
                baseline_dir,
            } => Some((*source, baseline_dir.as_path())),
            ProjectStatus::Skipped(_) => None,
        }
    }
}

/// `true` if `name` is a backup of some other entry.
pub fn is_backup_name(name: &str, suffix: &str) -> bool {
    name.len() > suffix.len() && name.ends_with(suffix)
}

/// List every project under the working root, sorted by name.
pub fn discover(layout: &WorkspaceLayout, suffix: &str) -> std::io::Result<Vec<Project>> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(&layout.edit_root)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if is_readme(&name) {
            continue;
        }
        names.push(name);
    }
    names.sort();

    let projects = names
        .iter()
        .map(|name| {
            let status = project_status(layout, name, suffix);
            debug!(project = name.as_str(), status = ?status, "discovered project");
            Project {
                name: name.clone(),
                edit_dir: layout.edit_root.join(name),
                status,
            }
        })
        .collect();
    Ok(projects)
}

fn project_status(layout: &WorkspaceLayout, name: &str, suffix: &str) -> ProjectStatus {
    if is_backup_name(name, suffix) {
        return ProjectStatus::Skipped(SkipReason::BackupArtifact);
    }
    if layout.edit_root.join(format!("{}{}", name, suffix)).exists() {
        return ProjectStatus::Skipped(SkipReason::HasBackup);
    }

    let local = layout.local_root.join(name);
    if local.is_dir() {
        return ProjectStatus::Ready {
            source: BaselineSource::Local,
            baseline_dir: local,
        };
    }
    let git = layout.git_root.join(name);
    if git.is_dir() {
        return ProjectStatus::Ready {
            source: BaselineSource::Git,
            baseline_dir: git,
        };
    }
    ProjectStatus::Skipped(SkipReason::NoBaseline)
}
