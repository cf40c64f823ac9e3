//! Backup and restore of top-level working-root entries.
//!
//! A backup of `name` is a full copy at `<name><suffix>` next to it. Projects
//! with a backup sibling are left out of reconciliation, so the backup acts
//! as a pristine snapshot while the operator experiments on the original.
//!
//! README-named entries and VCS metadata are never backed up or restored.
//! An existing target is only replaced when `force` is set and the
//! confirmation callback agrees.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::errors::BackupError;
use crate::path_policy::{is_readme, is_vcs_metadata};
use crate::project::is_backup_name;
use crate::store::FileStore;

/// What happened to each entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackupReport {
    /// Targets created fresh.
    pub copied: Vec<PathBuf>,
    /// Existing targets replaced after confirmation.
    pub overwritten: Vec<PathBuf>,
    /// Targets left alone, with the reason.
    pub skipped: Vec<(PathBuf, String)>,
}

/// Copy every eligible top-level entry of `root` to `<name><suffix>`.
pub fn backup_entries(
    root: &Path,
    suffix: &str,
    force: bool,
    confirm: &mut dyn FnMut(&Path) -> bool,
    store: &dyn FileStore,
) -> Result<BackupReport, BackupError> {
    let mut report = BackupReport::default();
    for name in entry_names(root)? {
        if is_backup_name(&name, suffix) {
            continue;
        }
        let source = root.join(&name);
        let target = root.join(format!("{}{}", name, suffix));
        place(&source, &target, force, confirm, store, &mut report)?;
    }
    info!(
        root = %root.display(),
        copied = report.copied.len(),
        overwritten = report.overwritten.len(),
        skipped = report.skipped.len(),
        "backup complete"
    );
    Ok(report)
}

/// Copy every `<name><suffix>` entry of `root` back over `name`.
///
/// Backups are left in place.
pub fn restore_entries(
    root: &Path,
    suffix: &str,
    force: bool,
    confirm: &mut dyn FnMut(&Path) -> bool,
    store: &dyn FileStore,
) -> Result<BackupReport, BackupError> {
    let mut report = BackupReport::default();
    for name in entry_names(root)? {
        if !is_backup_name(&name, suffix) {
            continue;
        }
        let original = &name[..name.len() - suffix.len()];
        let source = root.join(&name);
        let target = root.join(original);
        place(&source, &target, force, confirm, store, &mut report)?;
    }
    info!(
        root = %root.display(),
        copied = report.copied.len(),
        overwritten = report.overwritten.len(),
        skipped = report.skipped.len(),
        "restore complete"
    );
    Ok(report)
}

/// Sorted top-level names, minus README and VCS metadata entries.
fn entry_names(root: &Path) -> Result<Vec<String>, BackupError> {
    if !root.is_dir() {
        return Err(BackupError::RootMissing(root.to_path_buf()));
    }
    let mut names = Vec::new();
    for entry in std::fs::read_dir(root)? {
        let name = entry?.file_name().to_string_lossy().into_owned();
        if is_readme(&name) || is_vcs_metadata(&name) {
            debug!(name = name.as_str(), "excluded from backup/restore");
            continue;
        }
        names.push(name);
    }
    names.sort();
    Ok(names)
}

fn place(
    source: &Path,
    target: &Path,
    force: bool,
    confirm: &mut dyn FnMut(&Path) -> bool,
    store: &dyn FileStore,
    report: &mut BackupReport,
) -> Result<(), BackupError> {
    if target.exists() {
        if !force {
            debug!(target = %target.display(), "target exists, skipping");
            report
                .skipped
                .push((target.to_path_buf(), "target exists".into()));
            return Ok(());
        }
        if !confirm(target) {
            warn!(target = %target.display(), "overwrite declined");
            report
                .skipped
                .push((target.to_path_buf(), "overwrite declined".into()));
            return Ok(());
        }
        store.remove_all(target)?;
        store.copy(source, target)?;
        report.overwritten.push(target.to_path_buf());
        return Ok(());
    }
    store.copy(source, target)?;
    report.copied.push(target.to_path_buf());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::LocalFileStore;

    fn write(root: &Path, rel: &str, body: &str) {
        let p = root.join(rel);
        std::fs::create_dir_all(p.parent().unwrap()).unwrap();
        std::fs::write(p, body).unwrap();
    }

    fn read(root: &Path, rel: &str) -> String {
        std::fs::read_to_string(root.join(rel)).unwrap()
    }

    #[test]
    fn test_backup_copies_projects_but_not_readme() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "alpha/src/a.c", "a");
        write(root, "notes.txt", "n");
        write(root, "README.md", "r");

        let report =
            backup_entries(root, "_backup", false, &mut |_| true, &LocalFileStore).unwrap();
        assert_eq!(
            report.copied,
            vec![root.join("alpha_backup"), root.join("notes.txt_backup")]
        );
        assert_eq!(read(root, "alpha_backup/src/a.c"), "a");
        assert!(!root.join("README.md_backup").exists());
    }

    #[test]
    fn test_existing_backup_needs_force_and_confirmation() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "alpha/a.c", "new");
        write(root, "alpha_backup/a.c", "old");

        let report =
            backup_entries(root, "_backup", false, &mut |_| true, &LocalFileStore).unwrap();
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(read(root, "alpha_backup/a.c"), "old");

        let report =
            backup_entries(root, "_backup", true, &mut |_| false, &LocalFileStore).unwrap();
        assert_eq!(report.skipped[0].1, "overwrite declined");
        assert_eq!(read(root, "alpha_backup/a.c"), "old");

        let mut asked = Vec::new();
        let report = backup_entries(
            root,
            "_backup",
            true,
            &mut |p| {
                asked.push(p.to_path_buf());
                true
            },
            &LocalFileStore,
        )
        .unwrap();
        assert_eq!(asked, vec![root.join("alpha_backup")]);
        assert_eq!(report.overwritten, vec![root.join("alpha_backup")]);
        assert_eq!(read(root, "alpha_backup/a.c"), "new");
    }

    #[test]
    fn test_forced_overwrite_drops_stale_files() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "alpha/a.c", "a");
        write(root, "alpha_backup/stale.c", "s");

        backup_entries(root, "_backup", true, &mut |_| true, &LocalFileStore).unwrap();
        assert!(!root.join("alpha_backup/stale.c").exists());
    }

    #[test]
    fn test_restore_copies_back_and_keeps_backup() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "alpha_backup/a.c", "pristine");
        write(root, "beta_backup/b.c", "b");
        write(root, "alpha/a.c", "experiment");

        let report =
            restore_entries(root, "_backup", true, &mut |_| true, &LocalFileStore).unwrap();
        assert_eq!(report.copied, vec![root.join("beta")]);
        assert_eq!(report.overwritten, vec![root.join("alpha")]);
        assert_eq!(read(root, "alpha/a.c"), "pristine");
        assert_eq!(read(root, "beta/b.c"), "b");
        assert!(root.join("alpha_backup").exists());
    }

    #[test]
    fn test_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let result = backup_entries(
            &dir.path().join("missing"),
            "_backup",
            false,
            &mut |_| true,
            &LocalFileStore,
        );
        assert!(matches!(result, Err(BackupError::RootMissing(_))));
    }
}
