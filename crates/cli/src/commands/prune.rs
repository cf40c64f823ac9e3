//! `markpatch prune`: rewrite, classify and sweep the working root.

use anyhow::Result;

use markpatch_core::prune::prune_workspace;
use markpatch_core::store::LocalFileStore;

use super::mark::report_validation;
use super::Workspace;
use crate::style;

pub fn run_prune(ws: &Workspace) -> Result<()> {
    let root = &ws.layout.edit_root;
    let policy = ws.config.path_policy();
    let report = match prune_workspace(root, &ws.config.markers, &policy, &LocalFileStore) {
        Ok(report) => report,
        Err(e) => {
            report_validation(&e);
            return Err(e.into());
        }
    };

    println!();
    println!("{}", style::header(&format!("Pruned {}", root.display())));
    if report.wiped {
        println!(
            "{}",
            style::warn("No markers found anywhere; the working tree was cleared")
        );
    }
    println!("  Rewritten      {}", report.rewritten.len());
    println!("  Kept files     {}", report.kept.len());
    println!("  Removed files  {}", report.sweep.files_removed.len());
    println!("  Removed dirs   {}", report.sweep.dirs_removed.len());

    for (path, reason) in &report.skipped {
        println!("{}", style::warn(&format!("{} skipped: {}", path.display(), reason)));
    }
    for (path, reason) in &report.sweep.failures {
        println!(
            "{}",
            style::error(&format!("could not remove {}: {}", path.display(), reason))
        );
    }
    println!();

    if report.sweep.failures.is_empty() {
        Ok(())
    } else {
        anyhow::bail!("{} path(s) could not be removed", report.sweep.failures.len())
    }
}
