//! `markpatch backup` and `markpatch restore`.

use std::path::Path;

use anyhow::Result;
use dialoguer::Confirm;

use markpatch_core::backup::{backup_entries, restore_entries, BackupReport};
use markpatch_core::store::LocalFileStore;

use super::Workspace;
use crate::style;

#[derive(Debug, Clone, Copy)]
pub enum Direction {
    Backup,
    Restore,
}

pub fn run(ws: &Workspace, direction: Direction, force: bool) -> Result<()> {
    let root = &ws.layout.edit_root;
    let suffix = &ws.config.backup.suffix;
    let mut confirm = |target: &Path| {
        Confirm::new()
            .with_prompt(format!("{} already exists. Overwrite?", target.display()))
            .default(false)
            .interact()
            .unwrap_or(false)
    };

    let report = match direction {
        Direction::Backup => backup_entries(root, suffix, force, &mut confirm, &LocalFileStore)?,
        Direction::Restore => restore_entries(root, suffix, force, &mut confirm, &LocalFileStore)?,
    };
    print_report(direction, &report);
    Ok(())
}

fn print_report(direction: Direction, report: &BackupReport) {
    let verb = match direction {
        Direction::Backup => "backed up",
        Direction::Restore => "restored",
    };
    println!();
    for path in &report.copied {
        println!("{}", style::success(&format!("{} {}", verb, path.display())));
    }
    for path in &report.overwritten {
        println!(
            "{}",
            style::success(&format!("{} {} (overwritten)", verb, path.display()))
        );
    }
    for (path, reason) in &report.skipped {
        println!("{}", style::warn(&format!("{} skipped: {}", path.display(), reason)));
    }
    if report.copied.is_empty() && report.overwritten.is_empty() && report.skipped.is_empty() {
        println!("{}", style::dim("Nothing to do."));
    }
    println!();
}
