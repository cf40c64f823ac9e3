//! `markpatch export`: reconcile every project and write patches.

use anyhow::Result;

use markpatch_core::reconcile::{DiffyDiffer, PatchGenerator};

use super::Workspace;
use crate::style;

pub fn run_export(ws: &Workspace) -> Result<()> {
    let policy = ws.config.path_policy();
    let generator = PatchGenerator::new(
        &ws.layout,
        &ws.config.markers,
        &policy,
        &ws.config.backup.suffix,
        DiffyDiffer,
    );
    let report = generator.run()?;

    if report.no_sentinels {
        println!(
            "{}",
            style::warn("No sentinel lines under the working root; nothing to export")
        );
        return Ok(());
    }

    println!();
    for project in &report.projects {
        println!("{}", style::header(&project.name));
        if project.patches.is_empty() {
            println!("  {}", style::dim("no changes"));
        }
        for patch in &project.patches {
            println!(
                "  {:<8} {}",
                style::patch_kind(patch.kind),
                patch.rel_path.display()
            );
        }
        for (path, reason) in &project.skipped {
            println!("  {}", style::warn(&format!("{} skipped: {}", path.display(), reason)));
        }
    }
    for (name, reason) in &report.skipped_projects {
        println!("{}", style::dim(&format!("{} skipped: {}", name, reason)));
    }

    println!();
    println!(
        "{}",
        style::success(&format!(
            "{} patch(es) written to {}",
            report.patch_count(),
            ws.layout.output_root.display()
        ))
    );
    Ok(())
}
