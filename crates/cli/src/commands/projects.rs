//! `markpatch projects`: list projects and their baselines.

use anyhow::{Context, Result};
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};

use markpatch_core::project::{discover, ProjectStatus};

use super::Workspace;
use crate::style;

pub fn run_projects(ws: &Workspace) -> Result<()> {
    let projects = discover(&ws.layout, &ws.config.backup.suffix).with_context(|| {
        format!(
            "failed to list projects under {}",
            ws.layout.edit_root.display()
        )
    })?;

    if projects.is_empty() {
        println!();
        println!("{}", style::warn("No projects under the working root"));
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Project", "Baseline", "Path"]);

    for p in &projects {
        let (baseline, path) = match &p.status {
            ProjectStatus::Ready {
                source,
                baseline_dir,
            } => (source.to_string(), baseline_dir.display().to_string()),
            ProjectStatus::Skipped(reason) => (format!("skipped: {}", reason), "—".to_string()),
        };
        table.add_row(vec![Cell::new(&p.name), Cell::new(&baseline), Cell::new(&path)]);
    }

    println!();
    println!("{}", table);
    println!();
    Ok(())
}
