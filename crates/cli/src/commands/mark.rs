//! `markpatch mark`: rewrite individual files in place.

use std::path::PathBuf;

use anyhow::Result;

use markpatch_core::errors::PruneError;
use markpatch_core::prune::mark_files;

use super::Workspace;
use crate::style;

pub fn run_mark(ws: &Workspace, files: &[PathBuf]) -> Result<()> {
    let report = match mark_files(files, &ws.config.markers) {
        Ok(report) => report,
        Err(e) => {
            report_validation(&e);
            return Err(e.into());
        }
    };

    for (path, outcome) in &report.outcomes {
        if !outcome.rewritten {
            println!(
                "{}",
                style::dim(&format!("{} has no edit markers, left unchanged", path.display()))
            );
            continue;
        }
        let mut line = format!(
            "{} ({} in, {} out)",
            path.display(),
            outcome.scan.in_count,
            outcome.scan.out_count
        );
        if !outcome.has_content {
            line.push_str(", sentinels only");
        }
        println!("{}", style::success(&line));
    }
    for (path, reason) in &report.skipped {
        println!("{}", style::warn(&format!("{} skipped: {}", path.display(), reason)));
    }
    Ok(())
}

/// Print one line per invalid file before the error reaches `main`.
pub fn report_validation(err: &PruneError) {
    if let PruneError::Validation(errors) = err {
        for e in errors {
            eprintln!("{}", style::error(&e.to_string()));
        }
    }
}
