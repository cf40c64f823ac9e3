//! `markpatch init`: write the default configuration.

use std::path::Path;

use anyhow::{Context, Result};

use markpatch_core::config::AppConfig;

use crate::style;

pub fn run_init(output: &Path) -> Result<()> {
    if output.exists() {
        anyhow::bail!(
            "file already exists: {}. Use a different path or remove the existing file.",
            output.display()
        );
    }

    std::fs::write(output, AppConfig::default_template()).context("failed to write config file")?;

    println!(
        "{}",
        style::success(&format!("Default configuration written to {}", output.display()))
    );
    println!();
    println!("Next steps:");
    println!("  1. Adjust the paths and markers in the config file");
    println!("  2. Fetch baselines with: markpatch fetch <URL>");
    println!("  3. Mark files, then run: markpatch prune");
    Ok(())
}
