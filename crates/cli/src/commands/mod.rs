//! Subcommand implementations.

pub mod backup;
pub mod export;
pub mod fetch;
pub mod init;
pub mod mark;
pub mod projects;
pub mod prune;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use markpatch_core::config::{AppConfig, WorkspaceLayout};

/// Loaded configuration plus the tree locations it resolves to.
pub struct Workspace {
    pub config: AppConfig,
    pub layout: WorkspaceLayout,
}

impl Workspace {
    /// Load `config_path` (or defaults when it is absent) and resolve paths
    /// against the directory holding it.
    pub fn load(config_path: &Path) -> Result<Self> {
        let config = AppConfig::load_or_default(config_path)
            .with_context(|| format!("failed to load configuration from {}", config_path.display()))?;
        let base = config_base(config_path);
        let layout = config.resolve_paths(&base);
        debug!(base = %base.display(), edit_root = %layout.edit_root.display(), "workspace resolved");
        Ok(Self { config, layout })
    }
}

fn config_base(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
