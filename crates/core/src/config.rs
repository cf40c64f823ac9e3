//! Configuration for markpatch.
//!
//! Loaded from a TOML file (`markpatch.toml` by default). Every section is
//! optional: a missing file or a missing key falls back to the fixed
//! default layout next to the config file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::ConfigError;
use crate::markers::MarkerSet;
use crate::path_policy::PathPolicy;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Tree locations.
    #[serde(default)]
    pub paths: PathsConfig,

    /// Marker tokens.
    #[serde(default)]
    pub markers: MarkerSet,

    /// Backup naming.
    #[serde(default)]
    pub backup: BackupConfig,

    /// Workflow options.
    #[serde(default)]
    pub options: OptionsConfig,
}

// ---------------------------------------------------------------------------
// Paths
// ---------------------------------------------------------------------------

/// Locations of the working root, baseline roots, output root and the
/// remembered-repository list. Relative paths are resolved against the
/// directory holding the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Working root: one subdirectory per project.
    #[serde(default = "default_edit_root")]
    pub edit_root: PathBuf,

    /// Baseline root materialized from version control.
    #[serde(default = "default_git_root")]
    pub git_root: PathBuf,

    /// Manually supplied baseline root.
    #[serde(default = "default_local_root")]
    pub local_root: PathBuf,

    /// Where generated patches are written.
    #[serde(default = "default_output_root")]
    pub output_root: PathBuf,

    /// One repository URL per line.
    #[serde(default = "default_repos_file")]
    pub repos_file: PathBuf,
}

fn default_edit_root() -> PathBuf {
    PathBuf::from("edit")
}

fn default_git_root() -> PathBuf {
    PathBuf::from("git")
}

fn default_local_root() -> PathBuf {
    PathBuf::from("local")
}

fn default_output_root() -> PathBuf {
    PathBuf::from("patches")
}

fn default_repos_file() -> PathBuf {
    PathBuf::from("repos.txt")
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            edit_root: default_edit_root(),
            git_root: default_git_root(),
            local_root: default_local_root(),
            output_root: default_output_root(),
            repos_file: default_repos_file(),
        }
    }
}

// ---------------------------------------------------------------------------
// Backup
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupConfig {
    /// Appended to a top-level entry name to mark a pristine snapshot.
    #[serde(default = "default_backup_suffix")]
    pub suffix: String,
}

fn default_backup_suffix() -> String {
    "_backup".into()
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            suffix: default_backup_suffix(),
        }
    }
}

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OptionsConfig {
    /// Glob patterns (project-relative) excluded from prune and export.
    #[serde(default)]
    pub ignore_patterns: Vec<String>,
}

// ---------------------------------------------------------------------------
// Resolved layout
// ---------------------------------------------------------------------------

/// Absolute-or-base-relative paths after resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceLayout {
    pub edit_root: PathBuf,
    pub git_root: PathBuf,
    pub local_root: PathBuf,
    pub output_root: PathBuf,
    pub repos_file: PathBuf,
}

// ---------------------------------------------------------------------------
// Loading & validation
// ---------------------------------------------------------------------------

impl AppConfig {
    /// Load an [`AppConfig`] from a TOML file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading configuration");

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        debug!("configuration parsed successfully");
        Ok(config)
    }

    /// Load `path` if it exists, otherwise use defaults. Always validates.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let config = if path.exists() {
            Self::load_from_file(path)?
        } else {
            debug!(path = %path.display(), "no config file, using defaults");
            Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate that all fields are sane.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.markers
            .check()
            .map_err(|e| ConfigError::InvalidValue {
                field: "markers".into(),
                detail: e.to_string(),
            })?;

        if self.backup.suffix.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "backup.suffix".into(),
                detail: "backup suffix must not be empty".into(),
            });
        }
        if self.backup.suffix.contains('/') || self.backup.suffix.contains('\\') {
            return Err(ConfigError::InvalidValue {
                field: "backup.suffix".into(),
                detail: "backup suffix must not contain a path separator".into(),
            });
        }

        let paths = [
            ("paths.edit_root", &self.paths.edit_root),
            ("paths.git_root", &self.paths.git_root),
            ("paths.local_root", &self.paths.local_root),
            ("paths.output_root", &self.paths.output_root),
        ];
        for (field, p) in paths {
            if p.as_os_str().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: field.into(),
                    detail: "path must not be empty".into(),
                });
            }
        }
        for (i, (field_a, a)) in paths.iter().enumerate() {
            for (field_b, b) in paths.iter().skip(i + 1) {
                if a == b {
                    return Err(ConfigError::InvalidValue {
                        field: field_b.to_string(),
                        detail: format!("must differ from {}", field_a),
                    });
                }
            }
        }

        Ok(())
    }

    /// Resolve relative paths against `base` (normally the config file's directory).
    pub fn resolve_paths(&self, base: &Path) -> WorkspaceLayout {
        let resolve = |p: &Path| {
            if p.is_absolute() {
                p.to_path_buf()
            } else {
                base.join(p)
            }
        };
        WorkspaceLayout {
            edit_root: resolve(&self.paths.edit_root),
            git_root: resolve(&self.paths.git_root),
            local_root: resolve(&self.paths.local_root),
            output_root: resolve(&self.paths.output_root),
            repos_file: resolve(&self.paths.repos_file),
        }
    }

    /// The path policy described by `[options]`.
    pub fn path_policy(&self) -> PathPolicy {
        PathPolicy::new(self.options.ignore_patterns.clone())
    }

    /// Generate a default TOML config template string.
    pub fn default_template() -> &'static str {
        r###"# markpatch configuration
# Relative paths are resolved against the directory holding this file.

[paths]
edit_root = "edit"
git_root = "git"
local_root = "local"
output_root = "patches"
repos_file = "repos.txt"

[markers]
in = "##edit-in##"
out = "##edit-out##"
sel_start = "##edit-start##"
sel_end = "##edit-end##"

[backup]
suffix = "_backup"

[options]
# ignore_patterns = ["build/**", "*.o"]
"###
    }
}
