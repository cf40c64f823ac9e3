//! Path policy shared by pruning and patch export.
//!
//! Provides [`PathPolicy`] which decides, for a path relative to a project
//! (or the working root), whether the marker workflows should look at it.
//!
//! # Decision model
//!
//! | Condition | Decision |
//! |-----------|----------|
//! | Any component is a VCS metadata directory | `VcsMetadata` |
//! | File name starts with `readme` (any case) | `Readme` |
//! | Path matches a configured ignore glob | `Ignored` |
//! | None of the above | `Include` |

use std::path::Path;

use tracing::debug;

/// Directory names holding version-control metadata.
pub const VCS_METADATA_DIRS: &[&str] = &[".git", ".svn", ".hg"];

// ---------------------------------------------------------------------------
// Decision enum
// ---------------------------------------------------------------------------

/// The outcome of evaluating a path against the policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathDecision {
    /// Normal file, subject to every rule.
    Include,
    /// README file: kept when pruning, never diffed.
    Readme,
    /// Inside `.git` / `.svn` / `.hg`: never touched.
    VcsMetadata,
    /// Matches a user ignore glob.
    Ignored { pattern: String },
}

impl PathDecision {
    /// `true` if the file takes part in rewrite, retention and diffing.
    pub fn is_included(&self) -> bool {
        matches!(self, Self::Include)
    }

    /// Short human-readable label for logging.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Include => "include",
            Self::Readme => "readme",
            Self::VcsMetadata => "vcs-metadata",
            Self::Ignored { .. } => "ignored",
        }
    }
}

/// `true` if a base name starts with "readme", ignoring case.
pub fn is_readme(name: &str) -> bool {
    name.get(..6)
        .map(|p| p.eq_ignore_ascii_case("readme"))
        .unwrap_or(false)
}

/// `true` if a directory name is VCS metadata.
pub fn is_vcs_metadata(name: &str) -> bool {
    VCS_METADATA_DIRS.contains(&name)
}

// ---------------------------------------------------------------------------
// PathPolicy
// ---------------------------------------------------------------------------

/// Evaluates relative paths against the README rule, VCS exclusions and
/// ignore globs.
#[derive(Debug, Clone, Default)]
pub struct PathPolicy {
    /// Glob patterns to exclude, matched against the forward-slash relative path.
    ignore_patterns: Vec<String>,
}

impl PathPolicy {
    pub fn new(ignore_patterns: Vec<String>) -> Self {
        Self { ignore_patterns }
    }

    /// Evaluate a path relative to its tree root.
    pub fn evaluate(&self, rel_path: &Path) -> PathDecision {
        let mut last = None;
        for component in rel_path.components() {
            let name = component.as_os_str().to_string_lossy();
            if is_vcs_metadata(&name) {
                return PathDecision::VcsMetadata;
            }
            last = Some(name);
        }

        if let Some(name) = last {
            if is_readme(&name) {
                return PathDecision::Readme;
            }
        }

        let normalized = rel_path.to_string_lossy().replace('\\', "/");
        for pattern in &self.ignore_patterns {
            if glob_match::glob_match(&pattern.replace('\\', "/"), &normalized) {
                debug!(path = %normalized, pattern = pattern.as_str(), "path matches ignore pattern");
                return PathDecision::Ignored {
                    pattern: pattern.clone(),
                };
            }
        }

        PathDecision::Include
    }

    /// Evaluate a path relative to the working root.
    ///
    /// The first component names the project, so ignore globs are matched
    /// against the remainder, exactly as they are for a project's own tree.
    /// Files directly under the working root belong to no project and are
    /// evaluated as they are.
    pub fn evaluate_in_workspace(&self, rel_path: &Path) -> PathDecision {
        let mut components = rel_path.components();
        match components.next() {
            Some(first) if is_vcs_metadata(&first.as_os_str().to_string_lossy()) => {
                PathDecision::VcsMetadata
            }
            Some(_) if !components.as_path().as_os_str().is_empty() => {
                self.evaluate(components.as_path())
            }
            _ => self.evaluate(rel_path),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_include_by_default() {
        let policy = PathPolicy::default();
        let d = policy.evaluate(Path::new("src/main.c"));
        assert_eq!(d, PathDecision::Include);
        assert!(d.is_included());
        assert_eq!(d.label(), "include");
    }

    #[test]
    fn test_readme_any_case_any_suffix() {
        let policy = PathPolicy::default();
        assert_eq!(policy.evaluate(Path::new("README.md")), PathDecision::Readme);
        assert_eq!(policy.evaluate(Path::new("doc/ReadMe")), PathDecision::Readme);
        assert_eq!(policy.evaluate(Path::new("readme_old.txt")), PathDecision::Readme);
        assert_eq!(policy.evaluate(Path::new("read.me")), PathDecision::Include);
        assert_eq!(policy.evaluate(Path::new("my_readme")), PathDecision::Include);
    }

    #[test]
    fn test_vcs_metadata_anywhere_in_path() {
        let policy = PathPolicy::default();
        assert_eq!(
            policy.evaluate(Path::new(".git/config")),
            PathDecision::VcsMetadata
        );
        assert_eq!(
            policy.evaluate(Path::new("vendor/lib/.svn/entries")),
            PathDecision::VcsMetadata
        );
        assert_eq!(
            policy.evaluate(Path::new(".gitignore")),
            PathDecision::Include
        );
    }

    #[test]
    fn test_ignore_patterns() {
        let policy = PathPolicy::new(vec!["build/**".into(), "*.o".into()]);
        assert!(matches!(
            policy.evaluate(Path::new("build/out/x.c")),
            PathDecision::Ignored { .. }
        ));
        assert!(matches!(
            policy.evaluate(Path::new("main.o")),
            PathDecision::Ignored { .. }
        ));
        assert!(policy.evaluate(Path::new("src/main.c")).is_included());
    }

    #[test]
    fn test_workspace_paths_match_globs_per_project() {
        let policy = PathPolicy::new(vec!["build/**".into(), "*.o".into()]);
        assert!(matches!(
            policy.evaluate_in_workspace(Path::new("p/build/gen.c")),
            PathDecision::Ignored { .. }
        ));
        assert!(policy
            .evaluate_in_workspace(Path::new("build/gen.c"))
            .is_included());
        assert!(matches!(
            policy.evaluate_in_workspace(Path::new("main.o")),
            PathDecision::Ignored { .. }
        ));
        assert_eq!(
            policy.evaluate_in_workspace(Path::new(".git/HEAD")),
            PathDecision::VcsMetadata
        );
        assert_eq!(
            policy.evaluate_in_workspace(Path::new("p/README")),
            PathDecision::Readme
        );
    }

    #[test]
    fn test_vcs_checked_before_readme() {
        let policy = PathPolicy::default();
        assert_eq!(
            policy.evaluate(Path::new(".git/README")),
            PathDecision::VcsMetadata
        );
    }

    #[test]
    fn test_is_readme_handles_short_and_multibyte_names() {
        assert!(!is_readme("read"));
        assert!(!is_readme("r\u{e9}adme"));
        assert!(is_readme("README"));
    }
}
