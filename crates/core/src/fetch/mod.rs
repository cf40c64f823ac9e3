//! Materializing version-control baselines.
//!
//! The [`BaselineFetcher`] trait is the seam between the workflows and the
//! version-control system. [`GitFetcher`] is the `git2` implementation and
//! [`RepoList`] remembers which repositories the operator has fetched.

pub mod git;
pub mod repo_list;

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::errors::FetchError;

pub use git::{repo_dir_name, GitFetcher};
pub use repo_list::RepoList;

/// Produces a baseline tree for a repository URL under `dest_root`.
pub trait BaselineFetcher {
    /// Clone or refresh `url` and return the project directory.
    fn fetch(&self, url: &str, dest_root: &Path) -> Result<PathBuf, FetchError>;
}

/// Fetch every URL in order. A failure is logged and does not stop the rest.
pub fn fetch_all(
    fetcher: &dyn BaselineFetcher,
    urls: &[String],
    dest_root: &Path,
) -> Vec<(String, Result<PathBuf, FetchError>)> {
    urls.iter()
        .map(|url| {
            let result = fetcher.fetch(url, dest_root);
            match &result {
                Ok(dir) => info!(url = url.as_str(), dir = %dir.display(), "baseline ready"),
                Err(e) => warn!(url = url.as_str(), error = %e, "fetch failed"),
            }
            (url.clone(), result)
        })
        .collect()
}
