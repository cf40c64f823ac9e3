//! Git-backed baseline fetcher via `git2`.

use std::path::{Path, PathBuf};

use git2::{FetchOptions, Repository, ResetType};
use tracing::{debug, info, instrument};

use crate::errors::FetchError;

use super::BaselineFetcher;

/// Directory name for a repository URL: its last path segment without `.git`.
///
/// Works for `https://host/org/repo.git`, `git@host:org/repo.git` and plain
/// filesystem paths.
pub fn repo_dir_name(url: &str) -> Result<String, FetchError> {
    let trimmed = url.trim().trim_end_matches(['/', '\\']);
    let last = trimmed
        .rsplit(['/', '\\', ':'])
        .next()
        .unwrap_or_default();
    let name = last.strip_suffix(".git").unwrap_or(last);
    if name.is_empty() || name == "." || name == ".." {
        return Err(FetchError::BadUrl(url.to_string()));
    }
    Ok(name.to_string())
}

/// Clones repositories, or refreshes existing clones to the remote state.
#[derive(Debug, Clone, Copy, Default)]
pub struct GitFetcher;

impl GitFetcher {
    /// Fetch `origin` and hard-reset the checked-out branch to its remote
    /// counterpart. Local modifications are discarded.
    #[instrument(skip(self), fields(path = %path.display()))]
    fn refresh(&self, path: &Path) -> Result<(), FetchError> {
        let repo = Repository::open(path)?;
        let mut remote = repo.find_remote("origin")?;
        let mut fetch_opts = FetchOptions::new();
        remote.fetch(&[] as &[&str], Some(&mut fetch_opts), None)?;
        debug!("fetch completed");

        let head = repo.head()?;
        let branch = head.shorthand().unwrap_or("HEAD").to_string();
        let target = repo
            .find_reference(&format!("refs/remotes/origin/{}", branch))?
            .peel_to_commit()?;
        repo.reset(target.as_object(), ResetType::Hard, None)?;
        info!(branch = branch.as_str(), sha = %target.id(), "reset to remote");
        Ok(())
    }

    #[instrument(skip(self), fields(path = %path.display()))]
    fn clone_into(&self, url: &str, path: &Path) -> Result<(), FetchError> {
        info!("cloning git repository");
        let mut builder = git2::build::RepoBuilder::new();
        builder.fetch_options(FetchOptions::new());
        builder.clone(url, path)?;
        info!("clone completed");
        Ok(())
    }
}

impl BaselineFetcher for GitFetcher {
    fn fetch(&self, url: &str, dest_root: &Path) -> Result<PathBuf, FetchError> {
        let dest = dest_root.join(repo_dir_name(url)?);
        if dest.join(".git").exists() {
            self.refresh(&dest)?;
        } else {
            std::fs::create_dir_all(dest_root)?;
            self.clone_into(url, &dest)?;
        }
        Ok(dest)
    }
}
