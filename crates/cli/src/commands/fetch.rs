//! `markpatch fetch` and `markpatch repos`.

use anyhow::{Context, Result};

use markpatch_core::fetch::{fetch_all, GitFetcher, RepoList};

use super::Workspace;
use crate::style;

/// Clone or refresh one URL (remembering it), or every remembered URL.
pub fn run_fetch(ws: &Workspace, url: Option<&str>) -> Result<()> {
    let mut list = RepoList::load(&ws.layout.repos_file).context("failed to read repository list")?;

    let urls = match url {
        Some(url) => {
            if list.add(url) {
                list.save().context("failed to update repository list")?;
            }
            vec![url.trim().to_string()]
        }
        None => list.urls().to_vec(),
    };
    if urls.is_empty() {
        println!(
            "{}",
            style::warn("No repositories remembered yet. Run 'markpatch fetch <URL>' first.")
        );
        return Ok(());
    }

    let results = fetch_all(&GitFetcher, &urls, &ws.layout.git_root);
    let mut failed = 0;
    for (url, result) in &results {
        match result {
            Ok(dir) => println!("{}", style::success(&format!("{} → {}", url, dir.display()))),
            Err(e) => {
                failed += 1;
                println!("{}", style::error(&format!("{}: {}", url, e)));
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{} of {} fetch(es) failed", failed, results.len());
    }
    Ok(())
}

/// Print the remembered repository URLs.
pub fn run_repos(ws: &Workspace) -> Result<()> {
    let list = RepoList::load(&ws.layout.repos_file).context("failed to read repository list")?;
    if list.is_empty() {
        println!("{}", style::dim("No repositories remembered."));
        return Ok(());
    }
    for url in list.urls() {
        println!("{}", url);
    }
    Ok(())
}
