//! The remembered-repository list: one URL per line, in the order added.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::errors::FetchError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoList {
    path: PathBuf,
    urls: Vec<String>,
}

impl RepoList {
    /// Load the list at `path`. A missing file is an empty list.
    ///
    /// Blank lines and `#` comments are ignored; repeated URLs keep their
    /// first position.
    pub fn load(path: &Path) -> Result<Self, FetchError> {
        let mut list = Self {
            path: path.to_path_buf(),
            urls: Vec::new(),
        };
        if !path.exists() {
            debug!(path = %path.display(), "no repository list yet");
            return Ok(list);
        }
        let contents = std::fs::read_to_string(path)?;
        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            list.add(line);
        }
        Ok(list)
    }

    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    /// Append `url` unless it is already listed. Returns `true` if added.
    pub fn add(&mut self, url: &str) -> bool {
        let url = url.trim();
        if url.is_empty() || self.urls.iter().any(|u| u == url) {
            return false;
        }
        self.urls.push(url.to_string());
        true
    }

    /// Write the list back to its file.
    pub fn save(&self) -> Result<(), FetchError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let mut contents = self.urls.join("\n");
        if !contents.is_empty() {
            contents.push('\n');
        }
        std::fs::write(&self.path, contents)?;
        debug!(path = %self.path.display(), count = self.urls.len(), "saved repository list");
        Ok(())
    }
}
