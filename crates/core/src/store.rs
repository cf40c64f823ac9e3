//! File-store collaborator.
//!
//! Every destructive or copying filesystem operation the workflows perform
//! goes through [`FileStore`], so the retention sweep and backups can be
//! exercised against a recording fake in tests.

use std::path::Path;

use tracing::debug;

use crate::errors::StoreError;

/// Copy and delete primitives.
pub trait FileStore {
    /// Copy a file or a whole directory tree, preserving permission bits.
    fn copy(&self, from: &Path, to: &Path) -> Result<(), StoreError>;

    /// Delete one file.
    fn remove_file(&self, path: &Path) -> Result<(), StoreError>;

    /// Remove one empty directory.
    fn remove_dir(&self, path: &Path) -> Result<(), StoreError>;

    /// Remove a file or a directory and everything under it.
    fn remove_all(&self, path: &Path) -> Result<(), StoreError>;
}

/// [`FileStore`] backed by `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileStore;

impl LocalFileStore {
    fn io<'a>(op: &'static str, path: &'a Path) -> impl FnOnce(std::io::Error) -> StoreError + 'a {
        move |source| StoreError::Io {
            op,
            path: path.to_path_buf(),
            source,
        }
    }

    fn copy_tree(&self, src: &Path, dst: &Path) -> Result<(), StoreError> {
        std::fs::create_dir_all(dst).map_err(Self::io("create_dir", dst))?;
        let entries = std::fs::read_dir(src).map_err(Self::io("read_dir", src))?;

        for entry in entries {
            let entry = entry.map_err(Self::io("read_dir", src))?;
            let src_path = entry.path();
            let dst_path = dst.join(entry.file_name());
            let file_type = entry.file_type().map_err(Self::io("stat", &src_path))?;

            if file_type.is_dir() {
                self.copy_tree(&src_path, &dst_path)?;
            } else {
                std::fs::copy(&src_path, &dst_path).map_err(Self::io("copy", &src_path))?;
            }
        }

        let perms = std::fs::metadata(src)
            .map_err(Self::io("stat", src))?
            .permissions();
        std::fs::set_permissions(dst, perms).map_err(Self::io("chmod", dst))?;
        Ok(())
    }
}

impl FileStore for LocalFileStore {
    fn copy(&self, from: &Path, to: &Path) -> Result<(), StoreError> {
        debug!(from = %from.display(), to = %to.display(), "copy");
        if from.is_dir() {
            self.copy_tree(from, to)
        } else {
            if let Some(parent) = to.parent() {
                std::fs::create_dir_all(parent).map_err(Self::io("create_dir", parent))?;
            }
            std::fs::copy(from, to).map_err(Self::io("copy", from))?;
            Ok(())
        }
    }

    fn remove_file(&self, path: &Path) -> Result<(), StoreError> {
        debug!(path = %path.display(), "remove file");
        std::fs::remove_file(path).map_err(Self::io("remove_file", path))
    }

    fn remove_dir(&self, path: &Path) -> Result<(), StoreError> {
        debug!(path = %path.display(), "remove dir");
        std::fs::remove_dir(path).map_err(Self::io("remove_dir", path))
    }

    fn remove_all(&self, path: &Path) -> Result<(), StoreError> {
        debug!(path = %path.display(), "remove tree");
        let meta = std::fs::symlink_metadata(path).map_err(Self::io("stat", path))?;
        if meta.is_dir() {
            std::fs::remove_dir_all(path).map_err(Self::io("remove_dir_all", path))
        } else {
            std::fs::remove_file(path).map_err(Self::io("remove_file", path))
        }
    }
}
