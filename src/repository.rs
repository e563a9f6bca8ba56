//! # Version-Control Provider
//!
//! The pipeline never runs git itself. It goes through the [`VcsProvider`]
//! trait, which exposes the two operations the clone and analyze phases need:
//! opening an existing working tree and cloning a URL into a folder.
//!
//! [`GitProvider`] is the default implementation and wraps the system `git`
//! command via the [`crate::git`] helpers. Tests substitute their own
//! provider to simulate clone failures without touching the network.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Trait for version-control operations - allows mocking in tests
pub trait VcsProvider: Send + Sync {
    /// Open the working tree at `path`.
    ///
    /// Fails with [`Error::RepositoryNotFound`] if `path` is not a repository.
    fn open(&self, path: &Path) -> Result<RepositoryHandle>;

    /// Clone `url` into `path` and open the result.
    fn clone_into(&self, url: &str, path: &Path) -> Result<RepositoryHandle>;
}

/// An opened working tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryHandle {
    path: PathBuf,
    head: Option<String>,
}

impl RepositoryHandle {
    pub fn new(path: impl Into<PathBuf>, head: Option<String>) -> Self {
        Self {
            path: path.into(),
            head,
        }
    }

    /// Absolute path of the working tree.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Commit checked out when the handle was opened.
    pub fn head(&self) -> Option<&str> {
        self.head.as_deref()
    }
}

/// The default implementation of `VcsProvider`, which uses the system's
/// `git` command.
#[derive(Debug, Clone, Copy, Default)]
pub struct GitProvider;

impl VcsProvider for GitProvider {
    fn open(&self, path: &Path) -> Result<RepositoryHandle> {
        if !crate::git::is_work_tree(path) {
            return Err(Error::RepositoryNotFound {
                path: path.display().to_string(),
            });
        }
        Ok(RepositoryHandle::new(path, crate::git::head_commit(path)))
    }

    fn clone_into(&self, url: &str, path: &Path) -> Result<RepositoryHandle> {
        crate::git::clone(url, path)?;
        self.open(path)
    }
}
