//! Recreates the test upload area before each suite.
//!
//! Staging only ever removes its own root. Before anything is removed the
//! root is resolved lexically and refused when it is empty, is a filesystem
//! root, contains a preserved path such as the configuration directory, or
//! overlaps the forum's own upload directory.

use std::fs::{self, DirBuilder};
use std::io;
use std::path::absolute;

use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use thiserror::Error;
use tracing::info;

use seedbed_config::{Config, upload_directories};

const STAGING_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::staging");

/// Errors raised while staging upload directories.
#[derive(Debug, Error)]
pub enum StagingError {
    /// The root cannot be staged without touching data outside the test area.
    #[error("refusing to stage upload root '{path}': {reason}")]
    UnsafeRoot {
        /// Root as configured.
        path: Utf8PathBuf,
        /// Why the root was refused.
        reason: String,
    },
    /// A path could not be made absolute.
    #[error("failed to resolve '{path}': {source}")]
    Resolve {
        /// Path being resolved.
        path: Utf8PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Removing the previous upload tree failed.
    #[error("failed to remove upload root '{path}': {source}")]
    Remove {
        /// Root being removed.
        path: Utf8PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Creating an upload directory failed.
    #[error("failed to create upload directory '{path}': {source}")]
    Create {
        /// Directory being created.
        path: Utf8PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

/// Owns the test upload root and the directories recreated beneath it.
#[derive(Debug, Clone)]
pub struct Stager {
    root: Utf8PathBuf,
    directories: Vec<Utf8PathBuf>,
    preserved: Vec<Utf8PathBuf>,
    disjoint: Vec<Utf8PathBuf>,
}

impl Stager {
    /// Builds a stager for an explicit directory set.
    #[must_use]
    pub fn new(root: impl Into<Utf8PathBuf>, directories: Vec<Utf8PathBuf>) -> Self {
        Self {
            root: root.into(),
            directories,
            preserved: Vec::new(),
            disjoint: Vec::new(),
        }
    }

    /// Stager for the configured test upload root and the standard directory
    /// set. The configuration directory is preserved and the forum's own
    /// upload directory is kept apart from the root.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.test_upload_path(), upload_directories())
            .preserving(config.base_dir())
            .disjoint_from(config.upload_path())
    }

    /// Refuses any root that is `path` or one of its ancestors.
    #[must_use]
    pub fn preserving(mut self, path: impl Into<Utf8PathBuf>) -> Self {
        self.preserved.push(path.into());
        self
    }

    /// Refuses any root that is `path`, lies inside it, or contains it.
    #[must_use]
    pub fn disjoint_from(mut self, path: impl Into<Utf8PathBuf>) -> Self {
        self.disjoint.push(path.into());
        self
    }

    /// Upload root.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        self.root.as_path()
    }

    /// Absolute paths of the staged directories.
    #[must_use]
    pub fn staged_paths(&self) -> Vec<Utf8PathBuf> {
        self.directories
            .iter()
            .map(|directory| self.root.join(directory))
            .collect()
    }

    /// Removes the upload root and recreates every directory empty.
    ///
    /// Removal is unconditional so leftovers from a crashed run are cleared;
    /// a root that does not exist counts as already removed. Nothing is
    /// removed when the root fails [`Stager::check_root`].
    pub fn stage(&self) -> Result<(), StagingError> {
        self.check_root()?;

        match fs::remove_dir_all(&self.root) {
            Ok(()) => {}
            Err(error) if error.kind() == io::ErrorKind::NotFound => {}
            Err(source) => {
                return Err(StagingError::Remove {
                    path: self.root.clone(),
                    source,
                });
            }
        }

        let mut builder = DirBuilder::new();
        builder.recursive(true);
        for path in self.staged_paths() {
            builder
                .create(&path)
                .map_err(|source| StagingError::Create { path, source })?;
        }

        info!(
            target: STAGING_TARGET,
            root = %self.root,
            directories = self.directories.len(),
            "upload directories staged"
        );
        Ok(())
    }

    /// Verifies the root stays inside a test-only area.
    ///
    /// Paths are compared after lexical normalisation; symbolic links are not
    /// followed.
    pub fn check_root(&self) -> Result<(), StagingError> {
        if self.root.as_str().trim().is_empty() {
            return Err(self.unsafe_root("the path is empty"));
        }
        let root = normalise(&self.root)?;
        if root.parent().is_none() {
            return Err(self.unsafe_root("it is a filesystem root"));
        }
        for kept in &self.preserved {
            let kept = normalise(kept)?;
            if kept.starts_with(&root) {
                return Err(self.unsafe_root(format!("removing it would delete '{kept}'")));
            }
        }
        for other in &self.disjoint {
            let other = normalise(other)?;
            if other.starts_with(&root) || root.starts_with(&other) {
                return Err(self.unsafe_root(format!("it overlaps '{other}'")));
            }
        }
        Ok(())
    }

    fn unsafe_root(&self, reason: impl Into<String>) -> StagingError {
        StagingError::UnsafeRoot {
            path: self.root.clone(),
            reason: reason.into(),
        }
    }
}

fn normalise(path: &Utf8Path) -> Result<Utf8PathBuf, StagingError> {
    let resolve = |source| StagingError::Resolve {
        path: path.to_path_buf(),
        source,
    };
    let resolved = absolute(path).map_err(resolve)?;
    let resolved = Utf8PathBuf::from_path_buf(resolved).map_err(|_| {
        resolve(io::Error::new(
            io::ErrorKind::InvalidData,
            "path is not valid UTF-8",
        ))
    })?;

    let mut normalised = Utf8PathBuf::new();
    for component in resolved.components() {
        match component {
            Utf8Component::CurDir => {}
            Utf8Component::ParentDir => {
                normalised.pop();
            }
            other => normalised.push(other.as_str()),
        }
    }
    Ok(normalised)
}
