//! # Workspace Layout
//!
//! A workspace is a directory holding the four persisted artifacts: the
//! marker file, the source list, the structured source log and the pipeline
//! configuration. All four must be present before any pipeline operation may
//! run; their absence means the directory was never initialized.
//!
//! Every artifact is rewritten with [`write_atomic`], which writes a temporary
//! file next to the target and renames it into place, so a crash never leaves
//! a half-written file behind.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use log::debug;
use semver::Version;
use tempfile::NamedTempFile;

use crate::config::Config;
use crate::defaults::{
    CONFIG_FILENAME, MARKER_FILENAME, REPOS_DIRNAME, RESULTS_DIRNAME, SOURCES_FILENAME,
    SOURCE_LOG_FILENAME,
};
use crate::error::{Error, Result};

/// Resolved paths of an initialized workspace.
///
/// The root is made absolute on construction, so every derived path stays
/// valid after the process working directory changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    /// Initialize a new workspace at `root`, creating the directory if needed.
    ///
    /// Fails with [`Error::AlreadyInitialized`] if a marker file is present.
    pub fn init(root: &Path) -> Result<Self> {
        fs::create_dir_all(root)?;
        let workspace = Self {
            root: std::path::absolute(root)?,
        };

        if workspace.marker_path().exists() {
            return Err(Error::AlreadyInitialized {
                path: root.display().to_string(),
            });
        }

        write_atomic(&workspace.sources_path(), "")?;
        write_atomic(&workspace.source_log_path(), "{}\n")?;
        Config::default().save(&workspace.config_path())?;
        // The marker goes last so a partial init is never mistaken for a workspace.
        write_atomic(
            &workspace.marker_path(),
            &format!("{}\n", env!("CARGO_PKG_VERSION")),
        )?;

        debug!("Initialized workspace at {}", root.display());
        Ok(workspace)
    }

    /// Open an existing workspace, verifying that it is initialized and was
    /// created by a compatible version.
    pub fn open(root: &Path) -> Result<Self> {
        let workspace = Self {
            root: std::path::absolute(root)?,
        };

        let required = [
            workspace.marker_path(),
            workspace.sources_path(),
            workspace.source_log_path(),
            workspace.config_path(),
        ];
        if let Some(missing) = required.iter().find(|p| !p.is_file()) {
            debug!("Missing workspace artifact {}", missing.display());
            return Err(Error::NotInitialized {
                path: root.display().to_string(),
            });
        }

        let found = Version::parse(fs::read_to_string(workspace.marker_path())?.trim())?;
        let expected = Version::parse(env!("CARGO_PKG_VERSION"))?;
        if !is_compatible(&found, &expected) {
            return Err(Error::IncompatibleWorkspace {
                found: found.to_string(),
                expected: expected.to_string(),
            });
        }

        Ok(workspace)
    }

    /// Whether `root` holds an initialized workspace.
    pub fn is_initialized(root: &Path) -> bool {
        Self::open(root).is_ok()
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn marker_path(&self) -> PathBuf {
        self.root.join(MARKER_FILENAME)
    }

    pub fn sources_path(&self) -> PathBuf {
        self.root.join(SOURCES_FILENAME)
    }

    pub fn source_log_path(&self) -> PathBuf {
        self.root.join(SOURCE_LOG_FILENAME)
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join(CONFIG_FILENAME)
    }

    pub fn repos_dir(&self) -> PathBuf {
        self.root.join(REPOS_DIRNAME)
    }

    pub fn results_dir(&self) -> PathBuf {
        self.root.join(RESULTS_DIRNAME)
    }

    /// Resolve a workspace-relative path (such as a source folder).
    pub fn resolve(&self, relative: &Path) -> PathBuf {
        self.root.join(relative)
    }
}

/// Same major version, and for `0.x` releases the same minor version.
fn is_compatible(found: &Version, expected: &Version) -> bool {
    found.major == expected.major && (expected.major != 0 || found.minor == expected.minor)
}

/// Replace `path` with `contents` by writing a temporary sibling file and
/// renaming it over the target.
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(contents.as_bytes())?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| Error::Io(e.error))?;
    Ok(())
}
