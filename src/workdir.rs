//! Scoped change of the process working directory.
//!
//! Analyses may resolve relative paths against the current directory, which
//! is process-wide state. [`WorkingDirGuard`] switches into a source's folder
//! for the duration of that source's analysis and switches back when dropped,
//! on success, on error and on early return alike.
//!
//! Only one guard may be alive at a time. Sources are processed strictly one
//! after another, and nesting or sharing guards across threads is rejected.

use std::env;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, error};

use crate::error::{Error, Result};

static ACTIVE: AtomicBool = AtomicBool::new(false);

/// Restores the previous working directory on drop.
#[derive(Debug)]
pub struct WorkingDirGuard {
    original: PathBuf,
}

impl WorkingDirGuard {
    /// Change into `target`, remembering the current directory.
    pub fn enter(target: &Path) -> Result<Self> {
        if ACTIVE.swap(true, Ordering::SeqCst) {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::WouldBlock,
                "another working directory guard is active",
            )));
        }

        let original = match env::current_dir() {
            Ok(dir) => dir,
            Err(e) => {
                ACTIVE.store(false, Ordering::SeqCst);
                return Err(e.into());
            }
        };
        if let Err(e) = env::set_current_dir(target) {
            ACTIVE.store(false, Ordering::SeqCst);
            return Err(e.into());
        }

        debug!("Entered {}", target.display());
        Ok(Self { original })
    }

    /// The directory that will be restored.
    pub fn original(&self) -> &Path {
        &self.original
    }
}

impl Drop for WorkingDirGuard {
    fn drop(&mut self) {
        if let Err(e) = env::set_current_dir(&self.original) {
            error!(
                "Failed to restore working directory {}: {}",
                self.original.display(),
                e
            );
        }
        ACTIVE.store(false, Ordering::SeqCst);
    }
}
