//! Single-flight guard for decision cycles sharing one output directory.

use crate::domain::error::GlidepathError;
use std::fs::{self, File, OpenOptions};
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const LOCK_FILE_NAME: &str = ".glidepath.lock";

/// Held for the duration of one cycle; the lock file is removed on drop.
#[derive(Debug)]
pub struct RunLock {
    path: PathBuf,
}

impl RunLock {
    pub fn acquire(output_dir: &Path) -> Result<Self, GlidepathError> {
        Self::acquire_with(output_dir, |file| writeln!(file, "{}", std::process::id()))
    }

    fn acquire_with<F>(output_dir: &Path, stamp: F) -> Result<Self, GlidepathError>
    where
        F: FnOnce(&mut File) -> io::Result<()>,
    {
        fs::create_dir_all(output_dir)?;
        let path = output_dir.join(LOCK_FILE_NAME);
        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(GlidepathError::RunLocked {
                    path: path.display().to_string(),
                });
            }
            Err(e) => return Err(e.into()),
        };
        // Owned from here on, so a failed stamp still removes the file.
        let lock = Self { path };
        stamp(&mut file)?;
        debug!(path = %lock.path.display(), "run lock acquired");
        Ok(lock)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            warn!(path = %self.path.display(), error = %e, "failed to release run lock");
        }
    }
}
