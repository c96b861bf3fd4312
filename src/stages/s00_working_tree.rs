//! Staging root layout: `src`, `obj` and `bin`, plus the run lock.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use fs2::FileExt;

use crate::config::BootstrapConfig;
use crate::error::Result;

/// Lock file guarding a staging root against concurrent runs.
pub const LOCK_FILENAME: &str = ".bootstrap.lock";

/// Create the staging root and its `src`, `obj` and `bin` directories.
/// Existing directories are left alone.
pub fn ensure_working_tree(config: &BootstrapConfig) -> Result<()> {
    for dir in [
        config.staging_root.clone(),
        config.src_dir(),
        config.obj_dir(),
        config.bin_dir(),
    ] {
        if !dir.exists() {
            fs::create_dir_all(&dir)
                .with_context(|| format!("creating staging directory '{}'", dir.display()))?;
        }
    }
    Ok(())
}

/// Exclusive lock on a staging root, released on drop.
#[derive(Debug)]
pub struct StagingLock {
    file: File,
    path: PathBuf,
}

impl StagingLock {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StagingLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

/// Take the staging root lock, failing if another run holds it.
pub fn lock_staging_root(staging_root: &Path) -> Result<StagingLock> {
    let path = staging_root.join(LOCK_FILENAME);
    let file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(&path)
        .with_context(|| format!("creating lock file '{}'", path.display()))?;

    if file.try_lock_exclusive().is_err() {
        drop(file);
        return Err(anyhow!(
            "staging directory '{}' is in use by another bootstrap run (lock: {})",
            staging_root.display(),
            path.display()
        )
        .into());
    }

    Ok(StagingLock { file, path })
}
