//! Repro scripts for failed commands.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// File name of the repro script written into a failed command's directory.
pub const REPRO_FILENAME: &str = "bootstrap-failure-repro.sh";

const INTERPRETER_LINE: &str = "#!/usr/bin/env bash";

/// Render the repro script body for `command`.
pub fn render(command: &str) -> String {
    format!("{INTERPRETER_LINE}\n{command}\n")
}

/// Write a repro script for `command` into `working_dir`, replacing any
/// previous one. Marked executable when `executable` is set.
pub fn write_repro(working_dir: &Path, command: &str, executable: bool) -> Result<PathBuf> {
    let path = working_dir.join(REPRO_FILENAME);
    fs::write(&path, render(command))
        .with_context(|| format!("writing repro script '{}'", path.display()))?;
    if executable {
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
            .with_context(|| format!("marking repro script '{}' executable", path.display()))?;
    }
    Ok(path)
}

/// Whether this process runs with root privileges.
pub fn running_as_root() -> bool {
    // SAFETY: geteuid has no preconditions and cannot fail.
    unsafe { libc::geteuid() == 0 }
}
