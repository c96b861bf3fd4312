//! Unpacking the baseline payload.

use std::path::Path;

use crate::error::Result;
use crate::executor::ReproducibleExecutor;
use crate::state::RunState;

/// Something that can unpack `archive` into `destination`.
pub trait ArchiveUnpacker {
    fn unpack(
        &self,
        executor: &ReproducibleExecutor,
        state: &mut RunState,
        archive: &Path,
        destination: &Path,
    ) -> Result<()>;
}

/// Unpacks with `tar xf`, which detects the compression itself.
///
/// Runs from the archive's directory, so a repro script for a failed
/// extraction lands next to the payload.
#[derive(Debug, Clone, Copy, Default)]
pub struct TarUnpacker;

impl TarUnpacker {
    pub fn command(archive: &Path, destination: &Path) -> String {
        format!(
            "tar xf {} -C {}",
            shell_words::quote(&archive.display().to_string()),
            shell_words::quote(&destination.display().to_string()),
        )
    }
}

impl ArchiveUnpacker for TarUnpacker {
    fn unpack(
        &self,
        executor: &ReproducibleExecutor,
        state: &mut RunState,
        archive: &Path,
        destination: &Path,
    ) -> Result<()> {
        executor.run(
            state,
            &Self::command(archive, destination),
            archive.parent(),
        )
    }
}
