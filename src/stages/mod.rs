//! The bootstrap pipeline, one module per stage.
//!
//! - [`s00_working_tree`] - staging root layout and lock
//! - [`s01_payload`] - obtain and unpack the baseline payload
//! - [`s02_sources`] - clone and check out component sources
//! - [`s03_build`] - build native components
//! - [`s04_patch`] - copy build outputs into the baseline
//!
//! Stage completion is not recorded anywhere; it is read back from the
//! filesystem through [`StageCompletionProbe`].

pub mod s00_working_tree;
pub mod s01_payload;
pub mod s02_sources;
pub mod s03_build;
pub mod s04_patch;

use std::path::Path;

use crate::config::BootstrapConfig;
use crate::executor::ReproducibleExecutor;

/// Answers "has this stage already happened?" for each stage that can be
/// skipped on a re-run.
pub trait StageCompletionProbe {
    /// The staging root exists, so this is a re-run.
    fn working_tree_exists(&self, staging_root: &Path) -> bool;

    /// A payload is already present at `path`.
    fn payload_present(&self, path: &Path) -> bool;

    /// A component's sources are already checked out at `source_dir`.
    fn sources_checked_out(&self, source_dir: &Path) -> bool;
}

/// Reads completion state from the real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsProbe;

impl StageCompletionProbe for FsProbe {
    fn working_tree_exists(&self, staging_root: &Path) -> bool {
        staging_root.exists()
    }

    fn payload_present(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn sources_checked_out(&self, source_dir: &Path) -> bool {
        source_dir.exists()
    }
}

/// What every stage borrows from the orchestrator.
pub struct StageContext<'a> {
    pub config: &'a BootstrapConfig,
    pub executor: &'a ReproducibleExecutor,
    pub probe: &'a dyn StageCompletionProbe,
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::BTreeSet;
    use std::path::PathBuf;

    /// Probe with completion state set by the test instead of the filesystem.
    #[derive(Debug, Default)]
    pub(crate) struct FakeProbe {
        pub(crate) working_tree: bool,
        pub(crate) payloads: BTreeSet<PathBuf>,
        pub(crate) checkouts: BTreeSet<PathBuf>,
    }

    impl StageCompletionProbe for FakeProbe {
        fn working_tree_exists(&self, _staging_root: &Path) -> bool {
            self.working_tree
        }

        fn payload_present(&self, path: &Path) -> bool {
            self.payloads.contains(path)
        }

        fn sources_checked_out(&self, source_dir: &Path) -> bool {
            self.checkouts.contains(source_dir)
        }
    }
}
