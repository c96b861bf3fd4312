//! Drives one bootstrap run through its stages.
//!
//! ```text
//! Init -> EnsureWorkingTree -> ObtainPayload -> ResolvePatchTargets
//!      -> ExtractIdentity -> CloneAndCheckout -> BuildComponents -> Patch -> Done
//! ```
//!
//! Stages only move forward. The first error ends the run; the run record
//! is marked `failed` and the error is returned to the caller unchanged.

use std::path::PathBuf;

use crate::archive::{ArchiveUnpacker, TarUnpacker};
use crate::component::Component;
use crate::config::BootstrapConfig;
use crate::error::{BootstrapError, Result};
use crate::executor::ReproducibleExecutor;
use crate::fetch::{CurlFetcher, PayloadFetcher};
use crate::identity::BuildIdentity;
use crate::preflight;
use crate::resolve::{resolve_patch_targets, PatchTargetSet};
use crate::stage_runs::{write_run_record, RunRecord, RunStatus};
use crate::stages::s00_working_tree::{ensure_working_tree, lock_staging_root};
use crate::stages::s01_payload::{obtain_payload, ObtainedPayload};
use crate::stages::s02_sources::{clone_and_checkout, SourcesOutcome};
use crate::stages::s03_build::build_components;
use crate::stages::s04_patch::{patch, PatchOutcome};
use crate::stages::{FsProbe, StageCompletionProbe, StageContext};
use crate::state::{Mode, RunState};

/// What a finished run produced.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub run_id: String,
    /// The spawned distribution (`<staging>/bin`).
    pub distribution: PathBuf,
    pub payload: ObtainedPayload,
    pub targets: PatchTargetSet,
    pub identity: BuildIdentity,
    pub sources: SourcesOutcome,
    pub built: Vec<Component>,
    pub patch: PatchOutcome,
    pub mode: Mode,
}

pub struct Orchestrator {
    config: BootstrapConfig,
    executor: ReproducibleExecutor,
    fetcher: Box<dyn PayloadFetcher>,
    unpacker: Box<dyn ArchiveUnpacker>,
    probe: Box<dyn StageCompletionProbe>,
    preflight: bool,
}

impl Orchestrator {
    pub fn new(config: BootstrapConfig, executor: ReproducibleExecutor) -> Self {
        Self {
            config,
            executor,
            fetcher: Box::new(CurlFetcher),
            unpacker: Box::new(TarUnpacker),
            probe: Box::new(FsProbe),
            preflight: true,
        }
    }

    pub fn with_fetcher(mut self, fetcher: impl PayloadFetcher + 'static) -> Self {
        self.fetcher = Box::new(fetcher);
        self
    }

    pub fn with_unpacker(mut self, unpacker: impl ArchiveUnpacker + 'static) -> Self {
        self.unpacker = Box::new(unpacker);
        self
    }

    pub fn with_probe(mut self, probe: impl StageCompletionProbe + 'static) -> Self {
        self.probe = Box::new(probe);
        self
    }

    /// Check host tools before touching the staging root (on by default).
    pub fn with_preflight(mut self, enabled: bool) -> Self {
        self.preflight = enabled;
        self
    }

    pub fn config(&self) -> &BootstrapConfig {
        &self.config
    }

    pub fn run(&self, state: &mut RunState) -> Result<RunSummary> {
        let config = &self.config;

        // Init
        if self.probe.working_tree_exists(&config.staging_root) {
            state.enter_investigation();
            tracing::warn!(
                "{} already exists; running in investigation mode",
                config.staging_root.display()
            );
            tracing::warn!("version control commands are disabled for this run");
            tracing::warn!(
                "delete {} to start over from a clean state",
                config.staging_root.display()
            );
        }

        if self.preflight {
            preflight::check_run_tools(config, state.is_investigating())
                .map_err(|err| BootstrapError::Configuration(format!("{err:#}")))?;
        }

        ensure_working_tree(config)?;
        let _lock = lock_staging_root(&config.staging_root)?;

        let mut record = RunRecord::begin(
            state.mode(),
            config.build_set.iter().map(|c| c.name().to_string()).collect(),
            config.patch,
        )?;
        write_run_record(&config.staging_root, &record)?;
        tracing::debug!(run_id = %record.run_id, "run started");

        match self.run_stages(state, &mut record) {
            Ok(summary) => {
                record.finish(RunStatus::Success, state.mode());
                write_run_record(&config.staging_root, &record)?;
                tracing::info!(
                    "spawned distribution at {}",
                    summary.distribution.display()
                );
                Ok(summary)
            }
            Err(err) => {
                state.enter_investigation();
                record.error = Some(err.to_string());
                record.finish(RunStatus::Failed, state.mode());
                if let Err(write_err) = write_run_record(&config.staging_root, &record) {
                    tracing::warn!("could not mark run record failed: {write_err}");
                }
                Err(err)
            }
        }
    }

    fn run_stages(&self, state: &mut RunState, record: &mut RunRecord) -> Result<RunSummary> {
        let ctx = StageContext {
            config: &self.config,
            executor: &self.executor,
            probe: self.probe.as_ref(),
        };

        let payload = obtain_payload(&ctx, self.fetcher.as_ref(), self.unpacker.as_ref(), state)?;
        record.payload_sha256 = Some(payload.sha256.clone());

        let distribution = self.config.bin_dir();
        let targets = resolve_patch_targets(&distribution, &self.config.layout)?;
        for (label, dir) in targets.labeled() {
            tracing::info!("{label} target: {}", dir.display());
        }

        let identity = BuildIdentity::extract(&targets.shared)?;
        tracing::info!(
            runtime = %identity.runtime,
            libraries = %identity.libraries,
            host = %identity.host,
            "baseline build identity"
        );
        record.identity = Some(identity.clone());

        let sources = clone_and_checkout(&ctx, &identity, state)?;
        let built = build_components(&ctx, &identity, state)?;
        let patched = patch(&ctx, &targets, state)?;

        Ok(RunSummary {
            run_id: record.run_id.clone(),
            distribution,
            payload,
            targets,
            identity,
            sources,
            built,
            patch: patched,
            mode: state.mode(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OsIdentity;
    use crate::executor::repro::REPRO_FILENAME;
    use crate::executor::testing::RecordingRunner;
    use crate::identity::fixtures::{host_with_commit, library_with_commit};
    use crate::stage_runs::load_run_record;
    use crate::stages::s01_payload::PayloadSource;
    use crate::stages::s04_patch::fixtures::fake_build_outputs;
    use std::cell::Cell;
    use std::fs;
    use std::path::Path;
    use std::rc::Rc;
    use tempfile::TempDir;

    const CORECLR: &str = "1111111111111111111111111111111111111111";
    const COREFX: &str = "2222222222222222222222222222222222222222";
    const HOST: &str = "3333333333333333333333333333333333333333";

    /// Writes a prepared archive and counts how often it was asked to.
    #[derive(Clone)]
    struct FixtureFetcher {
        calls: Rc<Cell<usize>>,
        archive: Vec<u8>,
    }

    impl PayloadFetcher for FixtureFetcher {
        fn fetch(
            &self,
            _executor: &ReproducibleExecutor,
            _state: &mut RunState,
            _url: &str,
            destination: &Path,
        ) -> Result<()> {
            self.calls.set(self.calls.get() + 1);
            fs::write(destination, &self.archive).unwrap();
            Ok(())
        }
    }

    /// A distribution with two framework versions and one sdk.
    fn payload_archive() -> Vec<u8> {
        let files: Vec<(&str, Vec<u8>)> = vec![
            ("dotnet", b"old host".to_vec()),
            (
                "shared/Microsoft.NETCore.App/1.0.0-rc2-002416/libcoreclr.so",
                library_with_commit("0000000000000000000000000000000000000000"),
            ),
            (
                "shared/Microsoft.NETCore.App/1.0.0/libcoreclr.so",
                library_with_commit(CORECLR),
            ),
            (
                "shared/Microsoft.NETCore.App/1.0.0/System.Native.so",
                library_with_commit(COREFX),
            ),
            (
                "shared/Microsoft.NETCore.App/1.0.0/dotnet",
                host_with_commit(HOST),
            ),
            ("sdk/1.0.0-preview2-003121/dotnet.dll", b"sdk".to_vec()),
            ("host/fxr/1.0.0/libhostfxr.so", b"fxr".to_vec()),
        ];
        let mut builder = tar::Builder::new(Vec::new());
        for (name, data) in files {
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append_data(&mut header, name, data.as_slice()).unwrap();
        }
        builder.into_inner().unwrap()
    }

    fn config(launch: &Path) -> BootstrapConfig {
        BootstrapConfig::new(
            OsIdentity {
                id: "debian".into(),
                version_id: "8".into(),
            },
            launch.to_path_buf(),
        )
    }

    fn fetcher() -> FixtureFetcher {
        FixtureFetcher {
            calls: Rc::new(Cell::new(0)),
            archive: payload_archive(),
        }
    }

    /// Staging root left behind by an earlier run: cached payload and
    /// built outputs for every component.
    fn previous_run(config: &BootstrapConfig) {
        fs::create_dir_all(config.obj_dir()).unwrap();
        fs::write(config.cached_payload_path(), payload_archive()).unwrap();
        fake_build_outputs(&config.src_dir());
    }

    #[test]
    fn test_fresh_run_without_builds() {
        let temp = TempDir::new().unwrap();
        let config = config(temp.path()).with_build_set(&[]).with_patch(false);
        let fetcher = fetcher();
        let runner = RecordingRunner::default();
        let executor = ReproducibleExecutor::new(runner.clone());
        let orchestrator = Orchestrator::new(config.clone(), executor)
            .with_fetcher(fetcher.clone())
            .with_preflight(false);
        let mut state = RunState::new();

        let summary = orchestrator.run(&mut state).unwrap();

        assert_eq!(fetcher.calls.get(), 1);
        assert_eq!(summary.payload.source, PayloadSource::Fetched);
        assert_eq!(summary.mode, Mode::Normal);
        assert_eq!(summary.sources, SourcesOutcome::Ready);
        assert!(summary.built.is_empty());
        assert_eq!(summary.patch, PatchOutcome::Disabled);
        assert_eq!(
            summary.identity,
            BuildIdentity {
                runtime: CORECLR.into(),
                libraries: COREFX.into(),
                host: HOST.into(),
            }
        );
        assert!(summary
            .targets
            .shared
            .ends_with("shared/Microsoft.NETCore.App/1.0.0"));
        assert!(summary.targets.sdk.ends_with("sdk/1.0.0-preview2-003121"));
        assert!(summary.targets.host.ends_with("host/fxr/1.0.0"));
        assert!(runner.commands().iter().all(|c| c.starts_with("tar ")));

        let record = load_run_record(&config.staging_root).unwrap().unwrap();
        assert_eq!(record.status, RunStatus::Success);
        assert_eq!(record.run_id, summary.run_id);
        assert_eq!(
            record.payload_sha256.as_deref(),
            Some(summary.payload.sha256.as_str())
        );
    }

    #[test]
    fn test_existing_staging_root_skips_git_and_patches() {
        let temp = TempDir::new().unwrap();
        let config = config(temp.path());
        previous_run(&config);
        let fetcher = fetcher();
        let runner = RecordingRunner::default()
            .stub("git")
            .stub("./")
            .stub("make");
        let executor = ReproducibleExecutor::new(runner.clone());
        let orchestrator = Orchestrator::new(config.clone(), executor)
            .with_fetcher(fetcher.clone())
            .with_preflight(false);
        let mut state = RunState::new();

        let summary = orchestrator.run(&mut state).unwrap();

        assert!(state.is_investigating());
        assert_eq!(fetcher.calls.get(), 0);
        assert_eq!(summary.payload.source, PayloadSource::Cached);
        assert_eq!(summary.sources, SourcesOutcome::Skipped);
        assert_eq!(summary.built, Component::ALL);
        assert_eq!(summary.patch, PatchOutcome::Patched);

        let commands = runner.commands();
        assert!(commands.iter().all(|c| !c.starts_with("git")));
        assert!(commands.iter().any(|c| c.starts_with("cp ")));

        let shared = &summary.targets.shared;
        assert_eq!(fs::read(shared.join("libuv.so")).unwrap(), b"libuv.so");
        assert_eq!(fs::read(shared.join("libcoreclr.so")).unwrap(), b"libcoreclr.so");
        assert_eq!(fs::read(summary.distribution.join("dotnet")).unwrap(), b"dotnet");
        assert!(summary.targets.host.join("libhostfxr.so").is_file());

        let record = load_run_record(&config.staging_root).unwrap().unwrap();
        assert_eq!(record.status, RunStatus::Success);
        assert_eq!(record.mode, Mode::Investigation);
    }

    #[test]
    fn test_cached_payload_is_not_fetched() {
        let temp = TempDir::new().unwrap();
        let config = config(temp.path()).with_build_set(&[]).with_patch(false);
        previous_run(&config);
        let fetcher = fetcher();
        let orchestrator = Orchestrator::new(config, ReproducibleExecutor::shell())
            .with_fetcher(fetcher.clone())
            .with_preflight(false);

        let summary = orchestrator.run(&mut RunState::new()).unwrap();
        assert_eq!(fetcher.calls.get(), 0);
        assert_eq!(summary.payload.source, PayloadSource::Cached);
    }

    #[test]
    fn test_failed_build_marks_record_failed() {
        let temp = TempDir::new().unwrap();
        let config = config(temp.path()).with_build_set(&[Component::AsyncIoLibrary]);
        previous_run(&config);
        let orchestrator = Orchestrator::new(config.clone(), ReproducibleExecutor::shell())
            .with_fetcher(fetcher())
            .with_preflight(false);
        let mut state = RunState::new();

        let err = orchestrator.run(&mut state).unwrap_err();

        assert_eq!(err.kind(), "ExecutionFailure");
        assert!(state.is_investigating());
        assert!(config.src_dir().join("libuv").join(REPRO_FILENAME).is_file());
        // Patch never ran.
        assert!(!config
            .bin_dir()
            .join("shared/Microsoft.NETCore.App/1.0.0/libuv.so")
            .exists());

        let record = load_run_record(&config.staging_root).unwrap().unwrap();
        assert_eq!(record.status, RunStatus::Failed);
        assert!(record.error.unwrap().contains("./autogen.sh"));
    }

    #[test]
    fn test_second_run_on_locked_root_fails() {
        let temp = TempDir::new().unwrap();
        let config = config(temp.path()).with_build_set(&[]).with_patch(false);
        fs::create_dir_all(&config.staging_root).unwrap();
        let _held = lock_staging_root(&config.staging_root).unwrap();

        let fetcher = fetcher();
        let orchestrator = Orchestrator::new(config, ReproducibleExecutor::shell())
            .with_fetcher(fetcher.clone())
            .with_preflight(false);
        let err = orchestrator.run(&mut RunState::new()).unwrap_err();

        assert_eq!(err.kind(), "UnexpectedFault");
        assert_eq!(fetcher.calls.get(), 0);
    }
}
