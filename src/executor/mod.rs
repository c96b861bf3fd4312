//! Reproducible execution of external commands.
//!
//! Every external step of the bootstrap (fetch, unpack, git, builds, copies)
//! goes through [`ReproducibleExecutor::run`]. A command that exits non-zero
//! leaves a one-line repro script in its working directory, switches the run
//! into investigation mode and ends the run with
//! [`BootstrapError::ExecutionFailure`].
//!
//! # Usage
//!
//! ```rust,ignore
//! use dotnet_bootstrap::executor::ReproducibleExecutor;
//! use dotnet_bootstrap::RunState;
//!
//! let executor = ReproducibleExecutor::shell();
//! let mut state = RunState::new();
//! executor.run(&mut state, "make", Some(Path::new("src/libuv")))?;
//! ```

pub mod repro;

use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

use anyhow::Context;

use crate::error::{BootstrapError, Result};
use crate::state::RunState;

/// Something that can run a shell command line to completion.
pub trait CommandRunner {
    /// Run `command` in `working_dir`, inheriting stdio, and return its exit status.
    fn run(&self, command: &str, working_dir: &Path) -> io::Result<ExitStatus>;
}

/// Runs command lines with `sh -c`.
#[derive(Debug, Clone, Default)]
pub struct ShellRunner {
    env: Vec<(String, String)>,
}

impl ShellRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Export `key=value` to every child process.
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }
}

impl CommandRunner for ShellRunner {
    fn run(&self, command: &str, working_dir: &Path) -> io::Result<ExitStatus> {
        Command::new("sh")
            .arg("-c")
            .arg(command)
            .current_dir(working_dir)
            .envs(self.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .status()
    }
}

/// Runs commands and turns failures into repro scripts.
pub struct ReproducibleExecutor {
    runner: Box<dyn CommandRunner>,
}

impl ReproducibleExecutor {
    pub fn new(runner: impl CommandRunner + 'static) -> Self {
        Self {
            runner: Box::new(runner),
        }
    }

    /// Executor backed by a plain [`ShellRunner`].
    pub fn shell() -> Self {
        Self::new(ShellRunner::new())
    }

    /// Run `command` in `working_dir` (process current directory when `None`).
    ///
    /// On a non-zero exit the run enters investigation mode, a repro script
    /// is written into the working directory and an
    /// [`BootstrapError::ExecutionFailure`] is returned. Callers propagate it;
    /// nothing after a failed command may run.
    pub fn run(
        &self,
        state: &mut RunState,
        command: &str,
        working_dir: Option<&Path>,
    ) -> Result<()> {
        let working_dir = match working_dir {
            Some(dir) => dir.to_path_buf(),
            None => std::env::current_dir().context("resolving current directory")?,
        };

        tracing::debug!(cwd = %working_dir.display(), "$ {command}");

        let status = match self.runner.run(command, &working_dir) {
            Ok(status) => status,
            Err(err) => {
                state.enter_investigation();
                return Err(anyhow::Error::new(err)
                    .context(format!(
                        "spawning `{}` in '{}'",
                        command,
                        working_dir.display()
                    ))
                    .into());
            }
        };

        if status.success() {
            return Ok(());
        }

        state.enter_investigation();
        Err(self.record_failure(command, working_dir, status))
    }

    fn record_failure(
        &self,
        command: &str,
        working_dir: PathBuf,
        status: ExitStatus,
    ) -> BootstrapError {
        let repro = match repro::write_repro(&working_dir, command, repro::running_as_root()) {
            Ok(path) => path,
            Err(err) => {
                return BootstrapError::UnexpectedFault(
                    err.context(format!("command `{command}` failed with {status}")),
                )
            }
        };

        tracing::error!(
            "detected a failure; a repro script has been placed at {}",
            repro.display()
        );
        tracing::error!(
            "to reproduce the failure:\n\tcd {}\n\t./{}",
            working_dir.display(),
            repro::REPRO_FILENAME
        );
        tracing::error!(
            "closing; re-running against the same staging directory starts in investigation mode (no git commands)"
        );

        BootstrapError::ExecutionFailure {
            command: command.to_string(),
            working_dir,
            status,
            repro,
        }
    }
}
