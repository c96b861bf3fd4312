//! Failure taxonomy for a bootstrap run.
//!
//! Every stage returns [`BootstrapError`]; none of them recover from it.
//! The binary's `main` is the only place that turns an error into
//! diagnostics and a process exit.

use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

/// Errors that end a bootstrap run.
#[derive(Error, Debug)]
pub enum BootstrapError {
    /// The host identity file is missing or incomplete, or an override
    /// file could not be loaded.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Patch targets were requested for a distribution root that does not exist.
    #[error("distribution root does not exist: {}", .0.display())]
    MissingDistribution(PathBuf),

    /// An external command exited non-zero. A repro script was written.
    #[error("command `{command}` failed in '{}' ({status}); repro script at '{}'", working_dir.display(), repro.display())]
    ExecutionFailure {
        command: String,
        working_dir: PathBuf,
        status: ExitStatus,
        repro: PathBuf,
    },

    /// Anything else.
    #[error(transparent)]
    UnexpectedFault(#[from] anyhow::Error),
}

impl BootstrapError {
    /// Stable name of the failure kind, used in the top-level diagnostic.
    pub fn kind(&self) -> &'static str {
        match self {
            BootstrapError::Configuration(_) => "ConfigurationError",
            BootstrapError::MissingDistribution(_) => "MissingDistributionError",
            BootstrapError::ExecutionFailure { .. } => "ExecutionFailure",
            BootstrapError::UnexpectedFault(_) => "UnexpectedFault",
        }
    }
}

impl From<std::io::Error> for BootstrapError {
    fn from(err: std::io::Error) -> Self {
        BootstrapError::UnexpectedFault(err.into())
    }
}

pub type Result<T, E = BootstrapError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_names_each_variant() {
        assert_eq!(
            BootstrapError::Configuration("x".into()).kind(),
            "ConfigurationError"
        );
        assert_eq!(
            BootstrapError::MissingDistribution(PathBuf::from("/nope")).kind(),
            "MissingDistributionError"
        );
        assert_eq!(
            BootstrapError::UnexpectedFault(anyhow::anyhow!("boom")).kind(),
            "UnexpectedFault"
        );
    }

    #[test]
    fn unexpected_fault_keeps_context_chain() {
        let err: BootstrapError = anyhow::anyhow!("root cause")
            .context("reading payload")
            .into();
        assert_eq!(err.to_string(), "reading payload");
        if let BootstrapError::UnexpectedFault(inner) = err {
            assert_eq!(format!("{inner:#}"), "reading payload: root cause");
        } else {
            panic!("expected UnexpectedFault");
        }
    }
}
