use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use dotnet_bootstrap::config::{BootstrapConfig, ConfigFile, OsIdentity};
use dotnet_bootstrap::executor::{ReproducibleExecutor, ShellRunner};
use dotnet_bootstrap::stage_runs::{load_run_record, write_run_record, RunStatus};
use dotnet_bootstrap::{BootstrapError, Component, Orchestrator, Result, RunState, RunSummary};

/// Rebuild the native parts of a .NET Core distribution for this host.
#[derive(Parser, Debug)]
#[command(name = "dotnet-bootstrap", version)]
struct Cli {
    /// Components to clone and build. All of them when omitted; none when
    /// the flag is given without values.
    #[arg(long, value_enum, num_args = 0.., value_name = "COMPONENT")]
    build: Option<Vec<Component>>,

    /// Do not copy build outputs into the distribution.
    #[arg(long)]
    no_patch: bool,

    /// Use a pre-fetched payload archive instead of downloading one.
    #[arg(long, value_name = "PATH")]
    payload: Option<PathBuf>,

    /// Staging directory [default: ./<rid>-dotnet].
    #[arg(long, value_name = "DIR")]
    to: Option<PathBuf>,

    /// TOML file overriding payload URL, repositories and layout names.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Skip the host tool check.
    #[arg(long)]
    skip_preflight: bool,

    /// Debug logging (RUST_LOG takes precedence).
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(if cli.verbose { Level::DEBUG } else { Level::INFO });

    let mut state = RunState::new();
    let mut staging_root: Option<PathBuf> = None;

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        let orchestrator = build_orchestrator(&cli)?;
        staging_root = Some(orchestrator.config().staging_root.clone());
        orchestrator.run(&mut state)
    }));

    match outcome {
        Ok(Ok(summary)) => {
            report_success(&summary);
            ExitCode::SUCCESS
        }
        Ok(Err(err)) => {
            state.enter_investigation();
            report_failure(&err);
            ExitCode::from(1)
        }
        Err(payload) => {
            state.enter_investigation();
            eprintln!("error: {}", panic_message(payload.as_ref()));
            eprintln!("kind: UnexpectedFault (panic)");
            if let Some(root) = staging_root.as_deref() {
                mark_record_failed(root, "panic during bootstrap run");
            }
            ExitCode::from(1)
        }
    }
}

fn init_tracing(level: Level) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .try_init()
        .ok();
}

fn build_orchestrator(cli: &Cli) -> Result<Orchestrator> {
    let launch_dir = std::env::current_dir().context("resolving launch directory")?;
    let os = OsIdentity::detect()?;
    tracing::info!("host runtime identifier: {}", os.rid());

    let mut config = BootstrapConfig::new(os.clone(), launch_dir.clone());
    if let Some(path) = cli.config.as_deref() {
        config = config.with_file(ConfigFile::load(&resolve(&launch_dir, path))?)?;
    }
    if let Some(to) = cli.to.as_deref() {
        config = config.with_staging_root(to);
    }
    if let Some(components) = cli.build.as_deref() {
        config = config.with_build_set(components);
    }
    let config = config
        .with_patch(!cli.no_patch)
        .with_payload(cli.payload.as_deref());

    let runner = ShellRunner::new()
        .with_env("ID", os.id)
        .with_env("VERSION_ID", os.version_id);

    Ok(Orchestrator::new(config, ReproducibleExecutor::new(runner))
        .with_preflight(!cli.skip_preflight))
}

fn resolve(launch_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        launch_dir.join(path)
    }
}

fn report_success(summary: &RunSummary) {
    println!("run {}: {} mode", summary.run_id, summary.mode);
    println!("distribution: {}", summary.distribution.display());
    for (label, dir) in summary.targets.labeled() {
        println!("  {label}: {}", dir.display());
    }
}

fn report_failure(err: &BootstrapError) {
    eprintln!("error: {err}");
    eprintln!("kind: {}", err.kind());
    match err {
        BootstrapError::ExecutionFailure { .. } => {}
        BootstrapError::UnexpectedFault(inner) => eprintln!("\n{inner:?}"),
        other => eprintln!("\n{other:?}"),
    }
}

fn mark_record_failed(staging_root: &Path, reason: &str) {
    let Ok(Some(mut record)) = load_run_record(staging_root) else {
        return;
    };
    if record.status != RunStatus::Running {
        return;
    }
    record.error = Some(reason.to_string());
    record.finish(RunStatus::Failed, dotnet_bootstrap::Mode::Investigation);
    if let Err(err) = write_run_record(staging_root, &record) {
        eprintln!("warning: could not mark run record failed: {err}");
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic with a non-string payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_absent_means_all() {
        let cli = Cli::try_parse_from(["dotnet-bootstrap"]).unwrap();
        assert!(cli.build.is_none());
        assert!(!cli.no_patch);
    }

    #[test]
    fn test_build_without_values_means_none() {
        let cli = Cli::try_parse_from(["dotnet-bootstrap", "--build"]).unwrap();
        assert_eq!(cli.build, Some(Vec::new()));
    }

    #[test]
    fn test_build_accepts_names_and_aliases() {
        let cli = Cli::try_parse_from([
            "dotnet-bootstrap",
            "--build",
            "native-runtime",
            "libuv",
            "--no-patch",
            "--to",
            "stage",
        ])
        .unwrap();
        assert_eq!(
            cli.build,
            Some(vec![Component::NativeRuntime, Component::AsyncIoLibrary])
        );
        assert!(cli.no_patch);
        assert_eq!(cli.to, Some(PathBuf::from("stage")));
    }

    #[test]
    fn test_unknown_component_rejected() {
        assert!(Cli::try_parse_from(["dotnet-bootstrap", "--build", "mono"]).is_err());
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");
    }
}
