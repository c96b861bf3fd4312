//! Preflight checks for a bootstrap run.
//!
//! Validates that the host has the tools the selected stages will shell out
//! to. This prevents a run from failing halfway through a long build with
//! a bare "command not found".
//!
//! # Example
//!
//! ```rust
//! use dotnet_bootstrap::preflight::{command_exists, check_required_tools};
//!
//! if !command_exists("git") {
//!     println!("git not installed");
//! }
//!
//! let tools = &[("sh", "dash"), ("tar", "tar")];
//! if let Err(e) = check_required_tools(tools) {
//!     eprintln!("{}", e);
//! }
//! ```

use anyhow::{bail, Result};

use crate::component::Component;
use crate::config::BootstrapConfig;

/// Check if a command exists on the host system.
pub fn command_exists(cmd: &str) -> bool {
    which::which(cmd).is_ok()
}

/// Tools needed by every run. Each tuple is (command_name, package_name).
pub const BASE_TOOLS: &[(&str, &str)] = &[("sh", "dash"), ("tar", "tar"), ("cp", "coreutils")];

/// Tools needed to fetch a payload when none was supplied.
pub const FETCH_TOOLS: &[(&str, &str)] = &[("curl", "curl")];

/// Tools needed to clone sources.
pub const SOURCE_TOOLS: &[(&str, &str)] = &[("git", "git")];

/// Tools a component's build invokes.
pub fn build_tools(component: Component) -> &'static [(&'static str, &'static str)] {
    match component {
        Component::NativeRuntime | Component::BaseClassLibraries | Component::HostResolver => {
            &[("cmake", "cmake"), ("clang", "clang"), ("make", "make")]
        }
        Component::AsyncIoLibrary => &[
            ("autoconf", "autoconf"),
            ("automake", "automake"),
            ("libtool", "libtool"),
            ("make", "make"),
        ],
    }
}

/// Check that specific tools are available.
///
/// # Returns
///
/// * `Ok(())` if all tools are found
/// * `Err` with list of missing tools and their packages
pub fn check_required_tools(tools: &[(&str, &str)]) -> Result<()> {
    let mut missing = Vec::new();

    for (tool, package) in tools {
        if !command_exists(tool) && !missing.iter().any(|(t, _)| t == tool) {
            missing.push((*tool, *package));
        }
    }

    if !missing.is_empty() {
        let msg = missing
            .iter()
            .map(|(t, p)| format!("  {} (install: {})", t, p))
            .collect::<Vec<_>>()
            .join("\n");
        bail!("Missing required host tools:\n{}", msg);
    }

    Ok(())
}

/// Tools the run described by `config` will need.
///
/// `sources_skipped` is true when version control will not run (the staging
/// root already exists).
pub fn required_tools(
    config: &BootstrapConfig,
    sources_skipped: bool,
) -> Vec<(&'static str, &'static str)> {
    let mut tools: Vec<(&str, &str)> = BASE_TOOLS.to_vec();

    let payload_supplied = config.payload.as_deref().is_some_and(|p| p.exists());
    if !payload_supplied && !config.cached_payload_path().exists() {
        tools.extend_from_slice(FETCH_TOOLS);
    }
    if !sources_skipped && !config.build_set.is_empty() {
        tools.extend_from_slice(SOURCE_TOOLS);
    }
    for component in &config.build_set {
        tools.extend_from_slice(build_tools(*component));
    }

    tools.sort();
    tools.dedup();
    tools
}

/// Check every tool the run described by `config` will need.
pub fn check_run_tools(config: &BootstrapConfig, sources_skipped: bool) -> Result<()> {
    check_required_tools(&required_tools(config, sources_skipped))
}
