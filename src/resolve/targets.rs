//! Patch target resolution for an extracted distribution.

use std::path::{Path, PathBuf};

use anyhow::Context;

use super::select::select_greatest;
use crate::error::{BootstrapError, Result};

/// Default shared framework name under `shared/`.
pub const DEFAULT_RUNTIME_NAME: &str = "Microsoft.NETCore.App";
/// Default host resolver name under `host/`.
pub const DEFAULT_RESOLVER_NAME: &str = "fxr";

/// Names of the well-known parents inside a distribution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetLayout {
    /// Framework directory under `shared/`.
    pub runtime_name: String,
    /// Resolver directory under `host/`.
    pub resolver_name: String,
}

impl Default for TargetLayout {
    fn default() -> Self {
        Self {
            runtime_name: DEFAULT_RUNTIME_NAME.to_string(),
            resolver_name: DEFAULT_RESOLVER_NAME.to_string(),
        }
    }
}

/// Version-selected directories that receive patched artifacts.
///
/// Any of the three paths may point at a baseline-sentinel directory that
/// does not exist; that surfaces when something is copied into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchTargetSet {
    /// Distribution root the targets were resolved against.
    pub root: PathBuf,
    /// `shared/<runtime>/<version>`
    pub shared: PathBuf,
    /// `sdk/<version>`
    pub sdk: PathBuf,
    /// `host/<resolver>/<version>`
    pub host: PathBuf,
}

impl PatchTargetSet {
    /// Every target paired with a short label, in patch order.
    pub fn labeled(&self) -> [(&'static str, &Path); 3] {
        [
            ("shared", self.shared.as_path()),
            ("sdk", self.sdk.as_path()),
            ("host", self.host.as_path()),
        ]
    }
}

/// Resolve the shared, sdk and host patch targets under `root`.
///
/// Fails only when `root` itself is missing. Each target is resolved
/// independently with [`select_greatest`].
pub fn resolve_patch_targets(root: &Path, layout: &TargetLayout) -> Result<PatchTargetSet> {
    if !root.exists() {
        return Err(BootstrapError::MissingDistribution(root.to_path_buf()));
    }
    let root = std::path::absolute(root)
        .with_context(|| format!("making distribution root '{}' absolute", root.display()))?;

    let shared = resolve_under(&root.join("shared").join(&layout.runtime_name));
    let sdk = resolve_under(&root.join("sdk"));
    let host = resolve_under(&root.join("host").join(&layout.resolver_name));

    tracing::debug!(
        shared = %shared.display(),
        sdk = %sdk.display(),
        host = %host.display(),
        "resolved patch targets"
    );

    Ok(PatchTargetSet {
        root,
        shared,
        sdk,
        host,
    })
}

fn resolve_under(container: &Path) -> PathBuf {
    container.join(select_greatest(container))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::BASELINE_SENTINEL;
    use std::fs;
    use tempfile::TempDir;

    fn distribution(dirs: &[&str]) -> TempDir {
        let temp = TempDir::new().unwrap();
        for dir in dirs {
            fs::create_dir_all(temp.path().join(dir)).unwrap();
        }
        temp
    }

    #[test]
    fn test_missing_root_is_missing_distribution() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("bin");
        let err = resolve_patch_targets(&root, &TargetLayout::default()).unwrap_err();
        assert!(matches!(err, BootstrapError::MissingDistribution(ref p) if p == &root));
    }

    #[test]
    fn test_resolves_highest_versions() {
        let temp = distribution(&[
            "shared/Microsoft.NETCore.App/1.0.0",
            "shared/Microsoft.NETCore.App/1.1.0",
            "sdk/1.0.0-preview2-003121",
            "sdk/1.0.0-preview2-1-003177",
            "host/fxr/1.0.1",
        ]);
        let targets = resolve_patch_targets(temp.path(), &TargetLayout::default()).unwrap();

        assert_eq!(
            targets.shared,
            temp.path().join("shared/Microsoft.NETCore.App/1.1.0")
        );
        assert_eq!(targets.sdk, temp.path().join("sdk/1.0.0-preview2-1-003177"));
        assert_eq!(targets.host, temp.path().join("host/fxr/1.0.1"));
        assert_eq!(targets.root, temp.path());
    }

    #[test]
    fn test_missing_sdk_resolves_under_sentinel() {
        let temp = distribution(&["shared/Microsoft.NETCore.App/1.0.0", "host/fxr/1.0.0"]);
        let targets = resolve_patch_targets(temp.path(), &TargetLayout::default()).unwrap();

        assert_eq!(targets.sdk, temp.path().join("sdk").join(BASELINE_SENTINEL));
        assert!(!targets.sdk.exists());
        assert_eq!(
            targets.shared,
            temp.path().join("shared/Microsoft.NETCore.App/1.0.0")
        );
    }

    #[test]
    fn test_custom_layout_names() {
        let temp = distribution(&["shared/Custom.App/2.0.0", "host/resolver/3.0.0"]);
        let layout = TargetLayout {
            runtime_name: "Custom.App".to_string(),
            resolver_name: "resolver".to_string(),
        };
        let targets = resolve_patch_targets(temp.path(), &layout).unwrap();

        assert_eq!(targets.shared, temp.path().join("shared/Custom.App/2.0.0"));
        assert_eq!(targets.host, temp.path().join("host/resolver/3.0.0"));
    }

    #[test]
    fn test_labeled_order() {
        let temp = distribution(&[]);
        let targets = resolve_patch_targets(temp.path(), &TargetLayout::default()).unwrap();
        let labels: Vec<&str> = targets.labeled().iter().map(|(l, _)| *l).collect();
        assert_eq!(labels, ["shared", "sdk", "host"]);
    }
}
