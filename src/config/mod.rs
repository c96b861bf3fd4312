//! Immutable configuration of one bootstrap run.
//!
//! Built once from the command line, the host's `os-release` and an
//! optional TOML override file, then shared by reference with every stage.

pub mod file;
pub mod os_release;

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use clap::ValueEnum;

use crate::component::{Component, ASYNC_IO_PINNED_REVISION};
use crate::error::{BootstrapError, Result};
use crate::resolve::TargetLayout;

pub use file::ConfigFile;
pub use os_release::OsIdentity;

/// Payload fetched when none is supplied.
pub const DEFAULT_PAYLOAD_URL: &str =
    "https://dotnetcli.blob.core.windows.net/dotnet/Sdk/rel-1.0.0/dotnet-dev-debian-x64.latest.tar.gz";
/// Name of the cached payload under `obj/`.
pub const DEFAULT_PAYLOAD_FILENAME: &str = "dotnet.latest.tar.gz";

/// Everything a run needs to know up front.
#[derive(Debug, Clone)]
pub struct BootstrapConfig {
    /// Directory the tool was launched from; relative inputs resolve here.
    pub launch_dir: PathBuf,
    /// Staging root holding `src`, `obj` and `bin`.
    pub staging_root: PathBuf,
    /// Components to clone and build.
    pub build_set: BTreeSet<Component>,
    /// Copy build outputs into the distribution.
    pub patch: bool,
    /// Pre-fetched payload archive, if any.
    pub payload: Option<PathBuf>,
    pub os: OsIdentity,
    pub payload_url: String,
    pub payload_filename: String,
    pub repositories: BTreeMap<Component, String>,
    pub async_io_revision: String,
    pub layout: TargetLayout,
}

impl BootstrapConfig {
    /// Defaults for `os`, staging in `<launch_dir>/<rid>-dotnet`.
    pub fn new(os: OsIdentity, launch_dir: PathBuf) -> Self {
        let staging_root = launch_dir.join(default_moniker(&os));
        Self {
            launch_dir,
            staging_root,
            build_set: Component::ALL.into_iter().collect(),
            patch: true,
            payload: None,
            os,
            payload_url: DEFAULT_PAYLOAD_URL.to_string(),
            payload_filename: DEFAULT_PAYLOAD_FILENAME.to_string(),
            repositories: Component::ALL
                .into_iter()
                .map(|c| (c, c.default_repository().to_string()))
                .collect(),
            async_io_revision: ASYNC_IO_PINNED_REVISION.to_string(),
            layout: TargetLayout::default(),
        }
    }

    /// Stage under `dir` instead; relative paths resolve against the launch directory.
    pub fn with_staging_root(mut self, dir: &Path) -> Self {
        self.staging_root = self.resolve_input(dir);
        self
    }

    /// Clone and build exactly `components`. An empty list builds nothing,
    /// which still fetches, unpacks and patches.
    pub fn with_build_set(mut self, components: &[Component]) -> Self {
        self.build_set = components.iter().copied().collect();
        self
    }

    pub fn with_patch(mut self, patch: bool) -> Self {
        self.patch = patch;
        self
    }

    /// Use a pre-fetched payload; relative paths resolve against the launch directory.
    pub fn with_payload(mut self, payload: Option<&Path>) -> Self {
        self.payload = payload.map(|p| self.resolve_input(p));
        self
    }

    /// Apply a TOML override file.
    pub fn with_file(mut self, file: ConfigFile) -> Result<Self> {
        if let Some(payload) = file.payload {
            if let Some(url) = payload.url {
                self.payload_url = url;
            }
            if let Some(filename) = payload.filename {
                if filename.contains('/') || filename.is_empty() {
                    return Err(BootstrapError::Configuration(format!(
                        "payload.filename must be a plain file name, got '{filename}'"
                    )));
                }
                self.payload_filename = filename;
            }
        }
        for (key, url) in file.repositories.unwrap_or_default() {
            let component = Component::from_str(&key, true).map_err(|_| {
                BootstrapError::Configuration(format!(
                    "unknown component '{key}' in [repositories]; expected one of: {}",
                    Component::ALL.map(|c| c.name()).join(", ")
                ))
            })?;
            self.repositories.insert(component, url);
        }
        if let Some(layout) = file.layout {
            if let Some(name) = layout.runtime_name {
                self.layout.runtime_name = name;
            }
            if let Some(name) = layout.resolver_name {
                self.layout.resolver_name = name;
            }
        }
        if let Some(revision) = file.async_io.and_then(|a| a.revision) {
            self.async_io_revision = revision;
        }
        Ok(self)
    }

    pub fn rid(&self) -> String {
        self.os.rid()
    }

    pub fn src_dir(&self) -> PathBuf {
        self.staging_root.join("src")
    }

    pub fn obj_dir(&self) -> PathBuf {
        self.staging_root.join("obj")
    }

    pub fn bin_dir(&self) -> PathBuf {
        self.staging_root.join("bin")
    }

    /// Where a fetched payload is cached.
    pub fn cached_payload_path(&self) -> PathBuf {
        self.obj_dir().join(&self.payload_filename)
    }

    pub fn repository(&self, component: Component) -> &str {
        self.repositories
            .get(&component)
            .map(String::as_str)
            .unwrap_or_else(|| component.default_repository())
    }

    fn resolve_input(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.launch_dir.join(path)
        }
    }
}

/// `<rid>-dotnet`, the default staging directory name.
pub fn default_moniker(os: &OsIdentity) -> String {
    format!("{}-dotnet", os.rid())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn debian() -> OsIdentity {
        OsIdentity {
            id: "debian".into(),
            version_id: "8".into(),
        }
    }

    #[test]
    fn test_defaults() {
        let config = BootstrapConfig::new(debian(), PathBuf::from("/work"));
        assert_eq!(config.staging_root, PathBuf::from("/work/debian.8-x64-dotnet"));
        assert_eq!(config.build_set.len(), 4);
        assert!(config.patch);
        assert!(config.payload.is_none());
        assert_eq!(
            config.cached_payload_path(),
            PathBuf::from("/work/debian.8-x64-dotnet/obj/dotnet.latest.tar.gz")
        );
        assert_eq!(
            config.repository(Component::AsyncIoLibrary),
            "https://github.com/libuv/libuv"
        );
    }

    #[test]
    fn test_empty_build_list_builds_nothing() {
        let config = BootstrapConfig::new(debian(), PathBuf::from("/work")).with_build_set(&[]);
        assert!(config.build_set.is_empty());
        assert!(config.patch);
    }

    #[test]
    fn test_build_list_restricts() {
        let config = BootstrapConfig::new(debian(), PathBuf::from("/work"))
            .with_build_set(&[Component::AsyncIoLibrary, Component::AsyncIoLibrary]);
        assert!(config.build_set.contains(&Component::AsyncIoLibrary));
        assert!(!config.build_set.contains(&Component::NativeRuntime));
        assert_eq!(config.build_set.len(), 1);
    }

    #[test]
    fn test_relative_inputs_resolve_against_launch_dir() {
        let config = BootstrapConfig::new(debian(), PathBuf::from("/work"))
            .with_staging_root(Path::new("stage"))
            .with_payload(Some(Path::new("dl/dotnet.tar.gz")));
        assert_eq!(config.staging_root, PathBuf::from("/work/stage"));
        assert_eq!(config.payload, Some(PathBuf::from("/work/dl/dotnet.tar.gz")));

        let config = config.with_staging_root(Path::new("/abs/stage"));
        assert_eq!(config.bin_dir(), PathBuf::from("/abs/stage/bin"));
    }

    #[test]
    fn test_file_overrides() {
        let file = ConfigFile::parse(
            r#"
[payload]
url = "file:///mirror/dotnet.tar.gz"
filename = "mirror.tar.gz"

[repositories]
coreclr = "https://example.invalid/coreclr"
host-resolver = "https://example.invalid/core-setup"

[layout]
runtime_name = "Other.App"
"#,
        )
        .unwrap();
        let config = BootstrapConfig::new(debian(), PathBuf::from("/work"))
            .with_file(file)
            .unwrap();

        assert_eq!(config.payload_url, "file:///mirror/dotnet.tar.gz");
        assert_eq!(config.payload_filename, "mirror.tar.gz");
        assert_eq!(
            config.repository(Component::NativeRuntime),
            "https://example.invalid/coreclr"
        );
        assert_eq!(
            config.repository(Component::HostResolver),
            "https://example.invalid/core-setup"
        );
        assert_eq!(config.layout.runtime_name, "Other.App");
        assert_eq!(config.layout.resolver_name, "fxr");
    }

    #[test]
    fn test_file_rejects_unknown_component() {
        let file = ConfigFile::parse("[repositories]\nmono = \"x\"\n").unwrap();
        let err = BootstrapConfig::new(debian(), PathBuf::from("/work"))
            .with_file(file)
            .unwrap_err();
        assert_eq!(err.kind(), "ConfigurationError");
    }

    #[test]
    fn test_file_rejects_payload_path() {
        let file = ConfigFile::parse("[payload]\nfilename = \"../x.tar.gz\"\n").unwrap();
        assert!(BootstrapConfig::new(debian(), PathBuf::from("/work"))
            .with_file(file)
            .is_err());
    }
}
