//! Host identity from `os-release`.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{BootstrapError, Result};

/// Canonical location of the identity file.
pub const OS_RELEASE_PATH: &str = "/etc/os-release";
/// Fallback location, per os-release(5).
pub const OS_RELEASE_FALLBACK_PATH: &str = "/usr/lib/os-release";

/// The `ID` and `VERSION_ID` of the host operating system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OsIdentity {
    pub id: String,
    pub version_id: String,
}

impl OsIdentity {
    /// Runtime identifier, e.g. `debian.8-x64`.
    pub fn rid(&self) -> String {
        format!("{}.{}-x64", self.id, self.version_id)
    }

    /// Read the identity from the standard locations.
    pub fn detect() -> Result<Self> {
        Self::load(&[
            PathBuf::from(OS_RELEASE_PATH),
            PathBuf::from(OS_RELEASE_FALLBACK_PATH),
        ])
    }

    /// Read the identity from the first of `candidates` that exists.
    pub fn load(candidates: &[PathBuf]) -> Result<Self> {
        let path = candidates.iter().find(|p| p.exists()).ok_or_else(|| {
            BootstrapError::Configuration(format!(
                "requires one of {} to exist; see `man os-release`",
                candidates
                    .iter()
                    .map(|p| format!("'{}'", p.display()))
                    .collect::<Vec<_>>()
                    .join(", ")
            ))
        })?;
        Self::from_file(path)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|err| {
            BootstrapError::Configuration(format!("reading '{}': {err}", path.display()))
        })?;
        let vars = parse(&contents);
        let field = |key: &str| {
            vars.get(key).cloned().ok_or_else(|| {
                BootstrapError::Configuration(format!(
                    "'{}' does not define {key}",
                    path.display()
                ))
            })
        };
        Ok(Self {
            id: field("ID")?,
            version_id: field("VERSION_ID")?,
        })
    }
}

/// Parse `KEY=value` lines, dropping blank lines, comments and quotes.
pub fn parse(contents: &str) -> BTreeMap<String, String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| (unquote(key.trim()), unquote(value.trim())))
        .collect()
}

fn unquote(raw: &str) -> String {
    raw.trim_matches(|c| c == '"' || c == '\'').to_string()
}
