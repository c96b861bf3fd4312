//! Build identities embedded in the baseline's native binaries.
//!
//! The runtime and the native library shims carry an `@(#)` version line
//! with a `Commit Hash: <sha>` marker. The `dotnet` host carries its commit
//! as a bare 40-character hex string. Both are found the way `strings`
//! would: by scanning printable ASCII runs of the binary.

use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use anyhow::Context;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Native runtime library inside the shared framework directory.
pub const RUNTIME_LIBRARY: &str = "libcoreclr.so";
/// Native library shim inside the shared framework directory.
pub const LIBRARIES_SHIM: &str = "System.Native.so";
/// Host executable inside the shared framework directory.
pub const HOST_EXECUTABLE: &str = "dotnet";

const VERSION_LINE_MARKER: &str = "@(#)";
const COMMIT_MARKER: &str = "Commit Hash: ";
const MIN_STRING_LEN: usize = 4;

/// Upstream revisions the baseline was built from.
///
/// An empty field means the marker was not found; checking out that
/// revision fails later, at the point of use.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildIdentity {
    pub runtime: String,
    pub libraries: String,
    pub host: String,
}

impl BuildIdentity {
    /// Read identities from the binaries in `shared_dir`.
    pub fn extract(shared_dir: &Path) -> Result<Self> {
        let identity = Self {
            runtime: commit_marker_in(&shared_dir.join(RUNTIME_LIBRARY))?,
            libraries: commit_marker_in(&shared_dir.join(LIBRARIES_SHIM))?,
            host: hex_commit_in(&shared_dir.join(HOST_EXECUTABLE))?,
        };
        for (name, value) in [
            (RUNTIME_LIBRARY, &identity.runtime),
            (LIBRARIES_SHIM, &identity.libraries),
            (HOST_EXECUTABLE, &identity.host),
        ] {
            if value.is_empty() {
                tracing::warn!("no build identity found in {name}");
            }
        }
        Ok(identity)
    }
}

/// Printable ASCII runs of at least four bytes, like `strings(1)`.
pub fn printable_strings(bytes: &[u8]) -> impl Iterator<Item = &str> {
    bytes
        .split(|b| !is_printable(*b))
        .filter(|run| run.len() >= MIN_STRING_LEN)
        .filter_map(|run| std::str::from_utf8(run).ok())
}

fn is_printable(byte: u8) -> bool {
    byte == b'\t' || (0x20..0x7f).contains(&byte)
}

/// Revision following `Commit Hash: ` on the `@(#)` line of `bytes`.
pub fn find_commit_marker(bytes: &[u8]) -> Option<String> {
    printable_strings(bytes)
        .filter(|s| s.contains(VERSION_LINE_MARKER))
        .find_map(|s| {
            let (_, rest) = s.split_once(COMMIT_MARKER)?;
            rest.split_whitespace().next().map(str::to_string)
        })
}

/// First 40-character lowercase hex token in `bytes`.
pub fn find_hex_commit(bytes: &[u8]) -> Option<String> {
    static HEX_COMMIT: OnceLock<Regex> = OnceLock::new();
    let pattern =
        HEX_COMMIT.get_or_init(|| Regex::new(r"[a-f0-9]{40}").expect("regex for hex commit"));
    printable_strings(bytes).find_map(|s| pattern.find(s).map(|m| m.as_str().to_string()))
}

fn commit_marker_in(path: &Path) -> Result<String> {
    Ok(find_commit_marker(&read_binary(path)?).unwrap_or_default())
}

fn hex_commit_in(path: &Path) -> Result<String> {
    Ok(find_hex_commit(&read_binary(path)?).unwrap_or_default())
}

fn read_binary(path: &Path) -> Result<Vec<u8>> {
    let bytes =
        fs::read(path).with_context(|| format!("reading binary '{}'", path.display()))?;
    Ok(bytes)
}
