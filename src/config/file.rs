//! Optional TOML override file.
//!
//! ```toml
//! [payload]
//! url = "https://example.invalid/dotnet-dev-debian-x64.tar.gz"
//! filename = "dotnet.latest.tar.gz"
//!
//! [repositories]
//! native-runtime = "https://github.com/me/coreclr"
//!
//! [layout]
//! runtime_name = "Microsoft.NETCore.App"
//! resolver_name = "fxr"
//!
//! [async_io]
//! revision = "229b3a4cc150aebd6561e6bd43076eafa7a03756"
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{BootstrapError, Result};

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub payload: Option<PayloadToml>,
    pub repositories: Option<BTreeMap<String, String>>,
    pub layout: Option<LayoutToml>,
    pub async_io: Option<AsyncIoToml>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PayloadToml {
    pub url: Option<String>,
    pub filename: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayoutToml {
    pub runtime_name: Option<String>,
    pub resolver_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AsyncIoToml {
    pub revision: Option<String>,
}

impl ConfigFile {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|err| {
            BootstrapError::Configuration(format!(
                "reading config file '{}': {err}",
                path.display()
            ))
        })?;
        Self::parse(&text).map_err(|err| match err {
            BootstrapError::Configuration(msg) => {
                BootstrapError::Configuration(format!("'{}': {msg}", path.display()))
            }
            other => other,
        })
    }

    pub fn parse(text: &str) -> Result<Self> {
        toml::from_str(text)
            .map_err(|err| BootstrapError::Configuration(format!("parsing config: {err}")))
    }
}
