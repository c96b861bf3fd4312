//! Obtain the baseline payload and unpack it into `bin`.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Serialize;
use sha2::{Digest, Sha256};

use super::StageContext;
use crate::archive::ArchiveUnpacker;
use crate::error::Result;
use crate::fetch::PayloadFetcher;
use crate::state::RunState;

/// Where the payload came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadSource {
    /// Path given on the command line.
    Supplied,
    /// Left in `obj/` by an earlier run.
    Cached,
    /// Downloaded by this run.
    Fetched,
}

#[derive(Debug, Clone)]
pub struct ObtainedPayload {
    pub path: PathBuf,
    pub source: PayloadSource,
    pub sha256: String,
}

/// Pick or fetch the payload, hash it and unpack it into `bin`.
pub fn obtain_payload(
    ctx: &StageContext<'_>,
    fetcher: &dyn PayloadFetcher,
    unpacker: &dyn ArchiveUnpacker,
    state: &mut RunState,
) -> Result<ObtainedPayload> {
    let config = ctx.config;
    let (path, source) = match config.payload.as_deref() {
        Some(supplied) if ctx.probe.payload_present(supplied) => {
            (supplied.to_path_buf(), PayloadSource::Supplied)
        }
        supplied => {
            if let Some(missing) = supplied {
                tracing::warn!(
                    "payload '{}' does not exist; falling back to {}",
                    missing.display(),
                    config.payload_url
                );
            }
            let cached = config.cached_payload_path();
            if ctx.probe.payload_present(&cached) {
                tracing::info!("using cached payload {}", cached.display());
                (cached, PayloadSource::Cached)
            } else {
                tracing::info!("fetching {}", config.payload_url);
                fetcher.fetch(ctx.executor, state, &config.payload_url, &cached)?;
                (cached, PayloadSource::Fetched)
            }
        }
    };

    let sha256 = sha256_file(&path)?;
    tracing::debug!(sha256 = %sha256, "payload {}", path.display());

    unpacker.unpack(ctx.executor, state, &path, &config.bin_dir())?;

    Ok(ObtainedPayload {
        path,
        source,
        sha256,
    })
}

fn sha256_file(path: &Path) -> Result<String> {
    let f = File::open(path).with_context(|| format!("opening payload '{}'", path.display()))?;
    let mut r = BufReader::new(f);
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = r
            .read(&mut buf)
            .with_context(|| format!("reading payload '{}'", path.display()))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}
