//! The run record: `run-manifest.json` in the staging root.
//!
//! Written when a run starts and rewritten when it ends. It reports what a
//! run did; nothing reads it back to decide whether a stage is complete.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::OffsetDateTime;

use crate::error::Result;
use crate::identity::BuildIdentity;
use crate::state::Mode;

const RUN_MANIFEST_FILENAME: &str = "run-manifest.json";

/// Run ids are the start time, `YYYYMMDD-HHMMSS` in UTC. The staging lock
/// keeps one run per root at a time.
const RUN_ID_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year][month][day]-[hour][minute][second]");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    Success,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRecord {
    pub run_id: String,
    pub status: RunStatus,
    pub created_at_utc: String,
    pub finished_at_utc: Option<String>,
    pub mode: Mode,
    pub build_set: Vec<String>,
    pub patch: bool,
    pub payload_sha256: Option<String>,
    pub identity: Option<BuildIdentity>,
    pub error: Option<String>,
}

impl RunRecord {
    /// A new `running` record stamped with the current time.
    pub fn begin(mode: Mode, build_set: Vec<String>, patch: bool) -> Result<Self> {
        let now = OffsetDateTime::now_utc();
        Ok(Self {
            run_id: now.format(RUN_ID_FORMAT).context("formatting run id")?,
            status: RunStatus::Running,
            created_at_utc: rfc3339(now)?,
            finished_at_utc: None,
            mode,
            build_set,
            patch,
            payload_sha256: None,
            identity: None,
            error: None,
        })
    }

    /// Mark the record finished. The end stamp is left unset if the clock
    /// cannot be formatted.
    pub fn finish(&mut self, status: RunStatus, mode: Mode) {
        self.status = status;
        self.mode = mode;
        self.finished_at_utc = rfc3339(OffsetDateTime::now_utc()).ok();
    }
}

pub fn manifest_path(staging_root: &Path) -> PathBuf {
    staging_root.join(RUN_MANIFEST_FILENAME)
}

pub fn write_run_record(staging_root: &Path, record: &RunRecord) -> Result<()> {
    let path = manifest_path(staging_root);
    write_json_atomic(&path, record)
        .with_context(|| format!("writing run record '{}'", path.display()))?;
    Ok(())
}

/// The last record written to `staging_root`, if any.
pub fn load_run_record(staging_root: &Path) -> Result<Option<RunRecord>> {
    let path = manifest_path(staging_root);
    if !path.is_file() {
        return Ok(None);
    }
    let bytes =
        fs::read(&path).with_context(|| format!("reading run record '{}'", path.display()))?;
    let parsed = serde_json::from_slice(&bytes)
        .with_context(|| format!("parsing run record '{}'", path.display()))?;
    Ok(Some(parsed))
}

fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    let payload = serde_json::to_vec_pretty(value).context("serializing run record")?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, payload).with_context(|| format!("writing '{}'", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("replacing '{}'", path.display()))?;
    Ok(())
}

fn rfc3339(at: OffsetDateTime) -> Result<String> {
    Ok(at.format(&Rfc3339).context("formatting timestamp")?)
}
