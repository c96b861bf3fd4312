//! Fetching the baseline payload.

use std::path::Path;

use crate::error::Result;
use crate::executor::ReproducibleExecutor;
use crate::state::RunState;

/// Something that can download `url` to `destination`.
pub trait PayloadFetcher {
    fn fetch(
        &self,
        executor: &ReproducibleExecutor,
        state: &mut RunState,
        url: &str,
        destination: &Path,
    ) -> Result<()>;
}

/// Downloads with `curl` through the executor.
///
/// The transfer goes to a `.part` file that is renamed on success, so an
/// interrupted download is never mistaken for a cached payload.
#[derive(Debug, Clone, Copy, Default)]
pub struct CurlFetcher;

impl CurlFetcher {
    pub fn command(url: &str, destination: &Path) -> String {
        let final_path = destination.display().to_string();
        let part_path = format!("{final_path}.part");
        format!(
            "curl -fsSL -o {part} {url} && mv {part} {dest}",
            part = shell_words::quote(&part_path),
            url = shell_words::quote(url),
            dest = shell_words::quote(&final_path),
        )
    }
}

impl PayloadFetcher for CurlFetcher {
    fn fetch(
        &self,
        executor: &ReproducibleExecutor,
        state: &mut RunState,
        url: &str,
        destination: &Path,
    ) -> Result<()> {
        executor.run(state, &Self::command(url, destination), destination.parent())
    }
}
