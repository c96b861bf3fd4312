//! Greatest-precedence directory selection.

use std::fs;
use std::path::Path;

use crate::version::Version;

/// Lowest possible precedence; returned when a container has no candidates.
pub const BASELINE_SENTINEL: &str = "0.0.0-alpha-00000";

/// A child directory name paired with the version parsed from it.
#[derive(Debug, Clone)]
struct DirectoryCandidate {
    name: String,
    version: Version,
}

/// Return the name of the immediate child directory of `container` with the
/// highest version precedence.
///
/// Files are ignored and the scan does not recurse. If the container is
/// missing, unreadable or has no subdirectories, [`BASELINE_SENTINEL`] is
/// returned; the result may therefore name a directory that does not exist.
pub fn select_greatest(container: &Path) -> String {
    let baseline = DirectoryCandidate {
        name: BASELINE_SENTINEL.to_string(),
        version: Version::parse(BASELINE_SENTINEL),
    };

    let Ok(entries) = fs::read_dir(container) else {
        tracing::debug!(container = %container.display(), "container not readable; using baseline");
        return baseline.name;
    };

    entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_dir())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .map(|name| DirectoryCandidate {
            version: Version::parse(&name),
            name,
        })
        .fold(baseline, |best, candidate| {
            if candidate.version.is_greater(&best.version) {
                candidate
            } else {
                best
            }
        })
        .name
}
