//! Copy freshly built native outputs over the baseline distribution.

use std::path::{Path, PathBuf};

use super::StageContext;
use crate::component::Component;
use crate::error::Result;
use crate::resolve::PatchTargetSet;
use crate::state::RunState;

/// Destination of a patch entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchTarget {
    Root,
    Shared,
    Sdk,
    Host,
}

impl PatchTarget {
    pub fn resolve(self, targets: &PatchTargetSet) -> &Path {
        match self {
            PatchTarget::Root => &targets.root,
            PatchTarget::Shared => &targets.shared,
            PatchTarget::Sdk => &targets.sdk,
            PatchTarget::Host => &targets.host,
        }
    }
}

/// One file (or shell pattern) copied from a component's output directory.
#[derive(Debug, Clone, Copy)]
pub struct PatchEntry {
    pub component: Component,
    /// Subdirectory of [`Component::output_dir`]; empty for the directory itself.
    pub subdir: &'static str,
    pub file: &'static str,
    pub target: PatchTarget,
}

impl PatchEntry {
    const fn new(
        component: Component,
        subdir: &'static str,
        file: &'static str,
        target: PatchTarget,
    ) -> Self {
        Self {
            component,
            subdir,
            file,
            target,
        }
    }

    pub fn source_dir(&self, src_dir: &Path) -> PathBuf {
        let out = self.component.output_dir(src_dir);
        if self.subdir.is_empty() {
            out
        } else {
            out.join(self.subdir)
        }
    }

    /// `cp` into `destination` as a directory. The trailing slash makes the
    /// copy fail when the directory does not exist instead of creating a
    /// file under its name.
    pub fn command(&self, destination: &Path) -> String {
        format!(
            "cp {} {}",
            self.file,
            shell_words::quote(&format!("{}/", destination.display()))
        )
    }
}

/// Every copy a patch performs, in order. One executor call each.
pub const PATCH_MANIFEST: &[PatchEntry] = &[
    PatchEntry::new(Component::HostResolver, "exe", "dotnet", PatchTarget::Root),
    PatchEntry::new(Component::NativeRuntime, "", "*so", PatchTarget::Shared),
    PatchEntry::new(Component::NativeRuntime, "", "corerun", PatchTarget::Shared),
    PatchEntry::new(Component::NativeRuntime, "", "crossgen", PatchTarget::Shared),
    PatchEntry::new(Component::HostResolver, "exe", "dotnet", PatchTarget::Shared),
    PatchEntry::new(
        Component::HostResolver,
        "dll",
        "libhostpolicy.so",
        PatchTarget::Shared,
    ),
    PatchEntry::new(Component::HostResolver, "fxr", "libhostfxr.so", PatchTarget::Shared),
    PatchEntry::new(Component::BaseClassLibraries, "", "System.*", PatchTarget::Shared),
    PatchEntry::new(Component::AsyncIoLibrary, "", "libuv.so", PatchTarget::Shared),
    PatchEntry::new(Component::HostResolver, "dll", "libhostpolicy.so", PatchTarget::Sdk),
    PatchEntry::new(Component::HostResolver, "fxr", "libhostfxr.so", PatchTarget::Sdk),
    PatchEntry::new(Component::HostResolver, "fxr", "libhostfxr.so", PatchTarget::Host),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchOutcome {
    Disabled,
    Patched,
}

/// Run every copy in [`PATCH_MANIFEST`]. The first failed copy ends the
/// stage; copies already made stay in place.
pub fn patch(
    ctx: &StageContext<'_>,
    targets: &PatchTargetSet,
    state: &mut RunState,
) -> Result<PatchOutcome> {
    if !ctx.config.patch {
        tracing::info!("patching disabled");
        return Ok(PatchOutcome::Disabled);
    }

    let src = ctx.config.src_dir();
    for (label, dir) in targets.labeled() {
        tracing::debug!("patch target {label}: {}", dir.display());
    }
    for entry in PATCH_MANIFEST {
        let destination = entry.target.resolve(targets);
        ctx.executor.run(
            state,
            &entry.command(destination),
            Some(&entry.source_dir(&src)),
        )?;
    }
    Ok(PatchOutcome::Patched)
}
