//! Clone and check out the sources of every component in the build set.

use super::StageContext;
use crate::component::Component;
use crate::error::Result;
use crate::identity::BuildIdentity;
use crate::state::RunState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourcesOutcome {
    /// Investigation mode; no version control ran.
    Skipped,
    /// Every component was cloned or already present.
    Ready,
}

/// Revision each component is checked out at.
pub fn revision_for(
    component: Component,
    identity: &BuildIdentity,
    async_io_revision: &str,
) -> String {
    match component {
        Component::NativeRuntime => identity.runtime.clone(),
        Component::BaseClassLibraries => identity.libraries.clone(),
        Component::HostResolver => identity.host.clone(),
        Component::AsyncIoLibrary => async_io_revision.to_string(),
    }
}

pub fn clone_and_checkout(
    ctx: &StageContext<'_>,
    identity: &BuildIdentity,
    state: &mut RunState,
) -> Result<SourcesOutcome> {
    if state.is_investigating() {
        tracing::info!("investigation mode: skipping clone and checkout");
        return Ok(SourcesOutcome::Skipped);
    }

    let config = ctx.config;
    let src = config.src_dir();
    for component in &config.build_set {
        let source_dir = component.source_dir(&src);
        if ctx.probe.sources_checked_out(&source_dir) {
            tracing::warn!(
                "{} already exists; source control there is up to you",
                source_dir.display()
            );
            continue;
        }

        let url = config.repository(*component);
        let revision = revision_for(*component, identity, &config.async_io_revision);
        tracing::info!("cloning {component} from {url} at {revision}");

        ctx.executor.run(
            state,
            &format!("git clone {}", shell_words::quote(url)),
            Some(&src),
        )?;
        ctx.executor.run(
            state,
            &format!("git checkout {}", shell_words::quote(&revision)),
            Some(&source_dir),
        )?;
    }
    Ok(SourcesOutcome::Ready)
}
