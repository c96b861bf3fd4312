//! Build the native components in the build set.

use std::path::PathBuf;

use super::StageContext;
use crate::component::Component;
use crate::config::BootstrapConfig;
use crate::error::Result;
use crate::identity::BuildIdentity;
use crate::state::RunState;

/// One command line and the directory it runs in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildStep {
    pub command: String,
    pub working_dir: PathBuf,
}

impl BuildStep {
    fn new(command: impl Into<String>, working_dir: PathBuf) -> Self {
        Self {
            command: command.into(),
            working_dir,
        }
    }
}

/// Commands that build `component`, in order.
pub fn build_steps(
    component: Component,
    config: &BootstrapConfig,
    identity: &BuildIdentity,
) -> Vec<BuildStep> {
    let source = component.source_dir(&config.src_dir());
    match component {
        Component::NativeRuntime => vec![BuildStep::new(
            "./build.sh x64 release skiptests skipnuget",
            source,
        )],
        Component::BaseClassLibraries => {
            // Newer trees split the native build into its own script.
            let native = source.join("src/Native");
            if native.join("build-native.sh").is_file() {
                vec![BuildStep::new(
                    "./build-native.sh x64 release Linux --numProc 1",
                    native,
                )]
            } else {
                vec![BuildStep::new("./build.sh native x64 release", source)]
            }
        }
        Component::HostResolver => vec![BuildStep::new(
            format!(
                "./build.sh --arch x64 --rid {} --hostver 0.0.0 --fxrver 0.0.0 \
                 --policyver 0.0.0 --commithash {}",
                shell_words::quote(&config.rid()),
                shell_words::quote(&identity.host),
            ),
            source.join("src/corehost"),
        )],
        Component::AsyncIoLibrary => ["./autogen.sh", "./configure", "make"]
            .into_iter()
            .map(|cmd| BuildStep::new(cmd, source.clone()))
            .collect(),
    }
}

/// Build every component in the build set, in fixed order. The first
/// failing command ends the stage.
pub fn build_components(
    ctx: &StageContext<'_>,
    identity: &BuildIdentity,
    state: &mut RunState,
) -> Result<Vec<Component>> {
    let mut built = Vec::new();
    for component in &ctx.config.build_set {
        tracing::info!("building {component}");
        for step in build_steps(*component, ctx.config, identity) {
            ctx.executor
                .run(state, &step.command, Some(&step.working_dir))?;
        }
        built.push(*component);
    }
    Ok(built)
}
