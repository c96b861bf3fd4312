//! The native components a bootstrap can rebuild.
//!
//! The set is closed: the .NET Core runtime (`coreclr`), the native half of
//! the base class libraries (`corefx`), the host and resolver (`core-setup`)
//! and the async I/O library (`libuv`). Each component knows its upstream
//! repository, its checkout directory under `src/` and the directory its
//! build leaves native outputs in.

use std::fmt;
use std::path::{Path, PathBuf};

/// libuv is pinned to 1.9.0.
pub const ASYNC_IO_PINNED_REVISION: &str = "229b3a4cc150aebd6561e6bd43076eafa7a03756";

/// A rebuildable native component.
///
/// Declaration order is build order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, clap::ValueEnum)]
pub enum Component {
    /// CoreCLR runtime.
    #[value(name = "native-runtime", alias = "coreclr")]
    NativeRuntime,
    /// CoreFX native shims.
    #[value(name = "base-class-libraries", alias = "corefx")]
    BaseClassLibraries,
    /// core-setup host, host policy and resolver.
    #[value(name = "host-resolver", alias = "core-setup")]
    HostResolver,
    /// libuv.
    #[value(name = "async-io-library", alias = "libuv")]
    AsyncIoLibrary,
}

impl Component {
    /// Every component, in build order.
    pub const ALL: [Component; 4] = [
        Component::NativeRuntime,
        Component::BaseClassLibraries,
        Component::HostResolver,
        Component::AsyncIoLibrary,
    ];

    /// Name used on the command line and in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Component::NativeRuntime => "native-runtime",
            Component::BaseClassLibraries => "base-class-libraries",
            Component::HostResolver => "host-resolver",
            Component::AsyncIoLibrary => "async-io-library",
        }
    }

    /// Directory name of the checkout under `src/`.
    pub fn repo_dir(&self) -> &'static str {
        match self {
            Component::NativeRuntime => "coreclr",
            Component::BaseClassLibraries => "corefx",
            Component::HostResolver => "core-setup",
            Component::AsyncIoLibrary => "libuv",
        }
    }

    /// Upstream repository cloned when no override is configured.
    pub fn default_repository(&self) -> &'static str {
        match self {
            Component::NativeRuntime => "https://github.com/dotnet/coreclr",
            Component::BaseClassLibraries => "https://github.com/dotnet/corefx",
            Component::HostResolver => "https://github.com/dotnet/core-setup",
            Component::AsyncIoLibrary => "https://github.com/libuv/libuv",
        }
    }

    /// Checkout directory for this component under `src_dir`.
    pub fn source_dir(&self, src_dir: &Path) -> PathBuf {
        src_dir.join(self.repo_dir())
    }

    /// Directory the component's build leaves its native outputs in.
    pub fn output_dir(&self, src_dir: &Path) -> PathBuf {
        let source = self.source_dir(src_dir);
        match self {
            Component::NativeRuntime => source.join("bin/Product/Linux.x64.Release"),
            Component::BaseClassLibraries => source.join("bin/Linux.x64.Release/Native"),
            Component::HostResolver => source.join("src/corehost/cli"),
            Component::AsyncIoLibrary => source.join(".libs"),
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
