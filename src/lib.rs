//! Bootstrap a .NET Core distribution for an unsupported Linux host.
//!
//! A run takes a prebuilt baseline payload, finds the newest framework, sdk
//! and resolver directories inside it, reads which upstream commits the
//! baseline's native binaries were built from, rebuilds those native
//! components from source for the host, and copies the results over the
//! baseline.
//!
//! - **Version ordering** - [`version::Version`], a total order over
//!   directory names like `1.0.0-rc2-002416`
//! - **Patch targets** - [`resolve`], greatest-version selection and the
//!   three directories a patch writes into
//! - **Execution** - [`executor::ReproducibleExecutor`], which leaves a
//!   repro script behind for every failed command
//! - **Stages** - [`stages`], driven in order by [`orchestrator::Orchestrator`]
//!
//! # Architecture
//!
//! ```text
//! dotnet-bootstrap (binary)
//!     │
//!     ├── BootstrapConfig   (immutable, built once)
//!     ├── RunState          (&mut, Normal -> Investigation only)
//!     └── Orchestrator
//!           ├── s00 working tree + lock
//!           ├── s01 payload (fetch, unpack)
//!           ├── resolve targets, extract identity
//!           ├── s02 sources (git, skipped when investigating)
//!           ├── s03 build
//!           └── s04 patch
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use dotnet_bootstrap::config::{BootstrapConfig, OsIdentity};
//! use dotnet_bootstrap::executor::ReproducibleExecutor;
//! use dotnet_bootstrap::orchestrator::Orchestrator;
//! use dotnet_bootstrap::RunState;
//!
//! let config = BootstrapConfig::new(OsIdentity::detect()?, std::env::current_dir()?);
//! let summary = Orchestrator::new(config, ReproducibleExecutor::shell())
//!     .run(&mut RunState::new())?;
//! println!("{}", summary.distribution.display());
//! ```

pub mod archive;
pub mod component;
pub mod config;
pub mod error;
pub mod executor;
pub mod fetch;
pub mod identity;
pub mod orchestrator;
pub mod preflight;
pub mod resolve;
pub mod stage_runs;
pub mod stages;
pub mod state;
pub mod version;

pub use component::Component;
pub use config::BootstrapConfig;
pub use error::{BootstrapError, Result};
pub use orchestrator::{Orchestrator, RunSummary};
pub use state::{Mode, RunState};
pub use version::Version;
