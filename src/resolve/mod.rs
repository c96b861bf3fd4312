//! Version-directed resolution of patch targets inside a distribution.
//!
//! - [`select`] - pick the highest-precedence child directory of a container
//! - [`targets`] - resolve the shared, sdk and host subtrees of a distribution

pub mod select;
pub mod targets;

pub use select::{select_greatest, BASELINE_SENTINEL};
pub use targets::{resolve_patch_targets, PatchTargetSet, TargetLayout};
