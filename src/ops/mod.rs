//! High-level operations.
//!
//! This module contains the implementation of `podgen gen`.

pub mod generate;
pub mod install;
pub mod local_sources;

pub use generate::{PodfileGenerator, GENERATED_PODFILE_NAME};
pub use install::{
    generate, with_overrides, InstallReport, InstalledTarget, Installer, WorkspaceWriter,
};
pub use local_sources::{find_local_dependencies, LocalDependency};
