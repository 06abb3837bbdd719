//! Core data structures for podgen.
//!
//! This module contains the input and output models of generation:
//! - Platforms and deployment targets
//! - Dependencies and pod specifications
//! - Podfiles and their target definitions

pub mod dependency;
pub mod platform;
pub mod podfile;
pub mod specification;

pub use dependency::Dependency;
pub use platform::{Platform, PlatformTarget};
pub use podfile::{FlagHash, Podfile, PodfileError, TargetDefinition, UsesFrameworks};
pub use specification::{Specification, SpecificationError};
