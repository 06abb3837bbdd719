//! podgen - throwaway Xcode workspaces for developing a single pod
//!
//! This crate provides the library behind the `podgen` command: layered
//! configuration, podspec discovery and the synthesis of a Podfile that
//! hosts the pods under development.

pub mod config;
pub mod core;
pub mod ops;
pub mod resolver;
pub mod util;

pub use config::{Configuration, OptionKey, Value};
pub use core::{Dependency, Podfile, Specification};
pub use ops::{generate, PodfileGenerator};
pub use resolver::Lockfile;
pub use util::context::GlobalContext;
