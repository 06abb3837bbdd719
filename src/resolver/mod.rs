//! Consumption of already-resolved dependency data.
//!
//! Nothing here solves versions: the lockfile records a previous
//! resolution and the graph exposes its "requires" relation.

pub mod graph;
pub mod lockfile;

pub use graph::DependencyGraph;
pub use lockfile::{LockedPod, Lockfile, LockfileError};
