//! Shared utilities

pub mod context;
pub mod diagnostic;
pub mod fs;
pub mod hash;
pub mod version;

pub use context::GlobalContext;
pub use diagnostic::Diagnostic;
