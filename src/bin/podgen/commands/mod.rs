//! Command implementations

pub mod completions;
pub mod config;
pub mod gen;

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::cli::OptionArgs;
use podgen::config::layers::{from_env, resolve, ResolveInput};
use podgen::config::Configuration;
use podgen::util::GlobalContext;

/// Resolve the configuration for the current directory.
pub fn resolve_configuration(options: &OptionArgs) -> Result<Configuration> {
    let ctx = Arc::new(GlobalContext::new()?);

    let mut input = ResolveInput::new(Arc::clone(&ctx));
    input.env = from_env(std::env::vars(), ctx.cwd());
    input.cli = options.to_layer(ctx.cwd());

    resolve(input).context("failed to load configuration")
}
