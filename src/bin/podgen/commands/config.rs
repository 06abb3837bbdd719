//! `podgen config` command

use anyhow::Result;

use crate::cli::GenArgs;
use crate::commands::resolve_configuration;
use podgen::util::diagnostic::{emit, validation_report};

pub fn execute(args: GenArgs, color: bool) -> Result<()> {
    let configuration = resolve_configuration(&args.options)?;
    println!("{}", configuration);

    let errors = configuration.validate();
    if errors.is_empty() {
        println!("configuration is valid");
        return Ok(());
    }
    emit(&validation_report(&errors), color);
    std::process::exit(1);
}
