//! `podgen gen` command

use anyhow::Result;

use crate::cli::GenArgs;
use crate::commands::resolve_configuration;
use podgen::ops::{generate, WorkspaceWriter};
use podgen::util::diagnostic::{emit, validation_report};

pub fn execute(args: GenArgs, color: bool) -> Result<()> {
    let configuration = resolve_configuration(&args.options)?;
    tracing::debug!("{}", configuration);

    let errors = configuration.validate();
    if !errors.is_empty() {
        emit(&validation_report(&errors), color);
        std::process::exit(1);
    }

    let reports = generate(&configuration, &WorkspaceWriter)?;
    for report in &reports {
        eprintln!("   Generated {}", report.gen_dir.display());
        for target in &report.targets {
            match &target.platform {
                Some(platform) => eprintln!("             {} ({})", target.name, platform),
                None => eprintln!("             {}", target.name),
            }
        }
        if configuration.auto_open() {
            if let Some(workspace) = &report.workspace_path {
                eprintln!("        Open {}", workspace.display());
            }
        }
    }

    Ok(())
}
