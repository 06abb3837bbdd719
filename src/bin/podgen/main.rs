//! podgen CLI - throwaway Xcode workspaces for developing a single pod

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("podgen=debug")
    } else {
        EnvFilter::new("podgen=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_ansi(!cli.no_color)
        .with_writer(std::io::stderr)
        .init();

    let color = !cli.no_color;

    match cli.command {
        Commands::Gen(args) => commands::gen::execute(args, color),
        Commands::Config(args) => commands::config::execute(args, color),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}
