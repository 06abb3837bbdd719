//! CLI definitions using clap.
//!
//! The `gen` and `config` options are not spelled out here: they are built
//! from the declared option table so the command line always matches it.

use std::path::Path;

use clap::parser::ValueSource;
use clap::{Arg, ArgAction, ArgMatches, Args, Command, FromArgMatches, Parser, Subcommand};
use clap_complete::Shell;

use podgen::config::{options, OptionKey, Value, ValueMap};

/// podgen - throwaway Xcode workspaces for developing a single pod
#[derive(Parser)]
#[command(name = "podgen")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a workspace for each podspec
    Gen(GenArgs),

    /// Print the resolved configuration
    Config(GenArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct GenArgs {
    #[command(flatten)]
    pub options: OptionArgs,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

const PODSPEC_PATHS_ID: &str = "podspec-paths";

/// An option given on the command line, before coercion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawOption {
    Flag(bool),
    Text(String),
}

/// Options given on the command line.
///
/// Only options the user actually passed are recorded, so that lower
/// configuration layers are not shadowed by clap defaults.
#[derive(Debug, Clone, Default)]
pub struct OptionArgs {
    pub podspec_paths: Vec<String>,
    pub explicit: Vec<(OptionKey, RawOption)>,
}

impl OptionArgs {
    /// Build the command-line configuration layer.
    ///
    /// The podspec paths are always present, empty when none were given.
    pub fn to_layer(&self, cwd: &Path) -> ValueMap {
        let mut layer = ValueMap::new();
        for (key, raw) in &self.explicit {
            let value = match raw {
                RawOption::Flag(enabled) => Value::Bool(*enabled),
                RawOption::Text(text) => Value::from(text.as_str()),
            };
            if let Some(value) = key.option().coerce(value, cwd) {
                layer.insert(*key, value);
            }
        }

        let paths = Value::Array(
            self.podspec_paths
                .iter()
                .map(|p| Value::from(p.as_str()))
                .collect(),
        );
        if let Some(paths) = OptionKey::PodspecPaths.option().coerce(paths, cwd) {
            layer.insert(OptionKey::PodspecPaths, paths);
        }
        layer
    }
}

impl Args for OptionArgs {
    fn augment_args(cmd: Command) -> Command {
        let mut cmd = cmd.arg(
            Arg::new(PODSPEC_PATHS_ID)
                .value_name("PODSPEC|DIR")
                .num_args(0..)
                .action(ArgAction::Append)
                .help("Podspecs or directories containing podspecs (defaults to the current directory)"),
        );

        for option in options() {
            let (Some(name), Some(message)) = (option.cli_name(), option.message) else {
                continue;
            };
            if option.is_flag() {
                let negated = format!("no-{}", name);
                cmd = cmd
                    .arg(
                        Arg::new(name.clone())
                            .long(name)
                            .action(ArgAction::SetTrue)
                            .help(message),
                    )
                    .arg(
                        Arg::new(negated.clone())
                            .long(negated)
                            .action(ArgAction::SetTrue)
                            .hide(true),
                    );
            } else {
                cmd = cmd.arg(
                    Arg::new(name.clone())
                        .long(name)
                        .value_name(option.arg_name.unwrap_or("VALUE"))
                        .action(ArgAction::Set)
                        .help(message),
                );
            }
        }
        cmd
    }

    fn augment_args_for_update(cmd: Command) -> Command {
        Self::augment_args(cmd)
    }
}

impl FromArgMatches for OptionArgs {
    fn from_arg_matches(matches: &ArgMatches) -> Result<Self, clap::Error> {
        let mut args = OptionArgs::default();
        args.update_from_arg_matches(matches)?;
        Ok(args)
    }

    fn update_from_arg_matches(&mut self, matches: &ArgMatches) -> Result<(), clap::Error> {
        self.podspec_paths = matches
            .get_many::<String>(PODSPEC_PATHS_ID)
            .map(|paths| paths.cloned().collect())
            .unwrap_or_default();

        self.explicit.clear();
        for option in options() {
            let Some(name) = option.cli_name() else {
                continue;
            };
            if option.message.is_none() {
                continue;
            }
            if option.is_flag() {
                let on = given_at(matches, &name);
                let off = given_at(matches, &format!("no-{}", name));
                let enabled = match (on, off) {
                    (Some(on), Some(off)) => on > off,
                    (Some(_), None) => true,
                    (None, Some(_)) => false,
                    (None, None) => continue,
                };
                self.explicit.push((option.key, RawOption::Flag(enabled)));
            } else if let Some(text) = matches.get_one::<String>(&name) {
                self.explicit
                    .push((option.key, RawOption::Text(text.clone())));
            }
        }
        Ok(())
    }
}

/// Position of an argument on the command line, if the user passed it.
fn given_at(matches: &ArgMatches, id: &str) -> Option<usize> {
    if matches.value_source(id) != Some(ValueSource::CommandLine) {
        return None;
    }
    matches.index_of(id)
}
