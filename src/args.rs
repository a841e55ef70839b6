use std::path::PathBuf;

use clap::{
  ArgAction,
  Parser,
  Subcommand,
  ValueEnum
};

use crate::rules::Rule;

#[derive(Debug, Parser)]
#[command(
  name = "cleantext",
  about = "Strip citation marks, \
           spaces and line breaks, \
           and fold full-width \
           characters"
)]
pub struct Cli {
  /// Config file (default:
  /// $CLEANTEXT_CONFIG or
  /// ./cleantext.toml)
  #[arg(long, global = true)]
  pub config:  Option<PathBuf>,
  /// Raise log verbosity (repeatable)
  #[arg(
    short,
    long,
    global = true,
    action = ArgAction::Count
  )]
  pub verbose: u8,
  #[command(subcommand)]
  pub command: Command
}

#[derive(Debug, Subcommand)]
pub enum Command {
  /// Clean stdin, a file, or every
  /// matching file under a directory
  Clean {
    /// File or directory to clean;
    /// omit or pass `-` for stdin
    path:     Option<PathBuf>,
    /// Skip a rule for this run
    #[arg(long, value_name = "RULE")]
    disable:  Vec<Rule>,
    /// Run only the named rules
    #[arg(
      long,
      value_name = "RULE",
      conflicts_with = "disable"
    )]
    only:     Vec<Rule>,
    /// Overwrite the source files
    #[arg(
      long,
      conflicts_with = "output"
    )]
    in_place: bool,
    /// Write cleaned files under this
    /// directory instead
    #[arg(long)]
    output:   Option<PathBuf>
  },
  /// List the rules in the order they
  /// run
  Rules,
  /// Inspect or change the saved rule
  /// settings
  Config {
    #[command(subcommand)]
    action: ConfigAction
  }
}

#[derive(Debug, Subcommand)]
pub enum ConfigAction {
  /// Print the effective config
  Show,
  /// Turn one rule on or off and save
  Set {
    rule:  Rule,
    state: Toggle
  },
  /// Write the default config
  Reset
}

#[derive(
  Debug, Clone, Copy, ValueEnum,
)]
pub enum Toggle {
  On,
  Off
}

impl Toggle {
  pub fn enabled(self) -> bool {
    matches!(self, Toggle::On)
  }
}
