use anyhow::Result;
use clap::Parser;
use cleantext::args::Cli;
use cleantext::config::{
  self,
  Config
};
use cleantext::pipeline;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt;

fn main() -> Result<()> {
  let cli = Cli::parse();
  let config_path =
    config::resolve_path(
      cli.config.as_deref()
    );
  let config = Config::load(&config_path)?;
  init_tracing(
    config
      .logging
      .level
      .raised_by(cli.verbose)
      .filter()
  );
  tracing::debug!(
    path = %config_path.display(),
    "loaded config"
  );
  pipeline::run(
    cli.command,
    config,
    &config_path
  )
}

fn init_tracing(level: LevelFilter) {
  let subscriber = fmt()
    .with_max_level(level)
    .with_target(false)
    .with_writer(std::io::stderr)
    .finish();
  if tracing::subscriber::set_global_default(
    subscriber
  )
  .is_err()
  {
    tracing::warn!(
      "tracing subscriber already set"
    );
  }
}
