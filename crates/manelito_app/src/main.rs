mod app;
mod cli;
mod config;
mod effects;
mod render;

use std::process::ExitCode;

use clap::Parser;

fn main() -> anyhow::Result<ExitCode> {
    let cli = cli::Cli::parse();
    let config = config::load(cli.config.as_deref())?;

    let destination = cli.log.map(Into::into).unwrap_or(config.log_destination);
    engine_logging::initialize(destination, cli.log_level(destination), &config.log_file);

    app::run(cli, config)
}
