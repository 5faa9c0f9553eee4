//! Rhythmvault CLI
//!
//! Command-line interface for the rhythmvault engine.

use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use log::info;

use rhythmvault::cli::{commands, Cli, Commands};
use rhythmvault::render::TriggerSheetBridge;
use rhythmvault::Session;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(filter)).init();

    info!("Rhythmvault v{}", env!("CARGO_PKG_VERSION"));

    let config = cli.load_config().context("failed to load configuration")?;
    let bridge = TriggerSheetBridge::new(config.machines());
    let mut session = Session::open(config)
        .context("failed to open session")?
        .with_bridge(Box::new(bridge));

    match &cli.command {
        Some(Commands::Shell) | None => commands::run_shell(&mut session)?,
        Some(command) => commands::run(&mut session, command)?,
    }
    Ok(())
}
