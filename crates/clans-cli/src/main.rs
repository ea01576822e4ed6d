//! Clans CLI Application
//!
//! Command-line client for reading, searching and editing plans on a
//! GrinnellPlans server.

mod args;
mod cli;
mod editor;
mod renderer;

use std::process::ExitCode;

use anyhow::{Context, Result};
use args::{Args, Commands, GlobalArgs};
use clans_core::{config, Config};
use clap::Parser;
use cli::Cli;
use log::info;
use renderer::TerminalRenderer;

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();

    let Args { global, command } = Args::parse();

    match run(global, command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(global: GlobalArgs, command: Commands) -> Result<()> {
    let profile_dir = config::profile_dir().context("Failed to prepare profile directory")?;
    let config = Config::load(&profile_dir.join(config::CONFIG_FILE))?;

    info!("Clans started with profile {}", profile_dir.display());

    Cli::new(profile_dir, config, global, TerminalRenderer::detect())
        .run(command)
        .await
}
