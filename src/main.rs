//! Tonal Valley CLI - Offline Test Driver
//!
//! Command-line interface for running WAV test cases through the effect core.

use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use log::info;

use tonal_valley::cli::{commands, Cli, Commands};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    info!("Tonal Valley v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Some(cmd) => handle_command(cmd),
        None => {
            println!("Tonal Valley v{}", env!("CARGO_PKG_VERSION"));
            println!("Use --help for available commands");
            Ok(())
        }
    }
}

fn handle_command(cmd: Commands) -> anyhow::Result<()> {
    match cmd {
        Commands::Run {
            case_dir,
            output_dir,
            block_size,
        } => commands::run(&case_dir, &output_dir, block_size)
            .with_context(|| format!("test case {} failed", case_dir.display())),
        Commands::Config => commands::print_config().context("could not read effect config"),
    }
}
