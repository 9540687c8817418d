//! CLI Module
//!
//! Command-line interface for running Tonal Valley test cases.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::harness::DEFAULT_BLOCK_SIZE;

/// Tonal Valley - offline driver for the audio effect core
#[derive(Parser, Debug)]
#[command(name = "toval")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Process a test case directory (one .wav, optional params.json)
    #[command(name = "run")]
    Run {
        /// Directory holding the test case
        case_dir: PathBuf,

        /// Directory receiving output.wav
        output_dir: PathBuf,

        /// Frames per channel handed to each process call
        #[arg(short, long, default_value_t = DEFAULT_BLOCK_SIZE)]
        block_size: usize,
    },

    /// Print the effect's negotiated stream configuration
    #[command(name = "config")]
    Config,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run() {
        let cli = Cli::parse_from(["toval", "run", "cases/02", "out", "-b", "256"]);
        match cli.command {
            Some(Commands::Run {
                case_dir,
                output_dir,
                block_size,
            }) => {
                assert_eq!(case_dir, PathBuf::from("cases/02"));
                assert_eq!(output_dir, PathBuf::from("out"));
                assert_eq!(block_size, 256);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_run_default_block_size() {
        let cli = Cli::parse_from(["toval", "-v", "run", "a", "b"]);
        assert!(cli.verbose);
        assert!(matches!(
            cli.command,
            Some(Commands::Run {
                block_size: DEFAULT_BLOCK_SIZE,
                ..
            })
        ));
    }
}
