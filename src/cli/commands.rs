//! CLI Command Implementations
//!
//! Implements the actual logic for each CLI command.

use std::fs;
use std::path::Path;

use log::info;

use crate::effect::Effect;
use crate::error::{Result, ToneError};
use crate::harness::TestRunner;

/// Process one test case directory.
pub fn run(case_dir: &Path, output_dir: &Path, block_size: usize) -> Result<()> {
    info!("Running test case: {}", case_dir.display());

    fs::create_dir_all(output_dir).map_err(|e| ToneError::Config {
        reason: format!("cannot create {}: {}", output_dir.display(), e),
    })?;

    let mut runner = TestRunner::with_block_size(block_size);
    let report = runner.run(case_dir, output_dir)?;

    println!("Test case: {}", report.test_case);
    println!(
        "Input: {} Hz, {} channel(s), {} frames",
        report.input.sample_rate, report.input_channels, report.frames
    );
    println!(
        "Processed {} block(s) of {} frames, {} parameter(s) applied",
        report.blocks, report.block_size, report.params_applied
    );
    println!("Output saved to: {}", report.output.display());

    Ok(())
}

/// Print the stream configuration of a freshly initialised effect as JSON.
pub fn print_config() -> Result<()> {
    let mut effect = Effect::new();
    effect.init()?;
    let config = effect.config();

    let json = serde_json::to_string_pretty(&config).map_err(|e| ToneError::Config {
        reason: e.to_string(),
    })?;
    println!("{}", json);

    Ok(())
}
