//! Test-case runner
//!
//! A test case is a directory holding one input `.wav` and an optional
//! `params.json`. The runner streams the input through an `Effect` in fixed
//! size blocks, the way an audio host would, and writes `output.wav`.

use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::Serialize;
use walkdir::WalkDir;

use crate::effect::Effect;
use crate::error::{Result, ToneError};
use crate::harness::params::ParamSet;
use crate::harness::wav::{self, WavClip};

/// Default block size in frames per channel
pub const DEFAULT_BLOCK_SIZE: usize = 1024;

/// Name of the optional parameter file inside a test case
pub const PARAMS_FILE: &str = "params.json";

/// Name of the rendered output file
pub const OUTPUT_FILE: &str = "output.wav";

/// Files making up one test case
#[derive(Debug, Clone)]
pub struct TestCase {
    pub name: String,
    pub wav: PathBuf,
    pub params: Option<PathBuf>,
}

impl TestCase {
    /// Locate the input WAV and parameter file inside `dir`
    ///
    /// The first `.wav` file in name order is used.
    ///
    /// # Errors
    /// `Config` if the directory holds no WAV file.
    pub fn discover(dir: &Path) -> Result<Self> {
        let wav = WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.into_path())
            .find(|path| {
                path.is_file()
                    && path
                        .extension()
                        .map_or(false, |ext| ext.eq_ignore_ascii_case("wav"))
            })
            .ok_or_else(|| ToneError::Config {
                reason: format!("no WAV file found in {}", dir.display()),
            })?;

        let params = dir.join(PARAMS_FILE);
        let params = params.is_file().then_some(params);
        let name = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| dir.display().to_string());

        Ok(Self { name, wav, params })
    }
}

/// Summary of one run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub test_case: String,
    pub input: WavClip,
    pub output: PathBuf,
    pub frames: usize,
    pub blocks: usize,
    pub block_size: usize,
    pub input_channels: u16,
    pub output_channels: u16,
    pub params_applied: usize,
}

/// Drives an `Effect` over a test case
#[derive(Debug)]
pub struct TestRunner {
    effect: Effect,
    block_size: usize,
}

impl TestRunner {
    /// Create a runner with the default block size
    pub fn new() -> Self {
        Self::with_block_size(DEFAULT_BLOCK_SIZE)
    }

    /// Create a runner that processes `block_size` frames per call
    ///
    /// A block size of zero is raised to one.
    pub fn with_block_size(block_size: usize) -> Self {
        Self {
            effect: Effect::new(),
            block_size: block_size.max(1),
        }
    }

    /// The effect being driven
    pub fn effect(&self) -> &Effect {
        &self.effect
    }

    /// Run the test case found in `case_dir` and write the result to
    /// `<output_dir>/output.wav`
    pub fn run(&mut self, case_dir: &Path, output_dir: &Path) -> Result<RunReport> {
        let case = TestCase::discover(case_dir)?;
        info!("Initiating test case {}", case.name);

        let clip = wav::load_wav(&case.wav)?;
        let input = self.prepare(&clip)?;

        let params_applied = match &case.params {
            Some(path) => ParamSet::load(path)?.apply(&mut self.effect)?,
            None => {
                info!(
                    "No parameter file in {}. Using default parameters.",
                    case_dir.display()
                );
                0
            }
        };

        let config = self.effect.config();
        let output_channels = usize::from(config.output_channels);
        let (rendered, blocks) = self.process(&input, output_channels)?;

        let output = output_dir.join(OUTPUT_FILE);
        wav::save_wav(
            &output,
            clip.sample_rate,
            config.output_channels,
            &wav::interleave(&rendered),
        )?;

        Ok(RunReport {
            test_case: case.name,
            frames: clip.frames(),
            input: clip,
            output,
            blocks,
            block_size: self.block_size,
            input_channels: config.input_channels,
            output_channels: config.output_channels,
            params_applied,
        })
    }

    /// Check the clip against the effect's channel requirements, initialise
    /// the effect and split the clip into channels
    ///
    /// # Errors
    /// `Config` if the clip's channel count differs from the effect's input
    /// width.
    pub fn prepare(&mut self, clip: &WavClip) -> Result<Vec<Vec<f32>>> {
        let config = self.effect.config();
        if clip.channels != config.input_channels {
            return Err(ToneError::Config {
                reason: format!(
                    "input WAV has {} channel(s), effect requires {}",
                    clip.channels, config.input_channels
                ),
            });
        }
        debug!(
            "Config: {} input channel(s), {} output channel(s)",
            config.input_channels, config.output_channels
        );

        let channels = wav::deinterleave(&clip.samples, usize::from(clip.channels))?;
        self.effect.init()?;
        Ok(channels)
    }

    /// Stream `input` through the effect in blocks
    ///
    /// Output blocks are zeroed before each call so channels the effect does
    /// not write stay silent. Returns the rendered channels and the number of
    /// blocks processed.
    pub fn process(
        &mut self,
        input: &[Vec<f32>],
        output_channels: usize,
    ) -> Result<(Vec<Vec<f32>>, usize)> {
        let total_frames = input.first().map_or(0, Vec::len);
        let total_blocks = total_frames.div_ceil(self.block_size);
        debug!(
            "Processing {} frames in {} block(s) of {}",
            total_frames, total_blocks, self.block_size
        );

        let mut rendered = vec![Vec::with_capacity(total_frames); output_channels];
        let mut block_out = vec![vec![0.0_f32; self.block_size]; output_channels];

        for (index, start) in (0..total_frames).step_by(self.block_size).enumerate() {
            let frames = self.block_size.min(total_frames - start);

            let inputs: Vec<&[f32]> = input.iter().map(|ch| &ch[start..start + frames]).collect();
            for channel in block_out.iter_mut() {
                channel.fill(0.0);
            }
            let mut outputs: Vec<&mut [f32]> =
                block_out.iter_mut().map(|ch| ch.as_mut_slice()).collect();

            self.effect
                .process(&inputs, &mut outputs, frames)
                .map_err(|e| {
                    log::error!("Processing failed on block {}: {}", index, e);
                    e
                })?;

            for (dest, block) in rendered.iter_mut().zip(&block_out) {
                dest.extend_from_slice(&block[..frames]);
            }
        }

        Ok((rendered, total_blocks))
    }
}

impl Default for TestRunner {
    fn default() -> Self {
        Self::new()
    }
}
