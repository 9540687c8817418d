//! WAV file I/O for the test harness
//!
//! Reads any PCM or float WAV into interleaved 32-bit float samples and writes
//! 16-bit PCM output, plus the (de)interleaving between file layout and the
//! per-channel buffers the effect consumes.

use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use log::{debug, info};
use serde::Serialize;

use crate::error::{Result, ToneError};

/// Decoded WAV contents
#[derive(Debug, Clone, Serialize)]
pub struct WavClip {
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of interleaved channels
    pub channels: u16,
    /// Bit depth of the source file
    pub bits_per_sample: u16,
    /// Interleaved samples normalised to [-1, 1]
    #[serde(skip)]
    pub samples: Vec<f32>,
}

impl WavClip {
    /// Number of frames (samples per channel)
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            0
        } else {
            self.samples.len() / usize::from(self.channels)
        }
    }
}

/// Load a WAV file
///
/// # Errors
/// `InputWav` if the file cannot be opened or decoded.
pub fn load_wav(path: &Path) -> Result<WavClip> {
    info!("Loading {}", path.display());
    let input_error = |source| ToneError::InputWav {
        path: path.display().to_string(),
        source,
    };

    let reader = WavReader::open(path).map_err(input_error)?;
    let spec = reader.spec();
    let samples = read_samples_as_f32(reader, spec).map_err(input_error)?;

    let clip = WavClip {
        sample_rate: spec.sample_rate,
        channels: spec.channels,
        bits_per_sample: spec.bits_per_sample,
        samples,
    };
    debug!(
        "WAV header: {} Hz, {} channel(s), {}-bit, {} frames",
        clip.sample_rate,
        clip.channels,
        clip.bits_per_sample,
        clip.frames()
    );
    Ok(clip)
}

/// Write interleaved samples as a 16-bit PCM WAV file
///
/// # Errors
/// `OutputWav` if the file cannot be created or written.
pub fn save_wav(path: &Path, sample_rate: u32, channels: u16, samples: &[f32]) -> Result<()> {
    let output_error = |source| ToneError::OutputWav {
        path: path.display().to_string(),
        source,
    };

    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec).map_err(output_error)?;
    for &sample in samples {
        // full scale matches the reader
        let scaled = (sample * 32768.0).round().clamp(-32768.0, 32767.0) as i16;
        writer.write_sample(scaled).map_err(output_error)?;
    }
    writer.finalize().map_err(output_error)?;

    info!("Wrote {} ({} channel(s))", path.display(), channels);
    Ok(())
}

/// De-interleave samples from [L,R,L,R,...] to [[L,L,...], [R,R,...]]
///
/// Trailing samples that do not fill a whole frame are dropped.
///
/// # Errors
/// `Config` if `channels` is zero.
pub fn deinterleave(samples: &[f32], channels: usize) -> Result<Vec<Vec<f32>>> {
    if channels == 0 {
        return Err(ToneError::Config {
            reason: "cannot de-interleave into zero channels".to_string(),
        });
    }

    let frames = samples.len() / channels;
    let mut result = vec![Vec::with_capacity(frames); channels];
    for frame in samples.chunks_exact(channels) {
        for (channel, &sample) in result.iter_mut().zip(frame) {
            channel.push(sample);
        }
    }
    Ok(result)
}

/// Interleave channels from [[L,L,...], [R,R,...]] to [L,R,L,R,...]
///
/// Channels are truncated to the shortest one.
pub fn interleave(channels: &[Vec<f32>]) -> Vec<f32> {
    let frames = channels.iter().map(Vec::len).min().unwrap_or(0);
    let mut result = Vec::with_capacity(frames * channels.len());

    for frame in 0..frames {
        for channel in channels {
            result.push(channel[frame]);
        }
    }

    result
}

fn read_samples_as_f32<R: std::io::Read>(
    mut reader: WavReader<R>,
    spec: WavSpec,
) -> std::result::Result<Vec<f32>, hound::Error> {
    match spec.sample_format {
        SampleFormat::Float => reader.samples::<f32>().collect(),
        SampleFormat::Int => {
            let scale = match spec.bits_per_sample {
                8 => 128.0,
                16 => 32768.0,
                24 => 8_388_608.0,
                32 => 2_147_483_648.0,
                _ => return Err(hound::Error::Unsupported),
            };
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect()
        }
    }
}
