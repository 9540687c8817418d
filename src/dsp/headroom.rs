//! Headroom Module
//!
//! Per-channel one-pole smoother followed by a static gain. Gain is set in dB
//! and stored as linear amplitude; one GAIN call applies to every channel.

use crate::dsp::convert::{db_to_linear, linear_to_db, step_response};
use crate::dsp::module::{check_buffers, DspModule};
use crate::error::{Result, ToneError};
use crate::protocol::{self, HeadroomParam, ModuleId};
use tracing::{debug, warn};

// ============================================================================
// Constants
// ============================================================================

/// Default channel count (left, right)
pub const DEFAULT_CHANNELS: usize = 2;

/// Default smoothing coefficient
const DEFAULT_ALPHA: f32 = 0.2;

// ============================================================================
// Headroom
// ============================================================================

/// Smoothing + gain stage
///
/// # Parameters
/// - `ENABLE` (u32): 0 passes audio through untouched, anything else enables
/// - `GAIN` (f32): gain in decibels, applied uniformly to all channels
///
/// Processing per channel `c` and sample `n` while enabled:
/// `history[c] = (1 - alpha) * in[n] + alpha * history[c]`, then
/// `out[n] = history[c] * gain[c]`.
#[derive(Debug, Clone)]
pub struct Headroom {
    num_channels: usize,
    enable: bool,
    alpha: f32,
    gains: Vec<f32>,
    history: Vec<f32>,
}

impl Headroom {
    /// Create a stereo headroom module
    pub fn new() -> Self {
        Self::with_channels(DEFAULT_CHANNELS)
    }

    /// Create a headroom module for `num_channels` channels
    ///
    /// Starts at unity gain with cleared history; `init` restores this state.
    pub fn with_channels(num_channels: usize) -> Self {
        Self {
            num_channels,
            enable: false,
            alpha: DEFAULT_ALPHA,
            gains: vec![1.0; num_channels],
            history: vec![0.0; num_channels],
        }
    }

    /// Enable or disable processing
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enable = enabled;
    }

    /// Set the gain in decibels on every channel
    pub fn set_gain_db(&mut self, db: f32) {
        let linear = db_to_linear(db);
        for gain in self.gains.iter_mut() {
            *gain = linear;
        }
        debug!(gain_db = db, linear, "headroom gain updated");
    }

    /// Current gain in decibels, read from the first channel
    pub fn gain_db(&self) -> f32 {
        linear_to_db(self.gains.first().copied().unwrap_or(1.0))
    }

    /// Set the smoothing coefficient
    ///
    /// # Errors
    /// `Parameter` if `alpha` is not strictly between 0 and 1; the current
    /// coefficient is kept.
    pub fn set_alpha(&mut self, alpha: f32) -> Result<()> {
        if !(alpha > 0.0 && alpha < 1.0) {
            warn!(alpha, "headroom alpha rejected");
            return Err(ToneError::Parameter {
                name: "alpha",
                value: alpha,
            });
        }
        self.alpha = alpha;
        Ok(())
    }

    /// Current smoothing coefficient
    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    /// One-pole history per channel
    pub fn history(&self) -> &[f32] {
        &self.history
    }

    fn set_enable_bytes(&mut self, data: &[u8]) -> Result<()> {
        let value = protocol::read_u32(data)?;
        self.set_enabled(value != 0);
        debug!(enabled = self.enable, "headroom enable updated");
        Ok(())
    }

    fn set_gain_bytes(&mut self, data: &[u8]) -> Result<()> {
        let db = protocol::read_f32(data)?;
        self.set_gain_db(db);
        Ok(())
    }
}

impl Default for Headroom {
    fn default() -> Self {
        Self::new()
    }
}

impl DspModule for Headroom {
    fn init(&mut self) -> Result<()> {
        self.gains.clear();
        self.gains.resize(self.num_channels, 1.0);
        self.history.clear();
        self.history.resize(self.num_channels, 0.0);
        self.enable = false;
        self.alpha = DEFAULT_ALPHA;
        debug!(channels = self.num_channels, "headroom initialised");
        Ok(())
    }

    fn set_param(&mut self, param_id: u16, data: &[u8]) -> Result<()> {
        match HeadroomParam::try_from(param_id)? {
            HeadroomParam::Enable => self.set_enable_bytes(data),
            HeadroomParam::Gain => self.set_gain_bytes(data),
        }
    }

    fn get_param(&self, param_id: u16, out: &mut [u8]) -> Result<()> {
        match HeadroomParam::try_from(param_id)? {
            HeadroomParam::Enable => protocol::write_u32(out, u32::from(self.enable)),
            HeadroomParam::Gain => protocol::write_f32(out, self.gain_db()),
        }
    }

    fn process(
        &mut self,
        inputs: &[&[f32]],
        outputs: &mut [&mut [f32]],
        frames: usize,
    ) -> Result<()> {
        check_buffers(inputs, outputs, self.num_channels, self.num_channels, frames)?;

        let alpha = self.alpha;
        for ch in 0..self.num_channels {
            let input = &inputs[ch][..frames];
            let output = &mut outputs[ch][..frames];

            if !self.enable {
                output.copy_from_slice(input);
                continue;
            }

            let gain = self.gains[ch];
            let mut state = self.history[ch];
            for (out, &sample) in output.iter_mut().zip(input) {
                state = step_response(sample, state, alpha);
                *out = state * gain;
            }
            self.history[ch] = state;
        }

        Ok(())
    }

    fn num_channels(&self) -> usize {
        self.num_channels
    }

    fn module_id(&self) -> ModuleId {
        ModuleId::Headroom
    }

    fn is_enabled(&self) -> bool {
        self.enable
    }
}

// ============================================================================
// Tests
// ============================================================================
