//! Level-adaptive biquad filter
//!
//! A single-channel second-order IIR whose coefficients are interpolated
//! between a "quiet" set and a "loud" set according to the average input level
//! of each block. The interpolation position follows the level through an
//! exponential step response, so attack and release run at block rate.

use crate::dsp::convert::{linear_to_db, step_response};
use crate::error::{Result, ToneError};
use crate::protocol::{self, BIQUAD_NUM_COEFFS};
use tracing::{debug, warn};

/// Smallest accepted step-response coefficient
pub const ALPHA_MIN: f32 = 0.3;

/// Largest accepted step-response coefficient
pub const ALPHA_MAX: f32 = 0.9;

const DEFAULT_ALPHA: f32 = 0.5;
const DEFAULT_MIN_GAIN_DB: f32 = -60.0;
const DEFAULT_MAX_GAIN_DB: f32 = 0.0;

/// Identity coefficient set: `y[n] = x[n]`
const IDENTITY: [f32; BIQUAD_NUM_COEFFS] = [1.0, 0.0, 0.0, 0.0, 0.0];

/// Five biquad coefficients `[c0, c1, c2, c3, c4]`
///
/// Applied as `y = c0*x[n] + c1*x[n-1] + c2*x[n-2] + c3*y[n-1] + c4*y[n-2]`;
/// the feedback coefficients carry their own sign.
pub type Coefficients = [f32; BIQUAD_NUM_COEFFS];

/// Filter history for one channel
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct History {
    x1: f32, // x[n-1]
    x2: f32, // x[n-2]
    y1: f32, // y[n-1]
    y2: f32, // y[n-2]
}

impl History {
    #[inline]
    fn process(&mut self, input: f32, c: &Coefficients) -> f32 {
        let output =
            c[0] * input + c[1] * self.x1 + c[2] * self.x2 + c[3] * self.y1 + c[4] * self.y2;

        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = output;

        output
    }
}

/// Interpolate each coefficient: `(1 - scale) * min + scale * max`
pub fn interpolate(min: &Coefficients, max: &Coefficients, scale: f32) -> Coefficients {
    let mut current = [0.0; BIQUAD_NUM_COEFFS];
    for ((c, lo), hi) in current.iter_mut().zip(min).zip(max) {
        *c = (1.0 - scale) * lo + scale * hi;
    }
    current
}

/// Level-adaptive biquad for one channel
///
/// Configure with the byte-level setters before the first `process` call.
/// `min_gain_db <= max_gain_db` is expected; other orderings are accepted but
/// give a degenerate mapping.
#[derive(Debug, Clone)]
pub struct AdaptiveBiquad {
    channel_id: u16,
    min_gain_db: f32,
    max_gain_db: f32,
    min_coeffs: Coefficients,
    max_coeffs: Coefficients,
    alpha: f32,
    current_scale: f32,
    history: History,
}

impl AdaptiveBiquad {
    /// Create a filter that passes audio through until configured
    pub fn new() -> Self {
        Self {
            channel_id: 0,
            min_gain_db: DEFAULT_MIN_GAIN_DB,
            max_gain_db: DEFAULT_MAX_GAIN_DB,
            min_coeffs: IDENTITY,
            max_coeffs: IDENTITY,
            alpha: DEFAULT_ALPHA,
            current_scale: 0.0,
            history: History::default(),
        }
    }

    /// Bind the filter to a channel and clear its running state
    pub fn init(&mut self, channel_id: u16) -> Result<()> {
        self.channel_id = channel_id;
        self.history = History::default();
        self.current_scale = 0.0;
        debug!(channel = channel_id, "adaptive biquad initialised");
        Ok(())
    }

    /// Channel this filter was initialised for
    pub fn channel_id(&self) -> u16 {
        self.channel_id
    }

    // ------------------------------------------------------------------------
    // Byte-level configuration
    // ------------------------------------------------------------------------

    /// Set the coefficients used at or below `min_gain_db` (20 bytes)
    pub fn set_min_coeffs(&mut self, data: &[u8]) -> Result<()> {
        self.min_coeffs = protocol::read_f32_array::<BIQUAD_NUM_COEFFS>(data)?;
        Ok(())
    }

    /// Set the coefficients used at or above `max_gain_db` (20 bytes)
    pub fn set_max_coeffs(&mut self, data: &[u8]) -> Result<()> {
        self.max_coeffs = protocol::read_f32_array::<BIQUAD_NUM_COEFFS>(data)?;
        Ok(())
    }

    /// Set the lower level threshold in dB (4 bytes)
    pub fn set_min_gain(&mut self, data: &[u8]) -> Result<()> {
        self.min_gain_db = protocol::read_f32(data)?;
        Ok(())
    }

    /// Set the upper level threshold in dB (4 bytes)
    pub fn set_max_gain(&mut self, data: &[u8]) -> Result<()> {
        self.max_gain_db = protocol::read_f32(data)?;
        Ok(())
    }

    /// Set the step-response coefficient (4 bytes)
    ///
    /// # Errors
    /// `Size` on a wrong length, `Parameter` if the value lies outside
    /// `[ALPHA_MIN, ALPHA_MAX]`. Either way the stored coefficient is kept.
    pub fn set_step_response(&mut self, data: &[u8]) -> Result<()> {
        let alpha = protocol::read_f32(data)?;
        if !(ALPHA_MIN..=ALPHA_MAX).contains(&alpha) {
            warn!(alpha, channel = self.channel_id, "step response out of range");
            return Err(ToneError::Parameter {
                name: "step_response",
                value: alpha,
            });
        }
        self.alpha = alpha;
        Ok(())
    }

    /// Write the quiet coefficient set (20 bytes)
    pub fn get_min_coeffs(&self, out: &mut [u8]) -> Result<()> {
        protocol::write_f32_array(out, &self.min_coeffs)
    }

    /// Write the loud coefficient set (20 bytes)
    pub fn get_max_coeffs(&self, out: &mut [u8]) -> Result<()> {
        protocol::write_f32_array(out, &self.max_coeffs)
    }

    /// Write the lower level threshold (4 bytes)
    pub fn get_min_gain(&self, out: &mut [u8]) -> Result<()> {
        protocol::write_f32(out, self.min_gain_db)
    }

    /// Write the upper level threshold (4 bytes)
    pub fn get_max_gain(&self, out: &mut [u8]) -> Result<()> {
        protocol::write_f32(out, self.max_gain_db)
    }

    /// Write the step-response coefficient (4 bytes)
    pub fn get_step_response(&self, out: &mut [u8]) -> Result<()> {
        protocol::write_f32(out, self.alpha)
    }

    /// Write the coefficients for the current interpolation position (20 bytes)
    pub fn get_current_coeffs(&self, out: &mut [u8]) -> Result<()> {
        protocol::write_f32_array(out, &self.current_coefficients())
    }

    // ------------------------------------------------------------------------
    // Runtime
    // ------------------------------------------------------------------------

    /// Smoothed interpolation position in `[0, 1]`
    pub fn current_scale(&self) -> f32 {
        self.current_scale
    }

    /// Coefficients at the current interpolation position
    pub fn current_coefficients(&self) -> Coefficients {
        interpolate(&self.min_coeffs, &self.max_coeffs, self.current_scale)
    }

    /// Map an average level in dB onto `[0, 1]` between the thresholds
    pub fn raw_scale(&self, avg_db: f32) -> f32 {
        if avg_db >= self.max_gain_db {
            1.0
        } else if avg_db <= self.min_gain_db {
            0.0
        } else {
            (avg_db - self.min_gain_db) / (self.max_gain_db - self.min_gain_db)
        }
    }

    /// Measure a block and move the interpolation position toward its level
    ///
    /// Every sample is converted to dB (non-positive samples are negative
    /// infinity) and the block average is treated as one point sample.
    pub fn update_scale(&mut self, block: &[f32]) {
        if block.is_empty() {
            return;
        }
        let sum_db: f32 = block.iter().map(|&x| linear_to_db(x)).sum();
        let avg_db = sum_db / block.len() as f32;
        let raw = self.raw_scale(avg_db);
        self.current_scale = step_response(raw, self.current_scale, self.alpha);
    }

    /// Filter one block
    ///
    /// # Errors
    /// `Size` if `output` is shorter than `input`. Nothing is processed.
    pub fn process(&mut self, input: &[f32], output: &mut [f32]) -> Result<()> {
        if output.len() < input.len() {
            return Err(ToneError::Size {
                expected: input.len(),
                actual: output.len(),
            });
        }

        self.update_scale(input);
        let coeffs = self.current_coefficients();

        for (out, &sample) in output.iter_mut().zip(input) {
            *out = self.history.process(sample, &coeffs);
        }
        Ok(())
    }
}

impl Default for AdaptiveBiquad {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const QUIET: Coefficients = [0.5, 0.1, 0.05, 0.2, -0.1];
    const LOUD: Coefficients = [1.5, -0.3, 0.2, -0.4, 0.05];

    fn bytes(values: &[f32]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_ne_bytes()).collect()
    }

    fn configured() -> AdaptiveBiquad {
        let mut biquad = AdaptiveBiquad::new();
        biquad.init(0).unwrap();
        biquad.set_min_coeffs(&bytes(&QUIET)).unwrap();
        biquad.set_max_coeffs(&bytes(&LOUD)).unwrap();
        biquad.set_min_gain(&bytes(&[-40.0])).unwrap();
        biquad.set_max_gain(&bytes(&[-10.0])).unwrap();
        biquad.set_step_response(&bytes(&[0.5])).unwrap();
        biquad
    }

    #[test]
    fn test_unconfigured_is_identity() {
        let mut biquad = AdaptiveBiquad::new();
        biquad.init(3).unwrap();
        let input = [0.2, -0.4, 0.6, 0.0];
        let mut output = [0.0; 4];

        biquad.process(&input, &mut output).unwrap();

        assert_eq!(output, input);
        assert_eq!(biquad.channel_id(), 3);
    }

    #[test]
    fn test_raw_scale_mapping() {
        let biquad = configured();
        assert_eq!(biquad.raw_scale(-80.0), 0.0);
        assert_eq!(biquad.raw_scale(-40.0), 0.0);
        assert_eq!(biquad.raw_scale(-10.0), 1.0);
        assert_eq!(biquad.raw_scale(6.0), 1.0);
        assert_abs_diff_eq!(biquad.raw_scale(-25.0), 0.5, epsilon = 1e-6);
        assert_eq!(biquad.raw_scale(f32::NEG_INFINITY), 0.0);
    }

    #[test]
    fn test_interpolation_endpoints_exact() {
        assert_eq!(interpolate(&QUIET, &LOUD, 0.0), QUIET);
        assert_eq!(interpolate(&QUIET, &LOUD, 1.0), LOUD);
        let mid = interpolate(&QUIET, &LOUD, 0.5);
        assert_abs_diff_eq!(mid[0], 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(mid[3], -0.1, epsilon = 1e-6);
    }

    #[test]
    fn test_loud_input_settles_on_max() {
        let mut biquad = configured();
        let block = [0.9_f32; 64];
        let mut out = [0.0_f32; 64];

        for _ in 0..60 {
            biquad.process(&block, &mut out).unwrap();
        }

        assert_abs_diff_eq!(biquad.current_scale(), 1.0, epsilon = 1e-6);
        let current = biquad.current_coefficients();
        for (got, want) in current.iter().zip(LOUD) {
            assert_abs_diff_eq!(*got, want, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_quiet_input_decays_to_min() {
        let mut biquad = configured();
        let loud = [0.9_f32; 16];
        let quiet = [1e-4_f32; 16];
        let mut out = [0.0_f32; 16];

        for _ in 0..20 {
            biquad.process(&loud, &mut out).unwrap();
        }
        for _ in 0..60 {
            biquad.process(&quiet, &mut out).unwrap();
        }

        assert_abs_diff_eq!(biquad.current_scale(), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_scale_step_response() {
        let mut biquad = configured();
        // 0.9 is above the upper threshold, raw = 1
        biquad.update_scale(&[0.9; 8]);
        assert_abs_diff_eq!(biquad.current_scale(), 0.5, epsilon = 1e-6);
        biquad.update_scale(&[0.9; 8]);
        assert_abs_diff_eq!(biquad.current_scale(), 0.75, epsilon = 1e-6);
    }

    #[test]
    fn test_non_positive_sample_forces_quiet() {
        let mut biquad = configured();
        biquad.update_scale(&[0.9, 0.9, 0.0, 0.9]);
        assert_eq!(biquad.current_scale(), 0.0);
    }

    #[test]
    fn test_difference_equation() {
        let mut biquad = AdaptiveBiquad::new();
        biquad.init(0).unwrap();
        let coeffs: Coefficients = [0.5, 0.25, 0.0, 0.5, 0.0];
        biquad.set_min_coeffs(&bytes(&coeffs)).unwrap();
        biquad.set_max_coeffs(&bytes(&coeffs)).unwrap();

        let input = [1.0, 0.0, 0.0];
        let mut output = [0.0; 3];
        biquad.process(&input, &mut output).unwrap();

        // y0 = 0.5; y1 = 0.25 + 0.5*0.5 = 0.5; y2 = 0.5*0.5 = 0.25
        assert_abs_diff_eq!(output[0], 0.5, epsilon = 1e-6);
        assert_abs_diff_eq!(output[1], 0.5, epsilon = 1e-6);
        assert_abs_diff_eq!(output[2], 0.25, epsilon = 1e-6);
    }

    #[test]
    fn test_history_carries_between_blocks() {
        let mut biquad = AdaptiveBiquad::new();
        biquad.init(0).unwrap();
        let coeffs: Coefficients = [0.0, 1.0, 0.0, 0.0, 0.0];
        biquad.set_min_coeffs(&bytes(&coeffs)).unwrap();
        biquad.set_max_coeffs(&bytes(&coeffs)).unwrap();

        let mut out = [0.0; 2];
        biquad.process(&[0.3, 0.7], &mut out).unwrap();
        biquad.process(&[0.1, 0.2], &mut out).unwrap();

        // one-sample delay: the first output of block two is the last input of block one
        assert_abs_diff_eq!(out[0], 0.7, epsilon = 1e-6);
        assert_abs_diff_eq!(out[1], 0.1, epsilon = 1e-6);
    }

    #[test]
    fn test_wrong_sizes_do_not_mutate() {
        let mut biquad = configured();

        assert!(matches!(
            biquad.set_min_coeffs(&bytes(&[1.0, 2.0, 3.0, 4.0])),
            Err(ToneError::Size {
                expected: 20,
                actual: 16
            })
        ));
        assert!(biquad.set_max_gain(&[0u8; 2]).is_err());
        assert!(biquad.set_step_response(&[0u8; 8]).is_err());

        let mut out = [0u8; 20];
        biquad.get_min_coeffs(&mut out).unwrap();
        assert_eq!(out.to_vec(), bytes(&QUIET));
        let mut gain = [0u8; 4];
        biquad.get_max_gain(&mut gain).unwrap();
        assert_eq!(f32::from_ne_bytes(gain), -10.0);
    }

    #[test]
    fn test_step_response_out_of_range_is_discarded() {
        let mut biquad = configured();

        for bad in [0.1_f32, 0.95, -1.0] {
            let err = biquad.set_step_response(&bytes(&[bad])).unwrap_err();
            assert_eq!(err.error_code(), "PARAMETER_ERROR");
        }

        let mut out = [0u8; 4];
        biquad.get_step_response(&mut out).unwrap();
        assert_eq!(f32::from_ne_bytes(out), 0.5);
        assert!(biquad.set_step_response(&bytes(&[ALPHA_MAX])).is_ok());
    }

    #[test]
    fn test_short_output_rejected() {
        let mut biquad = configured();
        let mut out = [0.0; 2];
        assert!(biquad.process(&[0.5; 4], &mut out).is_err());
        assert_eq!(biquad.current_scale(), 0.0);
    }

    #[test]
    fn test_current_coeffs_bytes() {
        let biquad = configured();
        let mut out = [0u8; 20];
        biquad.get_current_coeffs(&mut out).unwrap();
        assert_eq!(out.to_vec(), bytes(&QUIET));
    }
}
