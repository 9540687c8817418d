//! DspModule trait definition
//!
//! Base trait for every module addressable through the dispatcher.

use crate::error::{Result, ToneError};
use crate::protocol::ModuleId;

/// An addressable DSP unit with its own parameter namespace
///
/// Parameter values travel as exact-size byte blobs. Implementations validate
/// the blob length before interpreting it and never partially apply a value.
pub trait DspModule: Send {
    /// Reset state and size per-channel storage
    ///
    /// The only place a module may allocate.
    fn init(&mut self) -> Result<()>;

    /// Set a parameter from its wire bytes
    fn set_param(&mut self, param_id: u16, data: &[u8]) -> Result<()>;

    /// Write a parameter's wire bytes into `out`
    fn get_param(&self, param_id: u16, out: &mut [u8]) -> Result<()>;

    /// Process one block of `frames` samples per channel
    fn process(
        &mut self,
        inputs: &[&[f32]],
        outputs: &mut [&mut [f32]],
        frames: usize,
    ) -> Result<()>;

    /// Number of channels this module consumes and produces
    fn num_channels(&self) -> usize;

    /// Wire identifier of this module
    fn module_id(&self) -> ModuleId;

    /// Check if the module is enabled
    fn is_enabled(&self) -> bool;
}

/// Verify that a block's channel buffers can be processed before touching any
///
/// A missing channel reports `NullPointer`, a channel holding fewer than
/// `frames` samples reports `Size`.
pub fn check_buffers(
    inputs: &[&[f32]],
    outputs: &[&mut [f32]],
    input_channels: usize,
    output_channels: usize,
    frames: usize,
) -> Result<()> {
    for channel in 0..input_channels {
        let buffer = inputs
            .get(channel)
            .ok_or(ToneError::NullPointer { channel })?;
        if buffer.len() < frames {
            return Err(ToneError::Size {
                expected: frames,
                actual: buffer.len(),
            });
        }
    }
    for channel in 0..output_channels {
        let buffer = outputs
            .get(channel)
            .ok_or(ToneError::NullPointer { channel })?;
        if buffer.len() < frames {
            return Err(ToneError::Size {
                expected: frames,
                actual: buffer.len(),
            });
        }
    }
    Ok(())
}
