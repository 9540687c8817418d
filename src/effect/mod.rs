//! Effect dispatcher
//!
//! Owns the global bypass flag, the negotiated stream configuration and the
//! module chain. Control calls are routed by `(module_id, param_id)`; block
//! processing goes through the chain unless the effect is globally disabled.
//!
//! Chain order: Headroom.

mod config;

pub use config::{EffectConfig, DEFAULT_SAMPLE_RATE};

use crate::dsp::{check_buffers, DspModule, Headroom};
use crate::error::{Result, ToneError};
use crate::protocol::{self, GlobalParam, ModuleId};
use tracing::debug;

/// Top-level effect instance
///
/// Not internally synchronised: the host serialises control and process
/// calls.
#[derive(Debug, Clone)]
pub struct Effect {
    global_enable: u32,
    config: EffectConfig,
    headroom: Headroom,
}

impl Effect {
    /// Create an effect with its module chain and default configuration
    ///
    /// Call `init` before processing.
    pub fn new() -> Self {
        let mut effect = Self {
            global_enable: 0,
            config: EffectConfig::default(),
            headroom: Headroom::new(),
        };
        effect.update_channel_config();
        effect
    }

    /// Reset the global bypass and initialise every module
    ///
    /// # Errors
    /// The first module initialisation failure, unchanged.
    pub fn init(&mut self) -> Result<()> {
        self.global_enable = 0;
        self.headroom.init()?;
        self.update_channel_config();
        debug!(config = ?self.config, "effect initialised");
        Ok(())
    }

    /// Set a parameter from its wire bytes
    ///
    /// # Errors
    /// - `ModuleId` for an unknown module
    /// - `ParamId` for an unknown parameter of a known module
    /// - `Size` if `data` is not the parameter's exact wire size
    pub fn set(&mut self, module_id: u16, param_id: u16, data: &[u8]) -> Result<()> {
        match ModuleId::try_from(module_id)? {
            ModuleId::Global => self.global_set(param_id, data),
            module => self.module_mut(module)?.set_param(param_id, data),
        }
    }

    /// Host-shaped variant of `set` carrying an explicit length
    ///
    /// `length` is checked against the parameter's wire size before the data
    /// is looked at.
    ///
    /// # Errors
    /// `ModuleId`/`ParamId` for unknown ids, `Size` when `length` is not the
    /// wire size or `data` holds fewer than `length` bytes, `MissingData`
    /// when `data` is absent.
    pub fn set_raw(
        &mut self,
        module_id: u16,
        param_id: u16,
        length: u16,
        data: Option<&[u8]>,
    ) -> Result<()> {
        let length = Self::check_raw_length(module_id, param_id, length)?;
        let data = data.ok_or(ToneError::MissingData)?;
        let bytes = data.get(..length).ok_or(ToneError::Size {
            expected: length,
            actual: data.len(),
        })?;
        self.set(module_id, param_id, bytes)
    }

    /// Read a parameter's wire bytes into `out`
    ///
    /// GLOBAL has no readable parameters yet; every GLOBAL id reports
    /// `ParamId`.
    pub fn get(&self, module_id: u16, param_id: u16, out: &mut [u8]) -> Result<()> {
        match ModuleId::try_from(module_id)? {
            ModuleId::Global => Err(ToneError::ParamId {
                module_id,
                param_id,
            }),
            module => self.module(module)?.get_param(param_id, out),
        }
    }

    /// Host-shaped variant of `get` carrying an explicit length
    ///
    /// Checks run in the same order as `set_raw`.
    pub fn get_raw(
        &self,
        module_id: u16,
        param_id: u16,
        length: u16,
        data: Option<&mut [u8]>,
    ) -> Result<()> {
        if ModuleId::try_from(module_id)? == ModuleId::Global {
            return Err(ToneError::ParamId {
                module_id,
                param_id,
            });
        }
        let length = Self::check_raw_length(module_id, param_id, length)?;
        let data = data.ok_or(ToneError::MissingData)?;
        let actual = data.len();
        let bytes = data.get_mut(..length).ok_or(ToneError::Size {
            expected: length,
            actual,
        })?;
        self.get(module_id, param_id, bytes)
    }

    /// Process one block of `frames` samples per channel
    ///
    /// While globally disabled, output channels that have a matching input
    /// channel receive a copy of it and the remaining output channels are
    /// zeroed. While enabled, the block runs through the module chain.
    ///
    /// # Errors
    /// `NullPointer` for a missing channel buffer, `Size` for a channel
    /// shorter than `frames`. No output is written on error.
    pub fn process(
        &mut self,
        inputs: &[&[f32]],
        outputs: &mut [&mut [f32]],
        frames: usize,
    ) -> Result<()> {
        if self.global_enable == 0 {
            let input_channels = usize::from(self.config.input_channels);
            let output_channels = usize::from(self.config.output_channels);
            let shared = input_channels.min(output_channels);
            check_buffers(inputs, outputs, shared, output_channels, frames)?;

            for (ch, output) in outputs.iter_mut().take(output_channels).enumerate() {
                let output = &mut output[..frames];
                if ch < input_channels {
                    output.copy_from_slice(&inputs[ch][..frames]);
                } else {
                    output.fill(0.0);
                }
            }
            return Ok(());
        }

        self.headroom.process(inputs, outputs, frames)
    }

    /// Replace the configuration from its 8-byte wire record
    ///
    /// Channel counts are re-derived from the module chain afterwards.
    pub fn set_config(&mut self, data: &[u8]) -> Result<()> {
        let config = EffectConfig::from_bytes(data)?;
        self.apply_config(config);
        Ok(())
    }

    /// Write the current configuration as its 8-byte wire record
    pub fn get_config(&mut self, out: &mut [u8]) -> Result<()> {
        if out.len() != EffectConfig::WIRE_SIZE {
            return Err(ToneError::Size {
                expected: EffectConfig::WIRE_SIZE,
                actual: out.len(),
            });
        }
        self.update_channel_config();
        self.config.write_bytes(out)
    }

    /// Typed form of `set_config`
    pub fn apply_config(&mut self, config: EffectConfig) {
        self.config = config;
        self.update_channel_config();
        debug!(config = ?self.config, "effect configured");
    }

    /// Current configuration with channel counts refreshed from the chain
    pub fn config(&mut self) -> EffectConfig {
        self.update_channel_config();
        self.config
    }

    /// Check the global enable flag
    pub fn is_enabled(&self) -> bool {
        self.global_enable != 0
    }

    /// The Headroom stage of the chain
    pub fn headroom(&self) -> &Headroom {
        &self.headroom
    }

    fn global_set(&mut self, param_id: u16, data: &[u8]) -> Result<()> {
        match GlobalParam::try_from(param_id)? {
            GlobalParam::Enable => {
                self.global_enable = protocol::read_u32(data)?;
                debug!(global_enable = self.global_enable, "global enable updated");
                Ok(())
            }
        }
    }

    /// Addressable modules in processing order
    fn chain(&self) -> [&dyn DspModule; 1] {
        [&self.headroom]
    }

    fn chain_mut(&mut self) -> [&mut dyn DspModule; 1] {
        [&mut self.headroom]
    }

    fn module(&self, module: ModuleId) -> Result<&dyn DspModule> {
        self.chain()
            .into_iter()
            .find(|m| m.module_id() == module)
            .ok_or(ToneError::ModuleId {
                module_id: module as u16,
            })
    }

    fn module_mut(&mut self, module: ModuleId) -> Result<&mut dyn DspModule> {
        self.chain_mut()
            .into_iter()
            .find(|m| m.module_id() == module)
            .ok_or(ToneError::ModuleId {
                module_id: module as u16,
            })
    }

    /// Validate a host-supplied length against the addressed parameter
    fn check_raw_length(module_id: u16, param_id: u16, length: u16) -> Result<usize> {
        let module = ModuleId::try_from(module_id)?;
        let expected = protocol::param_kind(module, param_id)?.wire_size();
        let length = usize::from(length);
        if length != expected {
            return Err(ToneError::Size {
                expected,
                actual: length,
            });
        }
        Ok(length)
    }

    fn channels_for(&self, module: ModuleId) -> u16 {
        self.module(module)
            .map(|m| u16::try_from(m.num_channels()).unwrap_or(u16::MAX))
            .unwrap_or(0)
    }

    fn update_channel_config(&mut self) {
        self.config.input_channels = self.channels_for(ModuleId::FIRST);
        self.config.output_channels = self.channels_for(ModuleId::LAST);
    }
}

impl Default for Effect {
    fn default() -> Self {
        Self::new()
    }
}
