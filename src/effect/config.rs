//! Negotiated stream configuration

use crate::error::{Result, ToneError};
use serde::{Deserialize, Serialize};

/// Default sample rate in Hz
pub const DEFAULT_SAMPLE_RATE: f32 = 48_000.0;

/// Stream shape shared between host and effect
///
/// On the wire this is an 8-byte record: `sample_rate` (f32) followed by the
/// input and output channel counts (u16 each), native endian, no padding.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EffectConfig {
    pub sample_rate: f32,
    pub input_channels: u16,
    pub output_channels: u16,
}

impl EffectConfig {
    /// Exact byte length of the wire record
    pub const WIRE_SIZE: usize = 8;

    /// Decode from exactly `WIRE_SIZE` bytes
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() != Self::WIRE_SIZE {
            return Err(ToneError::Size {
                expected: Self::WIRE_SIZE,
                actual: data.len(),
            });
        }
        Ok(Self {
            sample_rate: f32::from_ne_bytes([data[0], data[1], data[2], data[3]]),
            input_channels: u16::from_ne_bytes([data[4], data[5]]),
            output_channels: u16::from_ne_bytes([data[6], data[7]]),
        })
    }

    /// Encode into exactly `WIRE_SIZE` bytes
    pub fn write_bytes(&self, out: &mut [u8]) -> Result<()> {
        if out.len() != Self::WIRE_SIZE {
            return Err(ToneError::Size {
                expected: Self::WIRE_SIZE,
                actual: out.len(),
            });
        }
        out.copy_from_slice(&self.to_bytes());
        Ok(())
    }

    /// Encode into a fresh wire record
    pub fn to_bytes(&self) -> [u8; Self::WIRE_SIZE] {
        let mut out = [0u8; Self::WIRE_SIZE];
        out[0..4].copy_from_slice(&self.sample_rate.to_ne_bytes());
        out[4..6].copy_from_slice(&self.input_channels.to_ne_bytes());
        out[6..8].copy_from_slice(&self.output_channels.to_ne_bytes());
        out
    }
}

impl Default for EffectConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            input_channels: 2,
            output_channels: 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_wire_layout() {
        let config = EffectConfig {
            sample_rate: 44_100.0,
            input_channels: 1,
            output_channels: 6,
        };
        let bytes = config.to_bytes();
        assert_eq!(&bytes[0..4], &44_100.0_f32.to_ne_bytes());
        assert_eq!(&bytes[4..6], &1u16.to_ne_bytes());
        assert_eq!(&bytes[6..8], &6u16.to_ne_bytes());
        assert_eq!(EffectConfig::from_bytes(&bytes).unwrap(), config);
    }

    #[test]
    fn test_wrong_size_rejected() {
        assert!(matches!(
            EffectConfig::from_bytes(&[0; 6]),
            Err(ToneError::Size {
                expected: 8,
                actual: 6
            })
        ));
        let mut out = [0u8; 12];
        assert!(EffectConfig::default().write_bytes(&mut out).is_err());
        assert_eq!(out, [0u8; 12]);
    }

    #[test]
    fn test_serializes_as_json() {
        let json = serde_json::to_value(EffectConfig::default()).unwrap();
        assert_eq!(json["input_channels"], 2);
        assert_eq!(json["sample_rate"], 48_000.0);
    }
}
