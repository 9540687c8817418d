//! Module/parameter addressing and the byte-level wire codec
//!
//! Hosts address every control value by a flat `(module_id, param_id)` pair and
//! transmit it as the raw native-endian bytes of its numeric type. The numeric
//! values below are the wire contract and must not be renumbered.

use crate::error::{Result, ToneError};

/// Number of coefficients in one biquad coefficient set
pub const BIQUAD_NUM_COEFFS: usize = 5;

/// Number of addressable modules, including GLOBAL
pub const MODULE_COUNT: u16 = 2;

// ============================================================================
// Identifiers
// ============================================================================

/// Addressable modules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ModuleId {
    /// Dispatcher-level parameters (global bypass)
    Global = 0,
    /// Smoothing + gain stage
    Headroom = 1,
}

impl ModuleId {
    /// First module of the processing chain; declares the input width
    pub const FIRST: ModuleId = ModuleId::Headroom;

    /// Last module of the processing chain; declares the output width
    pub const LAST: ModuleId = ModuleId::Headroom;

    /// Name used by parameter files
    pub fn name(self) -> &'static str {
        match self {
            ModuleId::Global => "GLOBAL",
            ModuleId::Headroom => "HEADROOM",
        }
    }

    /// Look up a module by its parameter-file name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "GLOBAL" => Some(ModuleId::Global),
            "HEADROOM" => Some(ModuleId::Headroom),
            _ => None,
        }
    }
}

impl TryFrom<u16> for ModuleId {
    type Error = ToneError;

    fn try_from(value: u16) -> Result<Self> {
        match value {
            0 => Ok(ModuleId::Global),
            1 => Ok(ModuleId::Headroom),
            _ => Err(ToneError::ModuleId { module_id: value }),
        }
    }
}

/// Parameters of the GLOBAL module
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum GlobalParam {
    Enable = 0,
}

impl TryFrom<u16> for GlobalParam {
    type Error = ToneError;

    fn try_from(value: u16) -> Result<Self> {
        match value {
            0 => Ok(GlobalParam::Enable),
            _ => Err(ToneError::ParamId {
                module_id: ModuleId::Global as u16,
                param_id: value,
            }),
        }
    }
}

/// Parameters of the HEADROOM module
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum HeadroomParam {
    Enable = 0,
    Gain = 1,
}

impl TryFrom<u16> for HeadroomParam {
    type Error = ToneError;

    fn try_from(value: u16) -> Result<Self> {
        match value {
            0 => Ok(HeadroomParam::Enable),
            1 => Ok(HeadroomParam::Gain),
            _ => Err(ToneError::ParamId {
                module_id: ModuleId::Headroom as u16,
                param_id: value,
            }),
        }
    }
}

/// Numeric type carried by a parameter on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// Booleans and enable flags
    U32,
    /// Gains and dB values
    F32,
    /// Biquad coefficient sets
    F32x5,
}

impl ParamKind {
    /// Exact byte length a value of this kind occupies
    pub fn wire_size(self) -> usize {
        match self {
            ParamKind::U32 => std::mem::size_of::<u32>(),
            ParamKind::F32 => std::mem::size_of::<f32>(),
            ParamKind::F32x5 => BIQUAD_NUM_COEFFS * std::mem::size_of::<f32>(),
        }
    }
}

impl GlobalParam {
    /// Wire type of this parameter
    pub fn kind(self) -> ParamKind {
        match self {
            GlobalParam::Enable => ParamKind::U32,
        }
    }
}

impl HeadroomParam {
    /// Wire type of this parameter
    pub fn kind(self) -> ParamKind {
        match self {
            HeadroomParam::Enable => ParamKind::U32,
            HeadroomParam::Gain => ParamKind::F32,
        }
    }
}

/// Wire type of a parameter addressed by its numeric id
///
/// # Errors
/// `ParamId` if the module has no such parameter.
pub fn param_kind(module: ModuleId, param_id: u16) -> Result<ParamKind> {
    match module {
        ModuleId::Global => GlobalParam::try_from(param_id).map(GlobalParam::kind),
        ModuleId::Headroom => HeadroomParam::try_from(param_id).map(HeadroomParam::kind),
    }
}

/// Resolve a parameter-file name within a module to its numeric id and kind
pub fn param_by_name(module: ModuleId, name: &str) -> Option<(u16, ParamKind)> {
    match (module, name) {
        (ModuleId::Global, "ENABLE" | "GLOBAL_ENABLE_FLAG") => {
            let param = GlobalParam::Enable;
            Some((param as u16, param.kind()))
        }
        (ModuleId::Headroom, "ENABLE") => {
            let param = HeadroomParam::Enable;
            Some((param as u16, param.kind()))
        }
        (ModuleId::Headroom, "GAIN") => {
            let param = HeadroomParam::Gain;
            Some((param as u16, param.kind()))
        }
        _ => None,
    }
}

// ============================================================================
// Codec
// ============================================================================

#[inline]
fn check_len(data: &[u8], expected: usize) -> Result<()> {
    if data.len() != expected {
        return Err(ToneError::Size {
            expected,
            actual: data.len(),
        });
    }
    Ok(())
}

/// Decode a `u32` from exactly four bytes
pub fn read_u32(data: &[u8]) -> Result<u32> {
    check_len(data, 4)?;
    Ok(u32::from_ne_bytes([data[0], data[1], data[2], data[3]]))
}

/// Decode an `f32` from exactly four bytes
pub fn read_f32(data: &[u8]) -> Result<f32> {
    check_len(data, 4)?;
    Ok(f32::from_ne_bytes([data[0], data[1], data[2], data[3]]))
}

/// Decode `N` consecutive `f32` values from exactly `4 * N` bytes
pub fn read_f32_array<const N: usize>(data: &[u8]) -> Result<[f32; N]> {
    check_len(data, N * 4)?;
    let mut values = [0.0_f32; N];
    for (value, chunk) in values.iter_mut().zip(data.chunks_exact(4)) {
        *value = f32::from_ne_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }
    Ok(values)
}

/// Encode a `u32` into exactly four bytes
pub fn write_u32(out: &mut [u8], value: u32) -> Result<()> {
    check_len(out, 4)?;
    out.copy_from_slice(&value.to_ne_bytes());
    Ok(())
}

/// Encode an `f32` into exactly four bytes
pub fn write_f32(out: &mut [u8], value: f32) -> Result<()> {
    check_len(out, 4)?;
    out.copy_from_slice(&value.to_ne_bytes());
    Ok(())
}

/// Encode a slice of `f32` values into exactly `4 * values.len()` bytes
pub fn write_f32_array(out: &mut [u8], values: &[f32]) -> Result<()> {
    check_len(out, values.len() * 4)?;
    for (chunk, value) in out.chunks_exact_mut(4).zip(values) {
        chunk.copy_from_slice(&value.to_ne_bytes());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(0 => Some(ModuleId::Global) ; "global")]
    #[test_case(1 => Some(ModuleId::Headroom) ; "headroom")]
    #[test_case(MODULE_COUNT => None ; "sentinel")]
    #[test_case(u16::MAX => None ; "max")]
    fn test_module_id_from_u16(raw: u16) -> Option<ModuleId> {
        ModuleId::try_from(raw).ok()
    }

    #[test]
    fn test_unknown_module_reports_id() {
        let err = ModuleId::try_from(7).unwrap_err();
        assert!(matches!(err, ToneError::ModuleId { module_id: 7 }));
    }

    #[test]
    fn test_unknown_param_reports_module() {
        let err = HeadroomParam::try_from(2).unwrap_err();
        assert!(matches!(
            err,
            ToneError::ParamId {
                module_id: 1,
                param_id: 2
            }
        ));
        assert!(GlobalParam::try_from(1).is_err());
    }

    #[test]
    fn test_chain_boundaries() {
        assert_eq!(ModuleId::FIRST as u16, 1);
        assert_eq!(ModuleId::LAST as u16, MODULE_COUNT - 1);
    }

    #[test]
    fn test_param_by_name() {
        assert_eq!(
            param_by_name(ModuleId::Headroom, "GAIN"),
            Some((1, ParamKind::F32))
        );
        assert_eq!(
            param_by_name(ModuleId::Global, "GLOBAL_ENABLE_FLAG"),
            Some((0, ParamKind::U32))
        );
        assert_eq!(param_by_name(ModuleId::Global, "GAIN"), None);
        assert_eq!(ModuleId::from_name("HEADROOM"), Some(ModuleId::Headroom));
        assert_eq!(ModuleId::from_name("EQ"), None);
    }

    #[test]
    fn test_param_kind_by_id() {
        assert_eq!(param_kind(ModuleId::Global, 0).unwrap(), ParamKind::U32);
        assert_eq!(param_kind(ModuleId::Headroom, 1).unwrap(), ParamKind::F32);
        assert!(matches!(
            param_kind(ModuleId::Headroom, 5),
            Err(ToneError::ParamId {
                module_id: 1,
                param_id: 5
            })
        ));
    }

    #[test_case(ParamKind::U32 => 4)]
    #[test_case(ParamKind::F32 => 4)]
    #[test_case(ParamKind::F32x5 => 20)]
    fn test_wire_sizes(kind: ParamKind) -> usize {
        kind.wire_size()
    }

    #[test]
    fn test_read_rejects_wrong_length() {
        assert!(matches!(
            read_u32(&[1, 0, 0]),
            Err(ToneError::Size {
                expected: 4,
                actual: 3
            })
        ));
        assert!(read_f32(&[0; 8]).is_err());
        assert!(read_f32_array::<5>(&[0; 16]).is_err());
    }

    #[test]
    fn test_write_then_read_coefficients() {
        let coeffs = [1.0, -0.5, 0.25, 0.1, -0.05];
        let mut bytes = [0u8; 20];
        write_f32_array(&mut bytes, &coeffs).unwrap();
        assert_eq!(read_f32_array::<5>(&bytes).unwrap(), coeffs);
    }

    #[test]
    fn test_write_rejects_wrong_length() {
        let mut short = [0u8; 2];
        assert!(write_u32(&mut short, 1).is_err());
        assert_eq!(short, [0, 0]);
    }
}
