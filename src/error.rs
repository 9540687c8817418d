//! Error handling for Tonal Valley
//!
//! Every core operation returns one of these kinds verbatim; the dispatcher
//! never wraps or translates a module's failure. Variants raised from
//! `process` hold no heap data.

use thiserror::Error;

/// Result type alias for Tonal Valley operations
pub type Result<T> = std::result::Result<T, ToneError>;

/// Main error type for Tonal Valley operations
#[derive(Error, Debug)]
pub enum ToneError {
    // Control-plane Errors
    #[error("Size mismatch: expected {expected} bytes, got {actual}")]
    Size { expected: usize, actual: usize },

    #[error("Configuration error: {reason}")]
    Config { reason: String },

    #[error("Unknown module id {module_id}")]
    ModuleId { module_id: u16 },

    #[error("Unknown parameter id {param_id} for module {module_id}")]
    ParamId { module_id: u16, param_id: u16 },

    #[error("Parameter '{name}' out of range: {value}")]
    Parameter { name: &'static str, value: f32 },

    // Processing Errors
    #[error("Missing buffer for channel {channel}")]
    NullPointer { channel: usize },

    #[error("Missing parameter data")]
    MissingData,

    // Harness Errors
    #[error("Could not read input WAV file: {path}")]
    InputWav {
        path: String,
        #[source]
        source: hound::Error,
    },

    #[error("Could not write output WAV file: {path}")]
    OutputWav {
        path: String,
        #[source]
        source: hound::Error,
    },

    #[error("Could not load parameter file: {path}")]
    ParamFile {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl ToneError {
    /// Numeric code shared with hosts across the byte-level interface.
    ///
    /// Zero is reserved for success and never returned here.
    pub fn code(&self) -> u32 {
        match self {
            ToneError::Size { .. } => 1,
            ToneError::Config { .. } => 2,
            ToneError::ModuleId { .. } => 3,
            ToneError::ParamId { .. } => 4,
            ToneError::Parameter { .. } => 5,
            ToneError::NullPointer { .. } | ToneError::MissingData => 6,
            ToneError::InputWav { .. } => 7,
            ToneError::OutputWav { .. } => 8,
            ToneError::ParamFile { .. } => 2,
        }
    }

    /// Get the error code name for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            ToneError::Size { .. } => "SIZE_ERROR",
            ToneError::Config { .. } => "CONFIG_ERROR",
            ToneError::ModuleId { .. } => "MODULEID_ERROR",
            ToneError::ParamId { .. } => "PARAMID_ERROR",
            ToneError::Parameter { .. } => "PARAMETER_ERROR",
            ToneError::NullPointer { .. } | ToneError::MissingData => "NULL_POINTER_ERROR",
            ToneError::InputWav { .. } => "INPUT_WAV_ERROR",
            ToneError::OutputWav { .. } => "OUTPUT_WAV_ERROR",
            ToneError::ParamFile { .. } => "CONFIG_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = ToneError::Size {
            expected: 4,
            actual: 2,
        };
        assert_eq!(err.error_code(), "SIZE_ERROR");
        assert_eq!(err.code(), 1);
    }

    #[test]
    fn test_codes_follow_wire_numbering() {
        assert_eq!(ToneError::ModuleId { module_id: 9 }.code(), 3);
        assert_eq!(
            ToneError::ParamId {
                module_id: 1,
                param_id: 7
            }
            .code(),
            4
        );
        assert_eq!(
            ToneError::Parameter {
                name: "alpha",
                value: 2.0
            }
            .code(),
            5
        );
        assert_eq!(ToneError::NullPointer { channel: 1 }.code(), 6);
    }

    #[test]
    fn test_display_mentions_sizes() {
        let err = ToneError::Size {
            expected: 20,
            actual: 16,
        };
        assert_eq!(err.to_string(), "Size mismatch: expected 20 bytes, got 16");
        assert_eq!(
            ToneError::MissingData.to_string(),
            "Missing parameter data"
        );
    }
}
