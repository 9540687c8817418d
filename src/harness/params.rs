//! JSON parameter files
//!
//! Translates human-readable module/parameter names into the numeric wire ids
//! and encodes JSON values into the byte blobs the effect expects:
//!
//! ```json
//! { "test_case": "02_gain", "GLOBAL": { "ENABLE": 1 }, "HEADROOM": { "GAIN": 6.0 } }
//! ```

use std::fs;
use std::path::Path;

use log::{info, warn};
use serde_json::Value;

use crate::effect::Effect;
use crate::error::{Result, ToneError};
use crate::protocol::{self, ModuleId, ParamKind};

/// Key holding the test-case name; not a module
const TEST_CASE_KEY: &str = "test_case";

/// One decoded `set` call
#[derive(Debug, Clone, PartialEq)]
pub struct ParamWrite {
    pub module: ModuleId,
    pub param_name: String,
    pub param_id: u16,
    pub data: Vec<u8>,
}

/// Parsed parameter file
#[derive(Debug, Clone)]
pub struct ParamSet {
    /// Name from the `test_case` key, if present
    pub test_case: Option<String>,
    /// Writes in file order
    pub writes: Vec<ParamWrite>,
}

impl ParamSet {
    /// Read and decode a parameter file
    ///
    /// # Errors
    /// `ParamFile` if the file cannot be read or is not a JSON object.
    pub fn load(path: &Path) -> Result<Self> {
        let param_error = |source: Box<dyn std::error::Error + Send + Sync>| ToneError::ParamFile {
            path: path.display().to_string(),
            source,
        };
        let text = fs::read_to_string(path).map_err(|e| param_error(Box::new(e)))?;
        let json: Value = serde_json::from_str(&text).map_err(|e| param_error(Box::new(e)))?;
        Self::from_json(&json).map_err(|e| param_error(Box::new(e)))
    }

    /// Decode an already parsed document
    ///
    /// Unknown modules, unknown parameters and values that cannot be encoded
    /// are skipped with a warning.
    ///
    /// # Errors
    /// `Config` if the document is not a JSON object.
    pub fn from_json(json: &Value) -> Result<Self> {
        let root = json.as_object().ok_or_else(|| ToneError::Config {
            reason: "parameter file must be a JSON object".to_string(),
        })?;

        let test_case = root
            .get(TEST_CASE_KEY)
            .and_then(Value::as_str)
            .map(str::to_string);
        let mut writes = Vec::new();

        for (module_name, params) in root {
            if module_name == TEST_CASE_KEY {
                continue;
            }
            let Some(module) = ModuleId::from_name(module_name) else {
                warn!("Unknown module: {}", module_name);
                continue;
            };
            let Some(params) = params.as_object() else {
                warn!("Module {} must map parameter names to values", module_name);
                continue;
            };

            for (param_name, value) in params {
                let Some((param_id, kind)) = protocol::param_by_name(module, param_name) else {
                    warn!("Unknown param: {}.{}", module_name, param_name);
                    continue;
                };
                let Some(data) = encode_value(value, kind) else {
                    warn!("Unsupported value for {}.{}: {}", module_name, param_name, value);
                    continue;
                };
                writes.push(ParamWrite {
                    module,
                    param_name: param_name.clone(),
                    param_id,
                    data,
                });
            }
        }

        Ok(Self { test_case, writes })
    }

    /// Apply every write to `effect`
    ///
    /// All writes are attempted. Returns the number that succeeded, or the
    /// last failure if any write was rejected.
    pub fn apply(&self, effect: &mut Effect) -> Result<usize> {
        let name = self.test_case.as_deref().unwrap_or("Unnamed Test");
        info!("Applying parameters for test case: {}", name);

        let mut applied = 0;
        let mut last_error = None;
        for write in &self.writes {
            info!(
                "Setting [{}] -> [{}] ({} bytes)",
                write.module.name(),
                write.param_name,
                write.data.len()
            );
            match effect.set(write.module as u16, write.param_id, &write.data) {
                Ok(()) => applied += 1,
                Err(e) => {
                    warn!(
                        "Set failed for {}.{} ({}): {}",
                        write.module.name(),
                        write.param_name,
                        e.error_code(),
                        e
                    );
                    last_error = Some(e);
                }
            }
        }

        if applied == 0 {
            info!("No parameters applied for test case: {}", name);
        }
        match last_error {
            Some(e) => Err(e),
            None => Ok(applied),
        }
    }
}

/// Encode a JSON value as the wire bytes of `kind`
///
/// Scalars follow the parameter's kind, arrays become consecutive f32 values,
/// and objects are encoded field by field in file order (integers as 4-byte
/// integers, other numbers as f32).
pub fn encode_value(value: &Value, kind: ParamKind) -> Option<Vec<u8>> {
    match value {
        Value::Number(_) | Value::Bool(_) => encode_scalar(value, kind),
        Value::Array(items) => {
            let mut bytes = Vec::with_capacity(items.len() * 4);
            for item in items {
                bytes.extend_from_slice(&(item.as_f64()? as f32).to_ne_bytes());
            }
            Some(bytes)
        }
        Value::Object(fields) => {
            let mut bytes = Vec::new();
            for field in fields.values() {
                if let Some(i) = field.as_i64() {
                    bytes.extend_from_slice(&(i as i32).to_ne_bytes());
                } else if let Some(u) = field.as_u64() {
                    bytes.extend_from_slice(&(u as u32).to_ne_bytes());
                } else if let Some(f) = field.as_f64() {
                    bytes.extend_from_slice(&(f as f32).to_ne_bytes());
                } else {
                    return None;
                }
            }
            Some(bytes)
        }
        _ => None,
    }
}

fn encode_scalar(value: &Value, kind: ParamKind) -> Option<Vec<u8>> {
    match kind {
        ParamKind::U32 => {
            let raw = match value {
                Value::Bool(b) => u32::from(*b),
                _ => u32::try_from(value.as_u64()?).ok()?,
            };
            Some(raw.to_ne_bytes().to_vec())
        }
        ParamKind::F32 => Some((value.as_f64()? as f32).to_ne_bytes().to_vec()),
        ParamKind::F32x5 => None,
    }
}
