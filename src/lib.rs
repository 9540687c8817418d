//! Tonal Valley - Real-time Audio Effect Core
//!
//! A small chain of DSP modules behind a uniform byte-oriented control
//! interface. Hosts address every parameter by `(module_id, param_id)` and
//! pass its value as the raw bytes of its numeric type, then call `process`
//! once per audio callback.
//!
//! # Architecture
//!
//! - `protocol`: module/parameter ids and the exact-size byte codec
//! - `dsp`: Headroom smoothing/gain stage and the adaptive biquad primitive
//! - `effect`: the dispatcher owning global bypass, stream config and chain
//! - `harness`: offline WAV/JSON collaborators used for testing

pub mod cli;
pub mod dsp;
pub mod effect;
pub mod error;
pub mod harness;
pub mod protocol;

pub use effect::{Effect, EffectConfig};
pub use error::{Result, ToneError};
