//! DSP Modules Library
//!
//! Addressable modules implement `DspModule` so the dispatcher can route
//! parameters and blocks to them uniformly. `AdaptiveBiquad` is a primitive
//! for building level-dependent filters and is not addressable on its own.

pub mod adaptive_biquad;
pub mod convert;
pub mod headroom;
mod module;

pub use adaptive_biquad::{AdaptiveBiquad, Coefficients};
pub use convert::{db_to_linear, linear_to_db, step_response};
pub use headroom::Headroom;
pub use module::{check_buffers, DspModule};
