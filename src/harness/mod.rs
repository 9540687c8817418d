//! Offline test harness
//!
//! Collaborators that sit outside the real-time core: WAV file I/O, JSON
//! parameter files and a runner that feeds files through an `Effect` block by
//! block.

pub mod params;
pub mod runner;
pub mod wav;

pub use params::{ParamSet, ParamWrite};
pub use runner::{RunReport, TestCase, TestRunner, DEFAULT_BLOCK_SIZE};
pub use wav::{deinterleave, interleave, load_wav, save_wav, WavClip};
