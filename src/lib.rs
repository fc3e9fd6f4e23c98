//! unmix - Audio Source Separation
//!
//! unmix separates audio in two stages:
//! 1. A pretrained separation model splits a mix into drums, vocals, bass
//!    and other
//! 2. A Butterworth filter bank splits a drum stem into kick, snare, hi-hat
//!    and toms
//!
//! # Architecture
//!
//! - `engine`: waveform container and WAV I/O
//! - `dsp`: filter design, zero-phase filtering, normalization and the drum
//!   decomposer
//! - `neural`: separation model bridge (Demucs) and a mock
//! - `pipeline`: decode → separate → decompose → encode
//! - `config`, `cli`: settings and the command-line surface

pub mod cli;
pub mod config;
pub mod dsp;
pub mod engine;
pub mod error;
pub mod neural;
pub mod pipeline;

pub use dsp::{decompose_drums, DrumDecomposer, DrumElement, DrumStems};
pub use engine::Waveform;
pub use error::{Result, UnmixError};
