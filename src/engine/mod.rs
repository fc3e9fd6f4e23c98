//! Audio Engine Module
//!
//! Waveform storage and WAV file I/O.

pub mod buffer;
pub mod io;

pub use buffer::{linear_to_db, Waveform};
pub use io::{
    decode, encode, generate_test_tone, generate_tone_mix, probe, AudioInfo, ExportFormat,
};
