//! Drum decomposition DSP
//!
//! Butterworth band design, zero-phase filtering and peak normalization,
//! combined by the drum decomposer into kick, snare, hi-hat and toms.

pub mod design;
pub mod drums;
pub mod filtfilt;
pub mod normalize;

pub use design::{design, BandKind, BandSpec, Section, SosFilter, DEFAULT_ORDER};
pub use drums::{decompose_drums, DrumDecomposer, DrumElement, DrumStems};
pub use filtfilt::{filtfilt, pad_length};
pub use normalize::{normalize_peak, Normalizer, DEFAULT_CEILING};
