//! Peak normalization
//!
//! Scales a waveform so its loudest sample sits at a fixed ceiling below
//! full scale. One gain factor is applied to every channel so the stereo
//! balance of a stem is preserved.

use log::debug;

use crate::engine::Waveform;
use crate::error::{Result, UnmixError};

/// Peak level every decomposed stem is scaled to
pub const DEFAULT_CEILING: f32 = 0.95;

/// Scales waveforms to a peak ceiling
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalizer {
    ceiling: f32,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self {
            ceiling: DEFAULT_CEILING,
        }
    }
}

impl Normalizer {
    /// Create a normalizer with a custom ceiling
    ///
    /// # Errors
    /// `Config` unless `0 < ceiling < 1`.
    pub fn new(ceiling: f32) -> Result<Self> {
        if !(ceiling > 0.0 && ceiling < 1.0) {
            return Err(UnmixError::Config {
                reason: format!("normalization ceiling must be in (0, 1), got {}", ceiling),
            });
        }
        Ok(Self { ceiling })
    }

    pub fn ceiling(&self) -> f32 {
        self.ceiling
    }

    /// Scale `waveform` so its peak equals the ceiling
    ///
    /// Silent input, and input whose peak is not finite, is returned as is.
    pub fn apply(&self, waveform: &Waveform) -> Waveform {
        let peak = waveform.peak();
        if peak <= 0.0 || !peak.is_finite() {
            debug!("Skipping normalization, peak is {}", peak);
            return waveform.clone();
        }

        let gain = self.ceiling as f64 / peak as f64;
        debug!("Normalizing peak {:.4} to {:.2} (gain {:.4})", peak, self.ceiling, gain);
        waveform.scaled(gain)
    }
}

/// Scale `waveform` to the default 0.95 peak
pub fn normalize_peak(waveform: &Waveform) -> Waveform {
    Normalizer::default().apply(waveform)
}
