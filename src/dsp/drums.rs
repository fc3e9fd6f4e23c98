//! Drum decomposition
//!
//! Splits a drum stem into kick, snare, hi-hat and toms by frequency band.
//! Each element is designed, zero-phase filtered and peak normalized
//! independently, so the bands can run on the rayon pool without locking.
//!
//! This is a frequency heuristic. The snare and toms bands overlap, and a
//! snare's low body will show up in the toms output.

use std::fmt;
use std::str::FromStr;

use log::{debug, info};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::dsp::design::{design, BandSpec};
use crate::dsp::filtfilt;
use crate::dsp::normalize::Normalizer;
use crate::engine::Waveform;
use crate::error::{Result, UnmixError};

const KICK_BAND: BandSpec = BandSpec::low_pass("kick", 200.0);
const SNARE_BAND: BandSpec = BandSpec::band_pass("snare", 150.0, 4000.0);
const HIHAT_BAND: BandSpec = BandSpec::high_pass("hihat", 5000.0);
const TOMS_BAND: BandSpec = BandSpec::band_pass("toms", 80.0, 500.0);

// ============================================================================
// Drum Element
// ============================================================================

/// One percussive component of a drum stem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DrumElement {
    Kick,
    Snare,
    Hihat,
    Toms,
}

impl DrumElement {
    /// All elements, in output order
    pub const ALL: [DrumElement; 4] = [
        DrumElement::Kick,
        DrumElement::Snare,
        DrumElement::Hihat,
        DrumElement::Toms,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DrumElement::Kick => "kick",
            DrumElement::Snare => "snare",
            DrumElement::Hihat => "hihat",
            DrumElement::Toms => "toms",
        }
    }

    /// Frequency band isolating this element
    pub fn band(&self) -> BandSpec {
        match self {
            DrumElement::Kick => KICK_BAND,
            DrumElement::Snare => SNARE_BAND,
            DrumElement::Hihat => HIHAT_BAND,
            DrumElement::Toms => TOMS_BAND,
        }
    }
}

impl fmt::Display for DrumElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DrumElement {
    type Err = UnmixError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "kick" => Ok(DrumElement::Kick),
            "snare" => Ok(DrumElement::Snare),
            "hihat" | "hi-hat" => Ok(DrumElement::Hihat),
            "toms" => Ok(DrumElement::Toms),
            other => Err(UnmixError::InvalidBandSpec {
                element: other.to_string(),
                reason: "not a drum element".to_string(),
            }),
        }
    }
}

// ============================================================================
// Drum Stems
// ============================================================================

/// Decomposition result: one waveform per drum element
#[derive(Debug, Clone, PartialEq)]
pub struct DrumStems {
    pub kick: Waveform,
    pub snare: Waveform,
    pub hihat: Waveform,
    pub toms: Waveform,
}

impl DrumStems {
    /// Build from waveforms ordered as `DrumElement::ALL`
    fn from_ordered(waveforms: Vec<Waveform>) -> Result<Self> {
        let count = waveforms.len();
        match <[Waveform; 4]>::try_from(waveforms) {
            Ok([kick, snare, hihat, toms]) => Ok(Self {
                kick,
                snare,
                hihat,
                toms,
            }),
            Err(_) => Err(UnmixError::InvalidWaveform {
                reason: format!("expected 4 drum elements, got {}", count),
            }),
        }
    }

    pub fn get(&self, element: DrumElement) -> &Waveform {
        match element {
            DrumElement::Kick => &self.kick,
            DrumElement::Snare => &self.snare,
            DrumElement::Hihat => &self.hihat,
            DrumElement::Toms => &self.toms,
        }
    }

    /// Iterate as `(element, waveform)` in kick, snare, hihat, toms order
    pub fn iter(&self) -> impl Iterator<Item = (DrumElement, &Waveform)> {
        DrumElement::ALL.into_iter().map(move |e| (e, self.get(e)))
    }
}

// ============================================================================
// Decomposer
// ============================================================================

/// Filters a drum stem into its four elements
#[derive(Debug, Clone, Copy)]
pub struct DrumDecomposer {
    normalizer: Normalizer,
    parallel: bool,
}

impl Default for DrumDecomposer {
    fn default() -> Self {
        Self {
            normalizer: Normalizer::default(),
            parallel: true,
        }
    }
}

impl DrumDecomposer {
    pub fn new(normalizer: Normalizer, parallel: bool) -> Self {
        Self {
            normalizer,
            parallel,
        }
    }

    /// Use a custom normalization ceiling
    pub fn with_ceiling(mut self, ceiling: f32) -> Result<Self> {
        self.normalizer = Normalizer::new(ceiling)?;
        Ok(self)
    }

    /// Run bands on the rayon pool (default) or one after another
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn is_parallel(&self) -> bool {
        self.parallel
    }

    pub fn ceiling(&self) -> f32 {
        self.normalizer.ceiling()
    }

    /// Decompose a drum stem
    ///
    /// Fails with the first `InvalidBandSpec` or `InsufficientSamples` hit by
    /// any band. Nothing is returned for the bands that succeeded.
    pub fn decompose(&self, drums: &Waveform) -> Result<DrumStems> {
        info!(
            "Decomposing drums: {} channel(s), {} samples at {} Hz",
            drums.channels(),
            drums.len(),
            drums.sample_rate()
        );

        let waveforms = if self.parallel {
            DrumElement::ALL
                .par_iter()
                .map(|&element| self.extract(drums, element))
                .collect::<Result<Vec<_>>>()?
        } else {
            DrumElement::ALL
                .iter()
                .map(|&element| self.extract(drums, element))
                .collect::<Result<Vec<_>>>()?
        };

        DrumStems::from_ordered(waveforms)
    }

    fn extract(&self, drums: &Waveform, element: DrumElement) -> Result<Waveform> {
        let filter = design(&element.band(), drums.sample_rate())?;
        debug!(
            "{}: {} filter, {} section(s), low={:?} high={:?}",
            element,
            filter.kind(),
            filter.sections().len(),
            filter.low_hz(),
            filter.high_hz()
        );

        let filtered = filtfilt::apply(drums, &filter)?;
        let normalized = self.normalizer.apply(&filtered);
        debug!(
            "{}: peak {:.4} -> {:.4}",
            element,
            filtered.peak(),
            normalized.peak()
        );
        Ok(normalized)
    }
}

/// Decompose a drum stem into kick, snare, hi-hat and toms
///
/// Runs the bands one after another with the default 0.95 ceiling.
///
/// # Example
/// ```
/// use unmix::engine::io::generate_tone_mix;
/// use unmix::decompose_drums;
///
/// let drums = generate_tone_mix(&[(60.0, 0.5), (6000.0, 0.5)], 2, 0.5, 44100);
/// let stems = decompose_drums(&drums).unwrap();
/// assert_eq!(stems.kick.len(), drums.len());
/// ```
pub fn decompose_drums(drums: &Waveform) -> Result<DrumStems> {
    DrumDecomposer::default()
        .with_parallel(false)
        .decompose(drums)
}
