//! Mock separator for testing
//!
//! Doesn't run a model. It splits the mix with crossover filters so the
//! output is deterministic, shaped like real stems and cheap enough for
//! tests and offline pipeline runs.

use log::debug;

use super::model::{StemSeparator, StemSet};
use crate::dsp::design::{design, BandSpec};
use crate::dsp::filtfilt;
use crate::engine::Waveform;
use crate::error::Result;

const BASS_BAND: BandSpec = BandSpec::low_pass("bass", 250.0);
const VOCALS_BAND: BandSpec = BandSpec::band_pass("vocals", 300.0, 3400.0);
const OTHER_BAND: BandSpec = BandSpec::high_pass("other", 3400.0);

/// Crossover-based stand-in for a separation model
///
/// The drums stem is the full mix, so the drum decomposer downstream sees
/// every frequency.
#[derive(Debug, Clone, Default)]
pub struct MockSeparator;

impl MockSeparator {
    pub fn new() -> Self {
        Self
    }

    fn band(mix: &Waveform, spec: &BandSpec) -> Result<Waveform> {
        let filter = design(spec, mix.sample_rate())?;
        filtfilt::apply(mix, &filter)
    }
}

impl StemSeparator for MockSeparator {
    fn name(&self) -> &str {
        "mock"
    }

    fn separate(&self, mix: &Waveform) -> Result<StemSet> {
        debug!("Mock separation of {} samples", mix.len());
        Ok(StemSet {
            drums: mix.clone(),
            vocals: Self::band(mix, &VOCALS_BAND)?,
            bass: Self::band(mix, &BASS_BAND)?,
            other: Self::band(mix, &OTHER_BAND)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::generate_tone_mix;
    use crate::error::UnmixError;

    #[test]
    fn test_mock_shapes() {
        let mix = generate_tone_mix(&[(100.0, 0.3), (1000.0, 0.3), (8000.0, 0.3)], 2, 0.25, 44100);
        let stems = MockSeparator::new().separate(&mix).unwrap();

        assert_eq!(stems.drums, mix);
        for (stem, waveform) in stems.iter() {
            assert_eq!(waveform.len(), mix.len(), "{} length", stem);
            assert_eq!(waveform.channels(), 2, "{} channels", stem);
        }
    }

    #[test]
    fn test_mock_routes_bands() {
        let mix = generate_tone_mix(&[(100.0, 0.5)], 1, 0.5, 44100);
        let stems = MockSeparator::new().separate(&mix).unwrap();
        assert!(stems.bass.rms() > 10.0 * stems.other.rms());
    }

    #[test]
    fn test_mock_is_deterministic() {
        let mix = generate_tone_mix(&[(440.0, 0.5)], 2, 0.1, 48000);
        let separator = MockSeparator::new();
        assert_eq!(separator.separate(&mix).unwrap(), separator.separate(&mix).unwrap());
    }

    #[test]
    fn test_mock_short_input() {
        let mix = Waveform::mono(vec![0.1, 0.2], 44100).unwrap();
        assert!(matches!(
            MockSeparator::new().separate(&mix),
            Err(UnmixError::InsufficientSamples { .. })
        ));
    }
}
