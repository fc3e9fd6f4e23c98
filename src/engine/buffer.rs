//! Waveform container
//!
//! Decoded audio held as non-interleaved 32-bit float channels. A `Waveform`
//! is immutable once constructed: every transform returns a new value, so a
//! single input can be shared by reference across worker threads.

use crate::error::{Result, UnmixError};

// ============================================================================
// Helper Functions
// ============================================================================

/// Convert linear amplitude to decibels
///
/// Returns `f32::NEG_INFINITY` for zero input.
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    if linear <= 0.0 {
        f32::NEG_INFINITY
    } else {
        20.0 * linear.log10()
    }
}

// ============================================================================
// Waveform
// ============================================================================

/// In-memory audio signal
///
/// # Invariants
/// - At least one channel
/// - All channels have the same length
/// - Sample rate is non-zero
///
/// # Example
/// ```
/// use unmix::engine::Waveform;
///
/// let waveform = Waveform::silence(2, 44100, 44100);
/// assert_eq!(waveform.channels(), 2);
/// assert_eq!(waveform.len(), 44100);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    /// Sample data: outer Vec is channels, inner Vec is samples
    samples: Vec<Vec<f32>>,
    /// Sample rate in Hz
    sample_rate: u32,
}

impl Waveform {
    /// Create a waveform from per-channel sample data
    ///
    /// # Errors
    /// `InvalidWaveform` if there are no channels, the channels differ in
    /// length, or the sample rate is zero.
    pub fn new(samples: Vec<Vec<f32>>, sample_rate: u32) -> Result<Self> {
        if samples.is_empty() {
            return Err(UnmixError::InvalidWaveform {
                reason: "waveform must have at least one channel".to_string(),
            });
        }
        if sample_rate == 0 {
            return Err(UnmixError::InvalidWaveform {
                reason: "sample rate must be positive".to_string(),
            });
        }
        let len = samples[0].len();
        if let Some((ch, other)) = samples.iter().enumerate().find(|(_, c)| c.len() != len) {
            return Err(UnmixError::InvalidWaveform {
                reason: format!(
                    "channel {} has {} samples, channel 0 has {}",
                    ch,
                    other.len(),
                    len
                ),
            });
        }
        Ok(Self {
            samples,
            sample_rate,
        })
    }

    /// Create a mono waveform
    pub fn mono(samples: Vec<f32>, sample_rate: u32) -> Result<Self> {
        Self::new(vec![samples], sample_rate)
    }

    /// Create an all-zero waveform
    ///
    /// A channel count of zero is raised to one.
    pub fn silence(channels: usize, num_samples: usize, sample_rate: u32) -> Self {
        Self {
            samples: vec![vec![0.0_f32; num_samples]; channels.max(1)],
            sample_rate: sample_rate.max(1),
        }
    }

    /// Create a waveform from interleaved sample data (L, R, L, R, ...)
    pub fn from_interleaved(interleaved: &[f32], channels: usize, sample_rate: u32) -> Result<Self> {
        if channels == 0 {
            return Err(UnmixError::InvalidWaveform {
                reason: "waveform must have at least one channel".to_string(),
            });
        }
        if interleaved.len() % channels != 0 {
            return Err(UnmixError::InvalidWaveform {
                reason: format!(
                    "Interleaved data length {} is not divisible by channel count {}",
                    interleaved.len(),
                    channels
                ),
            });
        }

        let num_samples = interleaved.len() / channels;
        let mut samples = vec![Vec::with_capacity(num_samples); channels];
        for frame in interleaved.chunks_exact(channels) {
            for (ch, &sample) in frame.iter().enumerate() {
                samples[ch].push(sample);
            }
        }

        Self::new(samples, sample_rate)
    }

    /// Convert to interleaved format (L, R, L, R, ... for stereo)
    pub fn to_interleaved(&self) -> Vec<f32> {
        let mut interleaved = Vec::with_capacity(self.channels() * self.len());
        for idx in 0..self.len() {
            for channel in &self.samples {
                interleaved.push(channel[idx]);
            }
        }
        interleaved
    }

    /// Number of channels
    #[inline]
    pub fn channels(&self) -> usize {
        self.samples.len()
    }

    /// Number of samples per channel
    #[inline]
    pub fn len(&self) -> usize {
        self.samples.first().map(|ch| ch.len()).unwrap_or(0)
    }

    /// Check if the waveform has no samples
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sample rate in Hz
    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Nyquist frequency in Hz
    #[inline]
    pub fn nyquist(&self) -> f64 {
        self.sample_rate as f64 / 2.0
    }

    /// Duration in seconds
    #[inline]
    pub fn duration_secs(&self) -> f64 {
        self.len() as f64 / self.sample_rate as f64
    }

    /// Samples of one channel
    ///
    /// # Panics
    /// Panics if the channel index is out of bounds
    #[inline]
    pub fn channel(&self, index: usize) -> &[f32] {
        &self.samples[index]
    }

    /// Iterate over channels
    pub fn iter_channels(&self) -> impl Iterator<Item = &[f32]> {
        self.samples.iter().map(|ch| ch.as_slice())
    }

    /// Build a new waveform by transforming each channel
    ///
    /// The closure must return a channel of the same length; anything else
    /// is an `InvalidWaveform` error.
    pub fn map_channels<F>(&self, mut f: F) -> Result<Self>
    where
        F: FnMut(&[f32]) -> Result<Vec<f32>>,
    {
        let samples = self
            .samples
            .iter()
            .map(|ch| f(ch))
            .collect::<Result<Vec<_>>>()?;

        if samples.iter().any(|ch| ch.len() != self.len()) {
            return Err(UnmixError::InvalidWaveform {
                reason: "channel transform changed the signal length".to_string(),
            });
        }

        Ok(Self {
            samples,
            sample_rate: self.sample_rate,
        })
    }

    /// Return a copy with every sample multiplied by `gain`
    pub fn scaled(&self, gain: f64) -> Self {
        let samples = self
            .samples
            .iter()
            .map(|ch| ch.iter().map(|&s| (s as f64 * gain) as f32).collect())
            .collect();
        Self {
            samples,
            sample_rate: self.sample_rate,
        }
    }

    /// Peak absolute amplitude across all channels
    pub fn peak(&self) -> f32 {
        self.samples
            .iter()
            .flat_map(|channel| channel.iter())
            .map(|&s| s.abs())
            .fold(0.0_f32, f32::max)
    }

    /// Peak absolute amplitude of one channel
    pub fn channel_peak(&self, index: usize) -> f32 {
        self.samples
            .get(index)
            .map(|ch| ch.iter().map(|&s| s.abs()).fold(0.0_f32, f32::max))
            .unwrap_or(0.0)
    }

    /// RMS level across all channels (linear)
    pub fn rms(&self) -> f32 {
        let total = self.channels() * self.len();
        if total == 0 {
            return 0.0;
        }
        let sum_squares: f64 = self
            .samples
            .iter()
            .flat_map(|channel| channel.iter())
            .map(|&s| (s as f64) * (s as f64))
            .sum();
        (sum_squares / total as f64).sqrt() as f32
    }

    /// Peak level in dBFS
    pub fn peak_db(&self) -> f32 {
        linear_to_db(self.peak())
    }

    /// Check that every sample is finite (no NaN/Inf)
    pub fn is_finite(&self) -> bool {
        self.samples
            .iter()
            .flat_map(|channel| channel.iter())
            .all(|s| s.is_finite())
    }

    /// Check that every sample is exactly zero
    pub fn is_silent(&self) -> bool {
        self.samples
            .iter()
            .flat_map(|channel| channel.iter())
            .all(|&s| s == 0.0)
    }

    /// Consume the waveform and return its channel data
    pub fn into_channels(self) -> Vec<Vec<f32>> {
        self.samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_new_validates_shape() {
        assert!(Waveform::new(vec![], 44100).is_err());
        assert!(Waveform::new(vec![vec![0.0; 4]], 0).is_err());
        assert!(Waveform::new(vec![vec![0.0; 4], vec![0.0; 3]], 44100).is_err());

        let waveform = Waveform::new(vec![vec![0.0; 4], vec![0.0; 4]], 44100).unwrap();
        assert_eq!(waveform.channels(), 2);
        assert_eq!(waveform.len(), 4);
    }

    #[test]
    fn test_interleave_roundtrip() {
        let interleaved = vec![1.0, 5.0, 2.0, 6.0, 3.0, 7.0];
        let waveform = Waveform::from_interleaved(&interleaved, 2, 8000).unwrap();

        assert_eq!(waveform.channel(0), &[1.0, 2.0, 3.0]);
        assert_eq!(waveform.channel(1), &[5.0, 6.0, 7.0]);
        assert_eq!(waveform.to_interleaved(), interleaved);
    }

    #[test]
    fn test_from_interleaved_rejects_ragged_data() {
        assert!(Waveform::from_interleaved(&[1.0, 2.0, 3.0], 2, 8000).is_err());
        assert!(Waveform::from_interleaved(&[1.0], 0, 8000).is_err());
    }

    #[test]
    fn test_peak_and_rms() {
        let waveform = Waveform::new(vec![vec![0.5, -0.25], vec![-0.75, 0.0]], 48000).unwrap();
        assert_relative_eq!(waveform.peak(), 0.75);
        assert_relative_eq!(waveform.channel_peak(0), 0.5);
        assert_relative_eq!(waveform.channel_peak(1), 0.75);

        let expected_rms = ((0.25 + 0.0625 + 0.5625) / 4.0_f64).sqrt() as f32;
        assert_relative_eq!(waveform.rms(), expected_rms, epsilon = 1e-6);
    }

    #[test]
    fn test_scaled_returns_new_waveform() {
        let waveform = Waveform::mono(vec![0.5, -0.5], 44100).unwrap();
        let louder = waveform.scaled(1.5);

        assert_relative_eq!(louder.peak(), 0.75);
        assert_relative_eq!(waveform.peak(), 0.5);
    }

    #[test]
    fn test_map_channels_rejects_length_change() {
        let waveform = Waveform::silence(2, 10, 44100);
        let result = waveform.map_channels(|ch| Ok(ch[..5].to_vec()));
        assert!(matches!(result, Err(UnmixError::InvalidWaveform { .. })));
    }

    #[test]
    fn test_silence() {
        let waveform = Waveform::silence(2, 100, 44100);
        assert!(waveform.is_silent());
        assert!(waveform.is_finite());
        assert_eq!(waveform.peak_db(), f32::NEG_INFINITY);
        assert_relative_eq!(waveform.duration_secs(), 100.0 / 44100.0);
    }
}
