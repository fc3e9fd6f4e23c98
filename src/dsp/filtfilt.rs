//! Zero-phase band filtering
//!
//! Applies a designed `SosFilter` forward and then backward over each channel
//! so the result has no phase shift. Both ends are padded with an odd
//! extension and each pass starts from the cascade's steady state, which keeps
//! edge transients confined to the padding that is cut away afterwards.

use crate::dsp::design::{Section, SosFilter};
use crate::engine::Waveform;
use crate::error::{Result, UnmixError};

/// Number of samples padded on each side for zero-phase filtering
pub fn pad_length(filter: &SosFilter) -> usize {
    let sections = filter.sections();
    let b_zeros = sections.iter().filter(|s| s.b[2] == 0.0).count();
    let a_zeros = sections.iter().filter(|s| s.a[2] == 0.0).count();
    let ntaps = 2 * sections.len() + 1 - b_zeros.min(a_zeros);
    3 * ntaps
}

/// Shortest input that `filtfilt` accepts for this filter
pub fn min_samples(filter: &SosFilter) -> usize {
    pad_length(filter) + 1
}

/// Zero-phase filter every channel of a waveform
///
/// # Errors
/// * `InsufficientSamples` - the waveform is not longer than the padding
/// * `InvalidWaveform` - the filter was designed for another sample rate
pub fn apply(waveform: &Waveform, filter: &SosFilter) -> Result<Waveform> {
    if waveform.sample_rate() != filter.sample_rate() {
        return Err(UnmixError::InvalidWaveform {
            reason: format!(
                "filter designed for {} Hz applied to {} Hz audio",
                filter.sample_rate(),
                waveform.sample_rate()
            ),
        });
    }
    waveform.map_channels(|channel| filtfilt(channel, filter))
}

/// Zero-phase filter a single channel
pub fn filtfilt(samples: &[f32], filter: &SosFilter) -> Result<Vec<f32>> {
    let edge = pad_length(filter);
    let len = samples.len();
    if len <= edge {
        return Err(UnmixError::InsufficientSamples {
            required: edge + 1,
            actual: len,
        });
    }

    let x: Vec<f64> = samples.iter().map(|&s| s as f64).collect();
    let ext = odd_extend(&x, edge);
    let zi = steady_state(filter.sections());

    let mut y = sosfilt(filter.sections(), &ext, &zi, ext[0]);
    let y_last = y[y.len() - 1];
    y.reverse();

    let mut z = sosfilt(filter.sections(), &y, &zi, y_last);
    z.reverse();

    Ok(z[edge..edge + len].iter().map(|&s| s as f32).collect())
}

/// Extend both ends by point reflection about the end samples
///
/// Requires `x.len() > n`.
fn odd_extend(x: &[f64], n: usize) -> Vec<f64> {
    let first = x[0];
    let last = x[x.len() - 1];
    let mut ext = Vec::with_capacity(x.len() + 2 * n);

    ext.extend((1..=n).rev().map(|i| 2.0 * first - x[i]));
    ext.extend_from_slice(x);
    ext.extend((1..=n).map(|i| 2.0 * last - x[x.len() - 1 - i]));

    ext
}

/// Per-section state for a unit step that has settled
///
/// Each section sees the step scaled by the DC gain of the sections before it.
fn steady_state(sections: &[Section]) -> Vec<[f64; 2]> {
    let mut scale = 1.0;
    sections
        .iter()
        .map(|s| {
            let gain = s.dc_gain();
            let z1 = s.b[2] - s.a[2] * gain;
            let z0 = s.b[1] - s.a[1] * gain + z1;
            let zi = [scale * z0, scale * z1];
            scale *= gain;
            zi
        })
        .collect()
}

/// Run the cascade over `x` with initial state `zi * x0`
///
/// Transposed direct form II, one state pair per section.
fn sosfilt(sections: &[Section], x: &[f64], zi: &[[f64; 2]], x0: f64) -> Vec<f64> {
    let mut state: Vec<[f64; 2]> = zi.iter().map(|z| [z[0] * x0, z[1] * x0]).collect();
    let mut out = x.to_vec();

    for (section, z) in sections.iter().zip(state.iter_mut()) {
        let [b0, b1, b2] = section.b;
        let [_, a1, a2] = section.a;
        for sample in out.iter_mut() {
            let input = *sample;
            let output = b0 * input + z[0];
            z[0] = b1 * input - a1 * output + z[1];
            z[1] = b2 * input - a2 * output;
            *sample = output;
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::design::{design, BandSpec};
    use crate::engine::io::{generate_test_tone, generate_tone_mix};

    fn kick_filter(sample_rate: u32) -> SosFilter {
        design(&BandSpec::low_pass("kick", 200.0), sample_rate).unwrap()
    }

    fn rms(samples: &[f32]) -> f64 {
        (samples.iter().map(|&s| (s as f64).powi(2)).sum::<f64>() / samples.len() as f64).sqrt()
    }

    #[test]
    fn test_pad_length() {
        // 2 sections -> 5 taps, 4 sections -> 9 taps
        assert_eq!(pad_length(&kick_filter(44100)), 15);
        let snare = design(&BandSpec::band_pass("snare", 150.0, 4000.0), 44100).unwrap();
        assert_eq!(pad_length(&snare), 27);
        assert_eq!(min_samples(&snare), 28);
    }

    #[test]
    fn test_odd_extend() {
        let ext = odd_extend(&[1.0, 2.0, 4.0, 7.0], 2);
        assert_eq!(ext, vec![-2.0, 0.0, 1.0, 2.0, 4.0, 7.0, 10.0, 12.0]);
    }

    #[test]
    fn test_steady_state_holds_dc() {
        // Feeding a constant from the steady state yields a constant output
        let filter = kick_filter(44100);
        let zi = steady_state(filter.sections());
        let x = vec![0.5; 64];
        let y = sosfilt(filter.sections(), &x, &zi, 0.5);
        for s in y {
            assert!((s - 0.5).abs() < 1e-9, "expected settled output, got {}", s);
        }
    }

    #[test]
    fn test_preserves_length_and_shape() {
        let waveform = generate_tone_mix(&[(100.0, 0.5), (3000.0, 0.5)], 2, 0.2, 44100);
        let filtered = apply(&waveform, &kick_filter(44100)).unwrap();

        assert_eq!(filtered.len(), waveform.len());
        assert_eq!(filtered.channels(), 2);
        assert_eq!(filtered.sample_rate(), 44100);
        assert!(filtered.is_finite());
    }

    #[test]
    fn test_pass_band_is_kept_and_stop_band_removed() {
        let filter = kick_filter(44100);
        // Measure away from the edges where start-up transients live
        let interior = 4410..39690;

        let low = generate_test_tone(60.0, 1.0, 44100);
        let low_out = filtfilt(low.channel(0), &filter).unwrap();
        let ratio = rms(&low_out[interior.clone()]) / rms(&low.channel(0)[interior.clone()]);
        assert!((ratio - 1.0).abs() < 0.01, "pass-band ratio {}", ratio);

        let high = generate_test_tone(6000.0, 1.0, 44100);
        let high_out = filtfilt(high.channel(0), &filter).unwrap();
        let ratio = rms(&high_out[interior.clone()]) / rms(&high.channel(0)[interior]);
        assert!(ratio < 1e-3, "stop-band ratio {}", ratio);
    }

    #[test]
    fn test_zero_phase() {
        // A pass-band tone comes out aligned with the input, not delayed
        let filter = kick_filter(44100);
        let tone = generate_test_tone(50.0, 1.0, 44100);
        let out = filtfilt(tone.channel(0), &filter).unwrap();

        let mid = tone.len() / 2;
        for i in mid..mid + 200 {
            assert!(
                (out[i] - tone.channel(0)[i]).abs() < 0.01,
                "phase shift at {}: {} vs {}",
                i,
                out[i],
                tone.channel(0)[i]
            );
        }
    }

    #[test]
    fn test_silence_stays_silent() {
        let out = filtfilt(&[0.0; 256], &kick_filter(44100)).unwrap();
        assert!(out.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_insufficient_samples() {
        let filter = kick_filter(44100);

        match filtfilt(&[0.5], &filter) {
            Err(UnmixError::InsufficientSamples { required, actual }) => {
                assert_eq!(required, 16);
                assert_eq!(actual, 1);
            }
            other => panic!("Expected InsufficientSamples, got {:?}", other),
        }
        assert!(filtfilt(&[], &filter).is_err());
        assert!(filtfilt(&[0.1; 15], &filter).is_err());
        assert_eq!(filtfilt(&[0.1; 16], &filter).unwrap().len(), 16);
    }

    #[test]
    fn test_sample_rate_mismatch() {
        let waveform = generate_test_tone(60.0, 0.1, 48000);
        let result = apply(&waveform, &kick_filter(44100));
        assert!(matches!(result, Err(UnmixError::InvalidWaveform { .. })));
    }
}
