//! Audio file I/O for Unmix
//!
//! Decodes WAV files into `Waveform`s and encodes them back. Samples are
//! always handled as 32-bit float internally; the source sample rate is kept
//! as-is.

use std::fs;
use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::engine::buffer::Waveform;
use crate::error::{Result, UnmixError};

/// Bit depths accepted by `encode`
pub const SUPPORTED_BIT_DEPTHS: [u16; 3] = [16, 24, 32];

/// Export format configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportFormat {
    /// Bit depth: 16, 24 (integer PCM) or 32 (float)
    pub bit_depth: u16,
}

impl Default for ExportFormat {
    fn default() -> Self {
        ExportFormat { bit_depth: 16 }
    }
}

impl ExportFormat {
    /// Create an export format with the given bit depth
    pub fn new(bit_depth: u16) -> Self {
        ExportFormat { bit_depth }
    }

    /// Reject bit depths `encode` cannot write
    pub fn validate(&self) -> Result<()> {
        if SUPPORTED_BIT_DEPTHS.contains(&self.bit_depth) {
            Ok(())
        } else {
            Err(UnmixError::UnsupportedFormat {
                format: format!(
                    "{}-bit audio (only 16, 24, 32 supported)",
                    self.bit_depth
                ),
            })
        }
    }
}

/// Header information about an audio file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioInfo {
    /// Duration in seconds
    pub duration_secs: f64,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels
    pub channels: u16,
    /// Samples per channel
    pub frames: u32,
    /// Bits per sample
    pub bits_per_sample: u16,
    /// "int" or "float"
    pub sample_format: String,
}

/// Read header information without decoding samples
pub fn probe(path: &Path) -> Result<AudioInfo> {
    let reader = open_reader(path)?;
    let spec = reader.spec();
    let frames = reader.duration();

    Ok(AudioInfo {
        duration_secs: frames as f64 / spec.sample_rate as f64,
        sample_rate: spec.sample_rate,
        channels: spec.channels,
        frames,
        bits_per_sample: spec.bits_per_sample,
        sample_format: match spec.sample_format {
            SampleFormat::Float => "float".to_string(),
            SampleFormat::Int => "int".to_string(),
        },
    })
}

/// Decode a WAV file into a waveform
///
/// # Errors
/// * `UnreadableFile` - missing file, malformed WAV, or read failure
/// * `UnsupportedFormat` - sample encoding hound can read but we do not map
pub fn decode(path: &Path) -> Result<Waveform> {
    let reader = open_reader(path)?;
    let spec = reader.spec();
    let channels = spec.channels as usize;

    debug!(
        "Decoding {}: {} Hz, {} ch, {}-bit {:?}",
        path.display(),
        spec.sample_rate,
        channels,
        spec.bits_per_sample,
        spec.sample_format
    );

    let interleaved = read_samples_as_f32(reader, spec.bits_per_sample, spec.sample_format, path)?;

    Waveform::from_interleaved(&interleaved, channels, spec.sample_rate).map_err(|e| {
        UnmixError::UnreadableFile {
            path: path.display().to_string(),
            reason: e.to_string(),
            source: None,
        }
    })
}

/// Encode a waveform to a WAV file
///
/// Parent directories are created when missing. Samples are clamped to
/// [-1.0, 1.0] for integer formats.
///
/// # Errors
/// * `UnsupportedFormat` - bit depth other than 16, 24 or 32
/// * `WriteError` - the file cannot be created or written
pub fn encode(waveform: &Waveform, path: &Path, format: ExportFormat) -> Result<()> {
    format.validate()?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| UnmixError::WriteError {
            path: path.display().to_string(),
            reason: format!("cannot create directory {}: {}", parent.display(), e),
            source: None,
        })?;
    }

    let spec = WavSpec {
        channels: waveform.channels() as u16,
        sample_rate: waveform.sample_rate(),
        bits_per_sample: format.bit_depth,
        sample_format: if format.bit_depth == 32 {
            SampleFormat::Float
        } else {
            SampleFormat::Int
        },
    };

    let write_err = |e: hound::Error| UnmixError::WriteError {
        path: path.display().to_string(),
        reason: e.to_string(),
        source: Some(e),
    };

    let mut writer = WavWriter::create(path, spec).map_err(write_err)?;
    let interleaved = waveform.to_interleaved();

    match format.bit_depth {
        16 => {
            for sample in interleaved {
                let scaled = (sample.clamp(-1.0, 1.0) * 32767.0) as i16;
                writer.write_sample(scaled).map_err(write_err)?;
            }
        }
        24 => {
            for sample in interleaved {
                // 24-bit stored as i32 in hound
                let scaled = (sample.clamp(-1.0, 1.0) * 8_388_607.0) as i32;
                writer.write_sample(scaled).map_err(write_err)?;
            }
        }
        _ => {
            for sample in interleaved {
                writer.write_sample(sample).map_err(write_err)?;
            }
        }
    }

    writer.finalize().map_err(write_err)?;
    debug!("Wrote {} ({} frames)", path.display(), waveform.len());

    Ok(())
}

/// Generate a mono sine tone
pub fn generate_test_tone(frequency: f32, duration_secs: f32, sample_rate: u32) -> Waveform {
    let num_samples = (duration_secs * sample_rate as f32) as usize;
    let angular_freq = 2.0 * std::f64::consts::PI * frequency as f64 / sample_rate as f64;
    let samples = (0..num_samples)
        .map(|i| (angular_freq * i as f64).sin() as f32)
        .collect();

    Waveform::new(vec![samples], sample_rate.max(1)).unwrap_or_else(|_| Waveform::silence(1, 0, 1))
}

/// Generate a multi-channel signal that is the sum of sine tones
///
/// Every channel carries the same mix; each `(frequency, amplitude)` pair
/// contributes one sinusoid.
pub fn generate_tone_mix(
    tones: &[(f32, f32)],
    channels: usize,
    duration_secs: f32,
    sample_rate: u32,
) -> Waveform {
    let num_samples = (duration_secs * sample_rate as f32) as usize;
    let mix: Vec<f32> = (0..num_samples)
        .map(|i| {
            let t = i as f64 / sample_rate as f64;
            tones
                .iter()
                .map(|&(freq, amp)| {
                    amp as f64 * (2.0 * std::f64::consts::PI * freq as f64 * t).sin()
                })
                .sum::<f64>() as f32
        })
        .collect();

    Waveform::new(vec![mix; channels.max(1)], sample_rate.max(1))
        .unwrap_or_else(|_| Waveform::silence(channels, 0, 1))
}

// ============================================================================
// Internal helper functions
// ============================================================================

fn open_reader(path: &Path) -> Result<WavReader<std::io::BufReader<fs::File>>> {
    if !path.exists() {
        return Err(UnmixError::UnreadableFile {
            path: path.display().to_string(),
            reason: "file not found".to_string(),
            source: None,
        });
    }

    WavReader::open(path).map_err(|e| UnmixError::UnreadableFile {
        path: path.display().to_string(),
        reason: format!("Failed to open WAV file: {}", e),
        source: Some(e),
    })
}

/// Read samples from a WAV reader and convert to f32
fn read_samples_as_f32<R: std::io::Read>(
    mut reader: WavReader<R>,
    bits_per_sample: u16,
    sample_format: SampleFormat,
    path: &Path,
) -> Result<Vec<f32>> {
    let read_err = |e: hound::Error| UnmixError::UnreadableFile {
        path: path.display().to_string(),
        reason: format!("Failed to read {}-bit samples: {}", bits_per_sample, e),
        source: Some(e),
    };

    match sample_format {
        SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<Vec<f32>, _>>()
            .map_err(read_err),
        SampleFormat::Int => {
            let scale = match bits_per_sample {
                8 => 128.0,
                16 => 32_768.0,
                24 => 8_388_608.0,
                32 => 2_147_483_648.0,
                _ => {
                    return Err(UnmixError::UnsupportedFormat {
                        format: format!("{}-bit integer audio", bits_per_sample),
                    })
                }
            };
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| (v as f64 / scale) as f32))
                .collect::<std::result::Result<Vec<f32>, _>>()
                .map_err(read_err)
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_generate_test_tone() {
        let waveform = generate_test_tone(441.0, 1.0, 44100);

        assert_eq!(waveform.len(), 44100);
        assert_eq!(waveform.channels(), 1);

        // 100 samples per cycle: sample 50 sits on a zero crossing
        assert!(waveform.channel(0)[50].abs() < 0.01);
        assert!((waveform.channel(0)[25] - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_generate_tone_mix() {
        let waveform = generate_tone_mix(&[(60.0, 0.5), (6000.0, 0.25)], 2, 0.5, 44100);

        assert_eq!(waveform.channels(), 2);
        assert_eq!(waveform.len(), 22050);
        assert_eq!(waveform.channel(0), waveform.channel(1));
        assert!(waveform.peak() <= 0.75 + 1e-6);
    }

    #[test]
    fn test_round_trip_stereo_16bit() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stereo.wav");

        let original = generate_tone_mix(&[(440.0, 0.5)], 2, 0.25, 44100);
        encode(&original, &path, ExportFormat::default()).unwrap();
        let decoded = decode(&path).unwrap();

        assert_eq!(decoded.channels(), 2);
        assert_eq!(decoded.len(), original.len());
        assert_eq!(decoded.sample_rate(), 44100);
        for (a, b) in original.channel(1).iter().zip(decoded.channel(1)) {
            assert!((a - b).abs() < 1e-3, "Sample mismatch: {} vs {}", a, b);
        }
    }

    #[test]
    fn test_round_trip_32bit_float_is_lossless() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("float.wav");

        let original = generate_test_tone(1000.0, 0.1, 22050);
        encode(&original, &path, ExportFormat::new(32)).unwrap();
        let decoded = decode(&path).unwrap();

        assert_eq!(decoded, original);
    }

    #[test]
    fn test_round_trip_24bit() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("24bit.wav");

        let original = generate_test_tone(1000.0, 0.1, 48000);
        encode(&original, &path, ExportFormat::new(24)).unwrap();
        let decoded = decode(&path).unwrap();

        for (a, b) in original.channel(0).iter().zip(decoded.channel(0)) {
            assert!((a - b).abs() < 1e-5);
        }
    }

    #[test]
    fn test_encode_creates_parent_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("out.wav");

        encode(&Waveform::silence(1, 100, 8000), &path, ExportFormat::default()).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_encode_rejects_bit_depth() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.wav");

        let result = encode(&Waveform::silence(1, 100, 8000), &path, ExportFormat::new(48));
        assert!(matches!(result, Err(UnmixError::UnsupportedFormat { .. })));
        assert!(!path.exists());
    }

    #[test]
    fn test_probe_reports_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("probe.wav");

        encode(&Waveform::silence(2, 22050, 22050), &path, ExportFormat::new(24)).unwrap();
        let info = probe(&path).unwrap();

        assert_eq!(info.sample_rate, 22050);
        assert_eq!(info.channels, 2);
        assert_eq!(info.frames, 22050);
        assert_eq!(info.bits_per_sample, 24);
        assert_eq!(info.sample_format, "int");
        assert!((info.duration_secs - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_decode_nonexistent_file() {
        let result = decode(Path::new("/nonexistent/path/audio.wav"));
        match result {
            Err(UnmixError::UnreadableFile { path, .. }) => assert!(path.contains("nonexistent")),
            other => panic!("Expected UnreadableFile error, got: {:?}", other),
        }
    }

    #[test]
    fn test_decode_garbage_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("garbage.wav");
        fs::write(&path, b"definitely not a RIFF header").unwrap();

        assert!(matches!(decode(&path), Err(UnmixError::UnreadableFile { .. })));
    }
}
