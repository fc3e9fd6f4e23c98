//! Demucs stem separation
//!
//! Runs the Demucs command-line tool in a Python subprocess:
//! 1. The mix is written to a temporary 32-bit float WAV
//! 2. `python -m demucs -n <model> -o <dir> <wav>` separates it
//! 3. The four stem WAVs are decoded from `<dir>/<model>/<track>/`
//! 4. The temporary directory is removed on drop
//!
//! No Python bindings are linked. The interpreter is whatever the config or
//! `UNMIX_PYTHON` names.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Instant;

use log::{debug, info, warn};

use super::model::{Stem, StemSeparator, StemSet};
use crate::config::Config;
use crate::engine::{decode, encode, ExportFormat, Waveform};
use crate::error::{Result, UnmixError};

/// Demucs models that can be requested by name
pub const DEMUCS_MODELS: [&str; 3] = ["htdemucs", "htdemucs_ft", "hdemucs_mmi"];

const TRACK_NAME: &str = "input";

/// Separator backed by a pretrained Demucs model
#[derive(Debug, Clone)]
pub struct DemucsSeparator {
    model: String,
    python: String,
    device: Option<String>,
}

impl DemucsSeparator {
    /// Create a separator for one of `DEMUCS_MODELS`
    pub fn new(model: &str, python: &str) -> Result<Self> {
        if !DEMUCS_MODELS.contains(&model) {
            return Err(UnmixError::UnknownModel {
                model: model.to_string(),
            });
        }
        Ok(Self {
            model: model.to_string(),
            python: python.to_string(),
            device: None,
        })
    }

    /// Create a separator using the interpreter and device from `config`
    pub fn from_config(model: &str, config: &Config) -> Result<Self> {
        Ok(Self::new(model, &config.python)?.with_device(config.device.clone()))
    }

    /// Force a device (`cpu`, `cuda`, `mps`) instead of letting Demucs pick
    pub fn with_device(mut self, device: Option<String>) -> Self {
        self.device = device;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Arguments passed to the interpreter
    fn command_args(&self, input: &Path, out_dir: &Path) -> Vec<String> {
        let mut args = vec![
            "-m".to_string(),
            "demucs".to_string(),
            "-n".to_string(),
            self.model.clone(),
            "-o".to_string(),
            out_dir.to_string_lossy().to_string(),
        ];
        if let Some(device) = &self.device {
            args.push("-d".to_string());
            args.push(device.clone());
        }
        args.push(input.to_string_lossy().to_string());
        args
    }

    /// Where Demucs writes one stem for our temporary track
    fn stem_path(&self, out_dir: &Path, stem: Stem) -> PathBuf {
        out_dir
            .join(&self.model)
            .join(TRACK_NAME)
            .join(format!("{}.wav", stem.as_str()))
    }

    fn run(&self, input: &Path, out_dir: &Path) -> Result<()> {
        let args = self.command_args(input, out_dir);
        debug!("Running {} {}", self.python, args.join(" "));

        let output = Command::new(&self.python)
            .args(&args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| UnmixError::Separation {
                reason: format!("failed to start '{}': {}", self.python, e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let tail: Vec<&str> = stderr.lines().rev().take(5).collect();
            return Err(UnmixError::Separation {
                reason: format!(
                    "demucs exited with {:?}: {}",
                    output.status.code(),
                    tail.into_iter().rev().collect::<Vec<_>>().join(" | ")
                ),
            });
        }
        Ok(())
    }

    fn read_stem(&self, out_dir: &Path, stem: Stem) -> Result<Waveform> {
        let path = self.stem_path(out_dir, stem);
        decode(&path).map_err(|e| UnmixError::Separation {
            reason: format!("missing {} stem from demucs: {}", stem, e),
        })
    }
}

impl StemSeparator for DemucsSeparator {
    fn name(&self) -> &str {
        &self.model
    }

    fn separate(&self, mix: &Waveform) -> Result<StemSet> {
        let start = Instant::now();
        let scratch = ScratchDir::create()?;
        let input = scratch.path().join(format!("{}.wav", TRACK_NAME));
        let out_dir = scratch.path().join("separated");

        encode(mix, &input, ExportFormat::new(32))?;
        info!(
            "Separating {:.1}s of audio with {} (this may take a few minutes)",
            mix.duration_secs(),
            self.model
        );
        self.run(&input, &out_dir)?;

        let stems = StemSet {
            drums: self.read_stem(&out_dir, Stem::Drums)?,
            vocals: self.read_stem(&out_dir, Stem::Vocals)?,
            bass: self.read_stem(&out_dir, Stem::Bass)?,
            other: self.read_stem(&out_dir, Stem::Other)?,
        };
        info!(
            "{} finished in {:.1}s",
            self.model,
            start.elapsed().as_secs_f64()
        );
        Ok(stems)
    }

    fn is_available(&self) -> bool {
        Command::new(&self.python)
            .args(["-c", "import demucs"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }
}

/// Temporary directory removed on drop
struct ScratchDir {
    path: PathBuf,
}

impl ScratchDir {
    fn create() -> Result<Self> {
        let path = std::env::temp_dir().join(format!("unmix-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&path)?;
        Ok(Self { path })
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_dir_all(&self.path) {
            warn!("Could not remove {}: {}", self.path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::generate_test_tone;

    #[test]
    fn test_known_models() {
        for model in DEMUCS_MODELS {
            assert_eq!(DemucsSeparator::new(model, "python").unwrap().name(), model);
        }
        assert!(matches!(
            DemucsSeparator::new("spleeter", "python"),
            Err(UnmixError::UnknownModel { .. })
        ));
    }

    #[test]
    fn test_command_args() {
        let separator = DemucsSeparator::new("htdemucs_ft", "python").unwrap();
        let args = separator.command_args(Path::new("/tmp/x/input.wav"), Path::new("/tmp/x/out"));
        assert_eq!(
            args,
            vec!["-m", "demucs", "-n", "htdemucs_ft", "-o", "/tmp/x/out", "/tmp/x/input.wav"]
        );

        let separator = separator.with_device(Some("cuda".to_string()));
        let args = separator.command_args(Path::new("in.wav"), Path::new("out"));
        assert_eq!(&args[6..], &["-d", "cuda", "in.wav"]);
    }

    #[test]
    fn test_stem_path_layout() {
        let separator = DemucsSeparator::new("htdemucs", "python").unwrap();
        assert_eq!(
            separator.stem_path(Path::new("/s"), Stem::Vocals),
            PathBuf::from("/s/htdemucs/input/vocals.wav")
        );
    }

    #[test]
    fn test_from_config() {
        let config = Config {
            python: "/usr/bin/python3".to_string(),
            device: Some("cpu".to_string()),
            ..Config::default()
        };
        let separator = DemucsSeparator::from_config("hdemucs_mmi", &config).unwrap();
        assert_eq!(separator.python, "/usr/bin/python3");
        assert_eq!(separator.device.as_deref(), Some("cpu"));
    }

    #[test]
    fn test_missing_interpreter_is_separation_error() {
        let separator =
            DemucsSeparator::new("htdemucs", "/nonexistent/unmix-python").unwrap();
        assert!(!separator.is_available());

        let mix = generate_test_tone(440.0, 0.1, 44100);
        match separator.separate(&mix) {
            Err(UnmixError::Separation { reason }) => assert!(reason.contains("failed to start")),
            other => panic!("Expected Separation error, got {:?}", other),
        }
    }

    #[test]
    fn test_scratch_dir_removed_on_drop() {
        let path = {
            let scratch = ScratchDir::create().unwrap();
            assert!(scratch.path().is_dir());
            scratch.path().to_path_buf()
        };
        assert!(!path.exists());
    }
}
