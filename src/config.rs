//! Runtime configuration
//!
//! Settings come from three places, later ones winning:
//! 1. Built-in defaults
//! 2. An optional JSON file (`--config`)
//! 3. `UNMIX_*` environment variables
//!
//! The merged result is validated before use.

use std::path::Path;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::dsp::normalize::{Normalizer, DEFAULT_CEILING};
use crate::dsp::DrumDecomposer;
use crate::engine::ExportFormat;
use crate::error::{Result, UnmixError};

/// Environment variable names read by `Config::apply_env`
pub const ENV_PYTHON: &str = "UNMIX_PYTHON";
pub const ENV_DEVICE: &str = "UNMIX_DEVICE";
pub const ENV_PARALLEL: &str = "UNMIX_PARALLEL";
pub const ENV_CEILING: &str = "UNMIX_CEILING";
pub const ENV_BIT_DEPTH: &str = "UNMIX_BIT_DEPTH";

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Peak level decomposed drum elements are normalized to
    pub ceiling: f32,
    /// Process the four drum bands on the rayon pool
    pub parallel: bool,
    /// Bit depth of written WAV files (16, 24 or 32)
    pub bit_depth: u16,
    /// Python interpreter with Demucs installed
    pub python: String,
    /// Demucs device (`cpu`, `cuda`, `mps`). Demucs picks one when unset.
    pub device: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ceiling: DEFAULT_CEILING,
            parallel: true,
            bit_depth: 16,
            python: "python".to_string(),
            device: None,
        }
    }
}

impl Config {
    /// Load defaults, then the optional file, then the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env()?;
        config.validate()?;
        debug!("Effective config: {:?}", config);
        Ok(config)
    }

    /// Read a JSON config file
    ///
    /// Missing keys take their defaults. An unreadable or malformed file is
    /// an error.
    pub fn from_file(path: &Path) -> Result<Self> {
        info!("Loading config from {}", path.display());
        let contents = std::fs::read_to_string(path).map_err(|e| UnmixError::Config {
            reason: format!("cannot read {}: {}", path.display(), e),
        })?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Apply `UNMIX_*` overrides from the process environment
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(python) = lookup(ENV_PYTHON) {
            self.python = python;
        }
        if let Some(device) = lookup(ENV_DEVICE) {
            self.device = if device.is_empty() { None } else { Some(device) };
        }
        if let Some(value) = lookup(ENV_PARALLEL) {
            self.parallel = parse_bool(ENV_PARALLEL, &value)?;
        }
        if let Some(value) = lookup(ENV_CEILING) {
            self.ceiling = value.trim().parse().map_err(|_| UnmixError::Config {
                reason: format!("{} must be a number, got '{}'", ENV_CEILING, value),
            })?;
        }
        if let Some(value) = lookup(ENV_BIT_DEPTH) {
            self.bit_depth = value.trim().parse().map_err(|_| UnmixError::Config {
                reason: format!("{} must be an integer, got '{}'", ENV_BIT_DEPTH, value),
            })?;
        }
        Ok(())
    }

    /// Check every value is usable
    pub fn validate(&self) -> Result<()> {
        Normalizer::new(self.ceiling)?;
        self.export_format()
            .validate()
            .map_err(|_| UnmixError::Config {
                reason: format!("bit_depth must be 16, 24 or 32, got {}", self.bit_depth),
            })?;
        if self.python.trim().is_empty() {
            return Err(UnmixError::Config {
                reason: "python executable must not be empty".to_string(),
            });
        }
        Ok(())
    }

    pub fn export_format(&self) -> ExportFormat {
        ExportFormat::new(self.bit_depth)
    }

    /// Drum decomposer built from these settings
    pub fn decomposer(&self) -> Result<DrumDecomposer> {
        Ok(DrumDecomposer::new(Normalizer::new(self.ceiling)?, self.parallel))
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(UnmixError::Config {
            reason: format!("{} must be true or false, got '{}'", key, value),
        }),
    }
}
