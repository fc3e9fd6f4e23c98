//! Separation pipeline
//!
//! Sequences file decode, stem separation, drum decomposition and file
//! encode for the three CLI modes. All processing for a step finishes before
//! that step writes anything, so a failed decomposition leaves no element
//! files behind.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::info;
use serde::{Deserialize, Serialize};

use crate::dsp::{DrumDecomposer, DrumElement, DrumStems};
use crate::engine::{decode, encode, ExportFormat};
use crate::error::{Result, UnmixError};
use crate::neural::{Stem, StemSeparator, StemSet};

/// Files written by one pipeline run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineOutput {
    pub stems: BTreeMap<Stem, PathBuf>,
    pub drums: BTreeMap<DrumElement, PathBuf>,
}

impl PipelineOutput {
    /// Every written path, stems first
    pub fn files(&self) -> impl Iterator<Item = &PathBuf> {
        self.stems.values().chain(self.drums.values())
    }
}

/// Decode → separate → decompose → encode
pub struct Pipeline {
    separator: Arc<dyn StemSeparator>,
    decomposer: DrumDecomposer,
    format: ExportFormat,
}

impl Pipeline {
    pub fn new(
        separator: Arc<dyn StemSeparator>,
        decomposer: DrumDecomposer,
        format: ExportFormat,
    ) -> Self {
        Self {
            separator,
            decomposer,
            format,
        }
    }

    pub fn separator_name(&self) -> &str {
        self.separator.name()
    }

    /// Split a mix into four stems and write them to `out_dir`
    pub fn run_stems(&self, input: &Path, out_dir: &Path) -> Result<PipelineOutput> {
        let (_, output) = self.separate_and_write(input, out_dir)?;
        Ok(output)
    }

    /// Split a drum stem into kick, snare, hi-hat and toms in `out_dir`
    pub fn run_drums(&self, input: &Path, out_dir: &Path) -> Result<PipelineOutput> {
        self.format.validate()?;
        ensure_input(input)?;
        let drums = decode(input)?;
        let elements = self.decomposer.decompose(&drums)?;

        Ok(PipelineOutput {
            stems: BTreeMap::new(),
            drums: self.write_elements(&elements, &file_stem(input), out_dir)?,
        })
    }

    /// Separate stems, then decompose the drums stem
    pub fn run_both(
        &self,
        input: &Path,
        stems_dir: &Path,
        drums_dir: &Path,
    ) -> Result<PipelineOutput> {
        let (stems, mut output) = self.separate_and_write(input, stems_dir)?;

        info!("Decomposing drums stem");
        let elements = self.decomposer.decompose(&stems.drums)?;
        let prefix = format!("{}_{}", file_stem(input), Stem::Drums);
        output.drums = self.write_elements(&elements, &prefix, drums_dir)?;
        Ok(output)
    }

    fn separate_and_write(&self, input: &Path, out_dir: &Path) -> Result<(StemSet, PipelineOutput)> {
        self.format.validate()?;
        ensure_input(input)?;
        let mix = decode(input)?;

        info!("Separating stems with {}", self.separator.name());
        let stems = self.separator.separate(&mix)?;

        let prefix = file_stem(input);
        let mut output = PipelineOutput::default();
        for (stem, waveform) in stems.iter() {
            let path = out_dir.join(format!("{}_{}.wav", prefix, stem));
            encode(waveform, &path, self.format)?;
            info!("Saved {}", path.display());
            output.stems.insert(stem, path);
        }
        Ok((stems, output))
    }

    fn write_elements(
        &self,
        elements: &DrumStems,
        prefix: &str,
        out_dir: &Path,
    ) -> Result<BTreeMap<DrumElement, PathBuf>> {
        let mut written = BTreeMap::new();
        for (element, waveform) in elements.iter() {
            let path = out_dir.join(format!("{}_{}.wav", prefix, element));
            encode(waveform, &path, self.format)?;
            info!("Saved {}", path.display());
            written.insert(element, path);
        }
        Ok(written)
    }
}

fn ensure_input(input: &Path) -> Result<()> {
    if input.is_file() {
        Ok(())
    } else {
        Err(UnmixError::UnreadableFile {
            path: input.display().to_string(),
            reason: "input file not found".to_string(),
            source: None,
        })
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "output".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem(Path::new("/music/song.mix.wav")), "song.mix");
        assert_eq!(file_stem(Path::new("drums.wav")), "drums");
        assert_eq!(file_stem(Path::new("/")), "output");
    }

    #[test]
    fn test_ensure_input() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ensure_input(dir.path()).is_err());
        assert!(matches!(
            ensure_input(&dir.path().join("missing.wav")),
            Err(UnmixError::UnreadableFile { .. })
        ));
    }
}
