//! CLI Module
//!
//! Command-line interface for the unmix separation tool.

pub mod commands;

use std::fmt;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Separate audio into stems and drum components
#[derive(Parser, Debug)]
#[command(name = "unmix")]
#[command(version, about, long_about = None)]
#[command(after_help = "Examples:
  unmix --mode=stems --input-file=input.wav
  unmix --mode=drums --input-file=drums.wav
  unmix --mode=both --input-file=input.wav
  unmix --mode=stems --input-file=song.wav --model=htdemucs_ft")]
pub struct Cli {
    /// Operation mode
    #[arg(long, value_enum)]
    pub mode: Mode,

    /// Input audio file path
    #[arg(long = "input-file")]
    pub input_file: PathBuf,

    /// Output directory for stems
    #[arg(long = "output-stems", default_value = "output_stems")]
    pub output_stems: PathBuf,

    /// Output directory for drum components
    #[arg(long = "output-drums", default_value = "output_drums")]
    pub output_drums: PathBuf,

    /// Separation model (htdemucs, htdemucs_ft, hdemucs_mmi, mock)
    #[arg(long, default_value = "htdemucs")]
    pub model: String,

    /// JSON configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

/// What the run produces
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Split a mix into drums, vocals, bass and other
    Stems,
    /// Split a drum stem into kick, snare, hi-hat and toms
    Drums,
    /// Split a mix into stems, then split its drums
    Both,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Stems => write!(f, "stems"),
            Mode::Drums => write!(f, "drums"),
            Mode::Both => write!(f, "both"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["unmix", "--mode=drums", "--input-file=drums.wav"]).unwrap();
        assert_eq!(cli.mode, Mode::Drums);
        assert_eq!(cli.input_file, PathBuf::from("drums.wav"));
        assert_eq!(cli.output_stems, PathBuf::from("output_stems"));
        assert_eq!(cli.output_drums, PathBuf::from("output_drums"));
        assert_eq!(cli.model, "htdemucs");
        assert!(cli.config.is_none());
        assert!(!cli.verbose);
    }

    #[test]
    fn test_all_options() {
        let cli = Cli::try_parse_from([
            "unmix",
            "--mode",
            "both",
            "--input-file",
            "song.wav",
            "--output-stems",
            "s",
            "--output-drums",
            "d",
            "--model",
            "htdemucs_ft",
            "--config",
            "unmix.json",
            "-v",
        ])
        .unwrap();
        assert_eq!(cli.mode, Mode::Both);
        assert_eq!(cli.output_stems, PathBuf::from("s"));
        assert_eq!(cli.output_drums, PathBuf::from("d"));
        assert_eq!(cli.model, "htdemucs_ft");
        assert_eq!(cli.config, Some(PathBuf::from("unmix.json")));
        assert!(cli.verbose);
    }

    #[test]
    fn test_required_arguments() {
        assert!(Cli::try_parse_from(["unmix", "--input-file=a.wav"]).is_err());
        assert!(Cli::try_parse_from(["unmix", "--mode=stems"]).is_err());
        assert!(Cli::try_parse_from(["unmix", "--mode=karaoke", "--input-file=a.wav"]).is_err());
    }
}
