//! Error handling for Unmix
//!
//! Every failure in the crate is an `UnmixError`. Errors carry a stable code
//! for the CLI and recovery suggestions for the user.

use thiserror::Error;

/// Result type alias for Unmix operations
pub type Result<T> = std::result::Result<T, UnmixError>;

/// Main error type for Unmix operations
#[derive(Error, Debug)]
pub enum UnmixError {
    // Filter design errors
    #[error("Invalid band specification for {element}: {reason}")]
    InvalidBandSpec { element: String, reason: String },

    // Filtering errors
    #[error("Insufficient samples for zero-phase filtering: need at least {required}, got {actual}")]
    InsufficientSamples { required: usize, actual: usize },

    #[error("Invalid waveform: {reason}")]
    InvalidWaveform { reason: String },

    // Audio I/O errors
    #[error("Unreadable audio file: {path}: {reason}")]
    UnreadableFile {
        path: String,
        reason: String,
        #[source]
        source: Option<hound::Error>,
    },

    #[error("Failed to write audio file: {path}: {reason}")]
    WriteError {
        path: String,
        reason: String,
        #[source]
        source: Option<hound::Error>,
    },

    #[error("Unsupported audio format: {format}")]
    UnsupportedFormat { format: String },

    // Separation model errors
    #[error("Unknown separation model: {model}")]
    UnknownModel { model: String },

    #[error("Stem separation failed: {reason}")]
    Separation { reason: String },

    // Configuration errors
    #[error("Invalid configuration: {reason}")]
    Config { reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl UnmixError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            UnmixError::InvalidBandSpec { .. } => "INVALID_BAND_SPEC",
            UnmixError::InsufficientSamples { .. } => "INSUFFICIENT_SAMPLES",
            UnmixError::InvalidWaveform { .. } => "INVALID_WAVEFORM",
            UnmixError::UnreadableFile { .. } => "UNREADABLE_FILE",
            UnmixError::WriteError { .. } => "WRITE_ERROR",
            UnmixError::UnsupportedFormat { .. } => "UNSUPPORTED_FORMAT",
            UnmixError::UnknownModel { .. } => "UNKNOWN_MODEL",
            UnmixError::Separation { .. } => "SEPARATION_FAILED",
            UnmixError::Config { .. } => "CONFIG_ERROR",
            UnmixError::Io(_) => "IO_ERROR",
            UnmixError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            UnmixError::InvalidBandSpec { .. } => vec![
                "The input sample rate may be too low for this band",
                "Resample the input to 44.1 kHz or 48 kHz and try again",
            ],
            UnmixError::InsufficientSamples { .. } => vec![
                "The input is too short to filter",
                "Use a longer drum stem (a fraction of a second is enough)",
            ],
            UnmixError::UnreadableFile { .. } => vec![
                "Check the file path is correct",
                "Convert the file to WAV format first",
                "Check if the file plays in another application",
            ],
            UnmixError::WriteError { .. } => vec![
                "Check the output directory is writable",
                "Free up disk space",
            ],
            UnmixError::UnsupportedFormat { .. } => vec![
                "Use 16-bit, 24-bit or 32-bit float WAV",
            ],
            UnmixError::UnknownModel { .. } => vec![
                "Available models: htdemucs, htdemucs_ft, hdemucs_mmi, mock",
            ],
            UnmixError::Separation { .. } => vec![
                "Install Demucs: pip install demucs",
                "Set UNMIX_PYTHON to the interpreter that has Demucs installed",
                "Try --model=mock to check the rest of the pipeline",
            ],
            UnmixError::Config { .. } => vec![
                "Check the configuration file and UNMIX_* environment variables",
            ],
            _ => vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = UnmixError::InsufficientSamples {
            required: 28,
            actual: 1,
        };
        assert_eq!(err.error_code(), "INSUFFICIENT_SAMPLES");

        let err = UnmixError::InvalidBandSpec {
            element: "snare".to_string(),
            reason: "low >= high".to_string(),
        };
        assert_eq!(err.error_code(), "INVALID_BAND_SPEC");
    }

    #[test]
    fn test_error_message_names_counts() {
        let err = UnmixError::InsufficientSamples {
            required: 28,
            actual: 1,
        };
        let message = err.to_string();
        assert!(message.contains("28"));
        assert!(message.contains('1'));
    }

    #[test]
    fn test_recovery_suggestions() {
        let err = UnmixError::UnknownModel {
            model: "spleeter".to_string(),
        };
        assert!(!err.recovery_suggestions().is_empty());
        assert!(UnmixError::Io(std::io::Error::other("x"))
            .recovery_suggestions()
            .is_empty());
    }
}
