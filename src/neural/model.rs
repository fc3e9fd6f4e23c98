//! Stem separator trait and core types
//!
//! Defines the interface every separation model implements.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::engine::Waveform;
use crate::error::{Result, UnmixError};

/// One of the four tracks a separation model produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stem {
    Drums,
    Vocals,
    Bass,
    Other,
}

impl Stem {
    /// All stems, in output order
    pub const ALL: [Stem; 4] = [Stem::Drums, Stem::Vocals, Stem::Bass, Stem::Other];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stem::Drums => "drums",
            Stem::Vocals => "vocals",
            Stem::Bass => "bass",
            Stem::Other => "other",
        }
    }
}

impl fmt::Display for Stem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stem {
    type Err = UnmixError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "drums" => Ok(Stem::Drums),
            "vocals" => Ok(Stem::Vocals),
            "bass" => Ok(Stem::Bass),
            "other" => Ok(Stem::Other),
            other => Err(UnmixError::Separation {
                reason: format!("unknown stem '{}'", other),
            }),
        }
    }
}

/// Output of a separation model
#[derive(Debug, Clone, PartialEq)]
pub struct StemSet {
    pub drums: Waveform,
    pub vocals: Waveform,
    pub bass: Waveform,
    pub other: Waveform,
}

impl StemSet {
    pub fn get(&self, stem: Stem) -> &Waveform {
        match stem {
            Stem::Drums => &self.drums,
            Stem::Vocals => &self.vocals,
            Stem::Bass => &self.bass,
            Stem::Other => &self.other,
        }
    }

    /// Iterate as `(stem, waveform)` in drums, vocals, bass, other order
    pub fn iter(&self) -> impl Iterator<Item = (Stem, &Waveform)> {
        Stem::ALL.into_iter().map(move |s| (s, self.get(s)))
    }
}

/// A model that splits a mix into drums, vocals, bass and other
///
/// Implementations are treated as black boxes: waveform in, four waveforms
/// out. They must be shareable across threads.
pub trait StemSeparator: Send + Sync {
    /// Model name as accepted by `--model`
    fn name(&self) -> &str;

    /// Split `mix` into four stems
    fn separate(&self, mix: &Waveform) -> Result<StemSet>;

    /// Whether the model can run on this machine
    fn is_available(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stem_names() {
        let names: Vec<_> = Stem::ALL.iter().map(|s| s.to_string()).collect();
        assert_eq!(names, vec!["drums", "vocals", "bass", "other"]);
        assert_eq!("Bass".parse::<Stem>().unwrap(), Stem::Bass);
        assert!("guitar".parse::<Stem>().is_err());
    }

    #[test]
    fn test_stem_set_iteration_order() {
        let w = |n| Waveform::silence(1, n, 44100);
        let set = StemSet {
            drums: w(1),
            vocals: w(2),
            bass: w(3),
            other: w(4),
        };
        let lengths: Vec<_> = set.iter().map(|(_, w)| w.len()).collect();
        assert_eq!(lengths, vec![1, 2, 3, 4]);
        assert_eq!(set.get(Stem::Bass).len(), 3);
    }
}
