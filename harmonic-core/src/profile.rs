//! # Harmonic Profile
//!
//! The result of one harmonic analysis, and its JSON persistence.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::AnalyzerConfig;

/// Fundamental and harmonic series of one spectrum.
///
/// `harmonic_positions[j]` and `harmonic_magnitudes[j]` belong to harmonic
/// number `j + 1` (number 1 is the fundamental tracked again). Harmonics that
/// could not be resolved keep their slot at the predicted bin with a zero
/// magnitude and are listed in `skipped`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HarmonicProfile {
    /// Refined fundamental in Hz, 0.0 when none was found.
    pub root_frequency: f64,
    /// Interpolated amplitude at the fundamental.
    pub root_gain: f64,
    /// Running fundamental after the harmonic walk.
    pub tracked_frequency: f64,
    /// Fractional bin position per harmonic.
    pub harmonic_positions: Vec<f64>,
    /// Amplitude per harmonic, scaled so the loudest is 1.0.
    pub harmonic_magnitudes: Vec<f64>,
    /// Harmonic numbers that were skipped.
    pub skipped: Vec<usize>,
}

impl HarmonicProfile {
    /// A profile with no fundamental and no harmonics.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn has_fundamental(&self) -> bool {
        self.root_frequency > 0.0
    }

    /// Iterates `(harmonic number, position, magnitude)` over resolved harmonics.
    pub fn tracked_harmonics(&self) -> impl Iterator<Item = (usize, f64, f64)> + '_ {
        self.harmonic_positions
            .iter()
            .zip(&self.harmonic_magnitudes)
            .enumerate()
            .map(|(j, (&position, &magnitude))| (j + 1, position, magnitude))
            .filter(|(number, _, _)| !self.skipped.contains(number))
    }

    /// Frequencies in Hz of the resolved harmonics, keyed by harmonic number.
    pub fn partial_frequencies(&self, config: &AnalyzerConfig) -> Vec<(usize, f64)> {
        self.tracked_harmonics()
            .map(|(number, position, _)| (number, config.bin_to_freq(position)))
            .collect()
    }

    /// Writes the profile as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path)
            .with_context(|| format!("failed to create profile {}", path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)
            .with_context(|| format!("failed to write profile {}", path.display()))?;
        Ok(())
    }

    /// Reads a profile written by [`HarmonicProfile::save`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("failed to open profile {}", path.display()))?;
        let profile = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("failed to parse profile {}", path.display()))?;
        Ok(profile)
    }
}
