//! # Analyzer Configuration
//!
//! Transform size, sample rate and the tuning constants of the peak search
//! live in one explicit value that is passed to every stage, so analyzers
//! with different sample rates can coexist.
//!
//! Every field has a default. A TOML file only needs the fields it changes:
//!
//! ```toml
//! fft_size = 8192
//! sample_rate = 48000.0
//! window = "blackman-harris"
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::convert;
use crate::error::AnalysisError;
use crate::fft::WindowFunction;

/// Configuration shared by the transform, the peak locator and the tracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Transform size N (default: 16384)
    pub fft_size: usize,

    /// Sample rate in Hz (default: 44100.0)
    pub sample_rate: f64,

    /// Upper bound on the number of harmonics tracked, fundamental included (default: 16)
    pub max_harmonics: usize,

    /// Weight of the previous value in the one-pole envelope smoother (default: 0.9)
    pub smoothing: f64,

    /// Leading bins held at zero by the smoother to reject DC (default: 6)
    pub settle_bins: usize,

    /// Envelope crossing ratio relative to the envelope maximum (default: 0.1)
    pub peak_threshold: f64,

    /// Half-width of the sinc interpolation window in bins (default: 5, i.e. 11 points)
    pub interpolation_radius: usize,

    /// Distance scanned either side of the approximate bin (default: 1.0)
    pub interpolation_span: f64,

    /// Resolution of the interpolation scan in bins (default: 0.001)
    pub interpolation_step: f64,

    /// The harmonic search half-window is the fundamental's bin spacing
    /// divided by this (default: 3.0)
    pub search_divisor: f64,

    /// Weight of each harmonic's implied fundamental in the running estimate (default: 0.3)
    pub tracking_weight: f64,

    /// Harmonics quieter than this fraction of the root gain are skipped (default: 0.001)
    pub harmonic_floor: f64,

    /// Window used by the bundled magnitude transform (default: Hann)
    pub window: WindowFunction,

    /// Pitch of A4 for the note readout (default: 440.0)
    pub reference_pitch: f64,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            fft_size: 16384,
            sample_rate: 44100.0,
            max_harmonics: 16,
            smoothing: 0.9,
            settle_bins: 6,
            peak_threshold: 0.1,
            interpolation_radius: 5,
            interpolation_span: 1.0,
            interpolation_step: 0.001,
            search_divisor: 3.0,
            tracking_weight: 0.3,
            harmonic_floor: 0.001,
            window: WindowFunction::Hann,
            reference_pitch: 440.0,
        }
    }
}

impl AnalyzerConfig {
    /// Parses a configuration from TOML text and validates it.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).context("failed to parse analyzer config")?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a TOML configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_toml_str(&text)
    }

    /// Checks that every value is usable by the analysis stages.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        let fail = |msg: &str| Err(AnalysisError::InvalidConfig(msg.to_string()));

        if self.fft_size == 0 {
            return fail("fft_size must be positive");
        }
        if !(self.sample_rate.is_finite() && self.sample_rate > 0.0) {
            return fail("sample_rate must be positive");
        }
        if !(0.0..1.0).contains(&self.smoothing) {
            return fail("smoothing must lie in [0, 1)");
        }
        if !(self.peak_threshold > 0.0) {
            return fail("peak_threshold must be positive");
        }
        if !(self.interpolation_step > 0.0 && self.interpolation_span > 0.0) {
            return fail("interpolation_step and interpolation_span must be positive");
        }
        if !(self.search_divisor > 0.0) {
            return fail("search_divisor must be positive");
        }
        if !(0.0..=1.0).contains(&self.tracking_weight) {
            return fail("tracking_weight must lie in [0, 1]");
        }
        if !(self.harmonic_floor >= 0.0) {
            return fail("harmonic_floor must not be negative");
        }
        if !(self.reference_pitch > 0.0) {
            return fail("reference_pitch must be positive");
        }
        Ok(())
    }

    pub fn nyquist(&self) -> f64 {
        self.sample_rate / 2.0
    }

    /// Width of one bin in Hz.
    pub fn bin_width(&self) -> f64 {
        self.sample_rate / self.fft_size as f64
    }

    pub fn bin_to_freq(&self, index: f64) -> f64 {
        convert::bin_to_freq(index, self.fft_size, self.sample_rate)
    }

    pub fn freq_to_bin(&self, freq: f64) -> f64 {
        convert::freq_to_bin(freq, self.fft_size, self.sample_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_is_valid() {
        let config = AnalyzerConfig::default();
        assert!(config.validate().is_ok());
        assert_relative_eq!(config.nyquist(), 22050.0);
        assert_relative_eq!(config.bin_width(), 44100.0 / 16384.0);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AnalyzerConfig::from_toml_str(
            r#"
            fft_size = 8192
            sample_rate = 48000.0
            window = "blackman-harris"
            "#,
        )
        .unwrap();

        assert_eq!(config.fft_size, 8192);
        assert_relative_eq!(config.sample_rate, 48000.0);
        assert_eq!(config.window, WindowFunction::BlackmanHarris);
        assert_eq!(config.max_harmonics, 16);
        assert_eq!(config.interpolation_radius, 5);
    }

    #[test]
    fn test_rejects_invalid_values() {
        let config = AnalyzerConfig {
            smoothing: 1.0,
            ..AnalyzerConfig::default()
        };
        assert!(matches!(config.validate(), Err(AnalysisError::InvalidConfig(_))));

        let config = AnalyzerConfig {
            sample_rate: 0.0,
            ..AnalyzerConfig::default()
        };
        assert!(config.validate().is_err());

        assert!(AnalyzerConfig::from_toml_str("fft_size = 0").is_err());
        assert!(AnalyzerConfig::from_toml_str("fft_size = \"big\"").is_err());
    }

    #[test]
    fn test_configs_convert_independently() {
        let cd = AnalyzerConfig::default();
        let dat = AnalyzerConfig {
            sample_rate: 48000.0,
            ..AnalyzerConfig::default()
        };
        assert_relative_eq!(cd.bin_to_freq(100.0), 100.0 / 16384.0 * 44100.0);
        assert_relative_eq!(dat.bin_to_freq(100.0), 100.0 / 16384.0 * 48000.0);
    }
}
