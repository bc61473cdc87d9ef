//! # Coarse Peak Location
//!
//! Integer-bin peak searches over a magnitude spectrum. Results are refined to
//! sub-bin accuracy by [`crate::interpolate`].
//!
//! - [`find_first_peak`]: first significant rise of a smoothed envelope,
//!   taken as the approximate fundamental
//! - [`find_approx_max`]: loudest bin in a window around a predicted harmonic

use crate::config::AnalyzerConfig;
use crate::error::AnalysisError;

/// An integer bin and its magnitude, as found by a coarse search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakCandidate {
    pub bin: usize,
    pub magnitude: f32,
}

impl PeakCandidate {
    /// Whether a sinc window of `radius` bins either side fits inside a
    /// spectrum of `len` bins.
    pub fn is_interpolatable(&self, len: usize, radius: usize) -> bool {
        window_fits(self.bin, len, radius)
    }
}

/// Whether bins `bin - radius ..= bin + radius` all exist in a spectrum of `len` bins.
pub fn window_fits(bin: usize, len: usize, radius: usize) -> bool {
    bin >= radius && bin + radius < len
}

/// One-pole low-pass envelope of a spectrum.
///
/// The first `settle_bins` values are held at zero so DC and sub-audio bins
/// never contribute.
pub fn smoothed_envelope(spectrum: &[f32], config: &AnalyzerConfig) -> Vec<f64> {
    let gain = 1.0 - config.smoothing;
    let mut y = 0.0;

    spectrum
        .iter()
        .enumerate()
        .map(|(i, &s)| {
            y = if i < config.settle_bins {
                0.0
            } else {
                config.smoothing * y + gain * s as f64
            };
            y
        })
        .collect()
}

/// Finds the approximate bin of the fundamental.
///
/// Locates the first bin where the smoothed envelope exceeds
/// `peak_threshold` times its own maximum, then climbs the raw spectrum to
/// the top of that lobe. Energy in a harmonic series is front-loaded, so the
/// first strong rise is the fundamental.
///
/// # Arguments
/// * `spectrum` - Magnitude spectrum, one value per bin
/// * `config` - Smoothing, settle and threshold parameters
///
/// # Returns
/// * `Ok(candidate)` - Integer bin at the top of the first strong lobe
///
/// # Errors
/// * `PeakNotFound` - the envelope never crosses the threshold (for example
///   an all-zero spectrum)
pub fn find_first_peak(
    spectrum: &[f32],
    config: &AnalyzerConfig,
) -> Result<PeakCandidate, AnalysisError> {
    let envelope = smoothed_envelope(spectrum, config);
    let y_max = envelope.iter().copied().fold(0.0, f64::max);
    let threshold = config.peak_threshold * y_max;

    envelope
        .iter()
        .position(|&y| y > threshold)
        .map(|crossing| climb(spectrum, crossing))
        .ok_or(AnalysisError::PeakNotFound)
}

/// Walks up from `bin` while the next bin is louder.
///
/// The envelope lags the spectrum, so the crossing sits on the rising flank
/// of the lobe, one or two bins before its top.
fn climb(spectrum: &[f32], mut bin: usize) -> PeakCandidate {
    while bin + 1 < spectrum.len() && spectrum[bin + 1] > spectrum[bin] {
        bin += 1;
    }
    PeakCandidate {
        bin,
        magnitude: spectrum[bin],
    }
}

/// Returns the loudest bin in `[center - radius, center + radius)`.
///
/// Ties go to the lowest bin.
///
/// # Arguments
/// * `spectrum` - Magnitude spectrum, one value per bin
/// * `center` - Predicted bin of the harmonic
/// * `radius` - Half-width of the search window in bins
///
/// # Returns
/// * `Ok(candidate)` - The loudest bin in the window and its magnitude
///
/// # Errors
/// * `WindowOutOfRange` - the window is empty or does not fit the spectrum
pub fn find_approx_max(
    spectrum: &[f32],
    center: usize,
    radius: usize,
) -> Result<PeakCandidate, AnalysisError> {
    let out_of_range = AnalysisError::WindowOutOfRange {
        center,
        radius,
        len: spectrum.len(),
    };

    if radius == 0 || center < radius || center + radius > spectrum.len() {
        return Err(out_of_range);
    }

    let start = center - radius;
    let mut best = PeakCandidate {
        bin: start,
        magnitude: spectrum[start],
    };
    for (offset, &magnitude) in spectrum[start..center + radius].iter().enumerate() {
        if magnitude > best.magnitude {
            best = PeakCandidate {
                bin: start + offset,
                magnitude,
            };
        }
    }

    Ok(best)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spike(len: usize, at: usize) -> Vec<f32> {
        let mut spectrum = vec![0.0; len];
        spectrum[at] = 1.0;
        spectrum
    }

    #[test]
    fn test_first_peak_all_zero() {
        let config = AnalyzerConfig::default();
        assert_eq!(
            find_first_peak(&vec![0.0; 512], &config),
            Err(AnalysisError::PeakNotFound)
        );
        assert_eq!(find_first_peak(&[], &config), Err(AnalysisError::PeakNotFound));
    }

    #[test]
    fn test_first_peak_ignores_settle_bins() {
        // Energy only inside the DC guard never registers.
        let mut spectrum = vec![0.0; 256];
        spectrum[2] = 5.0;
        spectrum[3] = 5.0;
        let config = AnalyzerConfig::default();
        assert_eq!(find_first_peak(&spectrum, &config), Err(AnalysisError::PeakNotFound));
    }

    #[test]
    fn test_first_peak_single_spike() {
        let config = AnalyzerConfig::default();
        let peak = find_first_peak(&spike(256, 50), &config).unwrap();
        assert_eq!(peak.bin, 50);
        assert_eq!(peak.magnitude, 1.0);
    }

    #[test]
    fn test_first_peak_broad_peak_is_near_center() {
        let mut spectrum = vec![0.0; 256];
        spectrum[48..53].copy_from_slice(&[0.25, 0.5, 1.0, 0.5, 0.25]);
        let config = AnalyzerConfig::default();
        let peak = find_first_peak(&spectrum, &config).unwrap();
        assert_eq!(peak.bin, 50);
    }

    #[test]
    fn test_first_peak_climbs_to_lobe_top() {
        // The envelope crosses on the flank at 38; the lobe tops out at 40.
        let mut spectrum = vec![0.0; 128];
        spectrum[36..44].copy_from_slice(&[0.05, 0.2, 0.5, 0.8, 1.0, 0.7, 0.3, 0.1]);
        let config = AnalyzerConfig::default();
        let peak = find_first_peak(&spectrum, &config).unwrap();
        assert_eq!(peak.bin, 40);
        assert_eq!(peak.magnitude, 1.0);
    }

    #[test]
    fn test_first_peak_of_windowed_tones() {
        use crate::fft::{MagnitudeTransform, WindowFunction};

        for window in [WindowFunction::Hann, WindowFunction::BlackmanHarris] {
            let config = AnalyzerConfig {
                window,
                ..AnalyzerConfig::default()
            };
            let transform = MagnitudeTransform::new(&config);
            for freq in [110.0, 220.0, 440.0] {
                let samples: Vec<f32> = (0..config.fft_size)
                    .map(|n| {
                        let t = n as f64 / config.sample_rate;
                        (2.0 * std::f64::consts::PI * freq * t).sin() as f32
                    })
                    .collect();
                let spectrum = transform.process(&samples);
                let true_bin = config.freq_to_bin(freq);
                let peak = find_first_peak(&spectrum, &config).unwrap();
                assert!(
                    (peak.bin as f64 - true_bin).abs() <= 1.0,
                    "{window:?} {freq} Hz: bin {} vs {true_bin:.3}",
                    peak.bin
                );
            }
        }
    }

    #[test]
    fn test_first_peak_prefers_lowest_strong_peak() {
        let mut spectrum = vec![0.0; 512];
        spectrum[40] = 0.8;
        spectrum[80] = 1.0;
        spectrum[120] = 0.6;
        let config = AnalyzerConfig::default();
        assert_eq!(find_first_peak(&spectrum, &config).unwrap().bin, 40);
    }

    #[test]
    fn test_envelope_holds_settle_bins_at_zero() {
        let config = AnalyzerConfig::default();
        let envelope = smoothed_envelope(&[1.0; 10], &config);
        assert!(envelope[..6].iter().all(|&y| y == 0.0));
        assert!((envelope[6] - 0.1).abs() < 1e-12);
        assert!(envelope[7] > envelope[6]);
    }

    #[test]
    fn test_approx_max_window() {
        let mut spectrum = vec![0.0; 100];
        spectrum[45] = 2.0;
        spectrum[52] = 3.0;
        spectrum[60] = 9.0; // outside [40, 60)
        let peak = find_approx_max(&spectrum, 50, 10).unwrap();
        assert_eq!(peak.bin, 52);
        assert_eq!(peak.magnitude, 3.0);
    }

    #[test]
    fn test_approx_max_ties_resolve_to_first() {
        let mut spectrum = vec![0.0; 100];
        spectrum[47] = 1.0;
        spectrum[53] = 1.0;
        assert_eq!(find_approx_max(&spectrum, 50, 5).unwrap().bin, 47);

        // A flat window returns its first bin.
        assert_eq!(find_approx_max(&vec![0.0; 100], 50, 5).unwrap().bin, 45);
    }

    #[test]
    fn test_approx_max_rejects_bad_windows() {
        let spectrum = vec![1.0; 100];
        assert!(find_approx_max(&spectrum, 50, 0).is_err());
        assert!(find_approx_max(&spectrum, 3, 5).is_err());
        assert!(find_approx_max(&spectrum, 97, 5).is_err());
        assert!(find_approx_max(&spectrum, 95, 5).is_ok());
    }

    #[test]
    fn test_candidate_interpolatable() {
        let radius = 5;
        let len = 100;
        let at = |bin| PeakCandidate { bin, magnitude: 0.0 }.is_interpolatable(len, radius);
        assert!(!at(4));
        assert!(at(5));
        assert!(at(94));
        assert!(!at(95));
    }
}
