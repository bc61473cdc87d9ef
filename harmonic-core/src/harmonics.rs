//! # Harmonic Tracking
//!
//! Walks up the harmonic series of a magnitude spectrum:
//! 1. Locate the fundamental coarsely and refine it to sub-bin accuracy
//! 2. For each harmonic, predict its bin from the current fundamental,
//!    search a window around it and refine the local maximum
//! 3. Pull the fundamental towards the frequency each harmonic implies
//! 4. Scale the harmonic magnitudes so the loudest is 1.0
//!
//! Higher harmonics pin the fundamental down more precisely, so the running
//! estimate improves as the walk proceeds.

use crate::config::AnalyzerConfig;
use crate::error::AnalysisError;
use crate::interpolate::{RefinedPeak, interpolate_peak};
use crate::peak::{find_approx_max, find_first_peak};
use crate::profile::HarmonicProfile;

/// Number of harmonics (fundamental included) tracked for a fundamental.
///
/// `min(max_harmonics, floor(nyquist / root) - 1)`, or 0 for a non-positive
/// fundamental.
pub fn harmonic_count(root_frequency: f64, config: &AnalyzerConfig) -> usize {
    if !(root_frequency > 0.0) {
        return 0;
    }
    let below_nyquist = (config.nyquist() / root_frequency).floor() as usize;
    config.max_harmonics.min(below_nyquist.saturating_sub(1))
}

/// Estimates the fundamental and harmonic series of a magnitude spectrum.
///
/// Never fails: an invalid configuration or a spectrum without a usable
/// fundamental yields [`HarmonicProfile::empty`].
///
/// A harmonic is skipped when its search window leaves the spectrum, when it
/// cannot be interpolated, or when its gain is below `harmonic_floor` times
/// the root gain. Skipped harmonics keep their slot at the predicted bin with
/// a zero magnitude, are listed in [`HarmonicProfile::skipped`] and leave the
/// running fundamental untouched, so a real partial quieter than the floor is
/// reported as silent. Set `harmonic_floor` to 0.0 to keep every partial.
///
/// # Arguments
/// * `spectrum` - Magnitude spectrum, one value per bin
/// * `config` - Transform size, sample rate and search parameters
///
/// # Returns
/// * `HarmonicProfile` - Refined fundamental, running fundamental and up to
///   `max_harmonics - 1` harmonic slots with magnitudes scaled to a maximum of 1.0
pub fn analyze_harmonics(spectrum: &[f32], config: &AnalyzerConfig) -> HarmonicProfile {
    if let Err(err) = config.validate() {
        log::warn!("{err}");
        return HarmonicProfile::empty();
    }

    let root = match find_first_peak(spectrum, config)
        .and_then(|candidate| interpolate_peak(spectrum, candidate.bin, config))
    {
        Ok(root) => root,
        Err(err) => {
            log::warn!("{err}");
            return HarmonicProfile::empty();
        }
    };

    let root_frequency = config.bin_to_freq(root.position);
    let mut profile = HarmonicProfile {
        root_frequency,
        root_gain: root.amplitude,
        tracked_frequency: root_frequency,
        ..HarmonicProfile::default()
    };
    if root_frequency == 0.0 {
        return profile;
    }

    let count = harmonic_count(root_frequency, config);
    let delta = (config.freq_to_bin(root_frequency) / config.search_divisor) as usize;
    log::debug!(
        "root {:.3} Hz at bin {:.3}, tracking {} harmonics with ±{} bin windows",
        root_frequency,
        root.position,
        count,
        delta
    );

    let mut tracked = root_frequency;
    for number in 1..count {
        let predicted = config.freq_to_bin(tracked * number as f64).round();

        match track_harmonic(spectrum, predicted, delta, root.amplitude, config) {
            Ok(peak) => {
                let implied = config.bin_to_freq(peak.position) / number as f64;
                let weight = config.tracking_weight;
                tracked = (1.0 - weight) * tracked + weight * implied;
                profile.harmonic_positions.push(peak.position);
                profile.harmonic_magnitudes.push(peak.amplitude);
            }
            Err(err) => {
                log::debug!("skipping harmonic {number} near bin {predicted}: {err}");
                profile.harmonic_positions.push(predicted);
                profile.harmonic_magnitudes.push(0.0);
                profile.skipped.push(number);
            }
        }
    }

    profile.tracked_frequency = tracked;
    normalize(&mut profile.harmonic_magnitudes);
    profile
}

/// Searches and refines one harmonic around its predicted bin.
fn track_harmonic(
    spectrum: &[f32],
    predicted: f64,
    delta: usize,
    root_gain: f64,
    config: &AnalyzerConfig,
) -> Result<RefinedPeak, AnalysisError> {
    if predicted < 0.0 {
        return Err(AnalysisError::WindowOutOfRange {
            center: 0,
            radius: delta,
            len: spectrum.len(),
        });
    }
    let candidate = find_approx_max(spectrum, predicted as usize, delta)?;
    let peak = interpolate_peak(spectrum, candidate.bin, config)?;

    if peak.amplitude < config.harmonic_floor * root_gain {
        // Nothing there: an empty slot would drag the fundamental towards noise.
        return Err(AnalysisError::PeakNotFound);
    }
    Ok(peak)
}

/// Scales values in place so the largest becomes exactly 1.0.
fn normalize(values: &mut [f64]) {
    let max = values.iter().copied().fold(0.0, f64::max);
    if max > 0.0 {
        for value in values.iter_mut() {
            *value /= max;
        }
    }
}
