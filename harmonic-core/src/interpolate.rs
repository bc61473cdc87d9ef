//! # Sub-Bin Peak Interpolation
//!
//! A spectrum only resolves `sample_rate / fft_size` Hz per bin. To follow
//! harmonics that fall between bins, the magnitudes around a coarse peak are
//! treated as samples of a band-limited curve and rebuilt with a windowed
//! sinc sum, which is then scanned for its maximum.

use std::f64::consts::PI;

use crate::config::AnalyzerConfig;
use crate::error::AnalysisError;
use crate::peak::window_fits;

/// Normalized sinc, `sin(πx) / (πx)` with `sinc(0) = 1`.
pub fn sinc(x: f64) -> f64 {
    if x == 0.0 {
        return 1.0;
    }
    let px = PI * x;
    px.sin() / px
}

/// A continuous local maximum: fractional bin position and its amplitude.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RefinedPeak {
    pub position: f64,
    pub amplitude: f64,
}

/// Refines an approximate peak bin to sub-bin accuracy.
///
/// The `2 * interpolation_radius + 1` magnitudes centred on `approx_bin` each
/// contribute a sinc lobe; the reconstruction is sampled every
/// `interpolation_step` over `[approx_bin - span, approx_bin + span)` and the
/// first position reaching the maximum is returned.
///
/// # Arguments
/// * `spectrum` - Magnitude spectrum, one value per bin
/// * `approx_bin` - Integer bin of the coarse peak
/// * `config` - Window radius, scan span and scan step
///
/// # Returns
/// * `Ok(peak)` - Fractional position and amplitude of the local maximum
///
/// # Errors
/// * `InvalidConfig` - the scan step or span is not a positive finite number
/// * `OutOfRange` - the window would read past either end of the spectrum
pub fn interpolate_peak(
    spectrum: &[f32],
    approx_bin: usize,
    config: &AnalyzerConfig,
) -> Result<RefinedPeak, AnalysisError> {
    let (span, step) = (config.interpolation_span, config.interpolation_step);
    if !(span.is_finite() && span > 0.0 && step.is_finite() && step > 0.0) {
        return Err(AnalysisError::InvalidConfig(format!(
            "interpolation span {span} and step {step} must be positive"
        )));
    }

    let radius = config.interpolation_radius;
    if !window_fits(approx_bin, spectrum.len(), radius) {
        return Err(AnalysisError::OutOfRange {
            bin: approx_bin,
            len: spectrum.len(),
        });
    }

    let window: Vec<(f64, f64)> = (approx_bin - radius..=approx_bin + radius)
        .map(|bin| (bin as f64, spectrum[bin] as f64))
        .collect();

    let reconstruct = |position: f64| -> f64 {
        window
            .iter()
            .map(|&(bin, magnitude)| magnitude * sinc(position - bin))
            .sum()
    };

    let start = approx_bin as f64 - span;
    let steps = (2.0 * span / step).ceil() as usize;
    let positions = (0..steps).map(|k| start + k as f64 * step);

    match scan_maximum(positions, reconstruct, approx_bin) {
        Ok(peak) => Ok(peak),
        Err(err) => {
            // Only reachable when the reconstruction is NaN everywhere.
            log::warn!("{err}");
            Ok(RefinedPeak {
                position: approx_bin as f64,
                amplitude: spectrum[approx_bin] as f64,
            })
        }
    }
}

/// Evaluates `f` at each position and keeps the first strict maximum.
fn scan_maximum(
    positions: impl Iterator<Item = f64>,
    f: impl Fn(f64) -> f64,
    bin: usize,
) -> Result<RefinedPeak, AnalysisError> {
    let mut best: Option<RefinedPeak> = None;

    for position in positions {
        let amplitude = f(position);
        let better = match best {
            Some(peak) => amplitude > peak.amplitude,
            None => !amplitude.is_nan(),
        };
        if better {
            best = Some(RefinedPeak { position, amplitude });
        }
    }

    best.ok_or(AnalysisError::NoArgmax { bin })
}
