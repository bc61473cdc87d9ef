//! # Magnitude Transform
//!
//! Turns a recorded sample into the magnitude spectrum the harmonic tracker
//! reads. The tracker does not depend on this module; any transform producing
//! `fft_size / 2` magnitudes with the same bin spacing works.
//!
//! ## Steps
//! - Copy the sample into a frame of exactly `fft_size` samples, zero-padding
//!   short samples and truncating long ones
//! - Remove the DC offset of the recorded part
//! - Apply the configured window
//! - Forward FFT with RustFFT, keeping magnitudes up to Nyquist

use std::f32::consts::PI;
use std::sync::Arc;

use rustfft::{Fft, FftPlanner, num_complex::Complex};
use serde::{Deserialize, Serialize};

use crate::config::AnalyzerConfig;

/// Window applied before the transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WindowFunction {
    Hann,
    /// 4-term Blackman-Harris, lower sidelobes at the cost of a wider main lobe.
    BlackmanHarris,
    Rectangular,
}

impl WindowFunction {
    /// Window coefficients for a frame of `size` samples.
    pub fn coefficients(self, size: usize) -> Vec<f32> {
        if size < 2 {
            return vec![1.0; size];
        }
        let denom = (size - 1) as f32;
        (0..size)
            .map(|i| {
                let phase = 2.0 * PI * i as f32 / denom;
                match self {
                    WindowFunction::Hann => 0.5 * (1.0 - phase.cos()),
                    WindowFunction::BlackmanHarris => {
                        0.35875 - 0.48829 * phase.cos() + 0.14128 * (2.0 * phase).cos()
                            - 0.01168 * (3.0 * phase).cos()
                    }
                    WindowFunction::Rectangular => 1.0,
                }
            })
            .collect()
    }
}

/// Copies `samples` into a frame of `fft_size`, zero-padded or truncated.
///
/// The recorded part is centred on zero first; the padding stays at zero.
pub fn prepare_frame(samples: &[f32], fft_size: usize) -> Vec<f32> {
    let used = &samples[..samples.len().min(fft_size)];
    let mut frame = vec![0.0; fft_size];
    if used.is_empty() {
        return frame;
    }

    let avg = used.iter().sum::<f32>() / used.len() as f32;
    for (slot, &sample) in frame.iter_mut().zip(used) {
        *slot = sample - avg;
    }
    frame
}

/// A planned forward transform producing magnitude spectra.
///
/// Planning happens once; [`MagnitudeTransform::process`] takes `&self`, so one
/// transform can serve several threads.
pub struct MagnitudeTransform {
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
}

impl MagnitudeTransform {
    pub fn new(config: &AnalyzerConfig) -> Self {
        let mut planner = FftPlanner::new();
        Self {
            fft: planner.plan_fft_forward(config.fft_size),
            window: config.window.coefficients(config.fft_size),
        }
    }

    pub fn fft_size(&self) -> usize {
        self.window.len()
    }

    /// Magnitude spectrum of a sample.
    ///
    /// # Arguments
    /// * `samples` - Recorded sample, zero-padded or truncated to `fft_size`
    ///
    /// # Returns
    /// * `Vec<f32>` - `fft_size / 2` magnitudes, bin 0 at DC
    pub fn process(&self, samples: &[f32]) -> Vec<f32> {
        let size = self.fft_size();
        let frame = prepare_frame(samples, size);

        let mut buffer: Vec<Complex<f32>> = frame
            .iter()
            .zip(&self.window)
            .map(|(&sample, &w)| Complex::new(sample * w, 0.0))
            .collect();
        self.fft.process(&mut buffer);

        buffer.iter().take(size / 2).map(|c| c.norm()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn tone(freq: f32, sample_rate: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|n| (2.0 * PI * freq * n as f32 / sample_rate).sin())
            .collect()
    }

    #[test]
    fn test_window_shapes() {
        let hann = WindowFunction::Hann.coefficients(9);
        assert_abs_diff_eq!(hann[0], 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(hann[4], 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(hann[8], 0.0, epsilon = 1e-6);

        let bh = WindowFunction::BlackmanHarris.coefficients(9);
        assert_abs_diff_eq!(bh[0], 0.00006, epsilon = 1e-5);
        assert_abs_diff_eq!(bh[4], 1.0, epsilon = 1e-5);

        assert!(WindowFunction::Rectangular.coefficients(4).iter().all(|&w| w == 1.0));
        assert_eq!(WindowFunction::Hann.coefficients(1), vec![1.0]);
    }

    #[test]
    fn test_prepare_frame_pads_and_truncates() {
        let frame = prepare_frame(&[1.0, 3.0], 4);
        assert_eq!(frame, vec![-1.0, 1.0, 0.0, 0.0]);

        let frame = prepare_frame(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 3);
        assert_eq!(frame, vec![-1.0, 0.0, 1.0]);

        assert_eq!(prepare_frame(&[], 3), vec![0.0; 3]);
    }

    #[test]
    fn test_tone_peaks_at_its_bin() {
        let config = AnalyzerConfig {
            fft_size: 1024,
            sample_rate: 1024.0,
            ..AnalyzerConfig::default()
        };
        let transform = MagnitudeTransform::new(&config);
        let spectrum = transform.process(&tone(100.0, 1024.0, 1024));

        assert_eq!(spectrum.len(), 512);
        let loudest = spectrum
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(bin, _)| bin);
        assert_eq!(loudest, Some(100));
        // Hann coherent gain: N/4 for a unit sine.
        assert_abs_diff_eq!(spectrum[100], 256.0, epsilon = 2.0);
    }
}
