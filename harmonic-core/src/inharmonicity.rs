use linreg::linear_regression;

use crate::config::AnalyzerConfig;
use crate::profile::HarmonicProfile;

/// Minimum number of partials for a meaningful regression.
const MIN_PARTIALS: usize = 3;

/// Estimates the inharmonicity coefficient `B` of a profile's harmonic series.
///
/// Stiff strings place partial `n` at `f_n = n f0 sqrt(1 + B n²)`, so
/// `(f_n / n)²` is linear in `n²` with slope `f0² B` and intercept `f0²`.
/// Only resolved harmonics take part.
pub fn estimate_inharmonicity(profile: &HarmonicProfile, config: &AnalyzerConfig) -> Option<f64> {
    let (xs, ys): (Vec<f64>, Vec<f64>) = profile
        .partial_frequencies(config)
        .into_iter()
        .filter(|&(_, freq)| freq > 0.0)
        .map(|(number, freq)| {
            let n = number as f64;
            (n * n, (freq / n) * (freq / n))
        })
        .unzip();

    if xs.len() < MIN_PARTIALS {
        return None;
    }

    let (slope, intercept) = linear_regression::<_, _, f64>(&xs, &ys).ok()?;
    if intercept.abs() > 1e-6 {
        Some(slope / intercept)
    } else {
        None
    }
}
