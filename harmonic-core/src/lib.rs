// harmonic-core/src/lib.rs

//! Harmonic analysis of recorded samples.
//!
//! Estimates the fundamental of a sample from its magnitude spectrum and
//! follows its harmonic series with sub-bin accuracy, for up to
//! [`AnalyzerConfig::max_harmonics`] partials. The crate is headless: loading
//! samples and drawing the results belong to the host.
//!
//! ```no_run
//! use harmonic_core::{AnalyzerConfig, fft::MagnitudeTransform, harmonics};
//!
//! let config = AnalyzerConfig::default();
//! let transform = MagnitudeTransform::new(&config);
//! # let samples = vec![0.0f32; 16384];
//! let spectrum = transform.process(&samples);
//! let profile = harmonics::analyze_harmonics(&spectrum, &config);
//! println!("root: {:.2} Hz", profile.root_frequency);
//! ```

pub mod config;
pub mod convert;
pub mod error;
pub mod fft;
pub mod harmonics;
pub mod inharmonicity;
pub mod interpolate;
pub mod peak;
pub mod profile;
pub mod tuning;
pub mod worker;

pub use config::AnalyzerConfig;
pub use error::AnalysisError;
pub use profile::HarmonicProfile;

use serde::{Deserialize, Serialize};

use fft::MagnitudeTransform;
use tuning::NoteReading;

/// Everything derived from one sample frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub profile: HarmonicProfile,
    /// Nearest note to the fundamental.
    pub note: Option<NoteReading>,
    /// Inharmonicity coefficient of the resolved harmonics.
    pub inharmonicity: Option<f64>,
}

/// Runs a sample frame through the transform, the harmonic tracker and the
/// readouts built on its result.
pub fn perform_analysis(
    samples: &[f32],
    transform: &MagnitudeTransform,
    config: &AnalyzerConfig,
) -> AnalysisReport {
    let spectrum = transform.process(samples);
    let profile = harmonics::analyze_harmonics(&spectrum, config);

    let note = if profile.has_fundamental() {
        tuning::nearest_note(profile.root_frequency, config.reference_pitch)
    } else {
        None
    };
    let inharmonicity = inharmonicity::estimate_inharmonicity(&profile, config);

    AnalysisReport {
        profile,
        note,
        inharmonicity,
    }
}
