//! Conversions between FFT bin indices and frequencies.
//!
//! No range checks happen here: indices may be fractional, negative or past
//! the end of a spectrum. Callers check bounds before indexing.

/// Frequency in Hz of a (possibly fractional) bin index.
pub fn bin_to_freq(index: f64, fft_size: usize, sample_rate: f64) -> f64 {
    index / fft_size as f64 * sample_rate
}

/// Bin index of a frequency in Hz.
pub fn freq_to_bin(freq: f64, fft_size: usize, sample_rate: f64) -> f64 {
    freq / sample_rate * fft_size as f64
}
