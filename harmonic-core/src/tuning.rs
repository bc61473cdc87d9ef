//! # Note Readout
//!
//! Maps a fundamental frequency to the nearest equal-tempered MIDI note and
//! its deviation in cents, for tuning against the analysed sample.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

const A4_MIDI: i32 = 69;

/// Names of all 128 MIDI notes, `C-1` to `G9`.
static NOTE_NAMES: Lazy<Vec<String>> = Lazy::new(|| {
    const PITCH_CLASSES: [&str; 12] = [
        "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
    ];
    (0..128)
        .map(|midi: i32| format!("{}{}", PITCH_CLASSES[(midi % 12) as usize], midi / 12 - 1))
        .collect()
});

/// The note nearest to a measured frequency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteReading {
    /// Note name, e.g. "A4" or "C#3"
    pub name: String,
    pub midi: u8,
    /// Equal-tempered frequency of the note in Hz
    pub target_frequency: f64,
    /// Deviation from the target (positive = sharp)
    pub cents: f64,
}

/// Equal-tempered frequency of a MIDI note.
pub fn note_frequency(midi: u8, reference_pitch: f64) -> f64 {
    reference_pitch * 2f64.powf((midi as i32 - A4_MIDI) as f64 / 12.0)
}

/// Deviation of `freq` from `target_freq` in cents (100 per semitone).
pub fn cents_deviation(freq: f64, target_freq: f64) -> f64 {
    1200.0 * (freq / target_freq).log2()
}

/// Finds the nearest MIDI note, or `None` outside the MIDI range.
pub fn nearest_note(freq: f64, reference_pitch: f64) -> Option<NoteReading> {
    if !(freq > 0.0 && freq.is_finite()) {
        return None;
    }

    let semitones = 12.0 * (freq / reference_pitch).log2();
    let midi = A4_MIDI + semitones.round() as i32;
    let midi = u8::try_from(midi).ok().filter(|&m| m < 128)?;

    let target_frequency = note_frequency(midi, reference_pitch);
    Some(NoteReading {
        name: NOTE_NAMES[midi as usize].clone(),
        midi,
        target_frequency,
        cents: cents_deviation(freq, target_frequency),
    })
}
