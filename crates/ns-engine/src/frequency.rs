//! Note-to-frequency conversion (12-TET, A4 = 440 Hz).

/// MIDI note of the tuning reference.
const A4_NOTE: f32 = 69.0;

/// Frequency of the tuning reference in Hz.
const A4_FREQ: f32 = 440.0;

/// Frequency of a MIDI note in Hz: `440 * 2^((note - 69) / 12)`.
pub fn note_to_frequency(note: u8) -> f32 {
    A4_FREQ * semitone_ratio(note as f32 - A4_NOTE)
}

/// Playback rate ratio for a shift of `semitones`.
pub fn semitone_ratio(semitones: f32) -> f32 {
    libm::exp2f(semitones / 12.0)
}
