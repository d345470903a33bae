//! Equal-tempered pitch to frequency mapping

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tuning {
    /// MIDI note number sounding at `reference_freq` (69 = A4)
    pub reference_pitch: u8,
    /// Frequency of the reference pitch in Hz
    pub reference_freq: f64,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            reference_pitch: 69,
            reference_freq: 440.0,
        }
    }
}

impl Tuning {
    pub fn new(reference_pitch: u8, reference_freq: f64) -> Self {
        Self { reference_pitch, reference_freq }
    }

    /// Frequency in Hz of a MIDI pitch
    pub fn frequency(&self, pitch: u8) -> f64 {
        let semitones = pitch as f64 - self.reference_pitch as f64;
        self.reference_freq * 2f64.powf(semitones / 12.0)
    }
}
