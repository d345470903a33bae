//! Tick to wall-clock conversion

use crate::error::{CantorError, Result};

/// Tempo assumed until the first tempo event of a score
pub const DEFAULT_BPM: f64 = 120.0;

/// Convert an absolute tick position to seconds at a fixed tempo.
///
/// # Arguments
/// * `ticks` - Absolute position in ticks
/// * `resolution` - Ticks per quarter note, constant per file
/// * `tempo_bpm` - Tempo in effect when the position is evaluated
///
/// # Example
/// ```
/// use cantor_core::time_of_ticks;
/// let secs = time_of_ticks(960, 480, 120.0).unwrap();
/// assert!((secs - 1.0).abs() < 1e-12);
/// ```
pub fn time_of_ticks(ticks: u64, resolution: u16, tempo_bpm: f64) -> Result<f64> {
    if !tempo_bpm.is_finite() || tempo_bpm <= 0.0 {
        return Err(CantorError::InvalidTempo(tempo_bpm));
    }
    if resolution == 0 {
        return Err(CantorError::Parse("resolution of 0 ticks per beat".into()));
    }

    let secs_per_beat = 60.0 / tempo_bpm;
    let secs_per_tick = secs_per_beat / resolution as f64;
    Ok(secs_per_tick * ticks as f64)
}

/// Convert a MIDI tempo meta value (microseconds per quarter note) to BPM
pub fn bpm_from_micros(micros_per_beat: u32) -> Result<f64> {
    if micros_per_beat == 0 {
        return Err(CantorError::InvalidTempo(f64::INFINITY));
    }
    Ok(60_000_000.0 / micros_per_beat as f64)
}
