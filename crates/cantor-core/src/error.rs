//! Error types for cantor

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CantorError {
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("Invalid tempo: {0} BPM")]
    InvalidTempo(f64),
    #[error("Track {track}, onset group {group}: no human note for pitch {pitch} at tick {ticks}")]
    PitchMismatch {
        track: usize,
        group: usize,
        pitch: u8,
        ticks: u64,
    },
    #[error(
        "Track {track}, onset group {group}: human note at pitch {pitch} tick {ticks} \
         has no quantized counterpart"
    )]
    GroupPitchMismatch {
        track: usize,
        group: usize,
        pitch: u8,
        ticks: u64,
    },
    #[error("Track {track}: {quantized} quantized onset groups but {human} human onset groups")]
    GroupCountMismatch {
        track: usize,
        quantized: usize,
        human: usize,
    },
    #[error("{quantized} quantized tracks but {human} human tracks")]
    TrackCountMismatch { quantized: usize, human: usize },
    #[error("Track {track}: {notes} notes but only {phonemes} phonemes")]
    PhonemeCountMismatch {
        track: usize,
        notes: usize,
        phonemes: usize,
    },
    #[error("Track {track}, note {note}: pitch {pitch} at tick {ticks} has no phoneme")]
    UnassignedPhoneme {
        track: usize,
        note: usize,
        pitch: u8,
        ticks: u64,
    },
    #[error("Track {track}, note {note}: pitch {pitch} at tick {ticks} has a slot of {duration:.4}s")]
    DegenerateNoteDuration {
        track: usize,
        note: usize,
        pitch: u8,
        ticks: u64,
        duration: f64,
    },
    #[error(
        "Track {track}, note {note}: pitch {pitch} at tick {ticks} starts at {start:.4}s, \
         before the track position {position:.4}s"
    )]
    OverlappingNote {
        track: usize,
        note: usize,
        pitch: u8,
        ticks: u64,
        start: f64,
        position: f64,
    },
    #[error(
        "Track {track}, note {note}: pitch {pitch} at tick {ticks} could not fit {duration:.4}s \
         after {attempts} attempts (shortest clip {shortest:.4}s)"
    )]
    CannotFitDuration {
        track: usize,
        note: usize,
        pitch: u8,
        ticks: u64,
        duration: f64,
        attempts: u32,
        shortest: f64,
    },
    #[error("Synthesizer failed: {0}")]
    ExternalProcessFailure(String),
    #[error("Sample rate mismatch: track is {expected} Hz, clip is {actual} Hz")]
    SampleRateMismatch { expected: u32, actual: u32 },
    #[error("WAV error: {0}")]
    Wav(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CantorError {
    /// Whether this error belongs to a single note and may be skipped over
    pub fn is_note_local(&self) -> bool {
        matches!(
            self,
            Self::UnassignedPhoneme { .. }
                | Self::DegenerateNoteDuration { .. }
                | Self::OverlappingNote { .. }
                | Self::CannotFitDuration { .. }
                | Self::ExternalProcessFailure(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, CantorError>;
