//! cantor-core: Domain types and algorithms for turning MIDI scores into sung tracks

mod error;
pub mod event;
pub mod extract;
pub mod humanize;
mod note;
pub mod phoneme;
pub mod render;
pub mod tempo;
mod tuning;
mod waveform;

pub use error::{CantorError, Result};
pub use event::{EventKind, Score, ScoreEvent};
pub use extract::{extract_score, extract_track};
pub use humanize::{humanize, humanize_track, onset_groups};
pub use note::{Note, Track};
pub use phoneme::{assign_phonemes, assign_sheet, PhonemeSheet, TRACK_SENTINEL};
pub use render::{
    NoteErrorPolicy, RenderConfig, RenderedTrack, SynthRequest, Synthesizer, VoiceRenderer,
};
pub use tempo::{bpm_from_micros, time_of_ticks, DEFAULT_BPM};
pub use tuning::Tuning;
pub use waveform::Waveform;
