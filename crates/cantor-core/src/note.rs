//! Notes and the tracks that own them

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::tuning::Tuning;

/// One sounded pitch interval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    /// MIDI note number (0-127, 60 = middle C)
    pub pitch: u8,
    /// Velocity (0-127)
    pub velocity: u8,
    /// Index of the MIDI track the note came from
    pub track: usize,
    pub start_ticks: u64,
    pub end_ticks: u64,
    /// Start in seconds
    pub start_time: f64,
    /// End in seconds
    pub end_time: f64,
    /// Syllable sung on this note, set after extraction
    pub phoneme: Option<String>,
    /// True once a matching note-off closed the note
    pub finished: bool,
}

impl Note {
    /// Open a note at `start_ticks`; it stays unfinished until [`Note::close`]
    pub fn open(pitch: u8, velocity: u8, track: usize, start_ticks: u64, start_time: f64) -> Self {
        Self {
            pitch,
            velocity,
            track,
            start_ticks,
            end_ticks: start_ticks,
            start_time,
            end_time: start_time,
            phoneme: None,
            finished: false,
        }
    }

    pub fn close(&mut self, end_ticks: u64, end_time: f64) {
        self.end_ticks = end_ticks;
        self.end_time = end_time;
        self.finished = true;
    }

    /// Time window the rendered syllable has to fit into
    pub fn slot_duration(&self) -> f64 {
        self.end_time - self.start_time
    }

    pub fn duration_ticks(&self) -> u64 {
        self.end_ticks.saturating_sub(self.start_ticks)
    }

    pub fn frequency(&self, tuning: &Tuning) -> f64 {
        tuning.frequency(self.pitch)
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Note velocity={} pitch={} start_ticks={} end_ticks={} start_time={:.3} end_time={:.3} phoneme={}",
            self.velocity,
            self.pitch,
            self.start_ticks,
            self.end_ticks,
            self.start_time,
            self.end_time,
            self.phoneme.as_deref().unwrap_or("-"),
        )
    }
}

/// Notes of one MIDI track, sorted by start
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Index of the source track in the MIDI file
    pub index: usize,
    pub notes: Vec<Note>,
}

impl Track {
    pub fn new(index: usize, notes: Vec<Note>) -> Self {
        Self { index, notes }
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    /// Stable sort by start tick; ties keep their current order
    pub fn sort(&mut self) {
        self.notes.sort_by_key(|n| n.start_ticks);
    }

    /// End of the last-ending note in seconds
    pub fn end_time(&self) -> f64 {
        self.notes.iter().map(|n| n.end_time).fold(0.0, f64::max)
    }
}
