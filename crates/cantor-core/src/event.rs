//! Score events as delivered by a MIDI parser

/// What a single track event does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    NoteOn { pitch: u8, velocity: u8 },
    NoteOff { pitch: u8, velocity: u8 },
    /// Tempo change in microseconds per quarter note
    Tempo { micros_per_beat: u32 },
    Other,
}

/// A track event with its delta from the previous event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreEvent {
    pub delta: u32,
    pub kind: EventKind,
}

impl ScoreEvent {
    pub fn new(delta: u32, kind: EventKind) -> Self {
        Self { delta, kind }
    }

    pub fn note_on(delta: u32, pitch: u8, velocity: u8) -> Self {
        Self::new(delta, EventKind::NoteOn { pitch, velocity })
    }

    pub fn note_off(delta: u32, pitch: u8) -> Self {
        Self::new(delta, EventKind::NoteOff { pitch, velocity: 0 })
    }

    pub fn tempo(delta: u32, micros_per_beat: u32) -> Self {
        Self::new(delta, EventKind::Tempo { micros_per_beat })
    }
}

/// A parsed score: resolution plus per-track event lists in file order
#[derive(Debug, Clone, Default)]
pub struct Score {
    /// Ticks per quarter note
    pub resolution: u16,
    pub tracks: Vec<Vec<ScoreEvent>>,
}
