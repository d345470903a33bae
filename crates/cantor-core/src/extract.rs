//! Note extraction: pairs note-on/note-off events into finished notes

use tracing::{debug, warn};

use crate::error::Result;
use crate::event::{EventKind, Score, ScoreEvent};
use crate::note::{Note, Track};
use crate::tempo::{bpm_from_micros, time_of_ticks, DEFAULT_BPM};

const PITCH_COUNT: usize = 128;

/// Extract the notes of one track.
///
/// `tempo_bpm` is the tempo in effect when the track starts; it is updated in
/// place by every tempo event so the caller can carry it into the next track.
/// Notes are stamped with the tempo in effect at their on and off events.
pub fn extract_track(
    events: &[ScoreEvent],
    index: usize,
    resolution: u16,
    tempo_bpm: &mut f64,
) -> Result<Track> {
    let mut notes: Vec<Note> = Vec::new();
    // Open notes per pitch, innermost last
    let mut open: [Vec<usize>; PITCH_COUNT] = std::array::from_fn(|_| Vec::new());
    let mut tick: u64 = 0;

    for event in events {
        tick += event.delta as u64;

        match event.kind {
            EventKind::NoteOn { pitch, velocity } if velocity > 0 => {
                let Some(stack) = open.get_mut(pitch as usize) else {
                    debug!(track = index, pitch, tick, "ignoring note-on outside MIDI range");
                    continue;
                };
                let start_time = time_of_ticks(tick, resolution, *tempo_bpm)?;
                stack.push(notes.len());
                notes.push(Note::open(pitch, velocity, index, tick, start_time));
            }
            EventKind::NoteOn { pitch, .. } | EventKind::NoteOff { pitch, .. } => {
                let Some(note_idx) = open.get_mut(pitch as usize).and_then(Vec::pop) else {
                    debug!(track = index, pitch, tick, "ignoring note-off without open note");
                    continue;
                };
                let end_time = time_of_ticks(tick, resolution, *tempo_bpm)?;
                notes[note_idx].close(tick, end_time);
            }
            EventKind::Tempo { micros_per_beat } => {
                *tempo_bpm = bpm_from_micros(micros_per_beat)?;
                debug!(track = index, tick, bpm = *tempo_bpm, "tempo change");
            }
            EventKind::Other => {}
        }
    }

    let dangling = notes.iter().filter(|n| !n.finished).count();
    if dangling > 0 {
        warn!(track = index, dangling, "dropping notes never closed by a note-off");
        notes.retain(|n| n.finished);
    }

    let mut track = Track::new(index, notes);
    track.sort();
    Ok(track)
}

/// Extract every track of a score, dropping tracks without notes.
///
/// One tempo value is folded through the tracks in file order, starting at
/// [`DEFAULT_BPM`].
pub fn extract_score(score: &Score) -> Result<Vec<Track>> {
    let mut tempo_bpm = DEFAULT_BPM;
    let mut tracks = Vec::new();

    for (index, events) in score.tracks.iter().enumerate() {
        let track = extract_track(events, index, score.resolution, &mut tempo_bpm)?;
        if track.is_empty() {
            debug!(track = index, "track has no notes");
            continue;
        }
        debug!(track = index, notes = track.len(), "extracted track");
        tracks.push(track);
    }

    Ok(tracks)
}
