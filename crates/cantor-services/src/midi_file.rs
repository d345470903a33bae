//! Standard MIDI file loading

use std::path::Path;

use cantor_core::{CantorError, EventKind, Result, Score, ScoreEvent};
use midly::{MetaMessage, MidiMessage, Smf, Timing, TrackEventKind};
use tracing::info;

/// Read and parse a MIDI file
pub fn load_score(path: &Path) -> Result<Score> {
    let data = std::fs::read(path)
        .map_err(|e| CantorError::Parse(format!("cannot read {}: {e}", path.display())))?;
    let score = parse_score(&data)
        .map_err(|e| CantorError::Parse(format!("{}: {e}", path.display())))?;
    info!(
        path = %path.display(),
        resolution = score.resolution,
        tracks = score.tracks.len(),
        "loaded MIDI file"
    );
    Ok(score)
}

/// Parse MIDI file bytes into score events
pub fn parse_score(data: &[u8]) -> Result<Score> {
    let smf = Smf::parse(data).map_err(|e| CantorError::Parse(e.to_string()))?;

    let resolution = match smf.header.timing {
        Timing::Metrical(tpb) => tpb.as_int(),
        Timing::Timecode(..) => {
            return Err(CantorError::Parse("SMPTE timecode timing is not supported".into()));
        }
    };

    let tracks = smf
        .tracks
        .iter()
        .map(|track| {
            track
                .iter()
                .map(|event| ScoreEvent::new(event.delta.as_int(), event_kind(&event.kind)))
                .collect()
        })
        .collect();

    Ok(Score { resolution, tracks })
}

fn event_kind(kind: &TrackEventKind<'_>) -> EventKind {
    match *kind {
        TrackEventKind::Midi { message, .. } => match message {
            MidiMessage::NoteOn { key, vel } => EventKind::NoteOn {
                pitch: key.as_int(),
                velocity: vel.as_int(),
            },
            MidiMessage::NoteOff { key, vel } => EventKind::NoteOff {
                pitch: key.as_int(),
                velocity: vel.as_int(),
            },
            _ => EventKind::Other,
        },
        TrackEventKind::Meta(MetaMessage::Tempo(t)) => EventKind::Tempo {
            micros_per_beat: t.as_int(),
        },
        _ => EventKind::Other,
    }
}
