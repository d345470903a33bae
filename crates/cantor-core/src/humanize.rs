//! Transfer of timing and dynamics from a human take onto quantized notes
//!
//! Both takes are split into onset groups (runs of notes sharing a start
//! tick). Groups are aligned by position, and inside a group notes are
//! matched by pitch. Any disagreement in structure is an error: guessing an
//! alignment would silently shift every later note.

use std::collections::{HashMap, HashSet};
use std::ops::Range;

use tracing::debug;

use crate::error::{CantorError, Result};
use crate::note::{Note, Track};

/// Index ranges of consecutive notes sharing a start tick.
///
/// `notes` must already be sorted by `start_ticks`.
pub fn onset_groups(notes: &[Note]) -> Vec<Range<usize>> {
    let mut groups = Vec::new();
    let mut start = 0;

    for i in 1..=notes.len() {
        if i == notes.len() || notes[i].start_ticks != notes[start].start_ticks {
            groups.push(start..i);
            start = i;
        }
    }

    groups
}

/// Overwrite timing and velocity of `quantized` with those of `human`
pub fn humanize_track(quantized: &mut Track, human: &Track) -> Result<()> {
    let q_groups = onset_groups(&quantized.notes);
    let h_groups = onset_groups(&human.notes);

    if q_groups.len() != h_groups.len() {
        return Err(CantorError::GroupCountMismatch {
            track: quantized.index,
            quantized: q_groups.len(),
            human: h_groups.len(),
        });
    }

    for (group, (q_range, h_range)) in q_groups.into_iter().zip(h_groups).enumerate() {
        let by_pitch: HashMap<u8, &Note> = human.notes[h_range.clone()]
            .iter()
            .map(|n| (n.pitch, n))
            .collect();
        let quantized_pitches: HashSet<u8> =
            quantized.notes[q_range.clone()].iter().map(|n| n.pitch).collect();

        if let Some(extra) = human.notes[h_range]
            .iter()
            .find(|n| !quantized_pitches.contains(&n.pitch))
        {
            return Err(CantorError::GroupPitchMismatch {
                track: quantized.index,
                group,
                pitch: extra.pitch,
                ticks: extra.start_ticks,
            });
        }

        for note in &mut quantized.notes[q_range] {
            let Some(source) = by_pitch.get(&note.pitch) else {
                return Err(CantorError::PitchMismatch {
                    track: quantized.index,
                    group,
                    pitch: note.pitch,
                    ticks: note.start_ticks,
                });
            };
            note.start_ticks = source.start_ticks;
            note.start_time = source.start_time;
            note.end_ticks = source.end_ticks;
            note.end_time = source.end_time;
            note.velocity = source.velocity;
        }
    }

    quantized.sort();
    debug!(track = quantized.index, notes = quantized.len(), "humanized track");
    Ok(())
}

/// Humanize every quantized track with the human track at the same position
pub fn humanize(quantized: &mut [Track], human: &[Track]) -> Result<()> {
    if quantized.len() != human.len() {
        return Err(CantorError::TrackCountMismatch {
            quantized: quantized.len(),
            human: human.len(),
        });
    }

    for (q, h) in quantized.iter_mut().zip(human) {
        humanize_track(q, h)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(pitch: u8, start: u64, end: u64, velocity: u8) -> Note {
        let mut n = Note::open(pitch, velocity, 0, start, start as f64 / 960.0);
        n.close(end, end as f64 / 960.0);
        n
    }

    #[test]
    fn test_onset_groups() {
        let notes = vec![note(60, 0, 10, 1), note(64, 0, 10, 1), note(62, 10, 20, 1), note(60, 30, 40, 1)];
        assert_eq!(onset_groups(&notes), vec![0..2, 2..3, 3..4]);
        assert!(onset_groups(&[]).is_empty());
    }

    #[test]
    fn test_single_note_transfer() {
        let mut quantized = Track::new(0, vec![note(60, 0, 480, 64)]);
        quantized.notes[0].phoneme = Some("la".into());
        let human = Track::new(0, vec![note(60, 5, 470, 100)]);

        humanize_track(&mut quantized, &human).unwrap();

        let n = &quantized.notes[0];
        assert_eq!(n.start_ticks, 5);
        assert_eq!(n.end_ticks, 470);
        assert_eq!(n.velocity, 100);
        assert_eq!(n.start_time, human.notes[0].start_time);
        assert_eq!(n.phoneme.as_deref(), Some("la"));
    }

    #[test]
    fn test_chord_matched_by_pitch() {
        let mut quantized = Track::new(0, vec![note(64, 0, 480, 80), note(60, 0, 480, 80)]);
        let human = Track::new(0, vec![note(60, 3, 450, 90), note(64, 3, 500, 70)]);

        humanize_track(&mut quantized, &human).unwrap();

        let e = quantized.notes.iter().find(|n| n.pitch == 64).unwrap();
        assert_eq!((e.end_ticks, e.velocity), (500, 70));
        let c = quantized.notes.iter().find(|n| n.pitch == 60).unwrap();
        assert_eq!((c.end_ticks, c.velocity), (450, 90));
    }

    #[test]
    fn test_pitch_mismatch() {
        let mut quantized = Track::new(2, vec![note(60, 0, 480, 80), note(61, 0, 480, 80)]);
        let human = Track::new(2, vec![note(60, 4, 480, 80)]);

        let err = humanize_track(&mut quantized, &human).unwrap_err();
        assert!(matches!(
            err,
            CantorError::PitchMismatch { track: 2, group: 0, pitch: 61, ticks: 0 }
        ));
    }

    #[test]
    fn test_extra_human_pitch_in_group() {
        let mut quantized = Track::new(1, vec![note(60, 0, 480, 80), note(62, 480, 960, 80)]);
        let human = Track::new(
            1,
            vec![note(60, 6, 470, 90), note(64, 6, 470, 90), note(62, 490, 950, 90)],
        );

        let err = humanize_track(&mut quantized, &human).unwrap_err();
        assert!(matches!(
            err,
            CantorError::GroupPitchMismatch { track: 1, group: 0, pitch: 64, ticks: 6 }
        ));
        // Nothing was copied from the rejected group
        assert_eq!(quantized.notes[0].start_ticks, 0);
    }

    #[test]
    fn test_group_count_mismatch() {
        let mut quantized = Track::new(0, vec![note(60, 0, 480, 80), note(62, 480, 960, 80)]);
        let human = Track::new(0, vec![note(60, 0, 480, 80)]);
        assert!(matches!(
            humanize_track(&mut quantized, &human),
            Err(CantorError::GroupCountMismatch { quantized: 2, human: 1, .. })
        ));
    }

    #[test]
    fn test_track_count_mismatch() {
        let mut quantized = vec![Track::new(0, vec![note(60, 0, 1, 1)])];
        assert!(matches!(
            humanize(&mut quantized, &[]),
            Err(CantorError::TrackCountMismatch { quantized: 1, human: 0 })
        ));
    }
}
