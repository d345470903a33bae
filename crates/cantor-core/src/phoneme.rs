//! Phoneme sheets and their positional binding to notes

use tracing::debug;

use crate::error::{CantorError, Result};
use crate::note::Track;

/// Token that opens the phoneme list of the next track
pub const TRACK_SENTINEL: &str = "[track]";

/// Phoneme lists, one per track, in sheet order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhonemeSheet {
    pub tracks: Vec<Vec<String>>,
}

impl PhonemeSheet {
    /// Parse a `[track]`-delimited sheet of whitespace-separated tokens.
    ///
    /// Text without any sentinel is a single track.
    ///
    /// # Example
    /// ```
    /// use cantor_core::PhonemeSheet;
    /// let sheet = PhonemeSheet::parse("[track] la li lu\n[track] do re").unwrap();
    /// assert_eq!(sheet.tracks.len(), 2);
    /// assert_eq!(sheet.tracks[1], vec!["do", "re"]);
    /// ```
    pub fn parse(text: &str) -> Result<Self> {
        if !text.split_whitespace().any(|t| t == TRACK_SENTINEL) {
            let tokens: Vec<String> = text.split_whitespace().map(str::to_string).collect();
            let tracks = if tokens.is_empty() { Vec::new() } else { vec![tokens] };
            return Ok(Self { tracks });
        }

        let mut tracks: Vec<Vec<String>> = Vec::new();
        for token in text.split_whitespace() {
            if token == TRACK_SENTINEL {
                tracks.push(Vec::new());
                continue;
            }
            let Some(current) = tracks.last_mut() else {
                return Err(CantorError::Parse(format!(
                    "phoneme '{token}' appears before the first {TRACK_SENTINEL}"
                )));
            };
            current.push(token.to_string());
        }

        Ok(Self { tracks })
    }

    pub fn track(&self, position: usize) -> &[String] {
        self.tracks.get(position).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Give the i-th note of `track` the i-th phoneme
pub fn assign_phonemes(track: &mut Track, phonemes: &[String]) -> Result<()> {
    if phonemes.len() < track.len() {
        return Err(CantorError::PhonemeCountMismatch {
            track: track.index,
            notes: track.len(),
            phonemes: phonemes.len(),
        });
    }
    if phonemes.len() > track.len() {
        debug!(
            track = track.index,
            unused = phonemes.len() - track.len(),
            "more phonemes than notes"
        );
    }

    for (note, phoneme) in track.notes.iter_mut().zip(phonemes) {
        note.phoneme = Some(phoneme.clone());
    }
    Ok(())
}

/// Bind sheet tracks to extracted tracks by position
pub fn assign_sheet(tracks: &mut [Track], sheet: &PhonemeSheet) -> Result<()> {
    for (position, track) in tracks.iter_mut().enumerate() {
        assign_phonemes(track, sheet.track(position))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::note::Note;

    fn track_of(len: usize) -> Track {
        let notes = (0..len as u64)
            .map(|i| Note::open(60, 100, 0, i * 10, 0.0))
            .collect();
        Track::new(4, notes)
    }

    fn strings(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_multiple_tracks() {
        let sheet = PhonemeSheet::parse("[track]\nka  ki\tku\n\n[track]\n[track] sa").unwrap();
        assert_eq!(sheet.tracks, vec![strings(&["ka", "ki", "ku"]), vec![], strings(&["sa"])]);
    }

    #[test]
    fn test_parse_without_sentinel() {
        let sheet = PhonemeSheet::parse("a e i o u").unwrap();
        assert_eq!(sheet.tracks, vec![strings(&["a", "e", "i", "o", "u"])]);
        assert!(PhonemeSheet::parse("  \n").unwrap().tracks.is_empty());
    }

    #[test]
    fn test_parse_rejects_leading_tokens() {
        assert!(matches!(
            PhonemeSheet::parse("oops [track] la"),
            Err(CantorError::Parse(_))
        ));
    }

    #[test]
    fn test_assign_in_order() {
        let mut track = track_of(3);
        assign_phonemes(&mut track, &strings(&["do", "re", "mi", "fa"])).unwrap();
        let got: Vec<&str> = track.notes.iter().filter_map(|n| n.phoneme.as_deref()).collect();
        assert_eq!(got, vec!["do", "re", "mi"]);
    }

    #[test]
    fn test_assign_too_few() {
        let mut track = track_of(3);
        let err = assign_phonemes(&mut track, &strings(&["do"])).unwrap_err();
        assert!(matches!(
            err,
            CantorError::PhonemeCountMismatch { track: 4, notes: 3, phonemes: 1 }
        ));
    }

    #[test]
    fn test_assign_sheet_missing_track() {
        let mut tracks = vec![track_of(1), track_of(1)];
        let sheet = PhonemeSheet::parse("[track] la").unwrap();
        assert!(matches!(
            assign_sheet(&mut tracks, &sheet),
            Err(CantorError::PhonemeCountMismatch { phonemes: 0, .. })
        ));
        assert_eq!(tracks[0].notes[0].phoneme.as_deref(), Some("la"));
    }
}
