//! Voice rendering: fits each note's syllable into its time slot
//!
//! The synthesizer is driven with increasing speed values until the clip it
//! returns is no longer than the note. There is no closed form from speed to
//! rendered length, so the search is bounded by `max_iterations`.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{CantorError, Result};
use crate::note::{Note, Track};
use crate::tuning::Tuning;
use crate::waveform::Waveform;

/// Parameters for a single synthesizer invocation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SynthRequest<'a> {
    pub text: &'a str,
    /// Target fundamental in Hz
    pub frequency: f64,
    pub speed: f64,
    pub voice: &'a str,
}

/// Anything that can turn a syllable into a clip
pub trait Synthesizer {
    fn synthesize(&mut self, request: &SynthRequest<'_>) -> Result<Waveform>;
}

impl<S: Synthesizer + ?Sized> Synthesizer for &mut S {
    fn synthesize(&mut self, request: &SynthRequest<'_>) -> Result<Waveform> {
        (**self).synthesize(request)
    }
}

/// What to do when a single note cannot be rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteErrorPolicy {
    /// Log, leave the note's slot silent, and carry on with the track
    #[default]
    Skip,
    /// Fail the whole track
    Abort,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    pub tuning: Tuning,
    /// First speed value tried for every note
    pub speed_floor: f64,
    /// Increment between attempts
    pub speed_step: f64,
    /// Attempts per note before giving up
    pub max_iterations: u32,
    /// Velocity that plays at unity gain
    pub max_velocity: u8,
    pub voice: String,
    pub on_note_error: NoteErrorPolicy,
    /// Rate used for a track in which no note produced audio
    pub fallback_sample_rate: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            tuning: Tuning::default(),
            speed_floor: 80.0,
            speed_step: 10.0,
            max_iterations: 64,
            max_velocity: 127,
            voice: "en".to_string(),
            on_note_error: NoteErrorPolicy::Skip,
            fallback_sample_rate: 22050,
        }
    }
}

impl RenderConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.speed_step.is_finite() && self.speed_step > 0.0) {
            return Err(CantorError::Config(format!("speed_step must be positive, got {}", self.speed_step)));
        }
        if !self.speed_floor.is_finite() {
            return Err(CantorError::Config("speed_floor must be finite".into()));
        }
        if self.max_iterations == 0 {
            return Err(CantorError::Config("max_iterations must be at least 1".into()));
        }
        if self.max_velocity == 0 {
            return Err(CantorError::Config("max_velocity must be at least 1".into()));
        }
        if !(self.tuning.reference_freq.is_finite() && self.tuning.reference_freq > 0.0) {
            return Err(CantorError::Config(format!(
                "reference frequency must be positive, got {}",
                self.tuning.reference_freq
            )));
        }
        if self.fallback_sample_rate == 0 {
            return Err(CantorError::Config("fallback_sample_rate must be positive".into()));
        }
        Ok(())
    }

    /// Speed of the given zero-based attempt
    pub fn speed_at(&self, attempt: u32) -> f64 {
        self.speed_floor + attempt as f64 * self.speed_step
    }
}

/// Output of rendering one track
#[derive(Debug, Clone)]
pub struct RenderedTrack {
    pub index: usize,
    pub waveform: Waveform,
    pub rendered: usize,
    pub skipped: usize,
}

pub struct VoiceRenderer<S> {
    synth: S,
    config: RenderConfig,
}

impl<S: Synthesizer> VoiceRenderer<S> {
    pub fn new(synth: S, config: RenderConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { synth, config })
    }

    pub fn into_synthesizer(self) -> S {
        self.synth
    }

    /// Render every track in order
    pub fn render_all(&mut self, tracks: &[Track]) -> Result<Vec<RenderedTrack>> {
        tracks.iter().map(|t| self.render_track(t)).collect()
    }

    /// Render one track's notes, in order, into a single waveform
    pub fn render_track(&mut self, track: &Track) -> Result<RenderedTrack> {
        let mut waveform = Waveform::new();
        let mut rendered = 0;
        let mut skipped = 0;

        for (note_idx, note) in track.notes.iter().enumerate() {
            match self.render_note(&mut waveform, track.index, note_idx, note) {
                Ok(()) => rendered += 1,
                Err(e) if e.is_note_local() && self.config.on_note_error == NoteErrorPolicy::Skip => {
                    warn!(
                        track = track.index,
                        note = note_idx,
                        pitch = note.pitch,
                        ticks = note.start_ticks,
                        "skipping note: {e}"
                    );
                    // A note under an earlier clip leaves the position where it is
                    if !matches!(e, CantorError::OverlappingNote { .. }) {
                        waveform.pad_to(note.end_time);
                    }
                    skipped += 1;
                }
                Err(e) => return Err(e),
            }
        }

        if waveform.sample_rate().is_none() {
            waveform.set_sample_rate(self.config.fallback_sample_rate)?;
        }

        info!(
            track = track.index,
            rendered,
            skipped,
            secs = waveform.duration_secs(),
            "rendered track"
        );
        Ok(RenderedTrack { index: track.index, waveform, rendered, skipped })
    }

    fn render_note(
        &mut self,
        waveform: &mut Waveform,
        track: usize,
        note_idx: usize,
        note: &Note,
    ) -> Result<()> {
        let duration = note.slot_duration();
        if duration.is_nan() || duration <= 0.0 {
            return Err(CantorError::DegenerateNoteDuration {
                track,
                note: note_idx,
                pitch: note.pitch,
                ticks: note.start_ticks,
                duration,
            });
        }
        let Some(text) = note.phoneme.as_deref() else {
            return Err(CantorError::UnassignedPhoneme {
                track,
                note: note_idx,
                pitch: note.pitch,
                ticks: note.start_ticks,
            });
        };
        if waveform.extends_past(note.start_time) {
            return Err(CantorError::OverlappingNote {
                track,
                note: note_idx,
                pitch: note.pitch,
                ticks: note.start_ticks,
                start: note.start_time,
                position: waveform.duration_secs(),
            });
        }

        let clip = self.fit_clip(track, note_idx, note, text, duration)?;

        waveform.pad_to(note.start_time);
        let slot_start = waveform.duration_secs();
        let gain = note.velocity as f64 / self.config.max_velocity as f64;
        waveform.append_scaled(&clip, gain)?;
        waveform.pad_to(slot_start + duration);
        Ok(())
    }

    /// Search upward from `speed_floor` for the first clip that fits `duration`
    fn fit_clip(
        &mut self,
        track: usize,
        note_idx: usize,
        note: &Note,
        text: &str,
        duration: f64,
    ) -> Result<Waveform> {
        let frequency = note.frequency(&self.config.tuning);
        let mut shortest = f64::INFINITY;
        let mut last_failure = None;

        for attempt in 0..self.config.max_iterations {
            let speed = self.config.speed_at(attempt);
            let request = SynthRequest { text, frequency, speed, voice: &self.config.voice };

            match self.synth.synthesize(&request) {
                Ok(clip) => {
                    last_failure = None;
                    let clip_secs = clip.duration_secs();
                    debug!(track, note = note_idx, speed, clip_secs, target = duration, "synthesized");
                    if clip_secs <= duration {
                        return Ok(clip);
                    }
                    shortest = shortest.min(clip_secs);
                }
                Err(CantorError::ExternalProcessFailure(msg)) => {
                    warn!(track, note = note_idx, speed, "synthesizer failed: {msg}");
                    last_failure = Some(msg);
                }
                Err(e) => return Err(e),
            }
        }

        if let Some(msg) = last_failure {
            return Err(CantorError::ExternalProcessFailure(msg));
        }
        Err(CantorError::CannotFitDuration {
            track,
            note: note_idx,
            pitch: note.pitch,
            ticks: note.start_ticks,
            duration,
            attempts: self.config.max_iterations,
            shortest,
        })
    }
}
