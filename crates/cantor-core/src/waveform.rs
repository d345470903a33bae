//! Mono 16-bit sample buffer with a seconds-based timeline cursor

use crate::error::{CantorError, Result};

/// Mono i16 PCM.
///
/// A fresh waveform has no sample rate; it adopts the rate of the first clip
/// appended to it. Silence requested before that is remembered in seconds and
/// written out once the rate is known.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Waveform {
    sample_rate: Option<u32>,
    samples: Vec<i16>,
    pending_silence: f64,
}

impl Waveform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_samples(sample_rate: u32, samples: Vec<i16>) -> Self {
        Self {
            sample_rate: Some(sample_rate),
            samples,
            pending_silence: 0.0,
        }
    }

    pub fn sample_rate(&self) -> Option<u32> {
        self.sample_rate
    }

    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Length in seconds, the timeline cursor of a track being rendered
    pub fn duration_secs(&self) -> f64 {
        match self.sample_rate {
            Some(rate) if rate > 0 => self.samples.len() as f64 / rate as f64,
            _ => self.pending_silence,
        }
    }

    /// Whether the buffer already reaches past `secs`, at sample resolution
    pub fn extends_past(&self, secs: f64) -> bool {
        match self.sample_rate {
            Some(rate) => self.samples.len() > (secs.max(0.0) * rate as f64).round() as usize,
            None => self.pending_silence > secs,
        }
    }

    /// Fix the sample rate, writing out any silence held so far
    pub fn set_sample_rate(&mut self, rate: u32) -> Result<()> {
        if rate == 0 {
            return Err(CantorError::Wav("sample rate of 0 Hz".into()));
        }
        match self.sample_rate {
            Some(current) if current != rate => {
                return Err(CantorError::SampleRateMismatch { expected: current, actual: rate });
            }
            Some(_) => {}
            None => {
                self.sample_rate = Some(rate);
                let owed = std::mem::take(&mut self.pending_silence);
                self.pad_to(owed);
            }
        }
        Ok(())
    }

    /// Extend with silence so the waveform lasts at least `secs`
    pub fn pad_to(&mut self, secs: f64) {
        match self.sample_rate {
            Some(rate) => {
                let target = (secs.max(0.0) * rate as f64).round() as usize;
                if target > self.samples.len() {
                    self.samples.resize(target, 0);
                }
            }
            None => self.pending_silence = self.pending_silence.max(secs),
        }
    }

    /// Append `clip` with every sample multiplied by `gain`
    pub fn append_scaled(&mut self, clip: &Waveform, gain: f64) -> Result<()> {
        let rate = clip
            .sample_rate
            .ok_or_else(|| CantorError::Wav("clip has no sample rate".into()))?;
        self.set_sample_rate(rate)?;
        self.samples
            .extend(clip.samples.iter().map(|&s| scale_sample(s, gain)));
        Ok(())
    }
}

/// Linear gain, rounded to the nearest value and saturating at the i16 range
pub fn scale_sample(sample: i16, gain: f64) -> i16 {
    (sample as f64 * gain)
        .round()
        .clamp(i16::MIN as f64, i16::MAX as f64) as i16
}
