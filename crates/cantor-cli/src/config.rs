use std::path::{Path, PathBuf};

use anyhow::Context;
use cantor_core::{NoteErrorPolicy, RenderConfig, Tuning};
use cantor_services::DEFAULT_ARGS;
use serde::{Deserialize, Serialize};

/// Contents of the TOML run file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Score whose pitches and structure are sung
    pub quantized_midi: PathBuf,
    /// Human take of the same score; supplies timing and velocity when set
    #[serde(default)]
    pub human_midi: Option<PathBuf>,
    pub phonemes: PathBuf,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    pub synth: SynthConfig,
    #[serde(default)]
    pub render: RenderSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SynthConfig {
    pub program: PathBuf,
    #[serde(default)]
    pub args: Option<Vec<String>>,
    #[serde(default = "default_voice")]
    pub voice: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderSection {
    pub reference_frequency: f64,
    pub reference_pitch: u8,
    pub speed_floor: f64,
    pub speed_step: f64,
    pub max_iterations: u32,
    pub on_note_error: NoteErrorPolicy,
    pub fallback_sample_rate: u32,
}

impl Default for RenderSection {
    fn default() -> Self {
        let defaults = RenderConfig::default();
        Self {
            reference_frequency: defaults.tuning.reference_freq,
            reference_pitch: defaults.tuning.reference_pitch,
            speed_floor: defaults.speed_floor,
            speed_step: defaults.speed_step,
            max_iterations: defaults.max_iterations,
            on_note_error: defaults.on_note_error,
            fallback_sample_rate: defaults.fallback_sample_rate,
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("out")
}

fn default_voice() -> String {
    RenderConfig::default().voice
}

impl Config {
    /// Load a config file; relative paths are taken from its directory
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let mut config: Config = toml::from_str(&text)
            .with_context(|| format!("invalid config file: {}", path.display()))?;

        let base = path.parent().unwrap_or(Path::new(""));
        config.resolve_paths(base);
        config.render_config().validate()?;
        Ok(config)
    }

    fn resolve_paths(&mut self, base: &Path) {
        self.quantized_midi = base.join(&self.quantized_midi);
        self.human_midi = self.human_midi.as_ref().map(|p| base.join(p));
        self.phonemes = base.join(&self.phonemes);
        self.output_dir = base.join(&self.output_dir);
        // Bare program names are looked up on PATH
        if self.synth.program.components().count() > 1 {
            self.synth.program = base.join(&self.synth.program);
        }
    }

    pub fn render_config(&self) -> RenderConfig {
        let r = &self.render;
        RenderConfig {
            tuning: Tuning::new(r.reference_pitch, r.reference_frequency),
            speed_floor: r.speed_floor,
            speed_step: r.speed_step,
            max_iterations: r.max_iterations,
            voice: self.synth.voice.clone(),
            on_note_error: r.on_note_error,
            fallback_sample_rate: r.fallback_sample_rate,
            ..RenderConfig::default()
        }
    }

    pub fn synth_args(&self) -> Vec<String> {
        match &self.synth.args {
            Some(args) => args.clone(),
            None => DEFAULT_ARGS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Output WAV for a track index
    pub fn output_path(&self, track_index: usize) -> PathBuf {
        self.output_dir.join(format!("track_{track_index}.wav"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, text: &str) -> PathBuf {
        let path = dir.join("cantor.toml");
        std::fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            r#"
quantized_midi = "song.mid"
phonemes = "lyrics.txt"

[synth]
program = "singer"
"#,
        );
        let config = Config::load(&path).unwrap();

        assert_eq!(config.quantized_midi, dir.path().join("song.mid"));
        assert_eq!(config.output_dir, dir.path().join("out"));
        assert!(config.human_midi.is_none());
        assert_eq!(config.synth.program, PathBuf::from("singer"));
        assert_eq!(config.render_config(), RenderConfig::default());
        assert_eq!(config.synth_args().len(), DEFAULT_ARGS.len());
        assert_eq!(config.output_path(3), dir.path().join("out").join("track_3.wav"));
    }

    #[test]
    fn test_full_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            r#"
quantized_midi = "q.mid"
human_midi = "h.mid"
phonemes = "p.txt"
output_dir = "/abs/out"

[synth]
program = "bin/singer"
args = ["{text}", "{out}"]
voice = "ja"

[render]
reference_frequency = 432.0
speed_step = 5.0
max_iterations = 10
on_note_error = "abort"
"#,
        );
        let config = Config::load(&path).unwrap();
        let render = config.render_config();

        assert_eq!(config.human_midi, Some(dir.path().join("h.mid")));
        assert_eq!(config.output_dir, PathBuf::from("/abs/out"));
        assert_eq!(config.synth.program, dir.path().join("bin/singer"));
        assert_eq!(config.synth_args(), vec!["{text}", "{out}"]);
        assert_eq!(render.tuning.reference_freq, 432.0);
        assert_eq!(render.tuning.reference_pitch, 69);
        assert_eq!(render.speed_step, 5.0);
        assert_eq!(render.max_iterations, 10);
        assert_eq!(render.voice, "ja");
        assert_eq!(render.on_note_error, NoteErrorPolicy::Abort);
    }

    #[test]
    fn test_rejects_unknown_keys_and_bad_values() {
        let dir = tempfile::tempdir().unwrap();
        let typo = write(
            dir.path(),
            "quantized_midi = \"q.mid\"\nphonemes = \"p\"\nspeed = 3\n[synth]\nprogram = \"s\"\n",
        );
        assert!(Config::load(&typo).is_err());

        let bad_step = write(
            dir.path(),
            "quantized_midi = \"q.mid\"\nphonemes = \"p\"\n[synth]\nprogram = \"s\"\n[render]\nspeed_step = 0.0\n",
        );
        assert!(Config::load(&bad_step).is_err());
    }
}
