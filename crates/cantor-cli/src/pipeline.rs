//! Extraction, humanization, phoneme assignment and rendering, in that order

use std::path::PathBuf;

use anyhow::{bail, Context};
use cantor_core::{
    assign_phonemes, extract_score, humanize, CantorError, PhonemeSheet, Track, VoiceRenderer,
};
use cantor_services::{load_score, write_wav, CommandSynthesizer};
use tracing::{error, info};

use crate::config::Config;

/// Tracks ready to sing, plus the indices of tracks that were left out
#[derive(Debug)]
pub struct PreparedTracks {
    pub tracks: Vec<Track>,
    pub rejected: Vec<usize>,
}

/// Load the score(s) and phonemes and bind everything into tracks
pub fn prepare(config: &Config) -> anyhow::Result<PreparedTracks> {
    let score = load_score(&config.quantized_midi)?;
    let mut tracks = extract_score(&score)
        .with_context(|| format!("failed to extract notes from {}", config.quantized_midi.display()))?;
    info!(tracks = tracks.len(), "extracted quantized score");

    if let Some(human_path) = &config.human_midi {
        let human_score = load_score(human_path)?;
        let human = extract_score(&human_score)
            .with_context(|| format!("failed to extract notes from {}", human_path.display()))?;
        humanize(&mut tracks, &human).context("failed to transfer human timing")?;
        info!(path = %human_path.display(), "applied human timing");
    }

    let text = std::fs::read_to_string(&config.phonemes)
        .with_context(|| format!("failed to read phonemes: {}", config.phonemes.display()))?;
    let sheet = PhonemeSheet::parse(&text)
        .with_context(|| format!("invalid phoneme file: {}", config.phonemes.display()))?;

    let mut ready = Vec::with_capacity(tracks.len());
    let mut rejected = Vec::new();
    for (position, mut track) in tracks.into_iter().enumerate() {
        match assign_phonemes(&mut track, sheet.track(position)) {
            Ok(()) => ready.push(track),
            Err(e @ CantorError::PhonemeCountMismatch { .. }) => {
                error!(track = track.index, "{e}");
                rejected.push(track.index);
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(PreparedTracks { tracks: ready, rejected })
}

/// Render every track to `output_dir`, returning the files written
pub fn render(config: &Config, tracks: &[Track]) -> anyhow::Result<Vec<PathBuf>> {
    std::fs::create_dir_all(&config.output_dir).with_context(|| {
        format!("failed to create output directory: {}", config.output_dir.display())
    })?;

    let synth = CommandSynthesizer::new(&config.synth.program)?.with_args(config.synth_args());
    let mut renderer = VoiceRenderer::new(synth, config.render_config())?;

    let mut written = Vec::with_capacity(tracks.len());
    for track in tracks {
        let rendered = renderer
            .render_track(track)
            .with_context(|| format!("failed to render track {}", track.index))?;
        let path = config.output_path(rendered.index);
        write_wav(&path, &rendered.waveform)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!(track = rendered.index, path = %path.display(), "wrote track");
        written.push(path);
    }

    info!(
        invocations = renderer.into_synthesizer().invocations(),
        "synthesizer runs"
    );
    Ok(written)
}

/// Full run: prepare, render what can be rendered, then fail if tracks were rejected
pub fn run(config: &Config) -> anyhow::Result<Vec<PathBuf>> {
    let prepared = prepare(config)?;
    let written = render(config, &prepared.tracks)?;
    if !prepared.rejected.is_empty() {
        bail!(
            "{} track(s) had fewer phonemes than notes and were not rendered: {:?}",
            prepared.rejected.len(),
            prepared.rejected
        );
    }
    Ok(written)
}
