//! External speech synthesizer driven as a child process
//!
//! Each invocation writes one WAV into a scratch directory owned by the
//! synthesizer instance; the directory is removed when it is dropped.

use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use cantor_core::{CantorError, Result, SynthRequest, Synthesizer, Waveform};
use tempfile::TempDir;
use tracing::debug;

use crate::wav::read_wav;

/// Argument template used when none is configured
pub const DEFAULT_ARGS: &[&str] = &[
    "--voice",
    "{voice}",
    "--frequency",
    "{freq}",
    "--speed",
    "{speed}",
    "--output",
    "{out}",
    "{text}",
];

const CLIP_FILE: &str = "clip.wav";

#[derive(Debug)]
pub struct CommandSynthesizer {
    program: PathBuf,
    /// Arguments with `{text}`, `{freq}`, `{speed}`, `{voice}` and `{out}` placeholders
    args: Vec<String>,
    scratch: TempDir,
    invocations: u64,
}

impl CommandSynthesizer {
    pub fn new(program: impl Into<PathBuf>) -> Result<Self> {
        let scratch = tempfile::Builder::new().prefix("cantor-").tempdir()?;
        Ok(Self {
            program: program.into(),
            args: DEFAULT_ARGS.iter().map(|s| s.to_string()).collect(),
            scratch,
            invocations: 0,
        })
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn scratch_dir(&self) -> &Path {
        self.scratch.path()
    }

    /// Number of processes started so far
    pub fn invocations(&self) -> u64 {
        self.invocations
    }

    fn expand_args(&self, request: &SynthRequest<'_>, out: &Path) -> Vec<String> {
        let freq = format!("{:.2}", request.frequency);
        let speed = request.speed.to_string();
        let out = out.to_string_lossy();
        let values = [
            ("{text}", request.text),
            ("{freq}", freq.as_str()),
            ("{speed}", speed.as_str()),
            ("{voice}", request.voice),
            ("{out}", &*out),
        ];
        self.args.iter().map(|arg| fill_template(arg, &values)).collect()
    }
}

/// Replace placeholders in one left-to-right pass; substituted text is never rescanned
fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut filled = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(pos) = rest.find('{') {
        filled.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        match values.iter().find(|(key, _)| tail.starts_with(key)) {
            Some((key, value)) => {
                filled.push_str(value);
                rest = &tail[key.len()..];
            }
            None => {
                filled.push('{');
                rest = &tail[1..];
            }
        }
    }
    filled.push_str(rest);
    filled
}

impl Synthesizer for CommandSynthesizer {
    fn synthesize(&mut self, request: &SynthRequest<'_>) -> Result<Waveform> {
        let out = self.scratch.path().join(CLIP_FILE);
        // A stale clip must never be mistaken for this invocation's output
        match std::fs::remove_file(&out) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        let args = self.expand_args(request, &out);
        debug!(program = %self.program.display(), ?args, "invoking synthesizer");
        self.invocations += 1;

        let output = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| {
                io::Error::new(e.kind(), format!("failed to spawn {}: {e}", self.program.display()))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CantorError::ExternalProcessFailure(format!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                stderr.trim()
            )));
        }
        if !out.exists() {
            return Err(CantorError::ExternalProcessFailure(format!(
                "{} exited successfully but wrote no audio",
                self.program.display()
            )));
        }

        read_wav(&out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wav::write_wav;

    fn request() -> SynthRequest<'static> {
        SynthRequest { text: "la", frequency: 261.6256, speed: 90.0, voice: "de" }
    }

    #[test]
    fn test_default_args_expand() {
        let synth = CommandSynthesizer::new("singer").unwrap();
        let args = synth.expand_args(&request(), Path::new("/tmp/x/clip.wav"));
        assert_eq!(
            args,
            vec![
                "--voice", "de", "--frequency", "261.63", "--speed", "90", "--output",
                "/tmp/x/clip.wav", "la",
            ]
        );
    }

    #[test]
    fn test_custom_template() {
        let synth = CommandSynthesizer::new("espeak")
            .unwrap()
            .with_args(vec!["-v{voice}".into(), "-s".into(), "{speed}".into(), "{text}!".into()]);
        let args = synth.expand_args(&request(), Path::new("o.wav"));
        assert_eq!(args, vec!["-vde", "-s", "90", "la!"]);
    }

    #[test]
    fn test_placeholders_in_text_stay_literal() {
        let synth = CommandSynthesizer::new("singer").unwrap();
        let request = SynthRequest { text: "{out}{speed}{", ..request() };
        let args = synth.expand_args(&request, Path::new("/tmp/x/clip.wav"));
        assert_eq!(args.last().map(String::as_str), Some("{out}{speed}{"));
        assert_eq!(fill_template("{unknown}-{voice}", &[("{voice}", "en")]), "{unknown}-en");
    }

    #[test]
    fn test_scratch_dirs_are_private() {
        let a = CommandSynthesizer::new("x").unwrap();
        let b = CommandSynthesizer::new("x").unwrap();
        assert_ne!(a.scratch_dir(), b.scratch_dir());
        assert!(a.scratch_dir().is_dir());
    }

    #[cfg(unix)]
    #[test]
    fn test_reads_back_process_output() {
        let dir = tempfile::tempdir().unwrap();
        let fixture = dir.path().join("fixture.wav");
        write_wav(&fixture, &Waveform::from_samples(11025, vec![7; 64])).unwrap();

        let mut synth = CommandSynthesizer::new("sh").unwrap().with_args(vec![
            "-c".into(),
            "cp \"$0\" \"$1\"".into(),
            fixture.to_string_lossy().into_owned(),
            "{out}".into(),
        ]);
        let clip = synth.synthesize(&request()).unwrap();
        assert_eq!(clip.sample_rate(), Some(11025));
        assert_eq!(clip.len(), 64);
        assert_eq!(synth.invocations(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_nonzero_exit_is_process_failure() {
        let mut synth = CommandSynthesizer::new("sh")
            .unwrap()
            .with_args(vec!["-c".into(), "echo broken >&2; exit 3".into()]);
        let err = synth.synthesize(&request()).unwrap_err();
        match err {
            CantorError::ExternalProcessFailure(msg) => assert!(msg.contains("broken")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_silent_success_is_process_failure() {
        let mut synth = CommandSynthesizer::new("true").unwrap().with_args(vec![]);
        assert!(matches!(
            synth.synthesize(&request()),
            Err(CantorError::ExternalProcessFailure(_))
        ));
    }

    #[test]
    fn test_missing_program_is_io_error() {
        let mut synth = CommandSynthesizer::new("/nonexistent/cantor-singer").unwrap();
        assert!(matches!(synth.synthesize(&request()), Err(CantorError::Io(_))));
    }
}
