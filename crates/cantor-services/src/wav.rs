//! WAV reading and writing
//!
//! Everything is brought to mono 16-bit on the way in; output is always
//! mono 16-bit PCM.

use std::path::Path;

use cantor_core::{CantorError, Result, Waveform};

fn wav_error(path: &Path, e: hound::Error) -> CantorError {
    match e {
        hound::Error::IoError(io) => CantorError::Io(io),
        other => CantorError::Wav(format!("{}: {other}", path.display())),
    }
}

/// Load a WAV file as mono i16
pub fn read_wav(path: &Path) -> Result<Waveform> {
    let reader = hound::WavReader::open(path).map_err(|e| wav_error(path, e))?;
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    let raw: Vec<i16> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .into_samples::<f32>()
            .map(|s| s.map(float_to_i16))
            .collect::<std::result::Result<Vec<i16>, _>>()
            .map_err(|e| wav_error(path, e))?,
        hound::SampleFormat::Int => {
            let bits = spec.bits_per_sample;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| int_to_i16(v, bits)))
                .collect::<std::result::Result<Vec<i16>, _>>()
                .map_err(|e| wav_error(path, e))?
        }
    };

    // Mix to mono if needed
    let mono = if channels == 1 {
        raw
    } else {
        raw.chunks(channels)
            .map(|frame| {
                let sum: i32 = frame.iter().map(|&s| s as i32).sum();
                (sum / frame.len() as i32) as i16
            })
            .collect()
    };

    Ok(Waveform::from_samples(spec.sample_rate, mono))
}

/// Write a waveform as mono 16-bit PCM
pub fn write_wav(path: &Path, waveform: &Waveform) -> Result<()> {
    let sample_rate = waveform
        .sample_rate()
        .ok_or_else(|| CantorError::Wav(format!("{}: waveform has no sample rate", path.display())))?;
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec).map_err(|e| wav_error(path, e))?;
    for &sample in waveform.samples() {
        writer.write_sample(sample).map_err(|e| wav_error(path, e))?;
    }
    writer.finalize().map_err(|e| wav_error(path, e))
}

fn float_to_i16(s: f32) -> i16 {
    (s.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16
}

fn int_to_i16(v: i32, bits: u16) -> i16 {
    if bits > 16 {
        (v >> (bits - 16)) as i16
    } else {
        (v << (16 - bits)) as i16
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.wav");
        let wave = Waveform::from_samples(16000, vec![0, 1, -1, i16::MAX, i16::MIN, 1234]);

        write_wav(&path, &wave).unwrap();
        let back = read_wav(&path).unwrap();
        assert_eq!(back, wave);
    }

    #[test]
    fn test_stereo_float_is_mixed_to_mono() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 8000,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for (l, r) in [(1.0f32, 0.0f32), (-0.5, -0.5), (0.0, 0.0)] {
            writer.write_sample(l).unwrap();
            writer.write_sample(r).unwrap();
        }
        writer.finalize().unwrap();

        let wave = read_wav(&path).unwrap();
        assert_eq!(wave.sample_rate(), Some(8000));
        assert_eq!(wave.samples(), &[16383, -16384, 0]);
    }

    #[test]
    fn test_24_bit_is_narrowed() {
        assert_eq!(int_to_i16(0x7F_FF00, 24), 0x7FFF);
        assert_eq!(int_to_i16(-256, 24), -1);
        assert_eq!(int_to_i16(127, 8), 127 << 8);
    }

    #[test]
    fn test_write_requires_rate() {
        let dir = tempfile::tempdir().unwrap();
        let err = write_wav(&dir.path().join("x.wav"), &Waveform::new()).unwrap_err();
        assert!(matches!(err, CantorError::Wav(_)));
    }

    #[test]
    fn test_missing_file() {
        assert!(read_wav(Path::new("/nonexistent/cantor/clip.wav")).is_err());
    }
}
