//! Audio file loading
//!
//! Decodes WAV files with hound into mono f64 samples.

use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: hound::Error,
    },

    #[error("{0} contains no samples")]
    Empty(PathBuf),
}

/// File-loading capability: decoded mono samples and their sample rate
pub trait AudioLoader {
    fn load(&self, path: &Path) -> Result<(Vec<f64>, u32), LoadError>;
}

/// Loads WAV files (integer or float PCM, any channel count)
#[derive(Debug, Clone, Copy, Default)]
pub struct WavLoader;

impl AudioLoader for WavLoader {
    fn load(&self, path: &Path) -> Result<(Vec<f64>, u32), LoadError> {
        load_file(path)
    }
}

/// Load a WAV file, averaging channels down to mono
pub fn load_file(path: impl AsRef<Path>) -> Result<(Vec<f64>, u32), LoadError> {
    let path = path.as_ref();
    let read_error = |source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = hound::WavReader::open(path).map_err(read_error)?;
    let spec = reader.spec();

    let interleaved: Vec<f64> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .map(|s| s.map(|s| s as f64))
            .collect::<Result<_, _>>()
            .map_err(read_error)?,
        hound::SampleFormat::Int => {
            let full_scale = (1i64 << (spec.bits_per_sample - 1)) as f64;
            reader
                .samples::<i32>()
                .map(|s| s.map(|s| s as f64 / full_scale))
                .collect::<Result<_, _>>()
                .map_err(read_error)?
        }
    };

    if interleaved.is_empty() {
        return Err(LoadError::Empty(path.to_path_buf()));
    }

    let channels = spec.channels.max(1) as usize;
    let samples = if channels == 1 {
        interleaved
    } else {
        interleaved
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f64>() / frame.len() as f64)
            .collect()
    };

    log::debug!(
        "Loaded {}: {} samples at {} Hz ({} channel(s))",
        path.display(),
        samples.len(),
        spec.sample_rate,
        channels
    );

    Ok((samples, spec.sample_rate))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_wav(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("pitch-analyser-{}-{}.wav", name, std::process::id()))
    }

    #[test]
    fn test_load_stereo_int_downmixes() {
        let path = temp_wav("stereo");
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 22050,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for _ in 0..100 {
            writer.write_sample(16384i16).unwrap(); // 0.5
            writer.write_sample(0i16).unwrap();
        }
        writer.finalize().unwrap();

        let (samples, sample_rate) = load_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(sample_rate, 22050);
        assert_eq!(samples.len(), 100);
        assert!(samples.iter().all(|&s| (s - 0.25).abs() < 1e-9));
    }

    #[test]
    fn test_load_mono_float() {
        let path = temp_wav("float");
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 8000,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };

        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for i in 0..10 {
            writer.write_sample(i as f32 * 0.1).unwrap();
        }
        writer.finalize().unwrap();

        let (samples, sample_rate) = WavLoader.load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(sample_rate, 8000);
        assert_eq!(samples.len(), 10);
        assert!((samples[3] - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_missing_file() {
        let result = load_file("/nonexistent/pitch-analyser/missing.wav");
        assert!(matches!(result, Err(LoadError::Read { .. })));
    }
}
