//! Analyser configuration

use crate::audio::capture::CaptureConfig;
use crate::spectrum::band::{FrequencyRange, RangeError};
use crate::spectrum::{LibraryTransform, NaiveTransform, RecursiveTransform, SpectralTransform};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Invalid frequency range: {0}")]
    Range(#[from] RangeError),

    #[error("{0} must be non-zero")]
    Zero(&'static str),

    #[error("Upper bound {upper_hz} Hz is above the Nyquist frequency {nyquist_hz} Hz")]
    AboveNyquist { upper_hz: f64, nyquist_hz: f64 },

    #[error("Unknown algorithm '{0}' (expected naive, recursive or library)")]
    UnknownAlgorithm(String),
}

/// Spectral transform selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Algorithm {
    /// Trapezoidal Fourier integral over a 0.5 Hz sweep
    Naive,
    /// Per-frequency radix-2 recursion over a bin-width sweep
    Recursive,
    /// Real FFT over the whole window
    #[default]
    Library,
}

impl FromStr for Algorithm {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "naive" => Ok(Algorithm::Naive),
            "recursive" => Ok(Algorithm::Recursive),
            "library" | "fft" => Ok(Algorithm::Library),
            other => Err(ConfigError::UnknownAlgorithm(other.to_string())),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Algorithm::Naive => "naive",
            Algorithm::Recursive => "recursive",
            Algorithm::Library => "library",
        };
        f.write_str(name)
    }
}

/// Analyser configuration
///
/// Fixed once an analyser is built; to change it, stop and rebuild.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyserConfig {
    /// Sample rate in Hz (default: 44100)
    pub sample_rate: u32,

    /// Rolling buffer capacity in samples (default: 4096)
    /// The live loop only analyses a full buffer, so keep this equal to `number_of_samples`
    pub buffer_size: usize,

    /// Samples per capture callback (default: 1024)
    pub blocksize: usize,

    /// Capture queue capacity in blocks (default: 32)
    pub queue_maxsize: usize,

    /// Delay between analysis iterations (default: 100 ms)
    pub poll_interval: Duration,

    /// Band kept in emitted spectra (default: 100-2000 Hz)
    pub frequency_range: FrequencyRange,

    /// Analysis window length in samples (default: 4096)
    pub number_of_samples: usize,

    /// Transform used by the analysers (default: Library)
    pub algorithm: Algorithm,

    /// Carried into `NaiveTransform` but not consulted; its sweep step is fixed
    pub freq_resolution: f64,

    /// Capture drain thread pop timeout (default: 50 ms)
    pub drain_timeout: Duration,

    /// Upper bound on every thread join (default: 2 s)
    pub join_timeout: Duration,
}

impl Default for AnalyserConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            buffer_size: 4096,
            blocksize: 1024,
            queue_maxsize: 32,
            poll_interval: Duration::from_millis(100),
            frequency_range: FrequencyRange::default(),
            number_of_samples: 4096,
            algorithm: Algorithm::Library,
            freq_resolution: 0.05,
            drain_timeout: Duration::from_millis(50),
            join_timeout: Duration::from_secs(2),
        }
    }
}

impl AnalyserConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let sizes = [
            ("sample_rate", self.sample_rate as usize),
            ("buffer_size", self.buffer_size),
            ("blocksize", self.blocksize),
            ("queue_maxsize", self.queue_maxsize),
            ("number_of_samples", self.number_of_samples),
        ];
        if let Some((name, _)) = sizes.iter().find(|(_, value)| *value == 0) {
            return Err(ConfigError::Zero(*name));
        }

        if self.poll_interval.is_zero() {
            return Err(ConfigError::Zero("poll_interval"));
        }

        // Re-run the range checks in case the fields were assembled by hand
        let range = FrequencyRange::new(
            self.frequency_range.lower_hz(),
            self.frequency_range.upper_hz(),
        )?;

        let nyquist_hz = self.sample_rate as f64 / 2.0;
        if range.upper_hz() > nyquist_hz {
            return Err(ConfigError::AboveNyquist {
                upper_hz: range.upper_hz(),
                nyquist_hz,
            });
        }

        Ok(())
    }

    /// Capture settings derived from this configuration
    pub fn capture_config(&self) -> CaptureConfig {
        CaptureConfig {
            sample_rate: self.sample_rate,
            buffer_size: self.buffer_size,
            blocksize: self.blocksize,
            queue_maxsize: self.queue_maxsize,
            drain_timeout: self.drain_timeout,
            join_timeout: self.join_timeout,
        }
    }

    /// Build the selected transform for windows of `num_samples`
    pub fn build_transform(&self, num_samples: usize) -> SpectralTransform {
        let sample_rate = self.sample_rate as f64;

        match self.algorithm {
            Algorithm::Naive => SpectralTransform::Naive(NaiveTransform::new(
                self.frequency_range,
                self.freq_resolution,
            )),
            Algorithm::Recursive => SpectralTransform::Recursive(RecursiveTransform::new(
                num_samples,
                sample_rate,
                self.frequency_range,
            )),
            Algorithm::Library => {
                SpectralTransform::Library(LibraryTransform::new(num_samples, sample_rate))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = AnalyserConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.buffer_size, config.number_of_samples);
    }

    #[test]
    fn test_zero_sizes_rejected() {
        let config = AnalyserConfig {
            queue_maxsize: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::Zero("queue_maxsize")));

        let config = AnalyserConfig {
            poll_interval: Duration::ZERO,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::Zero("poll_interval")));
    }

    #[test]
    fn test_band_above_nyquist_rejected() {
        let config = AnalyserConfig {
            frequency_range: FrequencyRange::new(0.0, 1e18).unwrap(),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::AboveNyquist { .. })
        ));

        // Exactly Nyquist is allowed
        let config = AnalyserConfig {
            sample_rate: 8000,
            frequency_range: FrequencyRange::new(100.0, 4000.0).unwrap(),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_algorithm_from_str() {
        assert_eq!("naive".parse::<Algorithm>(), Ok(Algorithm::Naive));
        assert_eq!("Recursive".parse::<Algorithm>(), Ok(Algorithm::Recursive));
        assert_eq!("fft".parse::<Algorithm>(), Ok(Algorithm::Library));
        assert!("wavelet".parse::<Algorithm>().is_err());
        assert_eq!(Algorithm::Naive.to_string(), "naive");
    }

    #[test]
    fn test_build_transform_matches_algorithm() {
        for algorithm in [Algorithm::Naive, Algorithm::Recursive, Algorithm::Library] {
            let config = AnalyserConfig {
                algorithm,
                ..Default::default()
            };
            let transform = config.build_transform(config.number_of_samples);
            assert_eq!(transform.name(), algorithm.to_string());
        }
    }

    #[test]
    fn test_capture_config_carries_sizes() {
        let config = AnalyserConfig {
            buffer_size: 2048,
            blocksize: 256,
            ..Default::default()
        };
        let capture = config.capture_config();

        assert_eq!(capture.buffer_size, 2048);
        assert_eq!(capture.blocksize, 256);
        assert_eq!(capture.sample_rate, 44100);
    }
}
