//! Frequency band restriction

use super::SpectralFrame;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RangeError {
    #[error("Frequency bounds must be finite and non-negative (got {0}, {1})")]
    InvalidBound(f64, f64),

    #[error("Lower bound {0} Hz exceeds upper bound {1} Hz")]
    Inverted(f64, f64),
}

/// Closed frequency interval [lower_hz, upper_hz]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrequencyRange {
    lower_hz: f64,
    upper_hz: f64,
}

impl FrequencyRange {
    pub fn new(lower_hz: f64, upper_hz: f64) -> Result<Self, RangeError> {
        let valid = |f: f64| f.is_finite() && f >= 0.0;
        if !valid(lower_hz) || !valid(upper_hz) {
            return Err(RangeError::InvalidBound(lower_hz, upper_hz));
        }
        if lower_hz > upper_hz {
            return Err(RangeError::Inverted(lower_hz, upper_hz));
        }

        Ok(Self { lower_hz, upper_hz })
    }

    pub fn lower_hz(&self) -> f64 {
        self.lower_hz
    }

    pub fn upper_hz(&self) -> f64 {
        self.upper_hz
    }

    /// Inclusive on both ends
    pub fn contains(&self, frequency_hz: f64) -> bool {
        self.lower_hz <= frequency_hz && frequency_hz <= self.upper_hz
    }
}

impl Default for FrequencyRange {
    /// 100-2000 Hz, the span of sung and spoken pitch with its lower harmonics
    fn default() -> Self {
        Self {
            lower_hz: 100.0,
            upper_hz: 2000.0,
        }
    }
}

/// Keep only the bins whose frequency lies in `range`, preserving order
pub fn filter_band(frame: &SpectralFrame, range: FrequencyRange) -> SpectralFrame {
    let (frequencies, magnitudes) = frame
        .frequencies
        .iter()
        .zip(frame.magnitudes.iter())
        .filter(|&(&f, _)| range.contains(f))
        .map(|(&f, &m)| (f, m))
        .unzip();

    SpectralFrame {
        frequencies,
        magnitudes,
    }
}
