//! Spectral analysis
//!
//! Three interchangeable transforms turn a window of samples into a
//! `SpectralFrame`: direct numerical integration (`NaiveTransform`), a
//! per-frequency radix-2 recursion (`RecursiveTransform`) and a real FFT
//! (`LibraryTransform`).

pub mod band;
pub mod fft;
pub mod naive;
pub mod recursive;

pub use band::filter_band;
pub use fft::LibraryTransform;
pub use naive::NaiveTransform;
pub use recursive::RecursiveTransform;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransformError {
    #[error("{samples} samples but {timestamps} timestamps")]
    LengthMismatch { samples: usize, timestamps: usize },

    #[error("Non-finite sample at index {0}")]
    NonFiniteSample(usize),

    #[error("Invalid transform parameter: {0}")]
    InvalidParameter(String),

    #[error("FFT processing failed: {0}")]
    Fft(String),
}

/// Parallel frequency (Hz, ascending) and magnitude sequences
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpectralFrame {
    pub frequencies: Vec<f64>,
    pub magnitudes: Vec<f64>,
}

impl SpectralFrame {
    pub fn new(frequencies: Vec<f64>, magnitudes: Vec<f64>) -> Self {
        debug_assert_eq!(frequencies.len(), magnitudes.len());
        Self {
            frequencies,
            magnitudes,
        }
    }

    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    /// Frequency and magnitude of the strongest bin
    pub fn peak(&self) -> Option<(f64, f64)> {
        self.frequencies
            .iter()
            .copied()
            .zip(self.magnitudes.iter().copied())
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
    }
}

/// Common interface of the spectral transforms
pub trait Transform {
    /// Transform a window of samples taken at `timestamps` (seconds)
    fn compute(&mut self, samples: &[f64], timestamps: &[f64])
        -> Result<SpectralFrame, TransformError>;
}

/// Transform selected by configuration
pub enum SpectralTransform {
    Naive(NaiveTransform),
    Recursive(RecursiveTransform),
    Library(LibraryTransform),
}

impl SpectralTransform {
    pub fn name(&self) -> &'static str {
        match self {
            SpectralTransform::Naive(_) => "naive",
            SpectralTransform::Recursive(_) => "recursive",
            SpectralTransform::Library(_) => "library",
        }
    }
}

impl Transform for SpectralTransform {
    fn compute(
        &mut self,
        samples: &[f64],
        timestamps: &[f64],
    ) -> Result<SpectralFrame, TransformError> {
        match self {
            SpectralTransform::Naive(t) => t.compute(samples, timestamps),
            SpectralTransform::Recursive(t) => t.compute(samples, timestamps),
            SpectralTransform::Library(t) => t.compute(samples, timestamps),
        }
    }
}

/// Sample times `n / sample_rate` for n = 0..num_samples
pub fn sample_timestamps(num_samples: usize, sample_rate: f64) -> Vec<f64> {
    (0..num_samples).map(|n| n as f64 / sample_rate).collect()
}

/// Reject mismatched or non-finite input shared by all transforms
pub(crate) fn check_input(samples: &[f64], timestamps: &[f64]) -> Result<(), TransformError> {
    if samples.len() != timestamps.len() {
        return Err(TransformError::LengthMismatch {
            samples: samples.len(),
            timestamps: timestamps.len(),
        });
    }

    if let Some(index) = samples.iter().position(|s| !s.is_finite()) {
        return Err(TransformError::NonFiniteSample(index));
    }

    Ok(())
}

/// Most frequencies a single sweep may evaluate
pub const MAX_SWEEP_POINTS: usize = 1 << 20;

/// Frequencies `lower + i * step` below `upper`
pub(crate) fn sweep(lower: f64, upper: f64, step: f64) -> Result<Vec<f64>, TransformError> {
    if !(step > 0.0) || !(upper > lower) {
        return Ok(Vec::new());
    }

    let count = ((upper - lower) / step).ceil();
    if !(count <= MAX_SWEEP_POINTS as f64) {
        return Err(TransformError::InvalidParameter(format!(
            "sweep of {}-{} Hz in {} Hz steps exceeds {} frequencies",
            lower, upper, step, MAX_SWEEP_POINTS
        )));
    }

    Ok((0..count as usize).map(|i| lower + i as f64 * step).collect())
}
