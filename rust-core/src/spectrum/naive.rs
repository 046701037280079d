//! Direct numerical Fourier integral
//!
//! Correlates the signal with a complex exponential at each candidate
//! frequency and integrates over the sample times with the trapezoidal rule.
//! Cost is O(samples × frequencies), so this suits short offline windows.

use super::band::FrequencyRange;
use super::{check_input, sweep, SpectralFrame, Transform, TransformError};
use num_complex::Complex;
use std::f64::consts::PI;

/// Spacing of the candidate frequencies in Hz
pub const SWEEP_STEP_HZ: f64 = 0.5;

/// Trapezoidal-rule Fourier integral over a frequency sweep
#[derive(Debug, Clone)]
pub struct NaiveTransform {
    freq_range: FrequencyRange,
    freq_resolution: f64,
}

impl NaiveTransform {
    /// # Arguments
    /// * `freq_range` - Candidate frequencies span `[lower, upper)`
    /// * `freq_resolution` - Stored for configuration compatibility; the sweep
    ///   always steps by `SWEEP_STEP_HZ`
    pub fn new(freq_range: FrequencyRange, freq_resolution: f64) -> Self {
        Self {
            freq_range,
            freq_resolution,
        }
    }

    pub fn freq_resolution(&self) -> f64 {
        self.freq_resolution
    }

    /// Candidate frequencies in Hz
    pub fn frequencies(&self) -> Result<Vec<f64>, TransformError> {
        sweep(
            self.freq_range.lower_hz(),
            self.freq_range.upper_hz(),
            SWEEP_STEP_HZ,
        )
    }
}

/// ∫ x(t)·e^(-2πift) dt by the trapezoidal rule
fn integrate(samples: &[f64], timestamps: &[f64], frequency: f64) -> Complex<f64> {
    let integrand = |i: usize| {
        Complex::from_polar(samples[i], -2.0 * PI * frequency * timestamps[i])
    };

    let mut total = Complex::new(0.0, 0.0);
    let mut previous = integrand(0);

    for i in 1..samples.len() {
        let current = integrand(i);
        total += (previous + current) * (0.5 * (timestamps[i] - timestamps[i - 1]));
        previous = current;
    }

    total
}

impl Transform for NaiveTransform {
    fn compute(
        &mut self,
        samples: &[f64],
        timestamps: &[f64],
    ) -> Result<SpectralFrame, TransformError> {
        check_input(samples, timestamps)?;

        if samples.is_empty() {
            return Ok(SpectralFrame::default());
        }

        let frequencies = self.frequencies()?;
        let magnitudes = frequencies
            .iter()
            .map(|&f| integrate(samples, timestamps, f).norm())
            .collect();

        Ok(SpectralFrame::new(frequencies, magnitudes))
    }
}
