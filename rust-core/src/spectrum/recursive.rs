//! Radix-2 divide-and-conquer transform evaluated per frequency
//!
//! For each swept frequency f the window is split into even- and odd-indexed
//! halves, each half is evaluated at f recursively (with twice the sample
//! spacing) and the halves are recombined with the twiddle factor
//! e^(-2πif/fs). At f = k·fs/N this reproduces DFT bin k exactly; in between
//! bins it evaluates the DTFT. Cost is O(frequencies × N).

use super::band::FrequencyRange;
use super::{check_input, sweep, SpectralFrame, Transform, TransformError};
use num_complex::Complex;
use std::f64::consts::PI;

/// Per-frequency radix-2 transform over a bin-width sweep
#[derive(Debug, Clone)]
pub struct RecursiveTransform {
    num_samples: usize,
    sample_rate: f64,
    freq_range: FrequencyRange,
}

impl RecursiveTransform {
    pub fn new(num_samples: usize, sample_rate: f64, freq_range: FrequencyRange) -> Self {
        Self {
            num_samples,
            sample_rate,
            freq_range,
        }
    }

    /// Sweep step: the bin width `sample_rate / num_samples`
    pub fn frequency_step(&self) -> f64 {
        self.sample_rate / self.num_samples as f64
    }

    /// Swept frequencies in Hz
    pub fn frequencies(&self) -> Result<Vec<f64>, TransformError> {
        sweep(
            self.freq_range.lower_hz(),
            self.freq_range.upper_hz(),
            self.frequency_step(),
        )
    }
}

/// Σ_k x[start + k·stride]·e^(-iωk) for k = 0..count
fn evaluate(samples: &[f64], start: usize, stride: usize, count: usize, omega: f64) -> Complex<f64> {
    match count {
        0 => Complex::new(0.0, 0.0),
        1 => Complex::new(samples[start], 0.0),
        _ => {
            let even = evaluate(samples, start, stride * 2, (count + 1) / 2, omega * 2.0);
            let odd = evaluate(samples, start + stride, stride * 2, count / 2, omega * 2.0);
            even + Complex::from_polar(1.0, -omega) * odd
        }
    }
}

impl Transform for RecursiveTransform {
    fn compute(
        &mut self,
        samples: &[f64],
        timestamps: &[f64],
    ) -> Result<SpectralFrame, TransformError> {
        check_input(samples, timestamps)?;

        if samples.is_empty() {
            return Ok(SpectralFrame::default());
        }
        if self.num_samples == 0 || !(self.sample_rate > 0.0) {
            return Err(TransformError::InvalidParameter(format!(
                "num_samples {} and sample_rate {} must be positive",
                self.num_samples, self.sample_rate
            )));
        }

        let frequencies = self.frequencies()?;
        let magnitudes = frequencies
            .iter()
            .map(|&f| {
                let omega = 2.0 * PI * f / self.sample_rate;
                evaluate(samples, 0, 1, samples.len(), omega).norm()
            })
            .collect();

        Ok(SpectralFrame::new(frequencies, magnitudes))
    }
}
