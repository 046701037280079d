//! FFT transform using realfft for real-valued signals
//!
//! Single O(N log N) pass over the whole window; the only transform cheap
//! enough for the live analysis loop.

use super::{check_input, SpectralFrame, Transform, TransformError};
use num_complex::Complex;
use realfft::{RealFftPlanner, RealToComplex};
use std::sync::Arc;

/// One-sided magnitude spectrum via a real FFT
pub struct LibraryTransform {
    /// Sample rate in Hz
    sample_rate: f64,

    /// FFT size the current plan was made for
    fft_size: usize,

    planner: RealFftPlanner<f64>,

    /// Real FFT processor
    r2c: Arc<dyn RealToComplex<f64>>,

    /// Reusable input buffer
    input_buffer: Vec<f64>,

    /// Reusable output buffer (complex spectrum)
    output_buffer: Vec<Complex<f64>>,
}

impl LibraryTransform {
    /// Create new FFT transform
    ///
    /// # Arguments
    /// * `fft_size` - Expected window length; windows of another length re-plan
    /// * `sample_rate` - Sample rate in Hz
    pub fn new(fft_size: usize, sample_rate: f64) -> Self {
        let fft_size = fft_size.max(1);
        let mut planner = RealFftPlanner::<f64>::new();
        let r2c = planner.plan_fft_forward(fft_size);
        let input_buffer = r2c.make_input_vec();
        let output_buffer = r2c.make_output_vec();

        Self {
            sample_rate,
            fft_size,
            planner,
            r2c,
            input_buffer,
            output_buffer,
        }
    }

    fn replan(&mut self, fft_size: usize) {
        log::debug!("Re-planning FFT from {} to {} points", self.fft_size, fft_size);

        self.r2c = self.planner.plan_fft_forward(fft_size);
        self.input_buffer = self.r2c.make_input_vec();
        self.output_buffer = self.r2c.make_output_vec();
        self.fft_size = fft_size;
    }

    /// Get FFT size
    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Get number of frequency bins (fft_size/2 + 1 for real FFT)
    pub fn num_bins(&self) -> usize {
        self.fft_size / 2 + 1
    }

    /// Frequency of bin k in Hz: k · sample_rate / fft_size
    pub fn bin_to_frequency(&self, bin: usize) -> f64 {
        bin as f64 * self.sample_rate / self.fft_size as f64
    }

    /// Frequency axis in Hz, DC to Nyquist
    pub fn frequency_axis(&self) -> Vec<f64> {
        (0..self.num_bins())
            .map(|bin| self.bin_to_frequency(bin))
            .collect()
    }
}

impl Transform for LibraryTransform {
    fn compute(
        &mut self,
        samples: &[f64],
        timestamps: &[f64],
    ) -> Result<SpectralFrame, TransformError> {
        check_input(samples, timestamps)?;

        if samples.is_empty() {
            return Ok(SpectralFrame::default());
        }
        if !(self.sample_rate > 0.0) {
            return Err(TransformError::InvalidParameter(format!(
                "sample_rate {} must be positive",
                self.sample_rate
            )));
        }
        if samples.len() != self.fft_size {
            self.replan(samples.len());
        }

        self.input_buffer.copy_from_slice(samples);
        self.r2c
            .process(&mut self.input_buffer, &mut self.output_buffer)
            .map_err(|e| TransformError::Fft(e.to_string()))?;

        let magnitudes = self.output_buffer.iter().map(|c| c.norm()).collect();

        Ok(SpectralFrame::new(self.frequency_axis(), magnitudes))
    }
}
