//! Offline analysis of recorded audio
//!
//! Transforms a whole file in one pass and emits a single spectrum.

use super::config::{AnalyserConfig, ConfigError};
use super::sink::{SinkError, SpectrumSink};
use crate::audio::file::{AudioLoader, LoadError, WavLoader};
use crate::spectrum::band::filter_band;
use crate::spectrum::{sample_timestamps, SpectralFrame, Transform, TransformError};
use std::path::Path;
use std::time::Instant;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OfflineError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("Cannot analyse recording: {0}")]
    Config(#[from] ConfigError),

    #[error("Transform failed: {0}")]
    Transform(#[from] TransformError),

    #[error(transparent)]
    Sink(#[from] SinkError),
}

/// File-based pitch analysis
pub struct OfflineAnalyser {
    config: AnalyserConfig,
    loader: Box<dyn AudioLoader>,
}

impl OfflineAnalyser {
    /// Analyser reading WAV files
    pub fn new(config: AnalyserConfig) -> Self {
        Self::with_loader(config, Box::new(WavLoader))
    }

    pub fn with_loader(config: AnalyserConfig, loader: Box<dyn AudioLoader>) -> Self {
        Self { config, loader }
    }

    /// Load `path`, analyse all of it and emit the spectrum to `sink`
    pub fn analyse_file(
        &self,
        path: impl AsRef<Path>,
        sink: &mut dyn SpectrumSink,
    ) -> Result<SpectralFrame, OfflineError> {
        let start = Instant::now();
        let (samples, sample_rate) = self.loader.load(path.as_ref())?;
        let loaded = start.elapsed();

        let frame = self.analyse_samples(&samples, sample_rate, sink)?;

        log::info!(
            "Analysed {}: load {:.4} s, total {:.4} s",
            path.as_ref().display(),
            loaded.as_secs_f64(),
            start.elapsed().as_secs_f64()
        );

        Ok(frame)
    }

    /// Analyse in-memory mono samples and emit the spectrum to `sink`
    pub fn analyse_samples(
        &self,
        samples: &[f64],
        sample_rate: u32,
        sink: &mut dyn SpectrumSink,
    ) -> Result<SpectralFrame, OfflineError> {
        let start = Instant::now();

        let config = AnalyserConfig {
            sample_rate,
            ..self.config.clone()
        };
        config.validate()?;

        let timestamps = sample_timestamps(samples.len(), sample_rate as f64);
        let mut transform = config.build_transform(samples.len());

        let frame = transform.compute(samples, &timestamps)?;
        let frame = filter_band(&frame, config.frequency_range);
        let computed = start.elapsed();

        sink.update(&frame)?;

        log::info!(
            "{} transform over {} samples: computation {:.4} s, {} bins in band",
            transform.name(),
            samples.len(),
            computed.as_secs_f64(),
            frame.len()
        );

        Ok(frame)
    }
}
