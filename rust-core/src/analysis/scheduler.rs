//! Live analysis loop
//!
//! A worker thread periodically snapshots the capture buffer, transforms the
//! window, keeps the configured band and hands the spectrum to a sink.

use super::config::{AnalyserConfig, ConfigError};
use super::sink::SpectrumSink;
use crate::audio::buffer::RollingBuffer;
use crate::audio::capture::AudioCapture;
use crate::audio::input::{AudioError, CaptureBackend};
use crate::spectrum::band::{filter_band, FrequencyRange};
use crate::spectrum::{sample_timestamps, SpectralTransform, Transform};
use crate::worker::{StopSignal, Worker};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Audio capture failed: {0}")]
    Capture(#[from] AudioError),

    #[error("Failed to spawn analysis thread: {0}")]
    SpawnThread(String),
}

/// Result of a `run` request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Started,
    /// A run was already in progress and continues unaffected
    AlreadyRunning,
}

/// What one loop iteration did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Iteration {
    Emitted,
    /// Buffer did not hold exactly one analysis window
    Underrun,
    TransformFailed,
    SinkFailed,
}

/// State owned by the analysis worker thread
pub struct AnalysisLoop {
    buffer: Arc<RollingBuffer>,
    transform: SpectralTransform,
    frequency_range: FrequencyRange,
    number_of_samples: usize,
    timestamps: Vec<f64>,
    frames_emitted: Arc<AtomicU64>,
}

impl AnalysisLoop {
    pub fn new(config: &AnalyserConfig, buffer: Arc<RollingBuffer>) -> Self {
        let number_of_samples = config.number_of_samples;

        Self {
            buffer,
            transform: config.build_transform(number_of_samples),
            frequency_range: config.frequency_range,
            number_of_samples,
            timestamps: sample_timestamps(number_of_samples, config.sample_rate as f64),
            frames_emitted: Arc::new(AtomicU64::new(0)),
        }
    }

    fn with_counter(mut self, frames_emitted: Arc<AtomicU64>) -> Self {
        self.frames_emitted = frames_emitted;
        self
    }

    /// Snapshot, transform, filter and emit once
    pub fn iterate(&mut self, sink: &mut dyn SpectrumSink) -> Iteration {
        let window = self.buffer.snapshot();

        if window.len() != self.number_of_samples {
            log::trace!(
                "Buffer holds {} of {} samples, skipping",
                window.len(),
                self.number_of_samples
            );
            return Iteration::Underrun;
        }

        let frame = match self.transform.compute(&window, &self.timestamps) {
            Ok(frame) => filter_band(&frame, self.frequency_range),
            Err(e) => {
                log::warn!("{} transform failed: {}", self.transform.name(), e);
                return Iteration::TransformFailed;
            }
        };

        match sink.update(&frame) {
            Ok(()) => {
                self.frames_emitted.fetch_add(1, Ordering::Relaxed);
                Iteration::Emitted
            }
            Err(e) => {
                log::warn!("Sink update failed: {}", e);
                Iteration::SinkFailed
            }
        }
    }

    /// Iterate until stopped
    ///
    /// With `run_once` the loop makes exactly one iteration, skipped or not,
    /// and returns after the following poll interval.
    pub fn run(
        mut self,
        mut sink: Box<dyn SpectrumSink>,
        stop: &StopSignal,
        poll_interval: Duration,
        run_once: bool,
    ) {
        while !stop.is_set() {
            let iteration = self.iterate(sink.as_mut());
            log::trace!("Analysis iteration: {:?}", iteration);

            if stop.wait_timeout(poll_interval) || run_once {
                break;
            }
        }

        sink.close();
    }
}

struct ActiveRun {
    stop: StopSignal,
    worker: Worker,
}

/// Periodic live analysis bound to one audio capture
pub struct AnalysisScheduler {
    config: AnalyserConfig,
    capture: AudioCapture,
    active: Option<ActiveRun>,
    frames_emitted: Arc<AtomicU64>,
}

impl AnalysisScheduler {
    /// Create an idle scheduler capturing from `backend`
    pub fn new(
        config: AnalyserConfig,
        backend: Box<dyn CaptureBackend>,
    ) -> Result<Self, SchedulerError> {
        config.validate()?;

        if config.buffer_size != config.number_of_samples {
            log::warn!(
                "Rolling buffer holds {} samples but the analysis window is {}; \
                 the live loop only analyses a buffer of exactly one window",
                config.buffer_size,
                config.number_of_samples
            );
        }

        let capture = AudioCapture::new(config.capture_config(), backend);

        Ok(Self {
            config,
            capture,
            active: None,
            frames_emitted: Arc::new(AtomicU64::new(0)),
        })
    }

    /// Start capture and the analysis loop, emitting spectra to `sink`
    ///
    /// If a run is in progress this does nothing and `sink` is dropped.
    pub fn run(
        &mut self,
        sink: Box<dyn SpectrumSink>,
        poll_interval: Duration,
        run_once: bool,
    ) -> Result<RunStatus, SchedulerError> {
        if self.is_running() {
            log::debug!("Analysis already running, run ignored");
            return Ok(RunStatus::AlreadyRunning);
        }
        // A finished single-shot run leaves its handles behind
        self.release_worker();

        let mut sink = sink;
        if let Err(e) = self.capture.start() {
            sink.close();
            return Err(e.into());
        }

        let stop = StopSignal::new();
        let analysis = AnalysisLoop::new(&self.config, self.capture.buffer())
            .with_counter(Arc::clone(&self.frames_emitted));

        let worker = {
            let stop = stop.clone();
            Worker::spawn("analysis", move || {
                analysis.run(sink, &stop, poll_interval, run_once)
            })
        };

        let worker = match worker {
            Ok(worker) => worker,
            Err(e) => {
                self.capture.stop();
                return Err(SchedulerError::SpawnThread(e.to_string()));
            }
        };

        log::info!(
            "Analysis started: {} transform, {}-sample window every {:?}{}",
            self.config.algorithm,
            self.config.number_of_samples,
            poll_interval,
            if run_once { " (single shot)" } else { "" }
        );

        self.active = Some(ActiveRun { stop, worker });
        Ok(RunStatus::Started)
    }

    /// Stop the loop and the capture
    ///
    /// Returns within roughly two join timeouts even if the worker is stuck;
    /// a stuck worker is detached and closes its sink when it finishes.
    pub fn stop(&mut self) {
        if self.active.is_none() && !self.capture.is_buffering() {
            log::debug!("Analysis idle, stop ignored");
            return;
        }

        self.release_worker();
        self.capture.stop();

        log::info!(
            "Analysis stopped after {} emitted frame(s)",
            self.frames_emitted()
        );
    }

    fn release_worker(&mut self) {
        if let Some(active) = self.active.take() {
            active.stop.set();
            active.worker.join_timeout(self.config.join_timeout);
        }
    }

    /// Whether the analysis worker is still looping
    pub fn is_running(&self) -> bool {
        self.active
            .as_ref()
            .map_or(false, |active| !active.worker.is_finished())
    }

    /// Frames delivered to sinks since creation
    pub fn frames_emitted(&self) -> u64 {
        self.frames_emitted.load(Ordering::Relaxed)
    }

    pub fn capture(&self) -> &AudioCapture {
        &self.capture
    }

    pub fn config(&self) -> &AnalyserConfig {
        &self.config
    }
}

impl Drop for AnalysisScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::config::Algorithm;
    use crate::analysis::sink::SinkError;
    use crate::spectrum::SpectralFrame;
    use std::f64::consts::PI;

    #[derive(Default)]
    struct RecordingSink {
        frames: Vec<SpectralFrame>,
        closed: usize,
        fail: bool,
    }

    impl SpectrumSink for RecordingSink {
        fn update(&mut self, frame: &SpectralFrame) -> Result<(), SinkError> {
            if self.fail {
                return Err(SinkError::Rejected("test".into()));
            }
            self.frames.push(frame.clone());
            Ok(())
        }

        fn close(&mut self) {
            self.closed += 1;
        }
    }

    fn config(algorithm: Algorithm) -> AnalyserConfig {
        AnalyserConfig {
            sample_rate: 8000,
            buffer_size: 1024,
            number_of_samples: 1024,
            frequency_range: FrequencyRange::new(200.0, 1000.0).unwrap(),
            algorithm,
            ..Default::default()
        }
    }

    fn sine(freq_hz: f64, sample_rate: f64, n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| (2.0 * PI * freq_hz * i as f64 / sample_rate).sin())
            .collect()
    }

    #[test]
    fn test_iterate_skips_partial_window() {
        let buffer = Arc::new(RollingBuffer::new(1024));
        buffer.append(&[0.0; 512]);

        let mut analysis = AnalysisLoop::new(&config(Algorithm::Library), buffer);
        let mut sink = RecordingSink::default();

        assert_eq!(analysis.iterate(&mut sink), Iteration::Underrun);
        assert!(sink.frames.is_empty());
    }

    #[test]
    fn test_iterate_emits_filtered_frame() {
        let buffer = Arc::new(RollingBuffer::new(1024));
        buffer.append(&sine(440.0, 8000.0, 1024));

        for algorithm in [Algorithm::Naive, Algorithm::Recursive, Algorithm::Library] {
            let config = config(algorithm);
            let mut analysis = AnalysisLoop::new(&config, Arc::clone(&buffer));
            let mut sink = RecordingSink::default();

            assert_eq!(analysis.iterate(&mut sink), Iteration::Emitted);

            let frame = &sink.frames[0];
            assert!(frame
                .frequencies
                .iter()
                .all(|&f| config.frequency_range.contains(f)));

            let (peak, _) = frame.peak().unwrap();
            assert!((peak - 440.0).abs() <= 8000.0 / 1024.0, "{}: {}", algorithm, peak);
        }
    }

    #[test]
    fn test_transform_failure_is_isolated() {
        let buffer = Arc::new(RollingBuffer::new(1024));
        let mut window = vec![0.0; 1024];
        window[7] = f64::NAN;
        buffer.append(&window);

        let mut analysis = AnalysisLoop::new(&config(Algorithm::Library), Arc::clone(&buffer));
        let mut sink = RecordingSink::default();

        assert_eq!(analysis.iterate(&mut sink), Iteration::TransformFailed);

        // Next iteration recovers once the buffer is clean
        buffer.append(&[0.0; 1024]);
        assert_eq!(analysis.iterate(&mut sink), Iteration::Emitted);
    }

    #[test]
    fn test_sink_failure_is_isolated() {
        let buffer = Arc::new(RollingBuffer::new(1024));
        buffer.append(&[0.0; 1024]);

        let mut analysis = AnalysisLoop::new(&config(Algorithm::Library), buffer);
        let mut sink = RecordingSink {
            fail: true,
            ..Default::default()
        };

        assert_eq!(analysis.iterate(&mut sink), Iteration::SinkFailed);
        sink.fail = false;
        assert_eq!(analysis.iterate(&mut sink), Iteration::Emitted);
    }

    #[test]
    fn test_run_once_stops_after_first_frame() {
        let buffer = Arc::new(RollingBuffer::new(1024));
        buffer.append(&[0.0; 1024]);

        let analysis = AnalysisLoop::new(&config(Algorithm::Library), buffer);
        let counter = Arc::clone(&analysis.frames_emitted);
        let stop = StopSignal::new();

        analysis.run(
            Box::new(RecordingSink::default()),
            &stop,
            Duration::from_millis(1),
            true,
        );

        assert_eq!(counter.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_run_once_ends_after_a_skipped_iteration() {
        let config = AnalyserConfig {
            buffer_size: 2048,
            ..config(Algorithm::Library)
        };
        let buffer = Arc::new(RollingBuffer::new(config.buffer_size));
        buffer.append(&[0.0; 2048]);

        let analysis = AnalysisLoop::new(&config, buffer);
        let counter = Arc::clone(&analysis.frames_emitted);
        let stop = StopSignal::new();

        // Returns rather than waiting for a window that never fits
        analysis.run(
            Box::new(RecordingSink::default()),
            &stop,
            Duration::from_millis(1),
            true,
        );

        assert_eq!(counter.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = AnalyserConfig {
            number_of_samples: 0,
            ..Default::default()
        };
        let result = AnalysisScheduler::new(
            config,
            Box::new(crate::audio::synthetic::ToneBackend::new(440.0)),
        );

        assert!(matches!(result, Err(SchedulerError::Config(_))));
    }
}
