//! Synthetic capture device
//!
//! Generates a sine tone and delivers it in fixed-size blocks at the same
//! cadence a sound card would (`block_size / sample_rate` seconds apart).
//! Useful for exercising the capture pipeline without audio hardware.

use super::input::{AudioError, BlockCallback, CaptureBackend, InputStream, StreamParams};
use crate::worker::{StopSignal, Worker};
use std::f64::consts::PI;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Sine tone capture backend
#[derive(Debug, Clone)]
pub struct ToneBackend {
    frequency_hz: f64,
    amplitude: f64,
    block_interval: Option<Duration>,
}

impl ToneBackend {
    /// Tone at `frequency_hz` with amplitude 0.5
    pub fn new(frequency_hz: f64) -> Self {
        Self {
            frequency_hz,
            amplitude: 0.5,
            block_interval: None,
        }
    }

    pub fn with_amplitude(mut self, amplitude: f64) -> Self {
        self.amplitude = amplitude;
        self
    }

    /// Override the delay between blocks (defaults to real time)
    pub fn with_block_interval(mut self, interval: Duration) -> Self {
        self.block_interval = Some(interval);
        self
    }
}

impl CaptureBackend for ToneBackend {
    fn open(
        &self,
        params: StreamParams,
        mut callback: BlockCallback,
    ) -> Result<Box<dyn InputStream>, AudioError> {
        let playing = Arc::new(AtomicBool::new(false));
        let shutdown = StopSignal::new();

        let interval = self.block_interval.unwrap_or_else(|| {
            Duration::from_secs_f64(params.block_size as f64 / params.sample_rate.max(1) as f64)
        });
        let step = 2.0 * PI * self.frequency_hz / params.sample_rate.max(1) as f64;
        let amplitude = self.amplitude;

        let thread_playing = Arc::clone(&playing);
        let thread_shutdown = shutdown.clone();

        let worker = Worker::spawn("tone-device", move || {
            let mut block = vec![0.0f32; params.block_size];
            let mut n: u64 = 0;

            while !thread_shutdown.wait_timeout(interval) {
                if !thread_playing.load(Ordering::SeqCst) {
                    continue;
                }

                for sample in block.iter_mut() {
                    *sample = (amplitude * (step * n as f64).sin()) as f32;
                    n += 1;
                }
                callback(&block);
            }
        })
        .map_err(|e| AudioError::SpawnThread("tone-device", e.to_string()))?;

        Ok(Box::new(ToneStream {
            playing,
            shutdown,
            worker: Some(worker),
        }))
    }
}

struct ToneStream {
    playing: Arc<AtomicBool>,
    shutdown: StopSignal,
    worker: Option<Worker>,
}

impl InputStream for ToneStream {
    fn play(&self) -> Result<(), AudioError> {
        self.playing.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn pause(&self) -> Result<(), AudioError> {
        self.playing.store(false, Ordering::SeqCst);
        Ok(())
    }
}

impl Drop for ToneStream {
    fn drop(&mut self) {
        self.shutdown.set();
        if let Some(worker) = self.worker.take() {
            worker.join_timeout(Duration::from_secs(1));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;

    #[test]
    fn test_tone_delivers_fixed_size_blocks() {
        let (tx, rx) = unbounded();
        let backend = ToneBackend::new(440.0).with_block_interval(Duration::from_millis(1));

        let stream = backend
            .open(
                StreamParams {
                    sample_rate: 8000,
                    block_size: 256,
                },
                Box::new(move |data| {
                    let _ = tx.send(data.to_vec());
                }),
            )
            .unwrap();

        // Nothing arrives before play
        assert!(rx.recv_timeout(Duration::from_millis(20)).is_err());

        stream.play().unwrap();
        let first = rx.recv_timeout(Duration::from_secs(1)).unwrap();
        let second = rx.recv_timeout(Duration::from_secs(1)).unwrap();

        assert_eq!(first.len(), 256);
        assert_eq!(second.len(), 256);
        assert_eq!(first[0], 0.0);
        assert!(first.iter().all(|s| s.abs() <= 0.5 + 1e-6));

        // Phase continues across blocks
        let expected = (0.5 * (2.0 * PI * 440.0 * 256.0 / 8000.0).sin()) as f32;
        assert!((second[0] - expected).abs() < 1e-4);
    }
}
