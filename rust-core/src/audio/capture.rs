//! Live audio capture into a rolling buffer
//!
//! The device callback copies each block into a `BlockQueue` without
//! blocking; a drain thread empties the queue into the `RollingBuffer`.

use super::buffer::RollingBuffer;
use super::input::{AudioError, CaptureBackend, InputStream, StreamParams};
use super::queue::{AudioBlock, BlockQueue};
use crate::worker::{StopSignal, Worker};
use std::sync::Arc;
use std::time::Duration;

/// Capture settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptureConfig {
    /// Sample rate in Hz
    pub sample_rate: u32,

    /// Rolling buffer capacity in samples
    pub buffer_size: usize,

    /// Samples per device callback
    pub blocksize: usize,

    /// Queue capacity in blocks
    pub queue_maxsize: usize,

    /// How long the drain thread waits on an empty queue before re-checking the stop signal
    pub drain_timeout: Duration,

    /// Upper bound on the wait for the drain thread in `stop`
    pub join_timeout: Duration,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            buffer_size: 4096,
            blocksize: 1024,
            queue_maxsize: 32,
            drain_timeout: Duration::from_millis(50),
            join_timeout: Duration::from_secs(2),
        }
    }
}

/// Resources that exist only while buffering
struct ActiveCapture {
    stream: Box<dyn InputStream>,
    queue: BlockQueue,
    stop: StopSignal,
    drain: Worker,
}

/// Audio capture: device callback → block queue → rolling buffer
pub struct AudioCapture {
    config: CaptureConfig,
    backend: Box<dyn CaptureBackend>,
    buffer: Arc<RollingBuffer>,
    active: Option<ActiveCapture>,
    dropped_blocks: u64,
}

impl AudioCapture {
    /// Create an idle capture reading from `backend`
    ///
    /// # Panics
    /// If `config.buffer_size` is zero
    pub fn new(config: CaptureConfig, backend: Box<dyn CaptureBackend>) -> Self {
        Self {
            buffer: Arc::new(RollingBuffer::new(config.buffer_size)),
            config,
            backend,
            active: None,
            dropped_blocks: 0,
        }
    }

    /// Start buffering
    ///
    /// Does nothing if already buffering. On failure no thread is left
    /// running and the capture stays idle.
    pub fn start(&mut self) -> Result<(), AudioError> {
        if self.active.is_some() {
            log::debug!("Capture already buffering, start ignored");
            return Ok(());
        }

        let queue = BlockQueue::new(self.config.queue_maxsize);
        let stop = StopSignal::new();

        let drain = {
            let queue = queue.clone();
            let stop = stop.clone();
            let buffer = Arc::clone(&self.buffer);
            let timeout = self.config.drain_timeout;

            Worker::spawn("capture-drain", move || drain_loop(&queue, &buffer, &stop, timeout))
                .map_err(|e| AudioError::SpawnThread("capture-drain", e.to_string()))?
        };

        let producer = queue.clone();
        let params = StreamParams {
            sample_rate: self.config.sample_rate,
            block_size: self.config.blocksize,
        };

        let stream = self
            .backend
            .open(
                params,
                Box::new(move |data: &[f32]| {
                    producer.push(AudioBlock::from_f32(data));
                }),
            )
            .and_then(|stream| {
                stream.play()?;
                Ok(stream)
            });

        let stream = match stream {
            Ok(stream) => stream,
            Err(e) => {
                stop.set();
                drain.join_timeout(self.config.join_timeout);
                return Err(e);
            }
        };

        log::info!(
            "Capture started: {} Hz, {}-sample blocks, buffer {} samples",
            self.config.sample_rate,
            self.config.blocksize,
            self.config.buffer_size
        );

        self.active = Some(ActiveCapture {
            stream,
            queue,
            stop,
            drain,
        });

        Ok(())
    }

    /// Stop buffering, keeping the buffer contents
    ///
    /// Does nothing if idle. Returns after at most `join_timeout`; a drain
    /// thread that has not finished by then is left to exit on its own.
    pub fn stop(&mut self) {
        let Some(active) = self.active.take() else {
            log::debug!("Capture idle, stop ignored");
            return;
        };

        active.stop.set();

        if let Err(e) = active.stream.pause() {
            log::warn!("Failed to pause input stream: {}", e);
        }
        drop(active.stream);

        active.drain.join_timeout(self.config.join_timeout);

        let dropped = active.queue.dropped();
        if dropped > 0 {
            log::debug!("Capture dropped {} block(s) on a full queue", dropped);
        }
        self.dropped_blocks += dropped;

        log::info!("Capture stopped with {} buffered samples", self.buffer.len());
    }

    pub fn is_buffering(&self) -> bool {
        self.active.is_some()
    }

    /// Copy of the rolling buffer
    pub fn snapshot(&self) -> Vec<f64> {
        self.buffer.snapshot()
    }

    /// Discard buffered samples
    pub fn clear(&self) {
        self.buffer.clear();
    }

    pub fn buffer_len(&self) -> usize {
        self.buffer.len()
    }

    /// Shared handle to the rolling buffer
    pub fn buffer(&self) -> Arc<RollingBuffer> {
        Arc::clone(&self.buffer)
    }

    /// Blocks dropped on a full queue since creation
    pub fn dropped_blocks(&self) -> u64 {
        let live = self.active.as_ref().map_or(0, |a| a.queue.dropped());
        self.dropped_blocks + live
    }

    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }
}

impl Drop for AudioCapture {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Move blocks from the queue into the buffer until stopped and drained
fn drain_loop(queue: &BlockQueue, buffer: &RollingBuffer, stop: &StopSignal, timeout: Duration) {
    while !(stop.is_set() && queue.is_empty()) {
        if let Some(block) = queue.pop(timeout) {
            buffer.append(block.samples());
        }
    }
}
