//! Bounded block queue between the real-time callback and the drain thread
//!
//! `push` never blocks: when the queue is full the block is dropped, so the
//! audio callback keeps its timing at the cost of losing data.

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// One callback's worth of mono samples
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBlock {
    samples: Vec<f64>,
}

impl AudioBlock {
    /// Copy device samples into an owned block
    pub fn from_f32(data: &[f32]) -> Self {
        Self {
            samples: data.iter().map(|&s| s as f64).collect(),
        }
    }

    pub fn from_samples(samples: Vec<f64>) -> Self {
        Self { samples }
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn into_samples(self) -> Vec<f64> {
        self.samples
    }
}

/// Fixed-capacity, drop-on-full queue of audio blocks
#[derive(Clone)]
pub struct BlockQueue {
    tx: Sender<AudioBlock>,
    rx: Receiver<AudioBlock>,
    capacity: usize,
    dropped: Arc<AtomicU64>,
}

impl BlockQueue {
    /// Create a queue holding at most `capacity` blocks
    ///
    /// A zero capacity is raised to one; a rendezvous queue would drop every
    /// block pushed while the consumer is busy.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, rx) = bounded(capacity);

        Self {
            tx,
            rx,
            capacity,
            dropped: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Enqueue without blocking
    ///
    /// # Returns
    /// `true` if enqueued, `false` if the block was dropped
    pub fn push(&self, block: AudioBlock) -> bool {
        match self.tx.try_send(block) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }

    /// Dequeue, waiting at most `timeout`
    pub fn pop(&self, timeout: Duration) -> Option<AudioBlock> {
        match self.rx.recv_timeout(timeout) {
            Ok(block) => Some(block),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of blocks dropped because the queue was full
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    fn block(value: f64) -> AudioBlock {
        AudioBlock::from_samples(vec![value; 4])
    }

    #[test]
    fn test_push_drops_when_full() {
        let queue = BlockQueue::new(2);

        assert!(queue.push(block(1.0)));
        assert!(queue.push(block(2.0)));
        assert!(!queue.push(block(3.0)));

        assert_eq!(queue.len(), 2);
        assert_eq!(queue.dropped(), 1);

        // Earlier blocks are untouched and come out in order
        assert_eq!(queue.pop(Duration::from_millis(10)), Some(block(1.0)));
        assert_eq!(queue.pop(Duration::from_millis(10)), Some(block(2.0)));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_push_never_blocks() {
        let queue = BlockQueue::new(1);
        queue.push(block(0.0));

        let start = Instant::now();
        for _ in 0..1000 {
            assert!(!queue.push(block(1.0)));
        }
        assert!(start.elapsed() < Duration::from_millis(500));
    }

    #[test]
    fn test_pop_times_out_on_empty() {
        let queue = BlockQueue::new(4);
        let start = Instant::now();

        assert_eq!(queue.pop(Duration::from_millis(20)), None);
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn test_from_f32_copies_samples() {
        let data = [0.5f32, -0.25, 1.0];
        let block = AudioBlock::from_f32(&data);

        assert_eq!(block.samples(), &[0.5, -0.25, 1.0]);
        assert_eq!(block.len(), 3);
    }
}
