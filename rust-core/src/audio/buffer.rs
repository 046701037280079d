//! Rolling sample buffer
//!
//! Fixed-capacity store of the most recent samples, shared between the
//! capture drain thread (writer) and the analysis loop (reader)

use ringbuf::{HeapRb, Rb};
use std::sync::{Mutex, MutexGuard};

/// Thread-safe rolling buffer with oldest-first eviction
pub struct RollingBuffer {
    samples: Mutex<HeapRb<f64>>,
    capacity: usize,
}

impl RollingBuffer {
    /// Create new rolling buffer with given capacity
    ///
    /// # Arguments
    /// * `capacity` - Buffer capacity in samples
    ///
    /// # Panics
    /// If `capacity` is zero
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "rolling buffer capacity must be non-zero");

        Self {
            samples: Mutex::new(HeapRb::new(capacity)),
            capacity,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HeapRb<f64>> {
        // Every mutation completes under the lock, so a poisoned buffer is still consistent
        self.samples.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Append samples, evicting the oldest ones beyond capacity
    pub fn append(&self, samples: &[f64]) {
        // Only the last `capacity` samples can survive
        let tail = &samples[samples.len().saturating_sub(self.capacity)..];

        let mut rb = self.lock();
        for &sample in tail {
            rb.push_overwrite(sample);
        }
    }

    /// Copy of the current contents, oldest sample first
    pub fn snapshot(&self) -> Vec<f64> {
        self.lock().iter().copied().collect()
    }

    /// Discard all samples
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Get number of stored samples
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Check if buffer is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get buffer capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_append_and_snapshot() {
        let buffer = RollingBuffer::new(1024);

        let data = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        buffer.append(&data);

        assert_eq!(buffer.len(), 5);
        assert_eq!(buffer.snapshot(), data);
    }

    #[test]
    fn test_eviction_keeps_most_recent_suffix() {
        let buffer = RollingBuffer::new(10);
        let mut appended = Vec::new();

        // Blocks of uneven size, some larger than capacity
        for (i, size) in [3usize, 7, 4, 15, 1, 9].iter().enumerate() {
            let block: Vec<f64> = (0..*size).map(|j| (i * 100 + j) as f64).collect();
            buffer.append(&block);
            appended.extend_from_slice(&block);

            assert!(buffer.len() <= 10);
            let expected_start = appended.len().saturating_sub(10);
            assert_eq!(buffer.snapshot(), appended[expected_start..].to_vec());
        }
    }

    #[test]
    fn test_clear() {
        let buffer = RollingBuffer::new(8);
        buffer.append(&[1.0; 6]);
        buffer.clear();

        assert!(buffer.is_empty());
        assert!(buffer.snapshot().is_empty());
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        let buffer = RollingBuffer::new(4);
        buffer.append(&[1.0, 2.0]);

        let snapshot = buffer.snapshot();
        buffer.append(&[3.0, 4.0, 5.0]);

        assert_eq!(snapshot, vec![1.0, 2.0]);
        assert_eq!(buffer.snapshot(), vec![2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_concurrent_snapshots_see_whole_blocks() {
        let buffer = Arc::new(RollingBuffer::new(64));
        let writer_buffer = Arc::clone(&buffer);

        // Each block is a run of one value; a torn append would mix runs unevenly
        let writer = thread::spawn(move || {
            for i in 0..2000 {
                writer_buffer.append(&[i as f64; 16]);
            }
        });

        for _ in 0..2000 {
            let snapshot = buffer.snapshot();
            assert!(snapshot.len() <= 64);
            assert_eq!(snapshot.len() % 16, 0);
            for chunk in snapshot.chunks(16) {
                assert!(chunk.iter().all(|&s| s == chunk[0]));
            }
        }

        writer.join().unwrap();
    }
}
