//! Thread lifecycle helpers shared by the capture drain and the analysis loop
//!
//! A `StopSignal` is a cancellation flag that can also be waited on with a
//! timeout, and a `Worker` is a named thread whose join is bounded.

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Cancellation flag observable by polling or by a bounded wait
#[derive(Clone)]
pub struct StopSignal {
    flag: Arc<AtomicBool>,
    wake_tx: Sender<()>,
    wake_rx: Receiver<()>,
}

impl StopSignal {
    pub fn new() -> Self {
        let (wake_tx, wake_rx) = bounded(1);
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            wake_tx,
            wake_rx,
        }
    }

    /// Raise the signal and wake one waiter
    pub fn set(&self) {
        self.flag.store(true, Ordering::SeqCst);
        // A full channel already holds a pending wake-up
        let _ = self.wake_tx.try_send(());
    }

    pub fn is_set(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Wait until the signal is raised or `timeout` elapses
    ///
    /// # Returns
    /// `true` if the signal is set
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        if self.is_set() {
            return true;
        }

        match self.wake_rx.recv_timeout(timeout) {
            Ok(()) => {
                // Re-arm so that other clones waiting on the same signal also wake
                let _ = self.wake_tx.try_send(());
                true
            }
            Err(RecvTimeoutError::Timeout) => self.is_set(),
            Err(RecvTimeoutError::Disconnected) => true,
        }
    }
}

impl Default for StopSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Background thread with a completion notification
pub struct Worker {
    name: String,
    handle: JoinHandle<()>,
    done_rx: Receiver<()>,
}

impl Worker {
    /// Spawn a named thread running `body`
    pub fn spawn<F>(name: &str, body: F) -> io::Result<Self>
    where
        F: FnOnce() + Send + 'static,
    {
        let (done_tx, done_rx) = bounded::<()>(1);

        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                body();
                let _ = done_tx.send(());
            })?;

        Ok(Self {
            name: name.to_string(),
            handle,
            done_rx,
        })
    }

    /// Check whether the thread body has returned
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Join the thread, waiting at most `timeout`
    ///
    /// On timeout the handle is dropped and the thread keeps running detached
    /// until it observes its stop signal.
    ///
    /// # Returns
    /// `true` if the thread was joined
    pub fn join_timeout(self, timeout: Duration) -> bool {
        match self.done_rx.recv_timeout(timeout) {
            // Disconnected means the body panicked before notifying
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                if self.handle.join().is_err() {
                    log::error!("{} thread panicked", self.name);
                }
                true
            }
            Err(RecvTimeoutError::Timeout) => {
                log::warn!(
                    "{} thread did not stop within {:?}, detaching it",
                    self.name,
                    timeout
                );
                false
            }
        }
    }
}
