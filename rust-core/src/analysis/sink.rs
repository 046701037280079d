//! Spectrum consumers
//!
//! A sink receives each spectrum the analysers produce, e.g. a plotting
//! window or a test probe. It is handed to the analyser when a run starts.

use crate::spectrum::SpectralFrame;
use crossbeam_channel::{Sender, TrySendError};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SinkError {
    #[error("Sink receiver disconnected")]
    Disconnected,

    #[error("Sink rejected frame: {0}")]
    Rejected(String),
}

/// Consumer of computed spectra
pub trait SpectrumSink: Send {
    /// Accept one band-filtered spectrum
    fn update(&mut self, frame: &SpectralFrame) -> Result<(), SinkError>;

    /// Release the sink; calling it again has no effect
    fn close(&mut self) {}
}

/// Forwards frames over a channel, e.g. to a UI thread
///
/// Frames are dropped when the channel is full so a slow reader never
/// stalls the analysis loop.
pub struct ChannelSink {
    tx: Option<Sender<SpectralFrame>>,
}

impl ChannelSink {
    pub fn new(tx: Sender<SpectralFrame>) -> Self {
        Self { tx: Some(tx) }
    }
}

impl SpectrumSink for ChannelSink {
    fn update(&mut self, frame: &SpectralFrame) -> Result<(), SinkError> {
        let tx = self.tx.as_ref().ok_or(SinkError::Disconnected)?;

        match tx.try_send(frame.clone()) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                log::trace!("Sink channel full, frame skipped");
                Ok(())
            }
            Err(TrySendError::Disconnected(_)) => Err(SinkError::Disconnected),
        }
    }

    fn close(&mut self) {
        // Dropping the sender lets the receiver observe disconnection
        self.tx = None;
    }
}
