//! Pitch Analyser - live audio spectrum core
//!
//! Captures audio into a rolling buffer, periodically transforms the latest
//! window into a frequency spectrum, restricts it to a band of interest and
//! hands it to a sink for display.

pub mod analysis;
pub mod audio;
pub mod spectrum;
pub mod worker;

pub use analysis::{Algorithm, AnalyserConfig, AnalysisScheduler, OfflineAnalyser, SpectrumSink};
pub use audio::{AudioCapture, CpalBackend};
pub use spectrum::band::FrequencyRange;
pub use spectrum::{SpectralFrame, SpectralTransform, Transform};
