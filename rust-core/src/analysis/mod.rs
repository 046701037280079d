//! Pitch analysers: the live scheduler and the offline file path

pub mod config;
pub mod offline;
pub mod scheduler;
pub mod sink;

pub use config::{Algorithm, AnalyserConfig, ConfigError};
pub use offline::{OfflineAnalyser, OfflineError};
pub use scheduler::{AnalysisScheduler, RunStatus, SchedulerError};
pub use sink::{ChannelSink, SinkError, SpectrumSink};
