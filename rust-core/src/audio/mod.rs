//! Audio capture and loading

pub mod buffer;
pub mod capture;
pub mod file;
pub mod input;
pub mod queue;
pub mod synthetic;

pub use buffer::RollingBuffer;
pub use capture::{AudioCapture, CaptureConfig};
pub use file::{load_file, AudioLoader, LoadError, WavLoader};
pub use input::{AudioError, CaptureBackend, CpalBackend, InputStream, StreamParams};
pub use queue::{AudioBlock, BlockQueue};
pub use synthetic::ToneBackend;
