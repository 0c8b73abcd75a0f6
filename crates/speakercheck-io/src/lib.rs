//! Audio I/O layer for speakercheck.
//!
//! This crate provides:
//!
//! - **WAV file I/O**: [`read_wav`] and [`write_wav`] for recordings and excitation files
//! - **Excitation**: [`Excitation`] renders the tone or sweep a test plays, panned per [`Channel`](speakercheck_config::Channel)
//! - **Backends**: the [`AudioBackend`] trait with [`CpalBackend`] for real devices and
//!   [`LoopbackBackend`] for device-free runs
//! - **Measurement**: [`MeasurementContext`] plays an excitation while recording the response
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use speakercheck_config::{Channel, MeasurementSettings, TestType};
//! use speakercheck_io::{CpalBackend, Excitation, MeasurementContext};
//!
//! let settings = MeasurementSettings::default();
//! let excitation = Excitation::for_test(TestType::Sweep, &settings);
//!
//! let mut context = MeasurementContext::new(Box::new(CpalBackend::new()), settings);
//! let recording = context.run(&excitation, Channel::Left)?;
//! context.close();
//! ```

pub mod backend;
pub mod context;
pub mod cpal_backend;
mod devices;
pub mod loopback;
mod signal;
mod wav;

pub use backend::{AudioBackend, BackendStreamConfig, StreamHandle};
pub use context::{Measurement, MeasurementContext};
pub use cpal_backend::CpalBackend;
pub use devices::{AudioDevice, default_device, list_devices};
pub use loopback::LoopbackBackend;
pub use signal::{Excitation, pan_gains};
pub use wav::{WavSpec, read_wav, write_wav};

/// Error types for audio I/O operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// WAV file read/write error.
    #[error("WAV file error: {0}")]
    Wav(#[from] hound::Error),

    /// A float WAV file holds a NaN or infinite sample.
    #[error("WAV file has a non-finite sample at frame {0}")]
    NonFiniteSample(usize),

    /// Audio stream setup or runtime error.
    #[error("Audio stream error: {0}")]
    Stream(String),

    /// No audio device available on the system.
    #[error("No audio device available")]
    NoDevice,

    /// The requested audio device was not found.
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    /// Excitation or recording parameters were rejected.
    #[error("Invalid measurement parameters: {0}")]
    Analysis(#[from] speakercheck_analysis::AnalysisError),

    /// Standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type for audio I/O operations.
pub type Result<T> = std::result::Result<T, Error>;
